//! Duration strings as they appear in resource tables (`"2175h48m0.06015s"`).
//!
//! The grammar is a signed sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix: `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m`, `h`.
//! The lone string `"0"` is also accepted.

use chrono::TimeDelta;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const MAX_FRACTION_DIGITS: u32 = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a duration string. Returns `None` for anything that is not a
/// well-formed duration, including plain numbers other than `"0"`.
pub fn parse_duration(s: &str) -> Option<TimeDelta> {
    let (neg, mut rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let limit = if neg {
        i64::MAX as u128 + 1
    } else {
        i64::MAX as u128
    };
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, tail) = rest.split_at(int_len);
        rest = tail;

        let mut whole: u128 = 0;
        for b in int_part.bytes() {
            whole = whole.checked_mul(10)?.checked_add(u128::from(b - b'0'))?;
            if whole > limit {
                return None;
            }
        }

        let mut frac: u128 = 0;
        let mut scale: u128 = 1;
        let mut frac_len = 0;
        if let Some(tail) = rest.strip_prefix('.') {
            frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
            for b in tail[..frac_len].bytes().take(MAX_FRACTION_DIGITS as usize) {
                frac = frac * 10 + u128::from(b - b'0');
                scale *= 10;
            }
            rest = &tail[frac_len..];
        }

        if int_len == 0 && frac_len == 0 {
            return None;
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return None;
        }
        let (unit, tail) = rest.split_at(unit_len);
        rest = tail;
        let per_unit = unit_nanos(unit)?;

        let component = whole.checked_mul(per_unit)? + frac * per_unit / scale;
        total = total.checked_add(component)?;
        if total > limit {
            return None;
        }
    }

    let nanos = if neg {
        (total as i128).checked_neg()?
    } else {
        total as i128
    };
    Some(TimeDelta::nanoseconds(i64::try_from(nanos).ok()?))
}

/// Renders a duration the way `parse_duration` reads it, e.g. `"403h42m34.06s"`.
pub fn format_duration(d: TimeDelta) -> String {
    let Some(nanos) = d.num_nanoseconds() else {
        return format!("{}h", d.num_hours());
    };
    if nanos == 0 {
        return "0s".to_string();
    }

    let sign = if nanos < 0 { "-" } else { "" };
    let nanos = u128::from(nanos.unsigned_abs());

    if nanos < NANOS_PER_SEC {
        let (scale, unit) = match nanos {
            n if n < 1_000 => (1, "ns"),
            n if n < 1_000_000 => (1_000, "µs"),
            _ => (1_000_000, "ms"),
        };
        return format!("{sign}{}{unit}", fixed(nanos, scale));
    }

    let secs = nanos / NANOS_PER_SEC;
    let hours = secs / 3_600;
    let mins = (secs / 60) % 60;

    let mut out = String::from(sign);
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || mins > 0 {
        out.push_str(&format!("{mins}m"));
    }
    out.push_str(&fixed(nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC));
    out.push('s');
    out
}

/// `value / scale` as a decimal with trailing zeros trimmed.
fn fixed(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
