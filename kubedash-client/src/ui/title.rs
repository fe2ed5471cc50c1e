use ratatui::text::{Line, Span};

use super::colors::Skin;

/// ` Logs(ns/name) `
pub fn format_title(path: &str, container: &str) -> String {
    if container.is_empty() {
        format!(" Logs({path}) ")
    } else {
        format!(" Logs({path}:{container}) ")
    }
}

/// Same text as [`format_title`], with the container name highlighted.
pub fn title_line(path: &str, container: &str, skin: &Skin) -> Line<'static> {
    let base = skin.title();
    let mut spans = vec![Span::styled(format!(" Logs({path}"), base)];
    if !container.is_empty() {
        spans.push(Span::styled(":", base));
        spans.push(Span::styled(container.to_string(), skin.highlight()));
    }
    spans.push(Span::styled(") ", base));
    Line::from(spans)
}
