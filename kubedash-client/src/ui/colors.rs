//! Title colours shared by the log and table views.

use ratatui::style::{Color, Modifier, Style};

pub const TITLE_FG: Color = Color::Rgb(0x56, 0x9C, 0xD6); // #569CD6 - blue
pub const TITLE_BG: Color = Color::Reset;
pub const TITLE_HILITE: Color = Color::Rgb(0xD1, 0x9A, 0x66); // #D19A66 - orange
pub const SORT_MARK: Color = Color::Rgb(0x4E, 0xC9, 0xB0); // #4EC9B0 - cyan

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    pub fg: Color,
    pub bg: Color,
    pub hilite: Color,
}

impl Default for Skin {
    fn default() -> Self {
        Self {
            fg: TITLE_FG,
            bg: TITLE_BG,
            hilite: TITLE_HILITE,
        }
    }
}

impl Skin {
    pub fn title(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.hilite)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }
}
