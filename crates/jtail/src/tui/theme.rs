//! Theme and styling for the TUI.

use jtail_protocol::{Event, EventCategory};
use ratatui::style::{Color, Modifier, Style};

/// Theme colors and styles for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Brand color (orange/coral)
    pub brand: Color,
    /// Success color (green)
    pub success: Color,
    /// Warning color (amber/yellow)
    pub warning: Color,
    /// Error color (red)
    pub error: Color,
    /// Exceptions
    pub exception: Color,
    /// Muted/secondary text
    pub muted: Color,
    /// Selection background (subtle highlight)
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            brand: Color::Rgb(255, 143, 115),
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            exception: Color::Magenta,
            muted: Color::DarkGray,
            selection_bg: Color::Rgb(50, 50, 55),
        }
    }
}

impl Theme {
    /// Style for the brand/accent elements.
    pub fn brand_style(&self) -> Style {
        Style::default().fg(self.brand)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn exception_style(&self) -> Style {
        Style::default().fg(self.exception)
    }

    /// Style for muted/secondary text.
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Style for focused border.
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.brand)
    }

    /// Style for unfocused border.
    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Style for selected item with background highlight.
    pub fn selected_bg_style(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for header text.
    pub fn header_style(&self) -> Style {
        Style::default().fg(self.brand).add_modifier(Modifier::BOLD)
    }

    /// Alert banner: white on red.
    pub fn banner_style(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .bg(self.error)
            .add_modifier(Modifier::BOLD)
    }

    /// Row color for a streamed event.
    pub fn event_style(&self, event: &Event) -> Style {
        match event.category() {
            EventCategory::Gc => self.warning_style(),
            EventCategory::Lock => self.error_style(),
            EventCategory::Exception => self.exception_style(),
            EventCategory::HeapSummary | EventCategory::Other => Style::default(),
        }
    }

    /// Row color for a locally generated connection event.
    pub fn local_style(&self, event: &Event) -> Style {
        if event.kind() == super::state::CONNECTED {
            self.success_style().add_modifier(Modifier::BOLD)
        } else {
            self.error_style().add_modifier(Modifier::BOLD)
        }
    }
}
