use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::arrears::DuesStatus;
use crate::fmt::rupiah;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);

/// Amount as a colored span. Shows the absolute value; color carries the sign.
pub fn money_span(amount: i64) -> Span<'static> {
    let style = if amount < 0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(rupiah(amount.saturating_abs()), style)
}

pub fn status_span(status: DuesStatus) -> Span<'static> {
    let style = match status {
        DuesStatus::PaidUp => AMOUNT_POS_STYLE,
        DuesStatus::Unpaid => Style::new().fg(Color::Yellow),
        DuesStatus::Arrears => AMOUNT_NEG_STYLE,
    };
    Span::styled(status.label(), style.add_modifier(Modifier::BOLD))
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}
