use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::notification::{Notification, NotificationLevel};
use crate::theme::current_theme;

/// Top-right toast overlay. Fixed width (toasts never expand with their
/// message; long text wraps), newest on top, severity-colored border, with a
/// dismiss hint standing in for the close button. Mounted once per frame by
/// the coordinator as the last thing drawn, so it sits above both panels.
pub struct Toaster {
    width: u16,
    max_visible: usize,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        Self {
            width: 44,
            max_visible: 4,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, notifications: &[Notification]) {
        if notifications.is_empty() || area.width < self.width + 2 {
            return;
        }
        let width = self.width;
        let x = area.right().saturating_sub(width + 1);
        let mut y = area.top() + 1;

        for notification in notifications.iter().take(self.max_visible) {
            let text_width = width.saturating_sub(4) as usize;
            let wrapped = textwrap::wrap(&notification.message, text_width.max(1));
            let height = wrapped.len() as u16 + 2;
            if y + height > area.bottom() {
                break;
            }
            let toast_area = Rect::new(x, y, width, height);
            self.render_toast(f, toast_area, notification, &wrapped);
            y += height;
        }
    }

    fn render_toast(
        &self,
        f: &mut Frame,
        area: Rect,
        notification: &Notification,
        wrapped: &[std::borrow::Cow<'_, str>],
    ) {
        let theme = current_theme();
        let accent = theme.notification_accent(notification.level);
        let tag = match notification.level {
            NotificationLevel::Info => " info ",
            NotificationLevel::Warning => " warning ",
            NotificationLevel::Error => " error ",
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                tag,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .title_top(
                Line::from(Span::styled(" ✕ esc ", Style::default().fg(theme.base_03)))
                    .right_aligned(),
            )
            .style(Style::default().bg(theme.base_01));

        let lines: Vec<Line> = wrapped
            .iter()
            .map(|l| {
                Line::from(Span::styled(
                    format!(" {l}"),
                    Style::default().fg(theme.base_06),
                ))
            })
            .collect();

        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines).block(block);
        f.render_widget(paragraph, area);
    }

    /// Height the given message occupies, borders included. Used by tests to
    /// reason about stacking without rendering.
    pub fn toast_height(&self, message: &str) -> u16 {
        let text_width = self.width.saturating_sub(4) as usize;
        textwrap::wrap(message, text_width.max(1)).len() as u16 + 2
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// True when the message fits on one toast line without wrapping.
    pub fn fits_unwrapped(&self, message: &str) -> bool {
        message.width() <= self.width.saturating_sub(4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_width_is_fixed() {
        let toaster = Toaster::new();
        assert!(toaster.fits_unwrapped("short"));
        assert!(!toaster.fits_unwrapped(
            "a very long notification message that would have expanded the toast sideways"
        ));
        assert_eq!(toaster.width(), 44);
    }

    #[test]
    fn long_messages_wrap_instead_of_expanding() {
        let toaster = Toaster::new();
        let short = toaster.toast_height("ok");
        let long = toaster.toast_height(
            "a very long notification message that would have expanded the toast sideways",
        );
        assert_eq!(short, 3);
        assert!(long > short);
    }
}
