use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::notification::Notifier;
use crate::session::ChatProps;
use crate::theme::current_theme;

/// Signals the conversational panel sends back to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    /// The user asked for a full chat reset (Ctrl+L).
    ClearRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Note,
}

#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

/// Conversational panel. All internal state (input line, transcript, scroll)
/// lives here and is discarded when the coordinator rebuilds the panel on a
/// reset-signal change. No chat backend is wired in this shell; messages are
/// recorded locally and a one-time note says so.
pub struct ChatPanel {
    props: ChatProps,
    input: String,
    transcript: Vec<ChatEntry>,
    scroll_offset: usize,
    backend_note_shown: bool,
    notifier: Notifier,
}

impl ChatPanel {
    pub fn new(props: ChatProps, notifier: Notifier) -> Self {
        Self {
            props,
            input: String::new(),
            transcript: Vec::new(),
            scroll_offset: 0,
            backend_note_shown: false,
            notifier,
        }
    }

    /// The reset signal this panel was built under. The coordinator compares
    /// it against the session token to decide when to rebuild.
    pub fn built_under(&self) -> u64 {
        self.props.reset_signal
    }

    /// Re-supply current props without touching internal state. A document
    /// change updates the title and message tagging; it never clears the
    /// transcript (only the reset signal does that, via recreation).
    pub fn update_props(&mut self, props: ChatProps) {
        self.props = props;
    }

    pub fn props(&self) -> &ChatProps {
        &self.props
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ChatAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('l') => return Some(ChatAction::ClearRequested),
                KeyCode::Char('u') => {
                    self.input.clear();
                    return None;
                }
                _ => return None,
            }
        }

        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            _ => {}
        }
        None
    }

    fn submit_input(&mut self) {
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return;
        }
        self.input.clear();
        self.scroll_offset = 0;

        if self.props.document_id.is_empty() {
            self.notifier
                .warn("No document is ready yet. Select one in the documents panel.");
        }

        self.transcript.push(ChatEntry {
            role: ChatRole::User,
            text: message,
        });

        if !self.backend_note_shown {
            self.backend_note_shown = true;
            self.transcript.push(ChatEntry {
                role: ChatRole::Note,
                text: "No chat backend is connected in this build; messages are kept locally."
                    .to_string(),
            });
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let theme = current_theme();
        let (border_color, text_color) = theme.panel_colors(focused);

        let title = if self.props.document_name.is_empty() {
            " Chat ".to_string()
        } else {
            format!(" Chat — {} ", self.props.document_name)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        self.render_transcript(f, chunks[0], text_color);
        self.render_input_line(f, chunks[1], focused);
    }

    fn render_transcript(&self, f: &mut Frame, area: Rect, text_color: ratatui::style::Color) {
        let theme = current_theme();
        let width = area.width.saturating_sub(2) as usize;
        if width == 0 || area.height == 0 {
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        for entry in &self.transcript {
            let (prefix, style) = match entry.role {
                ChatRole::User => (
                    "you> ",
                    Style::default().fg(text_color).add_modifier(Modifier::BOLD),
                ),
                ChatRole::Note => ("   * ", Style::default().fg(theme.base_03)),
            };
            for (i, wrapped) in textwrap::wrap(&entry.text, width.saturating_sub(prefix.len()))
                .iter()
                .enumerate()
            {
                let lead = if i == 0 { prefix } else { "     " };
                lines.push(Line::from(vec![
                    Span::styled(lead, Style::default().fg(theme.base_03)),
                    Span::styled(wrapped.to_string(), style),
                ]));
            }
            lines.push(Line::default());
        }

        if lines.is_empty() {
            let hint = if self.props.document_name.is_empty() {
                "Select a document on the right, then ask about it here."
            } else {
                "Ask something about the document. Ctrl+L clears the conversation."
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(theme.base_03),
            )));
        }

        // Pin to the bottom, offset by manual scroll.
        let visible = area.height as usize;
        let skip = lines
            .len()
            .saturating_sub(visible)
            .saturating_sub(self.scroll_offset.min(lines.len()));
        let tail: Vec<Line> = lines.into_iter().skip(skip).take(visible).collect();

        let paragraph = Paragraph::new(tail).style(Style::default().bg(theme.base_00));
        f.render_widget(paragraph, area);
    }

    fn render_input_line(&self, f: &mut Frame, area: Rect, focused: bool) {
        let theme = current_theme();
        let cursor = if focused { "█" } else { "" };
        let line = Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.base_0b)),
            Span::styled(self.input.clone(), Style::default().fg(theme.base_06)),
            Span::styled(cursor, Style::default().fg(theme.base_06)),
        ]);
        let paragraph = Paragraph::new(line).style(Style::default().bg(theme.base_01));
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    fn panel_with_doc() -> ChatPanel {
        let mut state = SessionState::new();
        state.replace_active_document("f1".into(), "a.pdf".into(), 10);
        ChatPanel::new(state.chat_props(), Notifier::new())
    }

    fn type_line(panel: &mut ChatPanel, text: &str) {
        for c in text.chars() {
            panel.handle_key(KeyEvent::from(KeyCode::Char(c)));
        }
        panel.handle_key(KeyEvent::from(KeyCode::Enter));
    }

    #[test]
    fn enter_records_user_message() {
        let mut panel = panel_with_doc();
        type_line(&mut panel, "what is chapter 2 about?");

        assert_eq!(panel.input(), "");
        assert_eq!(panel.transcript()[0].role, ChatRole::User);
        assert_eq!(panel.transcript()[0].text, "what is chapter 2 about?");
    }

    #[test]
    fn backend_note_appears_once() {
        let mut panel = panel_with_doc();
        type_line(&mut panel, "first");
        type_line(&mut panel, "second");

        let notes = panel
            .transcript()
            .iter()
            .filter(|e| e.role == ChatRole::Note)
            .count();
        assert_eq!(notes, 1);
    }

    #[test]
    fn empty_input_is_ignored() {
        let mut panel = panel_with_doc();
        panel.handle_key(KeyEvent::from(KeyCode::Enter));
        assert!(panel.transcript().is_empty());
    }

    #[test]
    fn ctrl_l_requests_clear() {
        let mut panel = panel_with_doc();
        let action = panel.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert_eq!(action, Some(ChatAction::ClearRequested));
    }

    #[test]
    fn submitting_without_document_warns_through_notifier() {
        let notifier = Notifier::new();
        let mut panel = ChatPanel::new(SessionState::new().chat_props(), notifier.clone());
        type_line(&mut panel, "hello?");

        assert_eq!(notifier.count(), 1);
        // The message is still recorded; the warning is advisory.
        assert_eq!(panel.transcript()[0].role, ChatRole::User);
    }

    #[test]
    fn update_props_keeps_transcript() {
        let mut panel = panel_with_doc();
        type_line(&mut panel, "keep me");

        let mut state = SessionState::new();
        state.replace_active_document("f2".into(), "b.pdf".into(), 3);
        panel.update_props(state.chat_props());

        assert_eq!(panel.props().document_id, "f2");
        assert_eq!(panel.transcript()[0].text, "keep me");
    }
}
