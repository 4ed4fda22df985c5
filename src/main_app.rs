use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};
use ratatui::{
    Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::EventSource;
use crate::notification::Notifier;
use crate::session::{ChatProps, SessionState};
use crate::theme::{ThemeId, current_theme, current_theme_id, set_theme};
use crate::widget::chat_panel::{ChatAction, ChatPanel};
use crate::widget::document_panel::DocumentPanel;
use crate::widget::toaster::Toaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    Chat,
    Documents,
}

/// Session coordinator. Owns the session state, rebuilds the chat panel when
/// the reset token moves, forwards document-ready events from the document
/// panel, and mounts the single toast sink. It performs no I/O of its own and
/// never rewrites what collaborators publish through the notifier.
pub struct App {
    session: SessionState,
    chat_panel: ChatPanel,
    document_panel: DocumentPanel,
    toaster: Toaster,
    notifier: Notifier,
    pub focused_panel: FocusedPanel,
}

impl App {
    pub fn new(docs_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_notifier(docs_dir, Notifier::new())
    }

    /// The notifier is injected, not owned: collaborators hold their own
    /// clones and the coordinator cannot intercept what they publish.
    pub fn with_notifier(docs_dir: impl AsRef<Path>, notifier: Notifier) -> Result<Self> {
        let session = SessionState::new();
        let chat_panel = ChatPanel::new(session.chat_props(), notifier.clone());
        let document_panel = DocumentPanel::new(docs_dir.as_ref(), notifier.clone())?;

        Ok(Self {
            session,
            chat_panel,
            document_panel,
            toaster: Toaster::new(),
            notifier,
            focused_panel: FocusedPanel::Chat,
        })
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn chat_props(&self) -> ChatProps {
        self.session.chat_props()
    }

    pub fn reset_signal(&self) -> u64 {
        self.session.reset_token()
    }

    /// The reset signal the current chat panel instance was built under.
    /// Changes exactly when the panel is structurally recreated.
    pub fn chat_generation(&self) -> u64 {
        self.chat_panel.built_under()
    }

    pub fn chat_panel(&self) -> &ChatPanel {
        &self.chat_panel
    }

    pub fn document_panel(&self) -> &DocumentPanel {
        &self.document_panel
    }

    /// Discard the chat panel and build a fresh one. The recreation is keyed
    /// off the token: every call bumps it, so every call forces a rebuild —
    /// a full reinitialization, never a soft clear.
    pub fn request_chat_reset(&mut self) {
        let token = self.session.bump_reset_token();
        debug!("Chat reset requested, token now {token}");
        self.sync_chat_panel();
    }

    /// Inbound callback from the document panel: replace the active document
    /// wholesale and re-supply props to the chat panel.
    pub fn notify_document_ready(&mut self, id: String, name: String, page_count: u32) {
        info!("Document ready: {name} ({id}, {page_count} pages)");
        self.session.replace_active_document(id, name, page_count);
        self.chat_panel.update_props(self.session.chat_props());
    }

    fn sync_chat_panel(&mut self) {
        if self.chat_panel.built_under() != self.session.reset_token() {
            self.chat_panel = ChatPanel::new(self.session.chat_props(), self.notifier.clone());
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return Some(AppAction::Quit),
                KeyCode::Char('t') => {
                    self.cycle_theme();
                    return None;
                }
                _ => {}
            }
        }

        // ESC dismisses the newest toast before anything else sees it.
        if key.code == KeyCode::Esc && self.notifier.dismiss_current() {
            return None;
        }

        if key.code == KeyCode::Tab {
            self.focused_panel = match self.focused_panel {
                FocusedPanel::Chat => FocusedPanel::Documents,
                FocusedPanel::Documents => FocusedPanel::Chat,
            };
            return None;
        }

        match self.focused_panel {
            FocusedPanel::Chat => {
                if let Some(ChatAction::ClearRequested) = self.chat_panel.handle_key(key) {
                    self.request_chat_reset();
                }
            }
            FocusedPanel::Documents => {
                if key.code == KeyCode::Char('q') && key.modifiers.is_empty() {
                    return Some(AppAction::Quit);
                }
                self.document_panel.handle_key(key);
            }
        }
        None
    }

    fn cycle_theme(&mut self) {
        let next = match current_theme_id() {
            ThemeId::OceanicNext => ThemeId::CatppuccinMocha,
            ThemeId::CatppuccinMocha => ThemeId::OceanicNext,
        };
        set_theme(next);
        debug!("Theme switched to {}", next.name());
    }

    /// Tick-driven updates: toast expiry and document preparation progress.
    /// Returns true when a redraw is needed.
    pub fn on_tick(&mut self) -> bool {
        let mut changed = self.notifier.update();

        if self.document_panel.is_preparing() {
            if let Some(ready) = self.document_panel.tick() {
                self.notify_document_ready(ready.id, ready.name, ready.page_count);
            }
            changed = true;
        }

        changed
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(f, chunks[0]);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        self.sync_chat_panel();
        self.chat_panel
            .render(f, main_chunks[0], self.focused_panel == FocusedPanel::Chat);
        self.document_panel.render(
            f,
            main_chunks[1],
            self.focused_panel == FocusedPanel::Documents,
        );

        self.render_help_bar(f, chunks[2]);

        // The one toast sink, drawn last so it overlays both panels.
        self.toaster.render(f, area, &self.notifier.snapshot());
    }

    fn render_header(&self, f: &mut ratatui::Frame, area: Rect) {
        let theme = current_theme();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.base_02))
            .style(Style::default().bg(theme.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let document_info = match self.session.active_document() {
            Some(doc) if doc.page_count > 0 => format!("{} — {} pages", doc.name, doc.page_count),
            Some(doc) => doc.name.clone(),
            None => "no document".to_string(),
        };

        let line = Line::from(vec![
            Span::styled(
                " docchat ",
                Style::default()
                    .fg(theme.base_0d)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("| ", Style::default().fg(theme.base_03)),
            Span::styled(document_info, Style::default().fg(theme.base_05)),
        ]);
        f.render_widget(Paragraph::new(line), inner);
    }

    fn render_help_bar(&self, f: &mut ratatui::Frame, area: Rect) {
        let theme = current_theme();
        let help_text = match self.focused_panel {
            FocusedPanel::Chat => {
                "Type to compose | Enter: Send | Ctrl+L: Reset chat | Tab: Switch | Ctrl+C: Quit"
            }
            FocusedPanel::Documents => {
                "j/k: Navigate | Enter: Prepare | r: Rescan | Tab: Switch | q: Quit"
            }
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.base_02))
            .style(Style::default().bg(theme.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let paragraph = Paragraph::new(help_text).style(
            Style::default()
                .fg(theme.base_03)
                .bg(theme.base_00),
        );
        f.render_widget(paragraph, inner);
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut first_render = true;

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;

        if first_render {
            needs_redraw = true;
            first_render = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.on_tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{buffer_text, create_test_terminal};
    use tempfile::TempDir;

    fn test_app() -> (App, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path()).unwrap();
        (app, dir)
    }

    #[test]
    fn reset_recreates_chat_panel_each_call() {
        let (mut app, _dir) = test_app();
        let mut generations = vec![app.chat_generation()];

        for _ in 0..3 {
            app.request_chat_reset();
            generations.push(app.chat_generation());
        }

        for pair in generations.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn reset_discards_chat_state() {
        let (mut app, _dir) = test_app();
        app.handle_key_event(KeyEvent::from(KeyCode::Char('h')));
        app.handle_key_event(KeyEvent::from(KeyCode::Char('i')));
        assert_eq!(app.chat_panel().input(), "hi");

        app.handle_key_event(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));

        assert_eq!(app.chat_panel().input(), "");
        assert!(app.chat_panel().transcript().is_empty());
    }

    #[test]
    fn document_ready_replaces_props_wholesale() {
        let (mut app, _dir) = test_app();
        assert_eq!(app.chat_props().document_id, "");
        assert_eq!(app.chat_props().document_name, "");

        app.notify_document_ready("f1".into(), "a.pdf".into(), 10);
        app.notify_document_ready("f2".into(), "b.pdf".into(), 3);

        let props = app.chat_props();
        assert_eq!(props.document_id, "f2");
        assert_eq!(props.document_name, "b.pdf");
    }

    #[test]
    fn document_change_survives_without_resetting_chat() {
        let (mut app, _dir) = test_app();
        let generation = app.chat_generation();
        app.notify_document_ready("f1".into(), "a.pdf".into(), 10);
        assert_eq!(app.chat_generation(), generation);
        assert_eq!(app.chat_panel().props().document_name, "a.pdf");
    }

    #[test]
    fn esc_dismisses_toast_before_panels() {
        let (mut app, _dir) = test_app();
        app.notifier().error("boom");
        assert_eq!(app.notifier().count(), 1);

        app.handle_key_event(KeyEvent::from(KeyCode::Esc));
        assert_eq!(app.notifier().count(), 0);
    }

    #[test]
    fn toast_renders_once_across_redraws() {
        let (mut app, _dir) = test_app();
        app.notifier().info("only once");

        let mut terminal = create_test_terminal(100, 30);
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let text = buffer_text(&terminal);
        assert_eq!(text.matches("only once").count(), 1);
    }

    #[test]
    fn tab_switches_focus() {
        let (mut app, _dir) = test_app();
        assert_eq!(app.focused_panel, FocusedPanel::Chat);
        app.handle_key_event(KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.focused_panel, FocusedPanel::Documents);
        app.handle_key_event(KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.focused_panel, FocusedPanel::Chat);
    }

    #[test]
    fn q_quits_only_from_documents_panel() {
        let (mut app, _dir) = test_app();
        assert_eq!(app.handle_key_event(KeyEvent::from(KeyCode::Char('q'))), None);
        app.handle_key_event(KeyEvent::from(KeyCode::Tab));
        assert_eq!(
            app.handle_key_event(KeyEvent::from(KeyCode::Char('q'))),
            Some(AppAction::Quit)
        );
    }
}
