use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use log::{info, warn};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};
use walkdir::WalkDir;

use crate::notification::Notifier;
use crate::theme::current_theme;

/// Reported by the panel when a selected document finishes preparation.
/// The coordinator replaces its active document wholesale with this triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReady {
    pub id: String,
    pub name: String,
    pub page_count: u32,
}

#[derive(Debug, Clone)]
struct DocumentFile {
    name: String,
    path: PathBuf,
}

/// Staged preparation mirrors an upload-and-parse job: selection jumps to an
/// initial progress value, each tick advances a stage, and 100 means ready.
#[derive(Debug, Clone)]
enum PrepState {
    Idle,
    Preparing {
        name: String,
        page_count: u32,
        progress: u8,
    },
}

const PREP_STAGES: [u8; 4] = [5, 20, 60, 100];

/// Document panel: lists `.pdf` files under a root directory, runs the staged
/// preparation for the selected one, and emits `DocumentReady` exactly once
/// per completed run. It is the sole producer of ready events.
pub struct DocumentPanel {
    root: PathBuf,
    files: Vec<DocumentFile>,
    list_state: ListState,
    prep: PrepState,
    notifier: Notifier,
}

impl DocumentPanel {
    pub fn new(root: impl Into<PathBuf>, notifier: Notifier) -> Result<Self> {
        let root = root.into();
        let files = scan_documents(&root)
            .with_context(|| format!("scanning documents under {}", root.display()))?;
        info!("Found {} document(s) under {}", files.len(), root.display());

        let mut list_state = ListState::default();
        if !files.is_empty() {
            list_state.select(Some(0));
        }

        Ok(Self {
            root,
            files,
            list_state,
            prep: PrepState::Idle,
            notifier,
        })
    }

    pub fn document_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self.prep, PrepState::Preparing { .. })
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Char('r') => self.rescan(),
            KeyCode::Enter => self.begin_preparation(),
            _ => {}
        }
    }

    fn select_next(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.files.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn select_previous(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let previous = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(previous));
    }

    fn rescan(&mut self) {
        match scan_documents(&self.root) {
            Ok(files) => {
                info!("Rescan found {} document(s)", files.len());
                self.files = files;
                let selected = self
                    .list_state
                    .selected()
                    .filter(|i| *i < self.files.len())
                    .or(if self.files.is_empty() { None } else { Some(0) });
                self.list_state.select(selected);
            }
            Err(e) => {
                warn!("Rescan failed: {e:#}");
                self.notifier.error(format!("Rescan failed: {e}"));
            }
        }
    }

    fn begin_preparation(&mut self) {
        if self.is_preparing() {
            return;
        }
        let Some(file) = self
            .list_state
            .selected()
            .and_then(|i| self.files.get(i))
            .cloned()
        else {
            return;
        };

        match probe_page_count(&file.path) {
            Ok(page_count) => {
                info!("Preparing {} ({} pages)", file.name, page_count);
                self.prep = PrepState::Preparing {
                    name: file.name,
                    page_count,
                    progress: PREP_STAGES[0],
                };
            }
            Err(e) => {
                warn!("Failed to read {}: {e:#}", file.path.display());
                self.notifier.error(format!("Cannot read {}: {e}", file.name));
            }
        }
    }

    /// Advance the preparation one stage. Emits the ready event exactly once,
    /// on the tick that reaches 100; afterwards the panel is idle again.
    pub fn tick(&mut self) -> Option<DocumentReady> {
        let PrepState::Preparing {
            name,
            page_count,
            progress,
        } = &mut self.prep
        else {
            return None;
        };

        let next = PREP_STAGES
            .iter()
            .copied()
            .find(|&stage| stage > *progress)
            .unwrap_or(100);
        *progress = next;

        if next < 100 {
            return None;
        }

        let ready = DocumentReady {
            id: new_file_id(),
            name: name.clone(),
            page_count: *page_count,
        };
        self.prep = PrepState::Idle;
        self.notifier
            .info(format!("{} is ready ({} pages)", ready.name, ready.page_count));
        info!("Document ready: {} as {}", ready.name, ready.id);
        Some(ready)
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool) {
        let theme = current_theme();
        let (border_color, text_color) = theme.panel_colors(focused);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Documents ({}) ", self.files.len()))
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        if self.files.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                format!("No .pdf files under {}. Press r to rescan.", self.root.display()),
                Style::default().fg(theme.base_03),
            )));
            f.render_widget(empty, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .files
                .iter()
                .map(|file| {
                    ListItem::new(Line::from(Span::styled(
                        file.name.clone(),
                        Style::default().fg(text_color),
                    )))
                })
                .collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(theme.base_02)
                    .fg(theme.base_06)
                    .add_modifier(Modifier::BOLD),
            );
            f.render_stateful_widget(list, chunks[0], &mut self.list_state);
        }

        match &self.prep {
            PrepState::Preparing { name, progress, .. } => {
                let gauge = Gauge::default()
                    .ratio(f64::from(*progress) / 100.0)
                    .label(format!("Preparing {name}… {progress}%"))
                    .gauge_style(Style::default().fg(theme.base_0d).bg(theme.base_01));
                f.render_widget(gauge, chunks[1]);
            }
            PrepState::Idle => {
                let hint = Paragraph::new(Line::from(Span::styled(
                    "Enter: prepare | j/k: move | r: rescan",
                    Style::default().fg(theme.base_03),
                )))
                .style(Style::default().bg(theme.base_00));
                f.render_widget(hint, chunks[1]);
            }
        }
    }
}

fn scan_documents(root: &Path) -> Result<Vec<DocumentFile>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    let mut files: Vec<DocumentFile> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .map(|entry| DocumentFile {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry.into_path(),
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Byte-marker probe for the page count. Counts `/Type /Page` objects
/// (excluding the `/Type /Pages` tree nodes) without parsing the document;
/// 0 means unknown and downstream consumers must treat it that way.
fn probe_page_count(path: &Path) -> Result<u32> {
    let bytes = fs::read(path)?;
    let marker = b"/Type /Page";
    let mut count: u32 = 0;
    let mut i = 0;
    while i + marker.len() <= bytes.len() {
        if &bytes[i..i + marker.len()] == marker {
            let follows_s = bytes.get(i + marker.len()) == Some(&b's');
            if !follows_s {
                count += 1;
            }
            i += marker.len();
        } else {
            i += 1;
        }
    }
    Ok(count)
}

/// Fresh identity per preparation run, so re-selecting the same file still
/// replaces the previous document rather than merging with it.
fn new_file_id() -> String {
    format!("f_{:08x}", rand::random::<u32>())
}
