use crossterm::event::{KeyCode, KeyEvent};
use docchat::notification::Notifier;
use docchat::widget::document_panel::DocumentPanel;
use std::fs;
use tempfile::TempDir;

const ONE_PAGE_PDF: &[u8] = b"%PDF-1.4\n/Type /Pages\n/Type /Page\n%%EOF";

fn dir_with(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        fs::write(dir.path().join(name), ONE_PAGE_PDF).unwrap();
    }
    dir
}

#[test]
fn scans_only_pdf_files() {
    let dir = dir_with(&["b.pdf", "a.PDF"]);
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let panel = DocumentPanel::new(dir.path(), Notifier::new()).unwrap();
    assert_eq!(panel.document_count(), 2);
}

#[test]
fn scans_subdirectories() {
    let dir = dir_with(&["top.pdf"]);
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/deep.pdf"), ONE_PAGE_PDF).unwrap();

    let panel = DocumentPanel::new(dir.path(), Notifier::new()).unwrap();
    assert_eq!(panel.document_count(), 2);
}

#[test]
fn missing_directory_is_an_error() {
    let err = DocumentPanel::new("/no/such/place", Notifier::new());
    assert!(err.is_err());
}

#[test]
fn rescan_picks_up_new_files() {
    let dir = dir_with(&["first.pdf"]);
    let mut panel = DocumentPanel::new(dir.path(), Notifier::new()).unwrap();
    assert_eq!(panel.document_count(), 1);

    fs::write(dir.path().join("second.pdf"), ONE_PAGE_PDF).unwrap();
    panel.handle_key(KeyEvent::from(KeyCode::Char('r')));
    assert_eq!(panel.document_count(), 2);
}

#[test]
fn preparation_emits_ready_exactly_once() {
    let dir = dir_with(&["doc.pdf"]);
    let notifier = Notifier::new();
    let mut panel = DocumentPanel::new(dir.path(), notifier.clone()).unwrap();

    panel.handle_key(KeyEvent::from(KeyCode::Enter));
    assert!(panel.is_preparing());

    let mut ready_events = Vec::new();
    for _ in 0..10 {
        if let Some(ready) = panel.tick() {
            ready_events.push(ready);
        }
    }

    assert_eq!(ready_events.len(), 1);
    let ready = &ready_events[0];
    assert_eq!(ready.name, "doc.pdf");
    assert_eq!(ready.page_count, 1);
    assert!(ready.id.starts_with("f_"));
    assert!(!panel.is_preparing());

    // The panel announced readiness through the notifier.
    assert!(notifier.current().unwrap().message.contains("doc.pdf"));
}

#[test]
fn enter_with_no_files_is_a_no_op() {
    let dir = dir_with(&[]);
    let mut panel = DocumentPanel::new(dir.path(), Notifier::new()).unwrap();

    panel.handle_key(KeyEvent::from(KeyCode::Enter));
    assert!(!panel.is_preparing());
    assert_eq!(panel.tick(), None);
}

#[test]
fn selection_stays_in_bounds() {
    let dir = dir_with(&["a.pdf", "b.pdf"]);
    let mut panel = DocumentPanel::new(dir.path(), Notifier::new()).unwrap();

    for _ in 0..5 {
        panel.handle_key(KeyEvent::from(KeyCode::Char('j')));
    }
    for _ in 0..5 {
        panel.handle_key(KeyEvent::from(KeyCode::Char('k')));
    }
    // Still selectable; preparing the top entry works.
    panel.handle_key(KeyEvent::from(KeyCode::Enter));
    assert!(panel.is_preparing());
}
