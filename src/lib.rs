// Export modules for use in tests
pub mod event_source;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod session;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use main_app::{App, FocusedPanel, run_app_with_event_source};
