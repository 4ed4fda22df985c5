pub mod chat_panel;
pub mod document_panel;
pub mod toaster;
