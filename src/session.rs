/// The document currently shared across panels: identity plus metadata,
/// replaced wholesale whenever the document panel reports a new ready file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub id: String,
    pub name: String,
    pub page_count: u32,
}

/// Props handed to the chat panel on every draw. `reset_signal` is a pure
/// recreation trigger, not a content value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatProps {
    pub reset_signal: u64,
    pub document_id: String,
    pub document_name: String,
}

/// Session-scoped UI state owned by the coordinator. In memory only,
/// gone when the process exits.
#[derive(Debug, Default)]
pub struct SessionState {
    reset_token: u64,
    active_document: Option<ActiveDocument>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_token(&self) -> u64 {
        self.reset_token
    }

    /// Bump the reset token. Callers key the chat panel's structural
    /// identity off the returned value, so every call forces a rebuild.
    pub fn bump_reset_token(&mut self) -> u64 {
        self.reset_token += 1;
        self.reset_token
    }

    pub fn active_document(&self) -> Option<&ActiveDocument> {
        self.active_document.as_ref()
    }

    /// Replace the active document in one assignment. Values are accepted
    /// as-is; validation belongs to the document panel.
    pub fn replace_active_document(&mut self, id: String, name: String, page_count: u32) {
        self.active_document = Some(ActiveDocument {
            id,
            name,
            page_count,
        });
    }

    /// Current chat props: empty-string defaults until a document is ready.
    pub fn chat_props(&self) -> ChatProps {
        match &self.active_document {
            Some(doc) => ChatProps {
                reset_signal: self.reset_token,
                document_id: doc.id.clone(),
                document_name: doc.name.clone(),
            },
            None => ChatProps {
                reset_signal: self.reset_token,
                document_id: String::new(),
                document_name: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_default_to_empty_strings() {
        let state = SessionState::new();
        let props = state.chat_props();
        assert_eq!(props.reset_signal, 0);
        assert_eq!(props.document_id, "");
        assert_eq!(props.document_name, "");
    }

    #[test]
    fn reset_token_strictly_increases() {
        let mut state = SessionState::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(state.bump_reset_token());
        }
        for pair in seen.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn consecutive_resets_are_distinct() {
        let mut state = SessionState::new();
        let first = state.bump_reset_token();
        let second = state.bump_reset_token();
        assert_ne!(first, second);
    }

    #[test]
    fn document_replacement_never_mixes_fields() {
        let mut state = SessionState::new();
        state.replace_active_document("f1".into(), "a.pdf".into(), 10);
        state.replace_active_document("f2".into(), "b.pdf".into(), 3);

        let props = state.chat_props();
        assert_eq!(props.document_id, "f2");
        assert_eq!(props.document_name, "b.pdf");

        let doc = state.active_document().unwrap();
        assert_eq!(doc.page_count, 3);
    }

    #[test]
    fn unvalidated_input_is_forwarded_as_is() {
        let mut state = SessionState::new();
        state.replace_active_document(String::new(), "no-id.pdf".into(), 0);
        let props = state.chat_props();
        assert_eq!(props.document_id, "");
        assert_eq!(props.document_name, "no-id.pdf");
    }
}
