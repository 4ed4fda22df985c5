pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(width, height)).expect("failed to create test terminal")
    }

    /// Flatten the test backend's buffer into plain text, one line per row.
    pub fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut text = String::new();
        for (i, cell) in buffer.content().iter().enumerate() {
            if i > 0 && i % width == 0 {
                text.push('\n');
            }
            text.push_str(cell.symbol());
        }
        text
    }

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Type a whole line followed by Enter
        pub fn type_line(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self.events.push(SimulatedEventSource::enter_key());
            self
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events.push(SimulatedEventSource::enter_key());
            self
        }

        pub fn press_tab(mut self) -> Self {
            self.events.push(SimulatedEventSource::tab_key());
            self
        }

        pub fn press_esc(mut self) -> Self {
            self.events.push(SimulatedEventSource::esc_key());
            self
        }

        pub fn press_key(mut self, code: KeyCode, modifiers: KeyModifiers) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, modifiers));
            self
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }

        pub fn events(self) -> Vec<Event> {
            self.events
        }
    }
}
