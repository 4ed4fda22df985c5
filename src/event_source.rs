use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real keyboard event source using crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Simulated event source for testing. Once the scripted events run out it
/// reports nothing left to poll; reads past the end synthesize a quit key so
/// a runaway loop still terminates.
pub struct SimulatedEventSource {
    events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: crossterm::event::KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    pub fn ctrl_char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn enter_key() -> Event {
        Self::key_event(KeyCode::Enter, KeyModifiers::empty())
    }

    pub fn tab_key() -> Event {
        Self::key_event(KeyCode::Tab, KeyModifiers::empty())
    }

    pub fn esc_key() -> Event {
        Self::key_event(KeyCode::Esc, KeyModifiers::empty())
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            Ok(SimulatedEventSource::char_key('q'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_source_replays_in_order() {
        let events = vec![
            SimulatedEventSource::char_key('j'),
            SimulatedEventSource::enter_key(),
            SimulatedEventSource::ctrl_char_key('l'),
        ];

        let mut source = SimulatedEventSource::new(events);

        assert!(source.poll(Duration::from_millis(0)).unwrap());

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('j'));
            assert!(key.modifiers.is_empty());
        }

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Enter);
        }

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('l'));
            assert!(key.modifiers.contains(KeyModifiers::CONTROL));
        }

        assert!(!source.poll(Duration::from_millis(0)).unwrap());
    }

    #[test]
    fn exhausted_source_synthesizes_quit() {
        let mut source = SimulatedEventSource::new(vec![]);
        assert!(!source.poll(Duration::from_millis(0)).unwrap());
        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('q'));
        }
    }
}
