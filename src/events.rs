//! Typed publish/subscribe for engine notifications.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::game::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum EngineEvent {
    ScoreChange(u32),
    StateChange(GameState),
    DifficultyChange(Difficulty),
}

/// Returned by [`EventBus::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&EngineEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        before != self.listeners.len()
    }

    pub fn emit(&mut self, event: EngineEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_receive_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = seen.clone();
        bus.subscribe(move |e| sink.borrow_mut().push(*e));

        bus.emit(EngineEvent::StateChange(GameState::Play));
        bus.emit(EngineEvent::ScoreChange(1));

        assert_eq!(
            *seen.borrow(),
            vec![
                EngineEvent::StateChange(GameState::Play),
                EngineEvent::ScoreChange(1)
            ]
        );
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let sub = bus.subscribe(move |_| *c.borrow_mut() += 1);

        bus.emit(EngineEvent::ScoreChange(1));
        assert!(bus.unsubscribe(sub));
        bus.emit(EngineEvent::ScoreChange(2));

        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(sub));
        assert!(bus.is_empty());
    }

    #[test]
    fn subscriptions_are_unique() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(|_| {});
        let b = bus.subscribe(|_| {});
        assert_ne!(a, b);
        assert!(bus.unsubscribe(a));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn events_serialize_for_the_host() {
        let json = serde_json::to_string(&EngineEvent::DifficultyChange(Difficulty::Hard)).unwrap();
        assert_eq!(json, r#"{"type":"difficultyChange","value":"hard"}"#);
    }
}
