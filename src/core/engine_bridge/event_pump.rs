//=========================================================================
// Event Pump
//=========================================================================
//
// Engine event drain with bounded polling and disconnect detection.
//
// Architecture:
//   Receiver<EngineEvent> → drain() → Vec<EngineEvent> → PumpControl
//
// Bounded polling prevents a chatty engine from starving the caller.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::interface::EngineEvent;

//=== PumpControl =========================================================

/// Drain outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpControl {
    Continue,
    Disconnected,
}

//=== EventPump ===========================================================

/// Collects engine events with bounded batch extraction.
pub struct EventPump {
    receiver: Receiver<EngineEvent>,
}

impl EventPump {
    pub fn new(receiver: Receiver<EngineEvent>) -> Self {
        Self { receiver }
    }

    /// Drains pending engine events into `events` (bounded per call).
    ///
    /// Returns [`PumpControl::Disconnected`] once the engine side of the
    /// channel is gone; events drained before the disconnect are still
    /// delivered.
    pub fn drain(&self, events: &mut Vec<EngineEvent>) -> PumpControl {
        const MAX_EVENTS_PER_DRAIN: usize = 100;

        events.clear();

        while events.len() < MAX_EVENTS_PER_DRAIN {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return PumpControl::Continue,
                Err(TryRecvError::Disconnected) => return PumpControl::Disconnected,
            }
        }

        warn!("EventPump: backlog, drained {} events this call", events.len());
        PumpControl::Continue
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn drain_handles_empty_channel() {
        let (_tx, rx) = unbounded::<EngineEvent>();
        let pump = EventPump::new(rx);
        let mut events = Vec::new();

        assert_eq!(pump.drain(&mut events), PumpControl::Continue);
        assert!(events.is_empty());
    }

    #[test]
    fn drain_collects_queued_events_in_order() {
        let (tx, rx) = unbounded();
        let pump = EventPump::new(rx);

        tx.send(EngineEvent::Resized { width: 800, height: 600 }).unwrap();
        tx.send(EngineEvent::UncaughtError("boom".to_string())).unwrap();

        let mut events = Vec::new();
        assert_eq!(pump.drain(&mut events), PumpControl::Continue);
        assert_eq!(
            events,
            vec![
                EngineEvent::Resized { width: 800, height: 600 },
                EngineEvent::UncaughtError("boom".to_string()),
            ]
        );
    }

    #[test]
    fn drain_clears_previous_batch() {
        let (tx, rx) = unbounded();
        let pump = EventPump::new(rx);

        tx.send(EngineEvent::Resized { width: 1, height: 1 }).unwrap();
        let mut events = Vec::new();
        pump.drain(&mut events);
        assert_eq!(events.len(), 1);

        pump.drain(&mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn drain_reports_disconnect() {
        let (tx, rx) = unbounded::<EngineEvent>();
        let pump = EventPump::new(rx);

        drop(tx);

        let mut events = Vec::new();
        assert_eq!(pump.drain(&mut events), PumpControl::Disconnected);
    }

    #[test]
    fn drain_delivers_events_sent_before_disconnect() {
        let (tx, rx) = unbounded();
        let pump = EventPump::new(rx);

        tx.send(EngineEvent::UnhandledRejection("late".to_string())).unwrap();
        drop(tx);

        let mut events = Vec::new();
        // The buffered event arrives in the same drain that notices the
        // disconnect.
        assert_eq!(pump.drain(&mut events), PumpControl::Disconnected);
        assert_eq!(events, vec![EngineEvent::UnhandledRejection("late".to_string())]);
    }
}
