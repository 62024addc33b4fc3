//! Fire-and-forget table events for the audio-feedback collaborator.

use std::collections::HashMap;

/// Cushion hits slower than this are silent
pub const MIN_CUSHION_SPEED: f64 = 0.5;
/// Ball contacts softer than this are silent
pub const MIN_IMPACT_FORCE: f64 = 0.1;

/// Repeat suppression windows, in ticks (~50 ms and ~30 ms at 60 Hz)
const CUSHION_COOLDOWN_TICKS: u64 = 3;
const PAIR_COOLDOWN_TICKS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableEvent {
    ShotStruck { power: f64 },
    CushionImpact { ball: u8, speed: f64 },
    BallImpact { a: u8, b: u8, force: f64 },
    Pocketed { ball: u8, pocket: u8 },
}

/// Receives physical events while the simulation runs. Implementations
/// must return immediately; the tick never waits on them.
pub trait AudioSink {
    fn notify(&mut self, event: TableEvent);

    /// Called once after every simulated tick.
    fn end_tick(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn notify(&mut self, _event: TableEvent) {}
}

/// Collects events for later draining.
#[derive(Debug, Default)]
pub struct EventBuffer {
    pub events: Vec<TableEvent>,
}

impl EventBuffer {
    pub fn drain(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }
}

impl AudioSink for EventBuffer {
    fn notify(&mut self, event: TableEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SoundKey {
    Cushion(u8),
    Pair(u8, u8),
}

/// Drops repeats of the same cushion or ball pair inside a short window so
/// a ball resting against a rail does not buzz.
#[derive(Debug)]
pub struct ThrottledSink<S> {
    inner: S,
    tick: u64,
    last_played: HashMap<SoundKey, u64>,
}

impl<S: AudioSink> ThrottledSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            tick: 0,
            last_played: HashMap::new(),
        }
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Forget cooldowns, e.g. when a new frame is racked
    pub fn reset(&mut self) {
        self.last_played.clear();
    }

    fn allow(&mut self, key: SoundKey, cooldown: u64) -> bool {
        match self.last_played.get(&key) {
            Some(&at) if self.tick.saturating_sub(at) < cooldown => false,
            _ => {
                self.last_played.insert(key, self.tick);
                true
            }
        }
    }
}

impl<S: AudioSink> AudioSink for ThrottledSink<S> {
    fn notify(&mut self, event: TableEvent) {
        let allowed = match event {
            TableEvent::CushionImpact { ball, .. } => {
                self.allow(SoundKey::Cushion(ball), CUSHION_COOLDOWN_TICKS)
            }
            TableEvent::BallImpact { a, b, .. } => {
                self.allow(SoundKey::Pair(a.min(b), a.max(b)), PAIR_COOLDOWN_TICKS)
            }
            TableEvent::ShotStruck { .. } | TableEvent::Pocketed { .. } => true,
        };
        if allowed {
            self.inner.notify(event);
        }
    }

    fn end_tick(&mut self) {
        self.tick += 1;
        self.inner.end_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_collects_and_drains() {
        let mut buffer = EventBuffer::default();
        buffer.notify(TableEvent::ShotStruck { power: 10.0 });
        buffer.notify(TableEvent::Pocketed { ball: 3, pocket: 1 });
        assert_eq!(buffer.drain().len(), 2);
        assert!(buffer.events.is_empty());
    }

    #[test]
    fn repeated_cushion_hit_is_suppressed_within_window() {
        let mut sink = ThrottledSink::new(EventBuffer::default());
        let hit = TableEvent::CushionImpact { ball: 4, speed: 2.0 };
        sink.notify(hit);
        sink.notify(hit);
        sink.end_tick();
        sink.notify(hit);
        assert_eq!(sink.inner_mut().events.len(), 1);

        for _ in 0..CUSHION_COOLDOWN_TICKS {
            sink.end_tick();
        }
        sink.notify(hit);
        assert_eq!(sink.inner_mut().events.len(), 2);
    }

    #[test]
    fn pair_key_is_order_independent() {
        let mut sink = ThrottledSink::new(EventBuffer::default());
        sink.notify(TableEvent::BallImpact { a: 1, b: 2, force: 1.0 });
        sink.notify(TableEvent::BallImpact { a: 2, b: 1, force: 1.0 });
        assert_eq!(sink.inner_mut().events.len(), 1);
    }

    #[test]
    fn different_balls_are_throttled_independently() {
        let mut sink = ThrottledSink::new(EventBuffer::default());
        sink.notify(TableEvent::CushionImpact { ball: 1, speed: 1.0 });
        sink.notify(TableEvent::CushionImpact { ball: 2, speed: 1.0 });
        assert_eq!(sink.inner_mut().events.len(), 2);
    }

    #[test]
    fn pockets_are_never_throttled() {
        let mut sink = ThrottledSink::new(EventBuffer::default());
        sink.notify(TableEvent::Pocketed { ball: 1, pocket: 0 });
        sink.notify(TableEvent::Pocketed { ball: 2, pocket: 0 });
        assert_eq!(sink.inner_mut().events.len(), 2);
    }

    #[test]
    fn reset_clears_cooldowns() {
        let mut sink = ThrottledSink::new(EventBuffer::default());
        let hit = TableEvent::CushionImpact { ball: 4, speed: 2.0 };
        sink.notify(hit);
        sink.reset();
        sink.notify(hit);
        assert_eq!(sink.inner_mut().events.len(), 2);
    }
}
