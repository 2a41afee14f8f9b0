//! Monotonic millisecond clocks

use std::cell::Cell;

use crate::Millis;

/// Source of monotonic time for the frame loop
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Clock advanced by hand. Used by tests and the headless demo.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: Millis) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// `performance.now()` in the browser
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct PerformanceClock;

#[cfg(target_arch = "wasm32")]
impl Clock for PerformanceClock {
    fn now_ms(&self) -> Millis {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as Millis)
            .unwrap_or(0)
    }
}

/// Wraps a clock so time stands still while paused.
///
/// Game time is the inner time minus every paused span, so energize and
/// plasma windows neither run out nor stretch while the tab is hidden.
#[derive(Debug)]
pub struct PausableClock<C: Clock> {
    inner: C,
    paused_at: Option<Millis>,
    offset: Millis,
}

impl<C: Clock> PausableClock<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            paused_at: None,
            offset: 0,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.inner.now_ms());
            log::info!("clock paused");
        }
    }

    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            self.offset += self.inner.now_ms().saturating_sub(at);
            log::info!("clock resumed");
        }
    }
}

impl<C: Clock> Clock for PausableClock<C> {
    fn now_ms(&self) -> Millis {
        let raw = self.paused_at.unwrap_or_else(|| self.inner.now_ms());
        raw.saturating_sub(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        clock.advance(16);
        assert_eq!(clock.now_ms(), 116);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_pause_freezes_game_time() {
        let mut clock = PausableClock::new(ManualClock::new(0));
        clock.inner().advance(1000);
        clock.pause();
        clock.inner().advance(4000);
        assert_eq!(clock.now_ms(), 1000);
        clock.resume();
        assert_eq!(clock.now_ms(), 1000);
        clock.inner().advance(250);
        assert_eq!(clock.now_ms(), 1250);
    }

    #[test]
    fn test_double_pause_is_harmless() {
        let mut clock = PausableClock::new(ManualClock::new(0));
        clock.pause();
        clock.inner().advance(100);
        clock.pause();
        clock.resume();
        clock.resume();
        assert_eq!(clock.now_ms(), 0);
        assert!(!clock.is_paused());
    }
}
