// Playback over the date sequence: Idle/Playing state machine driven by ticks

use crate::core::constants::{KEY_ARROW_LEFT, KEY_ARROW_RIGHT};
use crate::core::timer::{TickId, TickScheduler};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub max_index: usize,
    pub playing: bool,
}

/// Owns the slider position and the single pending tick.
///
/// `0 <= current_index <= max_index` holds after every operation, and at most
/// one tick is scheduled at a time. Every committed change is published to
/// subscribers.
pub struct PlaybackController<S: TickScheduler> {
    state: PlaybackState,
    initialized: bool,
    pending: Option<TickId>,
    delay: Duration,
    scheduler: S,
    notifier: watch::Sender<PlaybackState>,
}

impl<S: TickScheduler> PlaybackController<S> {
    pub fn new(scheduler: S, delay: Duration) -> Self {
        let state = PlaybackState::default();
        let (notifier, _) = watch::channel(state);
        Self {
            state,
            initialized: false,
            pending: None,
            delay,
            scheduler,
            notifier,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.notifier.subscribe()
    }

    pub fn current_date(&self, dates: &[NaiveDate]) -> Option<NaiveDate> {
        dates.get(self.state.current_index).copied()
    }

    /// Called whenever the length of the date sequence may have changed.
    /// The first non-empty sequence moves the slider to the most recent date.
    pub fn observe_len(&mut self, len: usize) {
        if len == 0 {
            if self.initialized {
                self.cancel_pending();
                self.state = PlaybackState::default();
                self.initialized = false;
                self.publish();
            }
            return;
        }

        let max_index = len - 1;
        if !self.initialized {
            self.initialized = true;
            self.state.max_index = max_index;
            self.state.current_index = max_index;
        } else if self.state.max_index != max_index {
            self.state.max_index = max_index;
            self.state.current_index = self.state.current_index.min(max_index);
        } else {
            return;
        }
        self.publish();
    }

    /// Play/Stop button.
    pub fn toggle(&mut self) {
        if self.state.playing {
            self.cancel_pending();
            self.state.playing = false;
            self.state.current_index = self.state.max_index;
            debug!("playback stopped, jumped to {}", self.state.max_index);
            self.publish();
            return;
        }

        if !self.initialized {
            debug!("playback toggle ignored: no dates yet");
            return;
        }

        if self.state.current_index == self.state.max_index {
            self.state.current_index = 0;
        }

        if self.state.current_index == self.state.max_index {
            // single-date sequence: nothing to advance through
            debug!("playback toggle ignored: sequence has a single date");
            self.publish();
            return;
        }

        self.state.playing = true;
        self.schedule_tick();
        debug!("playback started at {}", self.state.current_index);
        self.publish();
    }

    /// Delivers a fired tick. Ticks that are no longer pending are ignored.
    pub fn on_tick(&mut self, id: TickId) {
        if self.pending != Some(id) {
            debug!("stale tick {:?} ignored", id);
            return;
        }
        self.pending = None;

        if !self.state.playing {
            return;
        }

        self.state.current_index = (self.state.current_index + 1).min(self.state.max_index);
        if self.state.current_index >= self.state.max_index {
            self.state.playing = false;
            debug!("playback reached the end at {}", self.state.max_index);
        } else {
            self.schedule_tick();
        }
        self.publish();
    }

    /// Direct slider placement, clamped into range. Leaves `playing` untouched.
    pub fn seek(&mut self, index: i64) {
        let clamped = index.clamp(0, self.state.max_index as i64) as usize;
        if clamped != self.state.current_index {
            self.state.current_index = clamped;
            self.publish();
        }
    }

    pub fn step(&mut self, delta: i64) {
        self.seek(self.state.current_index as i64 + delta);
    }

    /// Arrow keys move the slider by one. Returns whether the key was handled.
    pub fn handle_key(&mut self, key_code: u32) -> bool {
        match key_code {
            KEY_ARROW_LEFT => self.step(-1),
            KEY_ARROW_RIGHT => self.step(1),
            _ => return false,
        }
        true
    }

    /// Cancels the pending tick and leaves the index where it is.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        if self.state.playing {
            self.state.playing = false;
            self.publish();
        }
    }

    fn schedule_tick(&mut self) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule(self.delay));
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    fn publish(&self) {
        self.notifier.send_replace(self.state);
    }
}

impl<S: TickScheduler> Drop for PlaybackController<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
