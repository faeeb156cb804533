// src/pipeline/event_bus.rs
//
// Display-facing events. Strategies publish here instead of calling into a
// renderer; the driver drains the queue after each input event. Nothing read
// from the bus feeds back into matching state.

use crate::fitting::BezierHandles;
use std::collections::VecDeque;
use tracing::warn;

/// Default queue bound used by the strategies.
pub const DEFAULT_MAX_PENDING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// A frame completed; window curves shown for earlier frames are stale.
    FrameAdvanced,

    /// A candidate window was fitted (variable-length display).
    WindowFitted {
        frame_number: i64,
        bezier: BezierHandles,
    },

    GestureMatched {
        /// 0-based definition index.
        index: usize,
        description: String,
    },

    TrialMarked {
        index: usize,
        matches: bool,
    },

    NoGesture,
}

pub struct EventBus {
    events: VecDeque<GestureEvent>,
    max_pending: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: GestureEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<GestureEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}
