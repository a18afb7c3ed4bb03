//! Session state: the single struct owning the gesture pipeline.
//!
//! One `MotionState` lives for the whole run.  Every pose frame becomes
//! exactly one `tick`: classify, stabilize, dispatch, then hand each
//! dispatched action to the sink.

use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::MotionConfig;
use crate::gesture::{
    classify, Dispatcher, DispatchEvent, Gesture, HandObservation, Stabilizer,
};
use crate::ipc::sexp::escape_string;
use crate::sink::ActionSink;

/// Counters reported at the end of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    /// Ticks whose landmarks were unusable and counted as no hand.
    pub invalid_ticks: u64,
    /// Frames dropped by the confidence gate.
    pub low_confidence_ticks: u64,
    pub confirmations: u64,
    pub actions: u64,
    pub sink_failures: u64,
}

pub struct MotionState {
    pub config: MotionConfig,
    stabilizer: Stabilizer,
    dispatcher: Dispatcher,
    /// Raw label of the most recent tick.
    current: Gesture,
    /// Confirmed label of the most recent tick, if any.
    confirmed: Option<Gesture>,
    pub stats: SessionStats,
}

impl MotionState {
    pub fn new(config: MotionConfig) -> Self {
        let stabilizer = Stabilizer::new(config.history_size, config.majority_threshold);
        let dispatcher = Dispatcher::new(config.dispatcher_config(), config.bindings.clone());
        Self {
            config,
            stabilizer,
            dispatcher,
            current: Gesture::NoHand,
            confirmed: None,
            stats: SessionStats::default(),
        }
    }

    /// Label one frame's hand (None when no hand was tracked).
    fn label(&mut self, hand: Option<HandObservation>) -> Gesture {
        let Some(mut hand) = hand else {
            return Gesture::NoHand;
        };
        if !hand.is_confident(self.config.min_confidence) {
            self.stats.low_confidence_ticks += 1;
            trace!("hand below confidence {:.2}", self.config.min_confidence);
            return Gesture::NoHand;
        }
        if self.config.mirror {
            hand.mirror();
        }
        match classify(&hand) {
            Ok(gesture) => gesture,
            Err(e) => {
                self.stats.invalid_ticks += 1;
                debug!("treating tick as no hand: {}", e);
                Gesture::NoHand
            }
        }
    }

    /// Process one frame at monotonic time `now`.  Returns the dispatched
    /// events, including any the sink failed to perform.
    pub fn tick(
        &mut self,
        hand: Option<HandObservation>,
        now: Instant,
        sink: &mut dyn ActionSink,
    ) -> Vec<DispatchEvent> {
        self.stats.ticks += 1;

        let gesture = self.label(hand);
        self.current = gesture;
        trace!("tick {}: gesture {}", self.stats.ticks, gesture.as_str());

        let confirmed = self.stabilizer.observe(gesture);
        if confirmed.is_some() && confirmed != self.confirmed {
            self.stats.confirmations += 1;
            debug!("confirmed {}", gesture.as_str());
        }
        self.confirmed = confirmed;

        let events = self.dispatcher.dispatch(confirmed, now);
        for event in &events {
            match sink.press(event.action) {
                Ok(()) => {
                    self.stats.actions += 1;
                    info!(
                        "performed {} -> {} ({})",
                        event.gesture.as_str(),
                        event.action.as_str(),
                        event.trigger.as_str()
                    );
                }
                Err(e) => {
                    self.stats.sink_failures += 1;
                    warn!("{} sink failed on {}: {}", sink.name(), event.action.as_str(), e);
                }
            }
        }
        events
    }

    pub fn current_gesture(&self) -> Gesture {
        self.current
    }

    pub fn confirmed_gesture(&self) -> Option<Gesture> {
        self.confirmed
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self, sink: &dyn ActionSink) -> String {
        format!(
            "(:current {} :confirmed {} :history {} :dispatch {} :sink \"{}\" :ticks {} :actions {})",
            self.current_gesture().as_str(),
            self.confirmed_gesture().map_or("nil", |g| g.as_str()),
            self.stabilizer.history_sexp(),
            self.dispatcher.status_sexp(),
            escape_string(sink.name()),
            self.stats.ticks,
            self.stats.actions,
        )
    }

    /// Log the end-of-session summary.
    pub fn log_summary(&self) {
        let s = &self.stats;
        info!(
            "session summary: {} ticks, {} invalid, {} low-confidence, {} confirmations, {} actions, {} sink failures",
            s.ticks, s.invalid_ticks, s.low_confidence_ticks, s.confirmations, s.actions, s.sink_failures
        );
    }
}
