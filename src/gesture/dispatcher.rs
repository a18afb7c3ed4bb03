//! Confirmed-gesture to action dispatch.
//!
//! Two policies share the confirmed-gesture stream:
//! - one-shot: fires on a change of confirmed gesture, gated by a global
//!   cooldown since the last one-shot action;
//! - repeat: volume gestures fire immediately and then again every repeat
//!   delay for as long as they stay confirmed.
//!
//! The policies keep separate state and do not suppress each other, so the
//! first confirmation of a volume gesture emits one event from each.

use std::time::{Duration, Instant};
use tracing::debug;

use super::classifier::Gesture;

// ── Actions ────────────────────────────────────────────────

/// Symbolic key actions understood by the action sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Esc,
    Space,
    Right,
    Left,
    VolumeUp,
    VolumeDown,
    F,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Self::Esc,
        Self::Space,
        Self::Right,
        Self::Left,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esc => "esc",
            Self::Space => "space",
            Self::Right => "right",
            Self::Left => "left",
            Self::VolumeUp => "volumeup",
            Self::VolumeDown => "volumedown",
            Self::F => "f",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        Self::ALL.iter().copied().find(|a| a.as_str() == s)
    }
}

// ── Bindings ───────────────────────────────────────────────

/// Built-in gesture-to-action table.
pub const DEFAULT_BINDINGS: [(Gesture, Action); 7] = [
    (Gesture::Fist, Action::Esc),
    (Gesture::PlayPause, Action::Space),
    (Gesture::Forward, Action::Right),
    (Gesture::Rewind, Action::Left),
    (Gesture::VolumeUp, Action::VolumeUp),
    (Gesture::VolumeDown, Action::VolumeDown),
    (Gesture::Fullscreen, Action::F),
];

/// A gesture-to-action binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureBinding {
    pub gesture: Gesture,
    pub action: Action,
}

/// Gesture-to-action lookup table.  At most one action per gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMap {
    bindings: Vec<GestureBinding>,
}

impl Default for ActionMap {
    fn default() -> Self {
        Self {
            bindings: DEFAULT_BINDINGS
                .iter()
                .map(|(gesture, action)| GestureBinding {
                    gesture: *gesture,
                    action: *action,
                })
                .collect(),
        }
    }
}

impl ActionMap {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `gesture` to `action`, replacing any existing binding.
    pub fn bind(&mut self, gesture: Gesture, action: Action) {
        self.bindings.retain(|b| b.gesture != gesture);
        self.bindings.push(GestureBinding { gesture, action });
    }

    /// Remove a binding.  Returns true if one was removed.
    pub fn unbind(&mut self, gesture: Gesture) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.gesture != gesture);
        self.bindings.len() < before
    }

    /// Action for a gesture.  `unknown` and `none` never map to anything.
    pub fn action_for(&self, gesture: Gesture) -> Option<Action> {
        if !gesture.is_actionable() {
            return None;
        }
        self.bindings
            .iter()
            .find(|b| b.gesture == gesture)
            .map(|b| b.action)
    }

    pub fn bindings(&self) -> &[GestureBinding] {
        &self.bindings
    }

    /// Generate s-expression listing all bindings.
    pub fn bindings_sexp(&self) -> String {
        if self.bindings.is_empty() {
            return "nil".to_string();
        }
        let entries: Vec<String> = self
            .bindings
            .iter()
            .map(|b| {
                format!(
                    "(:gesture \"{}\" :action \"{}\")",
                    b.gesture.as_str(),
                    b.action.as_str()
                )
            })
            .collect();
        format!("({})", entries.join(" "))
    }
}

// ── Events ─────────────────────────────────────────────────

/// Which policy produced a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    OneShot,
    Repeat,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneShot => "one-shot",
            Self::Repeat => "repeat",
        }
    }
}

/// An action the sink should perform this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchEvent {
    pub gesture: Gesture,
    pub action: Action,
    pub trigger: Trigger,
}

// ── Config ─────────────────────────────────────────────────

/// Timing for the dispatch policies.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Minimum time between one-shot actions.
    pub cooldown: Duration,
    /// Interval between repeats of a held volume gesture.
    pub repeat_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(800),
            repeat_delay: Duration::from_millis(1500),
        }
    }
}

// ── Repeat state ───────────────────────────────────────────

/// Repeat policy state for one repeatable gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RepeatState {
    /// Fired and waiting for the repeat delay to elapse.
    active: bool,
    activated_at: Option<Instant>,
}

impl RepeatState {
    /// Fire if idle.  Returns true when the caller should dispatch.
    fn trigger(&mut self, now: Instant) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.activated_at = Some(now);
        true
    }

    /// Clear `active` once the delay has been exceeded.  Returns true on
    /// the transition.
    fn expire(&mut self, now: Instant, delay: Duration) -> bool {
        match (self.active, self.activated_at) {
            (true, Some(at)) if now.saturating_duration_since(at) > delay => {
                self.active = false;
                true
            }
            _ => false,
        }
    }
}

// ── Dispatcher ─────────────────────────────────────────────

/// Turns the confirmed-gesture stream into action dispatches.
pub struct Dispatcher {
    pub config: DispatcherConfig,
    actions: ActionMap,
    /// Last confirmed gesture seen by the one-shot policy.  Starts as
    /// `NoHand`.
    last_confirmed: Gesture,
    /// Time of the last one-shot dispatch.
    last_action_at: Option<Instant>,
    volume_up: RepeatState,
    volume_down: RepeatState,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default(), ActionMap::default())
    }
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig, actions: ActionMap) -> Self {
        Self {
            config,
            actions,
            last_confirmed: Gesture::NoHand,
            last_action_at: None,
            volume_up: RepeatState::default(),
            volume_down: RepeatState::default(),
        }
    }

    pub fn actions(&self) -> &ActionMap {
        &self.actions
    }

    fn repeat_state_mut(&mut self, gesture: Gesture) -> Option<&mut RepeatState> {
        match gesture {
            Gesture::VolumeUp => Some(&mut self.volume_up),
            Gesture::VolumeDown => Some(&mut self.volume_down),
            _ => None,
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_action_at {
            Some(at) => now.saturating_duration_since(at) > self.config.cooldown,
            None => true,
        }
    }

    /// Process one tick's confirmed gesture (or `None` when nothing is
    /// confirmed) and return the actions to perform, in order.
    pub fn dispatch(&mut self, confirmed: Option<Gesture>, now: Instant) -> Vec<DispatchEvent> {
        let mut events = Vec::new();

        if let Some(gesture) = confirmed {
            match self.actions.action_for(gesture) {
                Some(action) => {
                    if gesture != self.last_confirmed && self.cooldown_elapsed(now) {
                        self.last_confirmed = gesture;
                        self.last_action_at = Some(now);
                        events.push(DispatchEvent {
                            gesture,
                            action,
                            trigger: Trigger::OneShot,
                        });
                    }

                    let fired = self
                        .repeat_state_mut(gesture)
                        .map_or(false, |rs| rs.trigger(now));
                    if fired {
                        events.push(DispatchEvent {
                            gesture,
                            action,
                            trigger: Trigger::Repeat,
                        });
                    }
                }
                None => {
                    // Unmapped confirmations re-arm the one-shot edge
                    // without touching the cooldown clock.
                    if gesture != self.last_confirmed {
                        debug!("confirmed {} (no action)", gesture.as_str());
                        self.last_confirmed = gesture;
                    }
                }
            }
        }

        let delay = self.config.repeat_delay;
        for gesture in [Gesture::VolumeUp, Gesture::VolumeDown] {
            if let Some(rs) = self.repeat_state_mut(gesture) {
                if rs.expire(now, delay) {
                    debug!("repeat re-armed for {}", gesture.as_str());
                }
            }
        }

        events
    }

    /// Last gesture accepted by the one-shot policy.
    pub fn last_confirmed(&self) -> Gesture {
        self.last_confirmed
    }

    /// Whether the repeat policy for `gesture` is waiting out its delay.
    pub fn is_repeat_active(&self, gesture: Gesture) -> bool {
        match gesture {
            Gesture::VolumeUp => self.volume_up.active,
            Gesture::VolumeDown => self.volume_down.active,
            _ => false,
        }
    }

    /// Reset all dispatch state.
    pub fn reset(&mut self) {
        self.last_confirmed = Gesture::NoHand;
        self.last_action_at = None;
        self.volume_up = RepeatState::default();
        self.volume_down = RepeatState::default();
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:last-confirmed {} :cooldown-ms {} :repeat-delay-ms {} :volume-up-active {} :volume-down-active {})",
            self.last_confirmed.as_str(),
            self.config.cooldown.as_millis(),
            self.config.repeat_delay.as_millis(),
            if self.volume_up.active { "t" } else { "nil" },
            if self.volume_down.active { "t" } else { "nil" },
        )
    }
}
