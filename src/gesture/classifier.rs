//! Static gesture classification from hand landmarks.
//!
//! Derives a five-finger extended/folded vector from landmark geometry
//! and matches it exactly against a fixed pattern table.  Stateless.

use super::hand_tracking::{HandLandmark, HandObservation, LandmarkOutOfRange};
use thiserror::Error;

// ── Gesture labels ─────────────────────────────────────────

/// Closed gesture vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Fist,
    PlayPause,
    Forward,
    Rewind,
    VolumeUp,
    VolumeDown,
    Fullscreen,
    /// Hand tracked, finger pattern matches nothing.
    Unknown,
    /// No hand tracked this tick.
    NoHand,
}

impl Gesture {
    pub const ALL: [Gesture; 9] = [
        Self::Fist,
        Self::PlayPause,
        Self::Forward,
        Self::Rewind,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::Fullscreen,
        Self::Unknown,
        Self::NoHand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fist => "fist",
            Self::PlayPause => "play_pause",
            Self::Forward => "forward",
            Self::Rewind => "rewind",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::Fullscreen => "fullscreen",
            Self::Unknown => "unknown",
            Self::NoHand => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Gesture> {
        Self::ALL.iter().copied().find(|g| g.as_str() == s)
    }

    /// Whether this label can ever carry an action.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unknown | Self::NoHand)
    }

    /// Held gestures that re-dispatch on an interval.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Self::VolumeUp | Self::VolumeDown)
    }
}

// ── Finger states ──────────────────────────────────────────

/// Extended (1) / folded (0) flags: thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerStates(pub [u8; 5]);

/// Exact-match pattern table.
const GESTURE_PATTERNS: [([u8; 5], Gesture); 7] = [
    ([0, 0, 0, 0, 0], Gesture::Fist),
    ([1, 1, 1, 1, 1], Gesture::PlayPause),
    ([0, 1, 0, 0, 0], Gesture::Forward),
    ([1, 0, 0, 0, 0], Gesture::Rewind),
    ([0, 1, 1, 0, 0], Gesture::VolumeUp),
    ([0, 1, 1, 1, 1], Gesture::VolumeDown),
    ([1, 1, 1, 0, 0], Gesture::Fullscreen),
];

impl FingerStates {
    /// Compute finger states from landmark geometry.
    ///
    /// Thumb: extended when its tip is left of the joint before it (the
    /// frame is mirrored).  Other fingers: extended when the tip is above
    /// (smaller y than) the joint two positions before it.
    pub fn from_hand(hand: &HandObservation) -> Result<Self, LandmarkOutOfRange> {
        let mut states = [0u8; 5];
        for (i, tip) in HandLandmark::fingertips().iter().enumerate() {
            let tip_idx = tip.index();
            let tip_pt = hand.get(tip_idx)?;
            let extended = if i == 0 {
                tip_pt.x < hand.get(tip_idx - 1)?.x
            } else {
                tip_pt.y < hand.get(tip_idx - 2)?.y
            };
            states[i] = u8::from(extended);
        }
        Ok(Self(states))
    }

    /// Look up the gesture for this exact pattern.
    pub fn gesture(&self) -> Gesture {
        GESTURE_PATTERNS
            .iter()
            .find(|(pattern, _)| *pattern == self.0)
            .map(|(_, g)| *g)
            .unwrap_or(Gesture::Unknown)
    }
}

// ── Classification ─────────────────────────────────────────

/// Landmark input the classifier cannot use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("invalid hand landmarks: {0}")]
    TooFewLandmarks(#[from] LandmarkOutOfRange),
}

/// Classify one hand's landmarks into a gesture label.
pub fn classify(hand: &HandObservation) -> Result<Gesture, ClassifyError> {
    Ok(FingerStates::from_hand(hand)?.gesture())
}

// ── Test helpers ───────────────────────────────────────────

/// Build a 21-landmark hand whose geometry yields `states`.
#[cfg(test)]
pub(crate) fn make_hand(states: [u8; 5]) -> HandObservation {
    use super::hand_tracking::{Landmark, LANDMARK_COUNT};

    let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
    // Thumb: tip left of the IP joint when extended.
    landmarks[HandLandmark::ThumbIp.index()] = Landmark::new(0.5, 0.6, 0.0);
    landmarks[HandLandmark::ThumbTip.index()] = if states[0] == 1 {
        Landmark::new(0.4, 0.6, 0.0)
    } else {
        Landmark::new(0.6, 0.6, 0.0)
    };
    for (i, tip) in HandLandmark::fingertips().iter().enumerate().skip(1) {
        let tip_idx = tip.index();
        landmarks[tip_idx - 2] = Landmark::new(0.5, 0.5, 0.0);
        landmarks[tip_idx] = if states[i] == 1 {
            Landmark::new(0.5, 0.3, 0.0)
        } else {
            Landmark::new(0.5, 0.7, 0.0)
        };
    }
    HandObservation::new(landmarks)
}
