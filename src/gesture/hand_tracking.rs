//! Hand landmark data structures.
//!
//! Models the 21-point hand landmark layout produced by MediaPipe-style
//! pose sources.  Coordinates are normalized to the frame (0.0-1.0, y grows
//! downward).  Provides bounds-checked landmark access and the mirror
//! transform for sources that do not flip the camera frame.

use thiserror::Error;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Position of this landmark in the source list (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// Fingertip landmarks, thumb first.
    pub fn fingertips() -> [HandLandmark; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::PinkyTip,
        ]
    }
}

// ── Landmark point ─────────────────────────────────────────

/// One landmark in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; 0.0 for 2D sources.
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontally mirrored copy (x' = 1 - x).
    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// Landmark list is shorter than the classifier needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("landmark {index} requested but hand has only {len} landmarks")]
pub struct LandmarkOutOfRange {
    pub index: usize,
    pub len: usize,
}

// ── Hand observation ───────────────────────────────────────

/// Landmarks for the single tracked hand of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub landmarks: Vec<Landmark>,
    /// Detection confidence reported by the source, if any.
    pub confidence: Option<f32>,
}

impl HandObservation {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            confidence: None,
        }
    }

    /// Bounds-checked access by raw index.
    pub fn get(&self, index: usize) -> Result<&Landmark, LandmarkOutOfRange> {
        self.landmarks.get(index).ok_or(LandmarkOutOfRange {
            index,
            len: self.landmarks.len(),
        })
    }

    /// Bounds-checked access by named landmark.
    pub fn landmark(&self, which: HandLandmark) -> Result<&Landmark, LandmarkOutOfRange> {
        self.get(which.index())
    }

    /// Flip every landmark horizontally in place.
    pub fn mirror(&mut self) {
        for lm in &mut self.landmarks {
            *lm = lm.mirrored();
        }
    }

    /// Whether the source confidence clears `min_confidence`.
    /// Observations without a reported confidence always pass.
    pub fn is_confident(&self, min_confidence: f32) -> bool {
        self.confidence.map_or(true, |c| c >= min_confidence)
    }
}
