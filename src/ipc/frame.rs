//! Pose source frame protocol: one s-expression plist per line.
//!
//! ```text
//! (:t-ms 0 :confidence 0.92 :hand ((0.51 0.80 0.0) (0.47 0.74) ...))
//! (:t-ms 33 :hand nil)
//! ```
//!
//! `:hand` is absent or nil when no hand is tracked.  Sources that report
//! several hands may send `:hands (hand ...)`; only the first is used.

use lexpr::Value;
use thiserror::Error;

use super::sexp::{as_number, get_uint, get_value, is_nil, list_items};
use crate::gesture::hand_tracking::{HandObservation, Landmark};

/// One frame from the pose source.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    /// The tracked hand, or None when no hand was detected.
    pub hand: Option<HandObservation>,
    /// Capture time in milliseconds on the source's monotonic clock.
    pub timestamp_ms: Option<u64>,
}

impl PoseFrame {
    pub fn no_hand() -> Self {
        Self {
            hand: None,
            timestamp_ms: None,
        }
    }
}

/// A pose source line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("malformed s-expression: {0}")]
    Syntax(String),
    #[error("frame is not a property list")]
    NotPlist,
    #[error(":hand must be a list of landmarks")]
    BadHand,
    #[error("landmark {index}: expected (x y) or (x y z) numbers")]
    BadLandmark { index: usize },
    #[error(":t-ms must be a non-negative integer")]
    BadTimestamp,
    #[error(":confidence must be a number")]
    BadConfidence,
}

/// Parse one line of the pose source protocol.
pub fn parse_frame(raw: &str) -> Result<PoseFrame, FrameError> {
    let value = lexpr::from_str(raw).map_err(|e| FrameError::Syntax(e.to_string()))?;
    if !matches!(value, Value::Cons(_)) {
        return Err(FrameError::NotPlist);
    }

    let timestamp_ms = match get_value(&value, "t-ms") {
        Some(_) => Some(get_uint(&value, "t-ms").ok_or(FrameError::BadTimestamp)?),
        None => None,
    };

    let confidence = match get_value(&value, "confidence") {
        Some(v) if !is_nil(v) => Some(as_number(v).ok_or(FrameError::BadConfidence)? as f32),
        _ => None,
    };

    let hand_value = match get_value(&value, "hand") {
        Some(v) => Some(v),
        None => match get_value(&value, "hands") {
            Some(hands) => list_items(hands)
                .ok_or(FrameError::BadHand)?
                .into_iter()
                .next(),
            None => None,
        },
    };

    let hand = match hand_value {
        Some(v) if !is_nil(v) => {
            let mut hand = HandObservation::new(parse_landmarks(v)?);
            hand.confidence = confidence;
            Some(hand)
        }
        _ => None,
    };

    Ok(PoseFrame { hand, timestamp_ms })
}

fn parse_landmarks(value: &Value) -> Result<Vec<Landmark>, FrameError> {
    let items = list_items(value).ok_or(FrameError::BadHand)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_landmark(item).ok_or(FrameError::BadLandmark { index }))
        .collect()
}

fn parse_landmark(value: &Value) -> Option<Landmark> {
    let coords = list_items(value)?
        .into_iter()
        .map(as_number)
        .collect::<Option<Vec<f64>>>()?;
    match coords.as_slice() {
        [x, y] => Some(Landmark::new(*x as f32, *y as f32, 0.0)),
        [x, y, z] => Some(Landmark::new(*x as f32, *y as f32, *z as f32)),
        _ => None,
    }
}

/// Whether a raw line carries no frame (blank or `;` comment).
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.starts_with(';')
}
