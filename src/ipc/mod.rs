//! S-expression protocol: pose source frames and plist helpers.

pub mod frame;
pub mod sexp;

pub use frame::{parse_frame, FrameError, PoseFrame};
