//! Gesture core: classification, stabilization and dispatch.
//!
//! Provides:
//! - `hand_tracking`: landmark types and bounds-checked access
//! - `classifier`: landmarks → gesture label (stateless)
//! - `stabilizer`: majority vote over recent labels
//! - `dispatcher`: one-shot cooldown and volume repeat policies

pub mod classifier;
pub mod dispatcher;
pub mod hand_tracking;
pub mod stabilizer;

pub use classifier::{classify, ClassifyError, Gesture};
pub use dispatcher::{Action, ActionMap, DispatchEvent, Dispatcher, DispatcherConfig, Trigger};
pub use hand_tracking::{HandObservation, Landmark};
pub use stabilizer::Stabilizer;
