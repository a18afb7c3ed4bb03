//! Dry-run sink: logs actions instead of performing them.

use tracing::info;

use super::{ActionSink, SinkError};
use crate::gesture::Action;

#[derive(Debug, Default)]
pub struct LogSink {
    pressed: u64,
}

impl ActionSink for LogSink {
    fn press(&mut self, action: Action) -> Result<(), SinkError> {
        self.pressed += 1;
        info!(action = action.as_str(), count = self.pressed, "key press (dry run)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
