//! Action sinks: where dispatched actions end up.

pub mod command;
pub mod log;

pub use command::CommandSink;
pub use log::LogSink;

use thiserror::Error;
use tracing::info;

use crate::gesture::Action;

/// Failure to perform an action.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status} for {action}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        action: &'static str,
    },
}

/// Performs key actions.  Failures are reported, never retried.
pub trait ActionSink {
    fn press(&mut self, action: Action) -> Result<(), SinkError>;
    fn name(&self) -> &'static str;
}

/// Sink type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkType {
    Log,
    Command,
}

impl SinkType {
    pub fn parse(s: &str) -> Option<SinkType> {
        match s {
            "log" => Some(Self::Log),
            "command" => Some(Self::Command),
            _ => None,
        }
    }
}

/// Build the selected sink.  `program`/`args` only apply to the command sink.
pub fn build(sink: SinkType, program: String, args: Vec<String>) -> Box<dyn ActionSink> {
    match sink {
        SinkType::Log => Box::new(LogSink::default()),
        SinkType::Command => {
            let sink = CommandSink::new(program, args);
            info!("key injection via {}", sink.program());
            Box::new(sink)
        }
    }
}

/// Sink that records every action, optionally failing.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub pressed: Vec<Action>,
    pub fail: bool,
}

#[cfg(test)]
impl ActionSink for RecordingSink {
    fn press(&mut self, action: Action) -> Result<(), SinkError> {
        self.pressed.push(action);
        if self.fail {
            return Err(SinkError::Spawn {
                program: "recording".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "refused"),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
