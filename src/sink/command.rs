//! Key injection through an external program (`xdotool key <keysym>` by
//! default).

use std::process::{Command, Stdio};
use tracing::debug;

use super::{ActionSink, SinkError};
use crate::gesture::Action;

/// X keysym name for an action.
pub fn keysym(action: Action) -> &'static str {
    match action {
        Action::Esc => "Escape",
        Action::Space => "space",
        Action::Right => "Right",
        Action::Left => "Left",
        Action::VolumeUp => "XF86AudioRaiseVolume",
        Action::VolumeDown => "XF86AudioLowerVolume",
        Action::F => "f",
    }
}

/// Runs `<program> <args...> <keysym>` synchronously for each action.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for an action.
    pub fn command_args(&self, action: Action) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(keysym(action).to_string());
        args
    }
}

impl ActionSink for CommandSink {
    fn press(&mut self, action: Action) -> Result<(), SinkError> {
        let args = self.command_args(action);
        debug!("exec {} {}", self.program, args.join(" "));
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| SinkError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(SinkError::Failed {
                program: self.program.clone(),
                status,
                action: action.as_str(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
