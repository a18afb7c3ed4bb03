//! Pose source backend: drives the session from stdin or a recording.

pub mod stream;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::sink::ActionSink;
use crate::state::MotionState;
use stream::FrameClock;

/// Run one session to completion.  `input` is a recorded frame file; stdin
/// is read when it is None.
pub fn run(
    state: &mut MotionState,
    sink: &mut dyn ActionSink,
    input: Option<&Path>,
    realtime: bool,
) -> anyhow::Result<()> {
    stream::install_signal_handlers();
    let shutdown = stream::shutdown_flag();
    let mut clock = FrameClock::new(realtime);

    let result = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open pose source {}", path.display()))?;
            info!("reading pose frames from {}", path.display());
            stream::run_session(BufReader::new(file), state, sink, &mut clock, shutdown)
        }
        None => {
            info!("reading pose frames from stdin");
            let stdin = std::io::stdin();
            stream::run_session(stdin.lock(), state, sink, &mut clock, shutdown)
        }
    };

    info!("final status: {}", state.status_sexp(&*sink));
    state.log_summary();
    result
}
