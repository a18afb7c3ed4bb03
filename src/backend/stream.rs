//! Line-delimited pose stream: one frame per line from stdin or a file.
//!
//! Frames are processed strictly in order, one tick each.  Malformed lines
//! become no-hand ticks so the tick count matches the source's frame count.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::ipc::frame::{is_blank, parse_frame, PoseFrame};
use crate::sink::ActionSink;
use crate::state::MotionState;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn shutdown_flag() -> &'static AtomicBool {
    &SHUTDOWN_REQUESTED
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
///
/// Installed without `SA_RESTART`, so a read blocked on an idle source
/// fails with `EINTR` and the session loop sees the flag.
pub fn install_signal_handlers() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = signal_handler as *const () as libc::sighandler_t;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);
        for sig in [libc::SIGTERM, libc::SIGINT] {
            if libc::sigaction(sig, &action, std::ptr::null_mut()) != 0 {
                warn!(
                    "failed to install handler for signal {}: {}",
                    sig,
                    std::io::Error::last_os_error()
                );
            }
        }
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

// ── Clock ──────────────────────────────────────────────────

/// Maps frames to monotonic instants.
///
/// Timestamped frames are placed at `base + t-ms`, so replaying a recording
/// reproduces its timing regardless of read speed.  A timestamp earlier than
/// the previous one is clamped.  Frames without a timestamp (and every frame
/// in realtime mode) are stamped on arrival.
#[derive(Debug)]
pub struct FrameClock {
    base: Instant,
    realtime: bool,
    last_ms: Option<u64>,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(realtime: bool) -> Self {
        Self::with_base(Instant::now(), realtime)
    }

    pub fn with_base(base: Instant, realtime: bool) -> Self {
        Self {
            base,
            realtime,
            last_ms: None,
            last: None,
        }
    }

    /// Instant for the next frame.  Never earlier than the previous one.
    pub fn stamp(&mut self, timestamp_ms: Option<u64>) -> Instant {
        let candidate = match (self.realtime, timestamp_ms) {
            (false, Some(t)) => {
                let t = match self.last_ms {
                    Some(prev) if t < prev => {
                        warn!("frame timestamp {} ms precedes {} ms, clamping", t, prev);
                        prev
                    }
                    _ => t,
                };
                self.last_ms = Some(t);
                self.base + Duration::from_millis(t)
            }
            // Untimed frame inside a timestamped stream: no time passes.
            (false, None) if self.last_ms.is_some() => self.last.unwrap_or(self.base),
            _ => Instant::now(),
        };
        let now = match self.last {
            Some(last) if candidate < last => last,
            _ => candidate,
        };
        self.last = Some(now);
        now
    }
}

// ── Session ────────────────────────────────────────────────

/// Read one line into `buf`, without its line terminator.  Returns
/// `Ok(false)` at end of input.
///
/// Unlike `BufRead::read_line` this surfaces `Interrupted`, keeping any
/// partial line in `buf` for the next call.
fn read_frame_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(i) => {
                buf.extend_from_slice(&available[..i]);
                reader.consume(i + 1);
                return Ok(true);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

/// Feed every frame of `reader` through `state` until EOF or until
/// `shutdown` is set.
pub fn run_session<R: BufRead>(
    mut reader: R,
    state: &mut MotionState,
    sink: &mut dyn ActionSink,
    clock: &mut FrameClock,
    shutdown: &AtomicBool,
) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0u64;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            break;
        }

        match read_frame_line(&mut reader, &mut buf) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("pose source read failed at line {}: {}", line_no + 1, e);
                return Err(e).context("failed to read pose frame");
            }
        }
        line_no += 1;
        let raw = std::mem::take(&mut buf);
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches('\r');
        if is_blank(line) {
            continue;
        }

        let frame = parse_frame(line).unwrap_or_else(|e| {
            warn!("line {}: {}, treating as no hand", line_no, e);
            PoseFrame::no_hand()
        });
        let now = clock.stamp(frame.timestamp_ms);
        state.tick(frame.hand, now, sink);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::gesture::classifier::make_hand;
    use crate::gesture::{Action, HandObservation};
    use crate::sink::RecordingSink;
    use std::io::{Cursor, Read};

    fn hand_sexp(hand: &HandObservation) -> String {
        let points: Vec<String> = hand
            .landmarks
            .iter()
            .map(|lm| format!("({} {} {})", lm.x, lm.y, lm.z))
            .collect();
        format!("({})", points.join(" "))
    }

    fn frames(states: [u8; 5], start_ms: u64, count: u64) -> String {
        let hand = hand_sexp(&make_hand(states));
        (0..count)
            .map(|i| format!("(:t-ms {} :confidence 0.9 :hand {})\n", start_ms + i * 50, hand))
            .collect()
    }

    fn replay(input: &str) -> (MotionState, RecordingSink) {
        let mut state = MotionState::new(MotionConfig::default());
        let mut sink = RecordingSink::default();
        let mut clock = FrameClock::new(false);
        let shutdown = AtomicBool::new(false);
        run_session(
            Cursor::new(input.to_string()),
            &mut state,
            &mut sink,
            &mut clock,
            &shutdown,
        )
        .unwrap();
        (state, sink)
    }

    #[test]
    fn test_clock_uses_timestamps() {
        let base = Instant::now();
        let mut clock = FrameClock::with_base(base, false);
        assert_eq!(clock.stamp(Some(0)), base);
        assert_eq!(clock.stamp(Some(33)), base + Duration::from_millis(33));
        assert_eq!(clock.stamp(Some(1000)), base + Duration::from_millis(1000));
    }

    #[test]
    fn test_clock_clamps_backwards_timestamps() {
        let base = Instant::now();
        let mut clock = FrameClock::with_base(base, false);
        clock.stamp(Some(500));
        assert_eq!(clock.stamp(Some(200)), base + Duration::from_millis(500));
        assert_eq!(clock.stamp(Some(600)), base + Duration::from_millis(600));
    }

    #[test]
    fn test_clock_untimed_frame_in_timed_stream() {
        let base = Instant::now();
        let mut clock = FrameClock::with_base(base, false);
        clock.stamp(Some(5000));
        assert_eq!(clock.stamp(None), base + Duration::from_millis(5000));
    }

    #[test]
    fn test_clock_realtime_is_monotonic() {
        let mut clock = FrameClock::new(true);
        let a = clock.stamp(Some(10_000));
        let b = clock.stamp(Some(0));
        assert!(b >= a);
        assert!(a < Instant::now() + Duration::from_secs(1));
    }

    #[test]
    fn test_replay_fist_fires_once() {
        let (state, sink) = replay(&frames([0, 0, 0, 0, 0], 0, 40));
        assert_eq!(sink.pressed, vec![Action::Esc]);
        assert_eq!(state.stats.ticks, 40);
    }

    #[test]
    fn test_replay_cooldown_between_gestures() {
        // Fist fires at 150 ms.  Open hand is confirmed at 650 ms, inside
        // the cooldown, and fires once held past it (1000 ms).
        let mut input = frames([0, 0, 0, 0, 0], 0, 10);
        input.push_str(&frames([1, 1, 1, 1, 1], 500, 20));
        let (_, sink) = replay(&input);
        assert_eq!(sink.pressed, vec![Action::Esc, Action::Space]);

        let mut input = frames([0, 0, 0, 0, 0], 0, 10);
        input.push_str(&frames([1, 1, 1, 1, 1], 500, 6));
        let (_, sink) = replay(&input);
        assert_eq!(sink.pressed, vec![Action::Esc]);
    }

    #[test]
    fn test_replay_skips_blank_and_comments() {
        let mut input = String::from("; recorded session\n\n");
        input.push_str(&frames([0, 0, 0, 0, 0], 0, 5));
        let (state, sink) = replay(&input);
        assert_eq!(state.stats.ticks, 5);
        assert_eq!(sink.pressed, vec![Action::Esc]);
    }

    #[test]
    fn test_replay_malformed_line_is_no_hand_tick() {
        let mut input = frames([0, 0, 0, 0, 0], 0, 3);
        input.push_str("(:t-ms 150 :hand ((0.1\n");
        input.push_str(&frames([0, 0, 0, 0, 0], 200, 1));
        let (state, sink) = replay(&input);
        assert_eq!(state.stats.ticks, 5);
        // Only 4 of the last 5 ticks are fist.
        assert_eq!(sink.pressed, vec![Action::Esc]);

        let mut input = frames([0, 0, 0, 0, 0], 0, 2);
        input.push_str("garbage\n");
        input.push_str(&frames([0, 0, 0, 0, 0], 150, 1));
        let (_, sink) = replay(&input);
        assert!(sink.pressed.is_empty());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "camera gone"))
        }
    }

    #[test]
    fn test_read_error_ends_session() {
        let mut state = MotionState::new(MotionConfig::default());
        let mut sink = RecordingSink::default();
        let mut clock = FrameClock::new(false);
        let shutdown = AtomicBool::new(false);
        let reader = io::BufReader::new(FailingReader);
        assert!(run_session(reader, &mut state, &mut sink, &mut clock, &shutdown).is_err());
        assert_eq!(state.stats.ticks, 0);
    }

    /// Serves `data`, then reports `Interrupted` the way a read blocked on
    /// an idle pipe does when a signal arrives.  `on_interrupt` plays the
    /// signal handler's part.
    struct InterruptedReader<'a> {
        data: Cursor<Vec<u8>>,
        interrupts: usize,
        on_interrupt: Option<&'a AtomicBool>,
    }

    impl Read for InterruptedReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            if self.interrupts == 0 {
                return Ok(0);
            }
            self.interrupts -= 1;
            if let Some(flag) = self.on_interrupt {
                flag.store(true, Ordering::SeqCst);
            }
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal"))
        }
    }

    #[test]
    fn test_interrupted_read_observes_shutdown() {
        let mut state = MotionState::new(MotionConfig::default());
        let mut sink = RecordingSink::default();
        let mut clock = FrameClock::new(false);
        let shutdown = AtomicBool::new(false);
        let reader = io::BufReader::new(InterruptedReader {
            data: Cursor::new(frames([0, 0, 0, 0, 0], 0, 5).into_bytes()),
            // More interrupts than the loop should ever need.
            interrupts: 1000,
            on_interrupt: Some(&shutdown),
        });

        assert!(run_session(reader, &mut state, &mut sink, &mut clock, &shutdown).is_ok());
        assert!(shutdown.load(Ordering::SeqCst));
        assert_eq!(state.stats.ticks, 5);
        assert_eq!(sink.pressed, vec![Action::Esc]);
    }

    #[test]
    fn test_interrupted_read_without_shutdown_retries() {
        let mut state = MotionState::new(MotionConfig::default());
        let mut sink = RecordingSink::default();
        let mut clock = FrameClock::new(false);
        let shutdown = AtomicBool::new(false);
        let reader = io::BufReader::new(InterruptedReader {
            data: Cursor::new(frames([0, 0, 0, 0, 0], 0, 5).into_bytes()),
            interrupts: 3,
            on_interrupt: None,
        });

        assert!(run_session(reader, &mut state, &mut sink, &mut clock, &shutdown).is_ok());
        assert_eq!(state.stats.ticks, 5);
    }

    #[test]
    fn test_shutdown_flag_stops_before_next_frame() {
        let mut state = MotionState::new(MotionConfig::default());
        let mut sink = RecordingSink::default();
        let mut clock = FrameClock::new(false);
        let shutdown = AtomicBool::new(true);
        let input = Cursor::new(frames([0, 0, 0, 0, 0], 0, 5));

        assert!(run_session(input, &mut state, &mut sink, &mut clock, &shutdown).is_ok());
        assert_eq!(state.stats.ticks, 0);
    }

    #[test]
    fn test_partial_line_and_crlf() {
        let mut reader = io::BufReader::with_capacity(4, Cursor::new(b"(:t-ms 1)\r\ntail".to_vec()));
        let mut buf = Vec::new();
        assert!(read_frame_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"(:t-ms 1)\r");
        buf.clear();
        assert!(read_frame_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"tail");
        buf.clear();
        assert!(!read_frame_line(&mut reader, &mut buf).unwrap());
    }
}
