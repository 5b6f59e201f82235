//! # Operator Console
//!
//! Line-oriented calibration control, read from stdin by the binary.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `start [duration_ms]` | Open a calibration session |
//! | `stop` | Commit the open session |
//! | `status` | Calibration state and session progress |
//! | `show` | Current bounds as JSON |
//! | `set <lmin> <lmax> <rmin> <rmax>` | Install calibrated bounds |
//! | `reset` | Back to uncalibrated full range |
//! | `stats` | Packet and byte counters |
//! | `help` | Command list |

use std::time::{Duration, Instant};

use crate::error::{BridgeError, Result};
use crate::processor::calibration::{CalibrationBounds, CalibrationStatus};
use crate::processor::IngestPipeline;

const HELP: &str = "commands: start [duration_ms] | stop | status | show | \
set <left_min> <left_max> <right_min> <right_max> | reset | stats | help";

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(Option<Duration>),
    Stop,
    Status,
    Show,
    Set(CalibrationBounds),
    Reset,
    Stats,
    Help,
}

impl Command {
    /// Parses one console line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `Command` for unknown commands or malformed arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use clutch_bridge::control::Command;
    ///
    /// assert_eq!(Command::parse("start 2500")?, Some(Command::Start(Some(Duration::from_millis(2500)))));
    /// assert_eq!(Command::parse("   ")?, None);
    /// # Ok::<(), clutch_bridge::error::BridgeError>(())
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("start", []) => Command::Start(None),
            ("start", [ms]) => {
                let ms: u64 = parse_number(ms, "duration_ms")?;
                Command::Start(Some(Duration::from_millis(ms)))
            }
            ("stop", []) => Command::Stop,
            ("status", []) => Command::Status,
            ("show", []) => Command::Show,
            ("set", [left_min, left_max, right_min, right_max]) => {
                Command::Set(CalibrationBounds::calibrated(
                    parse_number(left_min, "left_min")?,
                    parse_number(left_max, "left_max")?,
                    parse_number(right_min, "right_min")?,
                    parse_number(right_max, "right_max")?,
                ))
            }
            ("reset", []) => Command::Reset,
            ("stats", []) => Command::Stats,
            ("help", []) => Command::Help,
            ("start" | "stop" | "status" | "show" | "set" | "reset" | "stats" | "help", _) => {
                return Err(BridgeError::Command(format!("wrong arguments for '{}'; {}", name, HELP)));
            }
            _ => return Err(BridgeError::Command(format!("unknown command '{}'; {}", name, HELP))),
        };

        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(word: &str, what: &str) -> Result<T> {
    word.parse()
        .map_err(|_| BridgeError::Command(format!("{} '{}' is not a valid number", what, word)))
}

/// Runs `command` against `pipeline` and returns the reply text.
///
/// `default_duration` is used by `start` without an argument.
///
/// # Errors
///
/// Propagates `AlreadyInProgress` / `NotActive` from the calibration engine,
/// and `Command` if the bounds cannot be rendered.
pub fn execute(command: Command, pipeline: &IngestPipeline, default_duration: Duration) -> Result<String> {
    match command {
        Command::Start(duration) => {
            let duration = duration.unwrap_or(default_duration);
            pipeline.start_calibration(duration)?;
            Ok(format!(
                "calibration started for {} ms; move both paddles through their full travel",
                duration.as_millis()
            ))
        }
        Command::Stop => {
            let bounds = pipeline.stop_calibration()?;
            Ok(format!("calibration stopped: {}", describe(&bounds)))
        }
        Command::Status => {
            let status = pipeline.calibration_status();
            match pipeline.engine().session_progress(Instant::now()) {
                Some((elapsed, total)) if status == CalibrationStatus::Capturing => Ok(format!(
                    "{} ({} / {} ms)",
                    status,
                    elapsed.as_millis().min(total.as_millis()),
                    total.as_millis()
                )),
                _ => Ok(format!("{}: {}", status, describe(&pipeline.get_calibration()))),
            }
        }
        Command::Show => serde_json::to_string(&pipeline.get_calibration())
            .map_err(|e| BridgeError::Command(format!("failed to render bounds: {}", e))),
        Command::Set(bounds) => {
            pipeline.set_calibration(bounds);
            Ok(format!("calibration set: {}", describe(&bounds)))
        }
        Command::Reset => {
            pipeline.reset_calibration();
            Ok("calibration reset to full range".to_string())
        }
        Command::Stats => {
            let (packets, bytes) = pipeline.get_stats();
            Ok(format!("packets: {}, bytes: {}", packets, bytes))
        }
        Command::Help => Ok(HELP.to_string()),
    }
}

fn describe(bounds: &CalibrationBounds) -> String {
    format!(
        "left {}..{}, right {}..{}{}",
        bounds.left_min,
        bounds.left_max,
        bounds.right_min,
        bounds.right_max,
        if bounds.calibrated { "" } else { " (uncalibrated)" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Duration = Duration::from_secs(5);

    fn run(line: &str, pipeline: &IngestPipeline) -> Result<String> {
        let command = Command::parse(line)?.expect("non-empty line");
        execute(command, pipeline, DEFAULT)
    }

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("start").unwrap(), Some(Command::Start(None)));
        assert_eq!(Command::parse("STOP").unwrap(), Some(Command::Stop));
        assert_eq!(Command::parse(" status ").unwrap(), Some(Command::Status));
        assert_eq!(Command::parse("show").unwrap(), Some(Command::Show));
        assert_eq!(Command::parse("reset").unwrap(), Some(Command::Reset));
        assert_eq!(Command::parse("stats").unwrap(), Some(Command::Stats));
        assert_eq!(Command::parse("help").unwrap(), Some(Command::Help));
        assert_eq!(
            Command::parse("set 100 3900 200 3800").unwrap(),
            Some(Command::Set(CalibrationBounds::calibrated(100, 3900, 200, 3800)))
        );
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("\t  ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        for line in ["calibrate", "start soon", "start 1 2", "stop now", "set 1 2 3", "set 1 2 3 70000"] {
            assert!(
                matches!(Command::parse(line), Err(BridgeError::Command(_))),
                "'{}' should be rejected",
                line
            );
        }
    }

    // ==================== Execute Tests ====================

    #[test]
    fn test_start_stop_cycle() {
        let pipeline = IngestPipeline::new(4095);

        let reply = run("start", &pipeline).unwrap();
        assert!(reply.contains("5000 ms"));
        assert!(pipeline.is_calibrating());
        assert!(matches!(run("start 100", &pipeline), Err(BridgeError::AlreadyInProgress)));
        assert!(run("status", &pipeline).unwrap().starts_with("capturing"));

        let reply = run("stop", &pipeline).unwrap();
        assert_eq!(reply, "calibration stopped: left 4095..0, right 4095..0");
        assert!(matches!(run("stop", &pipeline), Err(BridgeError::NotActive)));
    }

    #[test]
    fn test_start_with_explicit_duration() {
        let pipeline = IngestPipeline::new(4095);
        let reply = run("start 1200", &pipeline).unwrap();
        assert!(reply.contains("1200 ms"));
        let (_, total) = pipeline.engine().session_progress(Instant::now()).unwrap();
        assert_eq!(total, Duration::from_millis(1200));
    }

    #[test]
    fn test_set_show_reset() {
        let pipeline = IngestPipeline::new(4095);
        run("set 500 3000 600 2900", &pipeline).unwrap();
        assert_eq!(pipeline.get_calibration(), CalibrationBounds::calibrated(500, 3000, 600, 2900));

        let json = run("show", &pipeline).unwrap();
        let parsed: CalibrationBounds = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pipeline.get_calibration());

        assert_eq!(run("status", &pipeline).unwrap(), "calibrated: left 500..3000, right 600..2900");

        run("reset", &pipeline).unwrap();
        assert_eq!(
            run("status", &pipeline).unwrap(),
            "idle: left 0..4095, right 0..4095 (uncalibrated)"
        );
    }

    #[test]
    fn test_stats_and_help() {
        let pipeline = IngestPipeline::new(4095);
        pipeline.ingest(&[0u8; 6], 6, Instant::now()).unwrap();
        assert_eq!(run("stats", &pipeline).unwrap(), "packets: 1, bytes: 6");
        assert!(run("help", &pipeline).unwrap().contains("start [duration_ms]"));
    }
}
