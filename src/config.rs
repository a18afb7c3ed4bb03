//! Process configuration.
//!
//! Defaults reproduce the stock tuning (5-tick window, 4-tick majority,
//! 800 ms cooldown, 1.5 s volume repeat).  A config file is an s-expression
//! plist; keys it omits keep their defaults:
//!
//! ```text
//! (:history-size 5 :majority-threshold 4 :cooldown-ms 800
//!  :repeat-delay-ms 1500 :min-confidence 0.7 :mirror nil
//!  :bindings ((:gesture "fist" :action "esc")
//!             (:gesture "play_pause" :action "space")))
//! ```
//!
//! A `:bindings` list replaces the whole default table.

use std::path::Path;
use std::time::Duration;

use lexpr::Value;
use thiserror::Error;

use crate::gesture::dispatcher::{Action, ActionMap, DispatcherConfig};
use crate::gesture::stabilizer::{DEFAULT_HISTORY_SIZE, DEFAULT_MAJORITY_THRESHOLD};
use crate::gesture::Gesture;
use crate::ipc::sexp::{get_bool, get_float, get_keyword, get_uint, get_value, list_items};

/// Configuration load/validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config s-expression: {0}")]
    Syntax(String),
    #[error("invalid value for :{key}")]
    BadValue { key: &'static str },
    #[error("unknown gesture \"{0}\"")]
    UnknownGesture(String),
    #[error("unknown action \"{0}\"")]
    UnknownAction(String),
    #[error("{0}")]
    Invalid(String),
}

/// Immutable configuration for one process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Ticks kept in the stabilizer window.
    pub history_size: usize,
    /// Matching ticks required to confirm a gesture.
    pub majority_threshold: usize,
    /// Minimum time between one-shot actions (ms).
    pub cooldown_ms: u64,
    /// Interval between repeats of a held volume gesture (ms).
    pub repeat_delay_ms: u64,
    /// Frames with a lower reported detection confidence count as no hand.
    pub min_confidence: f32,
    /// Flip landmark x coordinates before classification.
    pub mirror: bool,
    /// Gesture-to-action table.
    pub bindings: ActionMap,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            majority_threshold: DEFAULT_MAJORITY_THRESHOLD,
            cooldown_ms: 800,
            repeat_delay_ms: 1500,
            min_confidence: 0.7,
            mirror: false,
            bindings: ActionMap::default(),
        }
    }
}

impl MotionConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate config s-expression text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let value = lexpr::from_str(raw).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        let mut config = Self::default();

        if let Some(n) = read_uint(&value, "history-size")? {
            config.history_size = n as usize;
        }
        if let Some(n) = read_uint(&value, "majority-threshold")? {
            config.majority_threshold = n as usize;
        }
        if let Some(n) = read_uint(&value, "cooldown-ms")? {
            config.cooldown_ms = n;
        }
        if let Some(n) = read_uint(&value, "repeat-delay-ms")? {
            config.repeat_delay_ms = n;
        }
        if get_value(&value, "min-confidence").is_some() {
            let c = get_float(&value, "min-confidence").ok_or(ConfigError::BadValue {
                key: "min-confidence",
            })?;
            config.min_confidence = c as f32;
        }
        if let Some(mirror) = get_bool(&value, "mirror") {
            config.mirror = mirror;
        }
        if let Some(bindings) = get_value(&value, "bindings") {
            config.bindings = parse_bindings(bindings)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::Invalid(
                "history-size must be at least 1".to_string(),
            ));
        }
        if self.majority_threshold == 0 || self.majority_threshold > self.history_size {
            return Err(ConfigError::Invalid(format!(
                "majority-threshold {} must be between 1 and history-size {}",
                self.majority_threshold, self.history_size
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min-confidence {} must be between 0.0 and 1.0",
                self.min_confidence
            )));
        }
        if let Some(b) = self.bindings.bindings().iter().find(|b| !b.gesture.is_actionable()) {
            return Err(ConfigError::Invalid(format!(
                "gesture \"{}\" cannot be bound",
                b.gesture.as_str()
            )));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            cooldown: self.cooldown(),
            repeat_delay: self.repeat_delay(),
        }
    }

    /// Generate s-expression for the effective configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:history-size {} :majority-threshold {} :cooldown-ms {} :repeat-delay-ms {} :min-confidence {} :mirror {} :bindings {})",
            self.history_size,
            self.majority_threshold,
            self.cooldown_ms,
            self.repeat_delay_ms,
            self.min_confidence,
            if self.mirror { "t" } else { "nil" },
            self.bindings.bindings_sexp(),
        )
    }
}

fn read_uint(value: &Value, key: &'static str) -> Result<Option<u64>, ConfigError> {
    match get_value(value, key) {
        Some(_) => get_uint(value, key)
            .map(Some)
            .ok_or(ConfigError::BadValue { key }),
        None => Ok(None),
    }
}

fn parse_bindings(value: &Value) -> Result<ActionMap, ConfigError> {
    let entries = list_items(value).ok_or(ConfigError::BadValue { key: "bindings" })?;
    let mut map = ActionMap::empty();
    for entry in entries {
        let gesture_name =
            get_keyword(entry, "gesture").ok_or(ConfigError::BadValue { key: "gesture" })?;
        let action_name =
            get_keyword(entry, "action").ok_or(ConfigError::BadValue { key: "action" })?;
        let gesture = Gesture::parse(&gesture_name)
            .ok_or_else(|| ConfigError::UnknownGesture(gesture_name.clone()))?;
        let action =
            Action::parse(&action_name).ok_or_else(|| ConfigError::UnknownAction(action_name.clone()))?;
        map.bind(gesture, action);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MotionConfig::default();
        assert_eq!(config.history_size, 5);
        assert_eq!(config.majority_threshold, 4);
        assert_eq!(config.cooldown(), Duration::from_millis(800));
        assert_eq!(config.repeat_delay(), Duration::from_millis(1500));
        assert_eq!(config.min_confidence, 0.7);
        assert!(!config.mirror);
        assert_eq!(config.bindings, ActionMap::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial() {
        let config = MotionConfig::parse("(:cooldown-ms 500 :mirror t)").unwrap();
        assert_eq!(config.cooldown_ms, 500);
        assert!(config.mirror);
        assert_eq!(config.history_size, 5);
        assert_eq!(config.repeat_delay_ms, 1500);
    }

    #[test]
    fn test_parse_full() {
        let config = MotionConfig::parse(
            "(:history-size 7 :majority-threshold 5 :cooldown-ms 1000 :repeat-delay-ms 2000 \
             :min-confidence 0.5 :mirror nil \
             :bindings ((:gesture \"fist\" :action \"space\") (:gesture \"rewind\" :action \"left\")))",
        )
        .unwrap();
        assert_eq!(config.history_size, 7);
        assert_eq!(config.majority_threshold, 5);
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.bindings.bindings().len(), 2);
        assert_eq!(config.bindings.action_for(Gesture::Fist), Some(Action::Space));
        assert_eq!(config.bindings.action_for(Gesture::PlayPause), None);
        assert_eq!(config.dispatcher_config().repeat_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_empty_bindings() {
        let config = MotionConfig::parse("(:bindings nil)").unwrap();
        assert!(config.bindings.bindings().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = MotionConfig::default();

        config.majority_threshold = 6;
        assert!(config.validate().is_err());
        config.majority_threshold = 0;
        assert!(config.validate().is_err());
        config.majority_threshold = 4;

        config.history_size = 0;
        assert!(config.validate().is_err());
        config.history_size = 5;

        config.min_confidence = 1.5;
        assert!(config.validate().is_err());
        config.min_confidence = 0.7;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MotionConfig::parse("(:cooldown-ms"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            MotionConfig::parse("(:cooldown-ms fast)"),
            Err(ConfigError::BadValue { key: "cooldown-ms" })
        ));
        assert!(matches!(
            MotionConfig::parse("(:bindings ((:gesture \"wave\" :action \"esc\")))"),
            Err(ConfigError::UnknownGesture(g)) if g == "wave"
        ));
        assert!(matches!(
            MotionConfig::parse("(:bindings ((:gesture \"fist\" :action \"enter\")))"),
            Err(ConfigError::UnknownAction(a)) if a == "enter"
        ));
        assert!(matches!(
            MotionConfig::parse("(:bindings ((:gesture \"unknown\" :action \"esc\")))"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MotionConfig::parse("(:majority-threshold 9)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("motionctl_test_missing").join("config.sexp");
        assert!(matches!(MotionConfig::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = std::env::temp_dir().join("motionctl_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.sexp");
        std::fs::write(&path, "(:repeat-delay-ms 1200)").unwrap();

        let config = MotionConfig::load(&path).unwrap();
        assert_eq!(config.repeat_delay_ms, 1200);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_sexp() {
        let sexp = MotionConfig::default().config_sexp();
        assert!(sexp.contains(":history-size 5"));
        assert!(sexp.contains(":majority-threshold 4"));
        assert!(sexp.contains(":cooldown-ms 800"));
        assert!(sexp.contains(":repeat-delay-ms 1500"));
        assert!(sexp.contains(":min-confidence 0.7 "));
        assert!(sexp.contains(":mirror nil"));
        assert!(sexp.contains("(:gesture \"fist\" :action \"esc\")"));
    }

    #[test]
    fn test_config_sexp_parses_back() {
        let config = MotionConfig::default();
        assert_eq!(MotionConfig::parse(&config.config_sexp()).unwrap(), config);

        let config = MotionConfig::parse("(:min-confidence 0.755 :mirror t)").unwrap();
        let sexp = config.config_sexp();
        assert!(sexp.contains(":min-confidence 0.755 "));
        assert_eq!(MotionConfig::parse(&sexp).unwrap(), config);
    }
}
