use crate::core::rep_counter::{JointSelection, RepThresholds};
use crate::models::pose::PoseConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Repetition counter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CounterConfig {
    /// Joint angle at or above which the arm counts as extended (degrees)
    pub top_threshold_deg: f32,
    /// Joint angle at or below which the arm counts as flexed (degrees)
    pub bottom_threshold_deg: f32,
    /// Minimum time between two counted repetitions
    pub refractory_ms: u64,
    /// Landmarks below this confidence invalidate a sample (0.0-1.0)
    pub min_confidence: f32,
    /// Control loop polling interval
    pub control_tick_ms: u64,
    /// Which arm drives the elbow angle
    pub joint: JointSelection,
    /// Settings forwarded to the pose model
    pub pose: PoseConfig,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            top_threshold_deg: 160.0,
            bottom_threshold_deg: 90.0,
            refractory_ms: 300,
            min_confidence: 0.5,
            control_tick_ms: 40,
            joint: JointSelection::Auto,
            pose: PoseConfig::default(),
        }
    }
}

impl CounterConfig {
    /// Load configuration from `path`, writing defaults if it doesn't exist
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CounterConfig = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path` as pretty JSON
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.bottom_threshold_deg > 0.0
            && self.bottom_threshold_deg < self.top_threshold_deg
            && self.top_threshold_deg <= 180.0)
        {
            return Err(ConfigError::Invalid(format!(
                "Thresholds must satisfy 0 < bottom ({}) < top ({}) <= 180",
                self.bottom_threshold_deg, self.top_threshold_deg
            )));
        }

        if self.refractory_ms > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "Invalid refractory period: {}ms. Must be at most 10000ms",
                self.refractory_ms
            )));
        }

        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("pose.min_detection_confidence", self.pose.min_detection_confidence),
            ("pose.min_tracking_confidence", self.pose.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid {}: {}. Must be between 0.0 and 1.0",
                    name, value
                )));
            }
        }

        if self.control_tick_ms == 0 || self.control_tick_ms > 1000 {
            return Err(ConfigError::Invalid(format!(
                "Invalid control tick: {}ms. Must be between 1 and 1000",
                self.control_tick_ms
            )));
        }

        if self.pose.target_fps == 0 || self.pose.target_fps > 60 {
            return Err(ConfigError::Invalid(format!(
                "Invalid target FPS: {}. Must be between 1 and 60",
                self.pose.target_fps
            )));
        }

        Ok(())
    }

    /// State machine parameters derived from this configuration
    pub fn thresholds(&self) -> RepThresholds {
        RepThresholds {
            top_deg: self.top_threshold_deg,
            bottom_deg: self.bottom_threshold_deg,
            refractory: Duration::from_millis(self.refractory_ms),
            min_confidence: self.min_confidence,
        }
    }

    pub fn control_tick(&self) -> Duration {
        Duration::from_millis(self.control_tick_ms)
    }

    /// Default configuration file location
    pub fn default_path() -> ConfigResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| ConfigError::Invalid("Could not determine home directory".to_string()))?;

        let mut path = PathBuf::from(home);
        path.push(".repcount");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_config_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("repcount_test_config_{}", name));
        path.push("settings.json");
        path
    }

    fn cleanup(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_default_config() {
        let config = CounterConfig::default();
        assert_eq!(config.top_threshold_deg, 160.0);
        assert_eq!(config.bottom_threshold_deg, 90.0);
        assert_eq!(config.refractory_ms, 300);
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.control_tick_ms, 40);
        assert_eq!(config.joint, JointSelection::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CounterConfig::default();

        // Inverted thresholds leave no hysteresis band
        config.bottom_threshold_deg = 170.0;
        assert!(config.validate().is_err());
        config.bottom_threshold_deg = 90.0;

        config.top_threshold_deg = 200.0;
        assert!(config.validate().is_err());
        config.top_threshold_deg = 160.0;

        config.min_confidence = 1.5;
        assert!(config.validate().is_err());
        config.min_confidence = 0.5;

        config.control_tick_ms = 0;
        assert!(config.validate().is_err());
        config.control_tick_ms = 40;

        config.pose.target_fps = 120;
        assert!(config.validate().is_err());
        config.pose.target_fps = 30;

        config.refractory_ms = 60_000;
        assert!(config.validate().is_err());
        config.refractory_ms = 0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_from_config() {
        let thresholds = CounterConfig::default().thresholds();
        assert_eq!(thresholds.top_deg, 160.0);
        assert_eq!(thresholds.bottom_deg, 90.0);
        assert_eq!(thresholds.refractory, Duration::from_millis(300));
        assert_eq!(thresholds.min_confidence, 0.5);
    }

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let path = test_config_path("missing");
        cleanup(&path);

        let config = CounterConfig::load_from(&path).unwrap();
        assert_eq!(config, CounterConfig::default());
        assert!(path.exists());

        cleanup(&path);
    }

    #[test]
    fn test_save_and_reload() {
        let path = test_config_path("roundtrip");
        cleanup(&path);

        let mut config = CounterConfig::default();
        config.top_threshold_deg = 150.0;
        config.joint = JointSelection::Left;
        config.save_to(&path).unwrap();

        let loaded = CounterConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        cleanup(&path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = test_config_path("partial");
        cleanup(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "refractory_ms": 450 }"#).unwrap();

        let loaded = CounterConfig::load_from(&path).unwrap();
        assert_eq!(loaded.refractory_ms, 450);
        assert_eq!(loaded.top_threshold_deg, 160.0);

        cleanup(&path);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let path = test_config_path("invalid");
        cleanup(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "top_threshold_deg": 80.0 }"#).unwrap();

        let result = CounterConfig::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        cleanup(&path);
    }
}
