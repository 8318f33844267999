//! Scanner configuration.
//!
//! Every knob has a documented default; a TOML file or `QR_STREAM_*`
//! environment variables may override them.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScanConfig {
    /// Brightness gate thresholds
    #[serde(default)]
    pub brightness: BrightnessConfig,
    /// Cascade stage parameters
    #[serde(default)]
    pub cascade: CascadeConfig,
}

/// Brightness gate thresholds
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrightnessConfig {
    /// Mean below this is reported as dark (default 70)
    #[serde(default = "default_dark_threshold")]
    pub dark_threshold: f64,
    /// Mean below this skips the cascade entirely (default 40)
    #[serde(default = "default_abandon_threshold")]
    pub abandon_threshold: f64,
}

/// Cascade stage parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CascadeConfig {
    /// Threshold stage boosts exposure when brightness is below this (default 80)
    #[serde(default = "default_boost_below")]
    pub boost_below: f64,
    /// Threshold stage exposure boost (default +30)
    #[serde(default = "default_boost_amount")]
    pub boost_amount: i32,
    /// Threshold stage base level, used when Otsu cannot split the histogram (default 50)
    #[serde(default = "default_threshold_base")]
    pub threshold_base: u8,
    /// Adaptive stage exposure reduction (default 60, applied as -60)
    #[serde(default = "default_darken_amount")]
    pub darken_amount: i32,
    /// Adaptive stage window size in pixels; odd, >= 3 (default 55)
    #[serde(default = "default_adaptive_block_size")]
    pub adaptive_block_size: u32,
    /// Adaptive stage offset subtracted from the local mean (default 3)
    #[serde(default = "default_adaptive_offset")]
    pub adaptive_offset: i32,
    /// Deliver `NotFound` to the sink when every stage fails (default false)
    #[serde(default)]
    pub report_exhaustion: bool,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            dark_threshold: default_dark_threshold(),
            abandon_threshold: default_abandon_threshold(),
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            boost_below: default_boost_below(),
            boost_amount: default_boost_amount(),
            threshold_base: default_threshold_base(),
            darken_amount: default_darken_amount(),
            adaptive_block_size: default_adaptive_block_size(),
            adaptive_offset: default_adaptive_offset(),
            report_exhaustion: false,
        }
    }
}

impl ScanConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QR_STREAM_*` environment overrides on top of this config
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        let b = &mut self.brightness;
        b.dark_threshold = parse_env_f64("QR_STREAM_DARK_THRESHOLD", b.dark_threshold);
        b.abandon_threshold = parse_env_f64("QR_STREAM_ABANDON_THRESHOLD", b.abandon_threshold);

        let c = &mut self.cascade;
        c.boost_below = parse_env_f64("QR_STREAM_BOOST_BELOW", c.boost_below);
        c.boost_amount = parse_env_i32("QR_STREAM_BOOST_AMOUNT", c.boost_amount);
        c.threshold_base = parse_env_u8("QR_STREAM_THRESHOLD_BASE", c.threshold_base);
        c.darken_amount = parse_env_i32("QR_STREAM_DARKEN_AMOUNT", c.darken_amount);
        c.adaptive_block_size = parse_env_u32("QR_STREAM_BLOCK_SIZE", c.adaptive_block_size);
        c.adaptive_offset = parse_env_i32("QR_STREAM_BLOCK_OFFSET", c.adaptive_offset);
        c.report_exhaustion = parse_env_bool_u8("QR_STREAM_REPORT_EXHAUSTION", c.report_exhaustion);

        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.brightness;
        if b.abandon_threshold > b.dark_threshold {
            return Err(ConfigError::Invalid(format!(
                "abandon_threshold ({}) must not exceed dark_threshold ({})",
                b.abandon_threshold, b.dark_threshold
            )));
        }
        let block = self.cascade.adaptive_block_size;
        if block < 3 || block % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "adaptive_block_size must be odd and >= 3, got {block}"
            )));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    /// TOML syntax or type error
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Values parsed but inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_env_f64(name: &str, default: f64) -> f64 {
    parse_env(name).unwrap_or(default)
}

fn parse_env_i32(name: &str, default: i32) -> i32 {
    parse_env(name).unwrap_or(default)
}

fn parse_env_u32(name: &str, default: u32) -> u32 {
    parse_env(name).unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    parse_env(name).unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    parse_env::<u8>(name).map(|v| v != 0).unwrap_or(default)
}

// Default value functions
fn default_dark_threshold() -> f64 {
    70.0
}
fn default_abandon_threshold() -> f64 {
    40.0
}
fn default_boost_below() -> f64 {
    80.0
}
fn default_boost_amount() -> i32 {
    30
}
fn default_threshold_base() -> u8 {
    50
}
fn default_darken_amount() -> i32 {
    60
}
fn default_adaptive_block_size() -> u32 {
    55
}
fn default_adaptive_offset() -> i32 {
    3
}
