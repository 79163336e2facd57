#![forbid(unsafe_code)]

//! Panel configuration: every tunable of the drawer in one validated struct.
//!
//! [`DrawerConfig`] covers snap geometry, gesture thresholds, resistance,
//! spring constants, and presentation ranges. It can be built in code or, with
//! the `config-files` feature, loaded from TOML or JSON.
//!
//! # Loading
//!
//! ```toml
//! # drawer.toml
//! collapsed_height = 100.0
//! viewport_height = 844.0
//! velocity_threshold = 500.0
//!
//! [expanded]
//! mode = "viewport_fraction"
//! fraction = 0.85
//! cap = 600.0
//!
//! [spring]
//! stiffness = 400.0
//! damping = 50.0
//! mass = 0.8
//! ```
//!
//! ```rust,ignore
//! let config = DrawerConfig::from_toml_file("drawer.toml")?;
//! ```
//!
//! # Defaults
//!
//! `DrawerConfig::default()` describes a typical bottom drawer: a 100px
//! collapsed strip, an expanded height of 85% of the viewport capped at
//! 600px, and a slightly overdamped settle spring.
//!
//! # Validation
//!
//! Configuration errors are programming mistakes, so every constructor that
//! consumes a config calls [`DrawerConfig::validate`] and fails fast. The
//! central check is strict ordering: `collapsed < expanded`.

#[cfg(feature = "config-files")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::presentation::PresentationConfig;
use crate::snap::SnapPoints;

// ---------------------------------------------------------------------------
// Expanded height
// ---------------------------------------------------------------------------

/// How the expanded snap point is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum ExpandedHeight {
    /// A fixed height, independent of the viewport.
    Fixed { height: f64 },
    /// `min(viewport_height × fraction, cap)`.
    ViewportFraction { fraction: f64, cap: f64 },
}

impl Default for ExpandedHeight {
    fn default() -> Self {
        Self::ViewportFraction {
            fraction: 0.85,
            cap: 600.0,
        }
    }
}

impl ExpandedHeight {
    /// Resolve against a viewport height.
    #[must_use]
    pub fn resolve(self, viewport_height: f64) -> f64 {
        match self {
            Self::Fixed { height } => height,
            Self::ViewportFraction { fraction, cap } => (viewport_height * fraction).min(cap),
        }
    }

    fn validate(self, errors: &mut Vec<String>) {
        match self {
            Self::Fixed { height } => {
                if !height.is_finite() || height <= 0.0 {
                    errors.push(format!("expanded.height must be finite and > 0, got {height}"));
                }
            }
            Self::ViewportFraction { fraction, cap } => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    errors.push(format!("expanded.fraction must be in (0, 1], got {fraction}"));
                }
                if !cap.is_finite() || cap <= 0.0 {
                    errors.push(format!("expanded.cap must be finite and > 0, got {cap}"));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Spring
// ---------------------------------------------------------------------------

/// Constants for the settle spring.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Distance from target (px) below which the spring may rest.
    pub rest_displacement: f64,
    /// Speed (px/s) below which the spring may rest.
    pub rest_velocity: f64,
    /// How long the spring must stay at rest before the settle completes.
    /// Defaults to one 60 Hz frame.
    pub settle_hold_ms: u64,
    /// Upper bound on a single settle; a spring still moving after this
    /// long is placed on its target and completed.
    pub max_settle_ms: u64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 400.0,
            damping: 50.0,
            mass: 0.8,
            rest_displacement: 0.01,
            rest_velocity: 2.0,
            settle_hold_ms: 16,
            max_settle_ms: 3_000,
        }
    }
}

impl SpringConfig {
    #[must_use]
    pub fn settle_hold(&self) -> Duration {
        Duration::from_millis(self.settle_hold_ms)
    }

    #[must_use]
    pub fn max_settle(&self) -> Duration {
        Duration::from_millis(self.max_settle_ms)
    }

    fn validate(&self, errors: &mut Vec<String>) {
        if !self.stiffness.is_finite() || self.stiffness <= 0.0 {
            errors.push(format!("spring.stiffness must be finite and > 0, got {}", self.stiffness));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            errors.push(format!("spring.damping must be finite and >= 0, got {}", self.damping));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            errors.push(format!("spring.mass must be finite and > 0, got {}", self.mass));
        }
        if !self.rest_displacement.is_finite() || self.rest_displacement <= 0.0 {
            errors.push(format!(
                "spring.rest_displacement must be finite and > 0, got {}",
                self.rest_displacement
            ));
        }
        if !self.rest_velocity.is_finite() || self.rest_velocity <= 0.0 {
            errors.push(format!(
                "spring.rest_velocity must be finite and > 0, got {}",
                self.rest_velocity
            ));
        }
        if self.max_settle_ms == 0 {
            errors.push("spring.max_settle_ms must be > 0".into());
        }
    }
}

// ---------------------------------------------------------------------------
// DrawerConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one panel instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DrawerConfig {
    /// Rest height of the collapsed snap point (px).
    pub collapsed_height: f64,
    /// Rule for the expanded snap point.
    pub expanded: ExpandedHeight,
    /// Viewport height used to resolve a fraction-based expanded height.
    pub viewport_height: f64,
    /// Release speed (px/s) above which a flick decides the snap point.
    pub velocity_threshold: f64,
    /// Release distance (px) above which a slow drag may change snap point.
    pub distance_threshold: f64,
    /// Cumulative motion (px) that classifies a touch as a drag, not a tap.
    pub dead_zone: f64,
    /// Weight of the newest interval in the smoothed velocity over one 16 ms
    /// frame, in (0, 1]. Longer intervals weigh the newest rate more.
    pub velocity_smoothing: f64,
    /// Resistance strength below the collapsed height. Overshoot saturates
    /// at `1 / resistance_low` px.
    pub resistance_low: f64,
    /// Resistance strength above the expanded height. Overshoot saturates
    /// at `1 / resistance_high` px.
    pub resistance_high: f64,
    /// Fraction of the release velocity handed to the settle spring.
    pub release_velocity_scale: f64,
    /// While dragging, heights within this band above collapsed track
    /// `collapsed` as the live target.
    pub live_target_band: f64,
    pub spring: SpringConfig,
    pub presentation: PresentationConfig,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            collapsed_height: 100.0,
            expanded: ExpandedHeight::default(),
            viewport_height: 800.0,
            velocity_threshold: 500.0,
            distance_threshold: 50.0,
            dead_zone: 10.0,
            velocity_smoothing: 0.8,
            resistance_low: 0.02,
            resistance_high: 0.01,
            release_velocity_scale: 0.3,
            live_target_band: 50.0,
            spring: SpringConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl DrawerConfig {
    /// Config with a fixed expanded height and no viewport dependence.
    #[must_use]
    pub fn fixed(collapsed_height: f64, expanded_height: f64) -> Self {
        Self {
            collapsed_height,
            expanded: ExpandedHeight::Fixed {
                height: expanded_height,
            },
            ..Self::default()
        }
    }

    /// Snap points for the configured viewport.
    pub fn snap_points(&self) -> Result<SnapPoints, ConfigError> {
        SnapPoints::for_viewport(self.collapsed_height, self.expanded, self.viewport_height)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check every parameter. Returns the list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.collapsed_height.is_finite() || self.collapsed_height < 0.0 {
            errors.push(format!(
                "collapsed_height must be finite and >= 0, got {}",
                self.collapsed_height
            ));
        }
        if !self.viewport_height.is_finite() || self.viewport_height <= 0.0 {
            errors.push(format!(
                "viewport_height must be finite and > 0, got {}",
                self.viewport_height
            ));
        }
        self.expanded.validate(&mut errors);

        if errors.is_empty() {
            let expanded = self.expanded.resolve(self.viewport_height);
            if self.collapsed_height >= expanded {
                errors.push(format!(
                    "collapsed_height ({}) must be < expanded height ({expanded})",
                    self.collapsed_height
                ));
            }
        }

        for (name, value) in [
            ("velocity_threshold", self.velocity_threshold),
            ("distance_threshold", self.distance_threshold),
            ("dead_zone", self.dead_zone),
            ("release_velocity_scale", self.release_velocity_scale),
            ("live_target_band", self.live_target_band),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be finite and >= 0, got {value}"));
            }
        }

        for (name, value) in [
            ("resistance_low", self.resistance_low),
            ("resistance_high", self.resistance_high),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} must be finite and > 0, got {value}"));
            }
        }

        if !(self.velocity_smoothing > 0.0 && self.velocity_smoothing <= 1.0) {
            errors.push(format!(
                "velocity_smoothing must be in (0, 1], got {}",
                self.velocity_smoothing
            ));
        }

        self.spring.validate(&mut errors);
        self.presentation.validate(&mut errors);
        errors
    }

    /// Consume the config, returning it only if it validates.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when building or loading a drawer configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DrawerConfig::default();
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn default_expanded_is_capped() {
        let config = DrawerConfig::default();
        // 800 × 0.85 = 680, capped at 600.
        assert_eq!(config.expanded.resolve(config.viewport_height), 600.0);
    }

    #[test]
    fn small_viewport_uses_fraction() {
        let expanded = ExpandedHeight::default();
        assert!((expanded.resolve(400.0) - 340.0).abs() < 1e-9);
    }

    #[test]
    fn collapsed_not_below_expanded_is_rejected() {
        let config = DrawerConfig::fixed(600.0, 600.0);
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must be <"), "{errors:?}");
    }

    #[test]
    fn tiny_viewport_is_rejected() {
        let config = DrawerConfig {
            viewport_height: 100.0,
            ..DrawerConfig::default()
        };
        assert!(matches!(config.validated(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_finite_values_are_reported() {
        let mut config = DrawerConfig::default();
        config.velocity_threshold = f64::NAN;
        config.resistance_low = 0.0;
        config.spring.mass = f64::INFINITY;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.starts_with("velocity_threshold")));
        assert!(errors.iter().any(|e| e.starts_with("resistance_low")));
        assert!(errors.iter().any(|e| e.starts_with("spring.mass")));
    }

    #[test]
    fn smoothing_bounds() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let config = DrawerConfig {
                velocity_smoothing: bad,
                ..DrawerConfig::default()
            };
            assert!(!config.validate().is_empty(), "accepted smoothing {bad}");
        }
    }

    #[test]
    fn validation_error_display_joins_messages() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn partial_toml_uses_defaults() {
        let config = DrawerConfig::from_toml_str(
            r#"
            collapsed_height = 120.0
            viewport_height = 700.0

            [spring]
            stiffness = 300.0
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.collapsed_height, 120.0);
        assert_eq!(config.spring.stiffness, 300.0);
        assert_eq!(config.spring.damping, 50.0);
        assert_eq!(config.velocity_threshold, 500.0);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn fixed_expanded_from_json() {
        let config = DrawerConfig::from_json_str(
            r#"{ "expanded": { "mode": "fixed", "height": 480.0 } }"#,
        )
        .expect("valid json");
        assert_eq!(config.expanded, ExpandedHeight::Fixed { height: 480.0 });
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn invalid_file_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drawer.toml");
        std::fs::write(&path, "collapsed_height = 900.0\n").expect("write");
        let err = DrawerConfig::from_toml_file(&path).expect_err("must reject");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn missing_file_is_io_error() {
        let err = DrawerConfig::from_toml_file("/nonexistent/drawer.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
