//! Temperature-compensated decision thresholds.
//!
//! The MQ-2 reads differently at the extremes of its operating range, so
//! each base threshold is scaled by a per-band factor:
//!
//! ```text
//!   temp < cold_cutoff          ──▶ base × cold_factor
//!   cold_cutoff ≤ temp ≤ hot    ──▶ base
//!   temp > hot_cutoff           ──▶ base × hot_factor
//! ```
//!
//! The same factor is applied to every tier in one computation, so a
//! correctly ordered base set (`safe <= warning < danger`) stays ordered
//! after adjustment for any temperature.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// A gas threshold in raw sensor counts.
pub type Threshold = i32;

// ───────────────────────────────────────────────────────────────
// Compensation policy
// ───────────────────────────────────────────────────────────────

/// How the configured hot/cold factors are interpreted.
///
/// Deployed boards disagree on whether a hot room should raise or lower
/// the alarm point, so both readings of the factors are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompensationPolicy {
    /// Thresholds are used as configured, temperature is ignored.
    Disabled,
    /// Factors are applied verbatim.  A factor above 1 desensitises.
    AsConfigured,
    /// Factors are folded to `min(f, 1/f)`: compensation can only make
    /// detection more sensitive, never less.
    #[default]
    SensitizeOnly,
}

impl CompensationPolicy {
    /// The multiplier actually applied for a configured `factor`.
    pub fn effective_factor(self, factor: f32) -> f32 {
        match self {
            Self::Disabled => 1.0,
            Self::AsConfigured => factor,
            Self::SensitizeOnly => {
                if factor > 1.0 {
                    1.0 / factor
                } else {
                    factor
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Compensation bands
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compensation {
    pub policy: CompensationPolicy,
    pub hot_cutoff_c: f32,
    pub cold_cutoff_c: f32,
    pub hot_factor: f32,
    pub cold_factor: f32,
}

impl Compensation {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            policy: config.compensation,
            hot_cutoff_c: config.hot_cutoff_c,
            cold_cutoff_c: config.cold_cutoff_c,
            hot_factor: config.hot_factor,
            cold_factor: config.cold_factor,
        }
    }

    /// Multiplier for the band `temperature_c` falls in.
    pub fn factor(&self, temperature_c: f32) -> f32 {
        let configured = if temperature_c > self.hot_cutoff_c {
            self.hot_factor
        } else if temperature_c < self.cold_cutoff_c {
            self.cold_factor
        } else {
            1.0
        };
        self.policy.effective_factor(configured)
    }

    /// Adjust one base threshold for the current temperature.
    pub fn adjust(&self, base: Threshold, temperature_c: f32) -> Threshold {
        scale(base, self.factor(temperature_c))
    }
}

fn scale(base: Threshold, factor: f32) -> Threshold {
    (f64::from(base) * f64::from(factor)).round() as Threshold
}

// ───────────────────────────────────────────────────────────────
// Threshold tiers
// ───────────────────────────────────────────────────────────────

/// Uncompensated thresholds as stored in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseThresholds {
    pub safe: Threshold,
    pub warning: Threshold,
    pub danger: Threshold,
}

/// Thresholds in effect for one evaluation.
///
/// Non-cooking mode uses `safe`; cooking mode uses `warning` and `danger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    pub safe: Threshold,
    pub warning: Threshold,
    pub danger: Threshold,
}

impl ThresholdSet {
    /// Thresholds with no temperature adjustment.
    pub fn uncompensated(base: &BaseThresholds) -> Self {
        Self {
            safe: base.safe,
            warning: base.warning,
            danger: base.danger,
        }
    }

    /// Apply one band factor uniformly to every tier.
    ///
    /// A distinct warning band survives rounding: when the base danger tier
    /// sits above warning, the adjusted one stays at least one count above.
    pub fn compute(base: &BaseThresholds, comp: &Compensation, temperature_c: f32) -> Self {
        let f = comp.factor(temperature_c);
        let warning = scale(base.warning, f);
        let mut danger = scale(base.danger, f);
        if base.danger > base.warning {
            danger = danger.max(warning + 1);
        }
        Self {
            safe: scale(base.safe, f),
            warning,
            danger,
        }
    }
}
