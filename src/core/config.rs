//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::fit::TargetProfile;
use crate::core::errors::{InventoryError, Result};

/// Full engine configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub contradictions: ContradictionConfig,
    pub reliability: ReliabilityConfig,
    pub fit: FitConfig,
    pub profile: TargetProfile,
    pub risk: RiskConfig,
}

/// Form assembly knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SamplerConfig {
    /// One meta item is injected after every `meta_interval` regular items.
    pub meta_interval: usize,
    /// Declared regular categories. When non-empty this fixes the
    /// stratification divisor and order; categories missing from the bank
    /// are skipped. Empty means "every regular category in the bank".
    pub categories: Vec<String>,
}

/// Severity thresholds for contradiction checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContradictionConfig {
    /// Same-category pair flagged when `|score_i - score_j| >=` this.
    pub category_pair_min_diff: f64,
    /// Control breach when `max - min >=` this across main-control items.
    pub control_breach_min_spread: f64,
    /// Meta group flagged when its sample std exceeds this.
    pub meta_max_std: f64,
}

/// Penalty weights and thresholds for the reliability index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReliabilityConfig {
    pub fast_latency_secs: f64,
    pub slow_latency_secs: f64,
    pub latency_weight: f64,
    pub critical_penalty: f64,
    pub high_penalty: f64,
    pub variance_min_responses: usize,
    pub variance_severe_std: f64,
    pub variance_severe_penalty: f64,
    pub variance_mild_std: f64,
    pub variance_mild_penalty: f64,
    pub extreme_ratio: f64,
    pub extreme_penalty: f64,
    pub willingness_max_mean: f64,
    pub willingness_penalty: f64,
}

/// Profile-fit penalty shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FitConfig {
    /// Multiplier for distance below a range's low bound.
    pub under_weight: f64,
    /// Multiplier for distance above a range's high bound.
    pub over_weight: f64,
    /// Points of fit lost per unit of weighted penalty.
    pub scale: f64,
    /// Distance outside the band still reported as yellow.
    pub yellow_margin: f64,
}

/// Category risk classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RiskConfig {
    /// Categories where a low mean signals admitted misconduct.
    pub critical_categories: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            meta_interval: 15,
            categories: Vec::new(),
        }
    }
}

impl Default for ContradictionConfig {
    fn default() -> Self {
        Self {
            category_pair_min_diff: 2.5,
            control_breach_min_spread: 2.0,
            meta_max_std: 0.8,
        }
    }
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            fast_latency_secs: 1.4,
            slow_latency_secs: 20.0,
            latency_weight: 70.0,
            critical_penalty: 35.0,
            high_penalty: 15.0,
            variance_min_responses: 15,
            variance_severe_std: 0.35,
            variance_severe_penalty: 60.0,
            variance_mild_std: 0.6,
            variance_mild_penalty: 30.0,
            extreme_ratio: 0.75,
            extreme_penalty: 40.0,
            willingness_max_mean: 2.0,
            willingness_penalty: 25.0,
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            under_weight: 1.2,
            over_weight: 0.5,
            scale: 15.0,
            yellow_margin: 0.5,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_categories: ["theft", "drugs", "unethical", "academic"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                tracing::warn!("HOME not set, falling back to /tmp for config path");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        home_dir.join(".config").join("iinv").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| InventoryError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(InventoryError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        tracing::debug!(path = %path_buf.display(), "configuration loaded");
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut f64_slot = |name: &str, slot: &mut f64| -> Result<()> {
            if let Some(raw) = lookup(name) {
                *slot = parse_env(name, &raw)?;
            }
            Ok(())
        };

        // contradictions
        let contradictions = &mut self.contradictions;
        f64_slot(
            "IINV_CONTRADICTIONS_CATEGORY_PAIR_MIN_DIFF",
            &mut contradictions.category_pair_min_diff,
        )?;
        f64_slot(
            "IINV_CONTRADICTIONS_CONTROL_BREACH_MIN_SPREAD",
            &mut contradictions.control_breach_min_spread,
        )?;
        f64_slot(
            "IINV_CONTRADICTIONS_META_MAX_STD",
            &mut contradictions.meta_max_std,
        )?;

        // reliability
        let reliability = &mut self.reliability;
        for (name, slot) in [
            ("IINV_RELIABILITY_FAST_LATENCY_SECS", &mut reliability.fast_latency_secs),
            ("IINV_RELIABILITY_SLOW_LATENCY_SECS", &mut reliability.slow_latency_secs),
            ("IINV_RELIABILITY_LATENCY_WEIGHT", &mut reliability.latency_weight),
            ("IINV_RELIABILITY_CRITICAL_PENALTY", &mut reliability.critical_penalty),
            ("IINV_RELIABILITY_HIGH_PENALTY", &mut reliability.high_penalty),
            ("IINV_RELIABILITY_VARIANCE_SEVERE_STD", &mut reliability.variance_severe_std),
            (
                "IINV_RELIABILITY_VARIANCE_SEVERE_PENALTY",
                &mut reliability.variance_severe_penalty,
            ),
            ("IINV_RELIABILITY_VARIANCE_MILD_STD", &mut reliability.variance_mild_std),
            (
                "IINV_RELIABILITY_VARIANCE_MILD_PENALTY",
                &mut reliability.variance_mild_penalty,
            ),
            ("IINV_RELIABILITY_EXTREME_RATIO", &mut reliability.extreme_ratio),
            ("IINV_RELIABILITY_EXTREME_PENALTY", &mut reliability.extreme_penalty),
            (
                "IINV_RELIABILITY_WILLINGNESS_MAX_MEAN",
                &mut reliability.willingness_max_mean,
            ),
            (
                "IINV_RELIABILITY_WILLINGNESS_PENALTY",
                &mut reliability.willingness_penalty,
            ),
        ] {
            f64_slot(name, slot)?;
        }

        // fit
        f64_slot("IINV_FIT_UNDER_WEIGHT", &mut self.fit.under_weight)?;
        f64_slot("IINV_FIT_OVER_WEIGHT", &mut self.fit.over_weight)?;
        f64_slot("IINV_FIT_SCALE", &mut self.fit.scale)?;
        f64_slot("IINV_FIT_YELLOW_MARGIN", &mut self.fit.yellow_margin)?;

        if let Some(raw) = lookup("IINV_SAMPLER_META_INTERVAL") {
            self.sampler.meta_interval = parse_env("IINV_SAMPLER_META_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("IINV_SAMPLER_CATEGORIES") {
            self.sampler.categories = split_list(&raw);
        }
        if let Some(raw) = lookup("IINV_RELIABILITY_VARIANCE_MIN_RESPONSES") {
            self.reliability.variance_min_responses =
                parse_env("IINV_RELIABILITY_VARIANCE_MIN_RESPONSES", &raw)?;
        }
        if let Some(raw) = lookup("IINV_RISK_CRITICAL_CATEGORIES") {
            self.risk.critical_categories = split_list(&raw);
        }

        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.sampler.meta_interval == 0 {
            return Err(InventoryError::InvalidConfig {
                details: "sampler.meta_interval must be >= 1".to_string(),
            });
        }

        let c = &self.contradictions;
        for (name, val) in [
            ("category_pair_min_diff", c.category_pair_min_diff),
            ("control_breach_min_spread", c.control_breach_min_spread),
            ("meta_max_std", c.meta_max_std),
        ] {
            validate_non_negative(&format!("contradictions.{name}"), val)?;
        }

        let r = &self.reliability;
        for (name, val) in [
            ("fast_latency_secs", r.fast_latency_secs),
            ("latency_weight", r.latency_weight),
            ("critical_penalty", r.critical_penalty),
            ("high_penalty", r.high_penalty),
            ("variance_severe_std", r.variance_severe_std),
            ("variance_severe_penalty", r.variance_severe_penalty),
            ("variance_mild_std", r.variance_mild_std),
            ("variance_mild_penalty", r.variance_mild_penalty),
            ("extreme_penalty", r.extreme_penalty),
            ("willingness_penalty", r.willingness_penalty),
        ] {
            validate_non_negative(&format!("reliability.{name}"), val)?;
        }
        if r.fast_latency_secs >= r.slow_latency_secs {
            return Err(InventoryError::InvalidConfig {
                details: format!(
                    "reliability.fast_latency_secs ({}) must be < slow_latency_secs ({})",
                    r.fast_latency_secs, r.slow_latency_secs
                ),
            });
        }
        if r.variance_severe_std > r.variance_mild_std {
            return Err(InventoryError::InvalidConfig {
                details: "reliability.variance_severe_std must be <= variance_mild_std"
                    .to_string(),
            });
        }
        validate_prob("reliability.extreme_ratio", r.extreme_ratio)?;
        if !(1.0..=5.0).contains(&r.willingness_max_mean) {
            return Err(InventoryError::InvalidConfig {
                details: format!(
                    "reliability.willingness_max_mean must be in [1, 5], got {}",
                    r.willingness_max_mean
                ),
            });
        }

        for (name, val) in [
            ("under_weight", self.fit.under_weight),
            ("over_weight", self.fit.over_weight),
            ("scale", self.fit.scale),
            ("yellow_margin", self.fit.yellow_margin),
        ] {
            validate_non_negative(&format!("fit.{name}"), val)?;
        }

        self.profile.validate()?;
        Ok(())
    }
}

fn validate_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(InventoryError::InvalidConfig {
            details: format!("{name} must be a finite value >= 0, got {value}"),
        });
    }
    Ok(())
}

fn validate_prob(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(InventoryError::InvalidConfig {
            details: format!("{name} must be in [0,1], got {value}"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| InventoryError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
