//! Session and runtime configuration.

use serde::Deserialize;

use crate::types::DrawMode;

/// Default storage key holding the serialized winner ledger.
pub const DEFAULT_STORAGE_KEY: &str = "lotteryWinners";
/// Default export filename label.
pub const DEFAULT_EXPORT_LABEL: &str = "中奖名单";
/// Default chance a special-tier tick shows the override name.
pub const DEFAULT_OVERRIDE_PROBABILITY: f64 = 0.5;

/// Tunables for a draw session and its runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether draws carry award tiers.
    pub mode: DrawMode,
    /// Display tick period while spinning.
    pub tick_interval_ms: u64,
    /// How long transient import notices stay visible.
    pub notice_clear_ms: u64,
    /// Key the winner ledger is stored under.
    pub storage_key: String,
    /// Prefix of exported workbook filenames.
    pub export_label: String,
    /// Chance a special-tier tick shows the override name.
    pub override_probability: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: DrawMode::Plain,
            tick_interval_ms: 100,
            notice_clear_ms: 3000,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            export_label: DEFAULT_EXPORT_LABEL.to_string(),
            override_probability: DEFAULT_OVERRIDE_PROBABILITY,
        }
    }
}

impl SessionConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: Self = serde_json::from_str(raw)?;
        cfg.tick_interval_ms = cfg.tick_interval_ms.max(1);
        cfg.override_probability = sanitize_probability(cfg.override_probability);
        Ok(cfg)
    }

    /// Config for the award-tiered variant.
    pub fn tiered() -> Self {
        Self {
            mode: DrawMode::Tiered,
            ..Self::default()
        }
    }
}

/// Clamps `p` into `[0, 1]`; non-finite values fall back to the default.
pub(crate) fn sanitize_probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        DEFAULT_OVERRIDE_PROBABILITY
    }
}
