use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MetricsError, Result};

/// Whether the commission is taken out of a trade's persisted P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionPolicy {
    #[default]
    Subtract,
    Ignore,
}

fn default_pnl_window_months() -> u32 {
    6
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Look-back of the equity curve when no explicit range is requested.
    #[serde(default = "default_pnl_window_months")]
    pub pnl_window_months: u32,
    #[serde(default)]
    pub commission_policy: CommissionPolicy,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Viewer's offset from UTC in minutes; `None` follows the host clock.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pnl_window_months: default_pnl_window_months(),
            commission_policy: CommissionPolicy::default(),
            currency: default_currency(),
            utc_offset_minutes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub pnl_window_months: Option<u32>,
    pub commission_policy: Option<CommissionPolicy>,
    pub currency: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&content)?;
        log::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// The configured viewer offset, if one is set and in range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pnl_window_months == 0 {
            return Err(MetricsError::InvalidSettings(
                "pnl_window_months must be at least 1".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(MetricsError::InvalidSettings(
                "currency must not be empty".to_string(),
            ));
        }
        if self.utc_offset_minutes.is_some() && self.utc_offset().is_none() {
            return Err(MetricsError::InvalidSettings(
                "utc_offset_minutes must be within +/-24h".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a partial update, returning the validated result.
    pub fn apply(&self, update: UpdateSettingsInput) -> Result<Self> {
        let mut next = self.clone();

        if let Some(val) = update.pnl_window_months {
            next.pnl_window_months = val;
        }
        if let Some(val) = update.commission_policy {
            next.commission_policy = val;
        }
        if let Some(val) = update.currency {
            next.currency = val;
        }
        if let Some(val) = update.utc_offset_minutes {
            next.utc_offset_minutes = Some(val);
        }

        next.validate()?;
        Ok(next)
    }
}
