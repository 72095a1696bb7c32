use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::easing::{Curve, Timing};
use crate::{
    ACCORDION_DURATION_MS, DEFAULT_RETAINED_ROWS, FRESHNESS_WINDOW_MS, MAX_ACCORDION_DURATION_MS,
    MAX_DATE_OFFSET_MINUTES, MAX_RETAINED_ROWS, PLACEHOLDER_IMAGE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid screen config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shell-tunable knobs for the inventory screen. Every field has a
/// default, so a partial JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub accordion_duration_ms: f64,
    pub accordion_curve: Curve,
    pub freshness_window_ms: i64,
    /// Offset applied to posted dates before formatting them.
    pub date_offset_minutes: i32,
    /// Detached rows whose accordion state is kept for remounting.
    pub retained_rows: usize,
    pub placeholder_image: String,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            accordion_duration_ms: ACCORDION_DURATION_MS,
            accordion_curve: Curve::EaseInOut,
            freshness_window_ms: FRESHNESS_WINDOW_MS,
            date_offset_minutes: 0,
            retained_rows: DEFAULT_RETAINED_ROWS,
            placeholder_image: PLACEHOLDER_IMAGE.into(),
        }
    }
}

impl ScreenConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.validated())
    }

    /// Clamps every field into its supported range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.accordion_duration_ms = if self.accordion_duration_ms.is_finite() {
            self.accordion_duration_ms.clamp(0.0, MAX_ACCORDION_DURATION_MS)
        } else {
            ACCORDION_DURATION_MS
        };
        self.freshness_window_ms = self.freshness_window_ms.max(0);
        self.date_offset_minutes = self
            .date_offset_minutes
            .clamp(-MAX_DATE_OFFSET_MINUTES, MAX_DATE_OFFSET_MINUTES);
        self.retained_rows = self.retained_rows.clamp(1, MAX_RETAINED_ROWS);
        if self.placeholder_image.trim().is_empty() {
            self.placeholder_image = PLACEHOLDER_IMAGE.into();
        }
        self
    }

    #[must_use]
    pub fn timing(&self) -> Timing {
        Timing {
            duration_ms: self.accordion_duration_ms,
            curve: self.accordion_curve,
        }
    }

    #[must_use]
    pub fn date_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.date_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
