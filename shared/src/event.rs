use serde::{Deserialize, Serialize};

use crate::capabilities::InventoryOutput;
use crate::config::ScreenConfig;
use crate::model::RecordKey;

/// Everything the shell can tell the core. Timestamps named `at_ms` are on
/// the shell's animation-frame clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,

    ScreenFocused,
    RefreshRequested,
    InventoryFetched(Box<InventoryOutput>),

    RowMounted {
        key: RecordKey,
    },
    RowUnmounted {
        key: RecordKey,
    },
    RowMeasured {
        key: RecordKey,
        height: Option<f64>,
        at_ms: f64,
    },
    RowToggled {
        key: RecordKey,
        at_ms: f64,
    },
    RowExpandRequested {
        key: RecordKey,
        at_ms: f64,
    },
    RowCollapseRequested {
        key: RecordKey,
        at_ms: f64,
    },
    AnimationFrame {
        at_ms: f64,
    },

    ScanProductRequested,

    ConfigChanged(ScreenConfig),
    DismissError,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::ScreenFocused => "screen_focused",
            Self::RefreshRequested => "refresh_requested",
            Self::InventoryFetched(_) => "inventory_fetched",
            Self::RowMounted { .. } => "row_mounted",
            Self::RowUnmounted { .. } => "row_unmounted",
            Self::RowMeasured { .. } => "row_measured",
            Self::RowToggled { .. } => "row_toggled",
            Self::RowExpandRequested { .. } => "row_expand_requested",
            Self::RowCollapseRequested { .. } => "row_collapse_requested",
            Self::AnimationFrame { .. } => "animation_frame",
            Self::ScanProductRequested => "scan_product_requested",
            Self::ConfigChanged(_) => "config_changed",
            Self::DismissError => "dismiss_error",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RefreshRequested
                | Self::RowToggled { .. }
                | Self::RowExpandRequested { .. }
                | Self::RowCollapseRequested { .. }
                | Self::ScanProductRequested
                | Self::DismissError
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
