#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod accordion;
pub mod capabilities;
pub mod config;
pub mod easing;
pub mod event;
pub mod freshness;
pub mod model;
pub mod row;
pub mod rows;
pub mod tags;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::ScreenConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::{InventoryRecord, KeyedRecord, Model, RecordKey};
pub use row::RowView;

pub const SCREEN_TITLE: &str = "Inventory";
pub const CAPTURE_ACTION_LABEL: &str = "Scan Product";
pub const CAPTURE_ACTION_ICON: &str = "barcode";
pub const ACCORDION_DURATION_MS: f64 = 600.0;
pub const MAX_ACCORDION_DURATION_MS: f64 = 10_000.0;
pub const FRESHNESS_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;
pub const PROBE_OFFSET_Y: f64 = -1000.0;
pub const TITLE_COLLAPSED_LINES: u8 = 1;
pub const TAG_MAX_LINES: u8 = 2;
pub const DEFAULT_RETAINED_ROWS: usize = 64;
pub const MAX_RETAINED_ROWS: usize = 1024;
pub const MAX_DATE_OFFSET_MINUTES: i32 = 14 * 60;
pub const PLACEHOLDER_IMAGE: &str = "placeholder.png";
pub const INVALID_DATE_LABEL: &str = "Invalid Date";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Decode,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "E_NETWORK",
            Self::Decode => "E_DECODE",
        }
    }

    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Network => "Couldn't load the inventory. Pull down to try again.",
            Self::Decode => "The inventory couldn't be read. Pull down to try again.",
        }
    }
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{}: {message}", .kind.code())]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The internal message stays in logs; the user sees the kind's text.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        self.kind.default_message().to_string()
    }
}

impl From<model::RecordError> for AppError {
    fn from(e: model::RecordError) -> Self {
        AppError::new(ErrorKind::Decode, e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            error_code: e.kind.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureActionView {
    pub label: String,
    pub icon: String,
}

impl Default for CaptureActionView {
    fn default() -> Self {
        Self {
            label: CAPTURE_ACTION_LABEL.into(),
            icon: CAPTURE_ACTION_ICON.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub title: String,
    pub rows: Vec<RowView>,
    pub is_refreshing: bool,
    pub is_empty: bool,
    pub error: Option<UserFacingError>,
    pub capture_action: CaptureActionView,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::*;
    use crate::accordion::Accordion;
    use crate::capabilities::{InventoryOutput, Route};
    use crate::model::decode_inventory;
    use crate::row::render_row;
    use crate::rows::MountOutcome;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn request_inventory(model: &mut Model, caps: &Capabilities) {
            if model.fetch_in_flight {
                debug!("inventory fetch already in flight");
                return;
            }
            model.fetch_in_flight = true;
            caps.inventory
                .fetch(|output| Event::InventoryFetched(Box::new(output)));
        }

        fn apply_inventory(model: &mut Model, output: InventoryOutput) {
            match output {
                InventoryOutput::Payload { body } => match decode_inventory(&body) {
                    Ok(records) => {
                        info!(count = records.len(), "inventory replaced");
                        model.replace_records(records);
                        model.clear_error();
                    }
                    Err(e) => {
                        warn!(error = %e, "inventory payload rejected");
                        model.set_error(e.into());
                    }
                },
                InventoryOutput::Failed { message } => {
                    warn!(%message, "inventory fetch failed");
                    model.set_error(AppError::new(ErrorKind::Network, message));
                }
            }
        }

        /// Keeps exactly one frame request outstanding while any row animates.
        fn schedule_frame(model: &mut Model, caps: &Capabilities) {
            if model.frame_pending || !model.rows.is_animating() {
                return;
            }
            model.frame_pending = true;
            caps.frames.next_frame(|at_ms| Event::AnimationFrame { at_ms });
        }

        fn with_row(
            model: &mut Model,
            key: &RecordKey,
            f: impl FnOnce(&mut Accordion),
        ) -> bool {
            match model.rows.get_mut(key) {
                Some(accordion) => {
                    f(accordion);
                    true
                }
                None => {
                    warn!(%key, "intent for a row that is not mounted");
                    false
                }
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();

            debug!(
                event = event.name(),
                user = event.is_user_initiated(),
                "update"
            );

            match event {
                Event::Noop => {}

                Event::ScreenFocused => {
                    Self::request_inventory(model, caps);
                    caps.render.render();
                }

                Event::RefreshRequested => {
                    model.is_refreshing = true;
                    Self::request_inventory(model, caps);
                    caps.render.render();
                }

                Event::InventoryFetched(output) => {
                    model.fetch_in_flight = false;
                    model.is_refreshing = false;
                    Self::apply_inventory(model, *output);
                    caps.render.render();
                }

                Event::RowMounted { key } => {
                    let Some(tags) = model
                        .record(&key)
                        .map(|entry| entry.record.tag_fingerprint())
                    else {
                        warn!(%key, "mount for unknown record");
                        return;
                    };

                    let timing = model.config.timing();
                    match model.rows.mount(key.clone(), tags, timing) {
                        MountOutcome::Fresh => {
                            caps.layout.measure_probe(key.clone(), move |output| {
                                Event::RowMeasured {
                                    key,
                                    height: output.height,
                                    at_ms: output.at_ms,
                                }
                            });
                        }
                        MountOutcome::Restored => debug!(%key, "row restored"),
                        MountOutcome::AlreadyMounted => {}
                    }
                    caps.render.render();
                }

                Event::RowUnmounted { key } => {
                    model.rows.unmount(&key);
                }

                Event::RowMeasured { key, height, at_ms } => {
                    let Some(accordion) = model.rows.get_mut(&key) else {
                        debug!(%key, "measurement arrived after unmount");
                        return;
                    };
                    if height.is_none() {
                        warn!(%key, "probe was not laid out; treating as empty");
                    }
                    if accordion.on_measured(height.unwrap_or(0.0), at_ms) {
                        Self::schedule_frame(model, caps);
                        caps.render.render();
                    }
                }

                Event::RowToggled { key, at_ms } => {
                    if Self::with_row(model, &key, |accordion| accordion.toggle(at_ms)) {
                        Self::schedule_frame(model, caps);
                        caps.render.render();
                    }
                }

                Event::RowExpandRequested { key, at_ms } => {
                    let mut changed = false;
                    Self::with_row(model, &key, |accordion| changed = accordion.expand(at_ms));
                    if changed {
                        Self::schedule_frame(model, caps);
                        caps.render.render();
                    }
                }

                Event::RowCollapseRequested { key, at_ms } => {
                    let mut changed = false;
                    Self::with_row(model, &key, |accordion| {
                        changed = accordion.collapse(at_ms);
                    });
                    if changed {
                        Self::schedule_frame(model, caps);
                        caps.render.render();
                    }
                }

                Event::AnimationFrame { at_ms } => {
                    model.frame_pending = false;
                    model.rows.advance_all(at_ms);
                    Self::schedule_frame(model, caps);
                    caps.render.render();
                }

                Event::ScanProductRequested => {
                    caps.navigation.navigate(Route::Capture);
                }

                Event::ConfigChanged(config) => {
                    let config = config.validated();
                    model.rows.set_timing(config.timing());
                    model.rows.resize(config.retained_rows);
                    model.config = config;
                    caps.render.render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let now = model.now();
            let detached = Accordion::new(model.config.timing());

            let rows = model
                .records
                .iter()
                .map(|entry| {
                    let accordion = model.rows.get(&entry.key).unwrap_or(&detached);
                    render_row(entry, accordion, now, &model.config)
                })
                .collect();

            ViewModel {
                title: SCREEN_TITLE.into(),
                rows,
                is_refreshing: model.is_refreshing,
                is_empty: model.records.is_empty(),
                error: model.active_error.as_ref().map(UserFacingError::from),
                capture_action: CaptureActionView::default(),
            }
        }
    }
}
