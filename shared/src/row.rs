//! One inventory record rendered as a row: image slot, header, tag panel,
//! plus the hidden probe the shell lays out to measure the panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::accordion::{Accordion, AccordionPhase};
use crate::freshness::{format_posted_date, is_new_within};
use crate::model::{KeyedRecord, RecordKey};
use crate::tags::Tag;
use crate::{ScreenConfig, PROBE_OFFSET_Y, TAG_MAX_LINES, TITLE_COLLAPSED_LINES};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSlot {
    Remote { url: String },
    Placeholder { asset: String },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    New,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Chevron {
    Up,
    Down,
}

impl Chevron {
    #[must_use]
    pub const fn for_expanded(expanded: bool) -> Self {
        if expanded {
            Self::Up
        } else {
            Self::Down
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Up => "chevron-up",
            Self::Down => "chevron-down",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderView {
    pub title: String,
    /// `None` lets the title wrap freely.
    pub title_max_lines: Option<u8>,
    pub badge: Option<Badge>,
    pub chevron: Chevron,
    pub date_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagChipView {
    pub text: String,
    pub max_lines: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TagPanelView {
    /// Animated height; the panel clips anything below it.
    pub height: f64,
    pub chips: Vec<TagChipView>,
}

impl TagPanelView {
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.height > 0.0
    }
}

/// Invisible copy of the tag panel, kept in the tree for the row's whole
/// lifetime. Same width and content as the visible panel.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MeasureProbeView {
    pub offset_y: f64,
    pub opacity: f64,
    pub chips: Vec<TagChipView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RowView {
    pub key: RecordKey,
    pub image: ImageSlot,
    pub header: HeaderView,
    pub tag_panel: TagPanelView,
    pub probe: MeasureProbeView,
    pub phase: AccordionPhase,
    pub expanded: bool,
}

/// Shows the URL when it is non-blank and parses, the placeholder otherwise.
#[must_use]
pub fn image_slot(url: Option<&str>, placeholder: &str) -> ImageSlot {
    match url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) if Url::parse(url).is_ok() => ImageSlot::Remote { url: url.to_string() },
        _ => ImageSlot::Placeholder {
            asset: placeholder.to_string(),
        },
    }
}

fn chips(tags: Vec<Tag>) -> Vec<TagChipView> {
    tags.into_iter()
        .map(|tag| TagChipView {
            text: tag.text,
            max_lines: TAG_MAX_LINES,
        })
        .collect()
}

#[must_use]
pub fn render_row(
    entry: &KeyedRecord,
    accordion: &Accordion,
    now: DateTime<Utc>,
    config: &ScreenConfig,
) -> RowView {
    let record = &entry.record;
    let expanded = accordion.is_expanded();
    let is_new = is_new_within(record.posted_at, now, config.freshness_window_ms);
    let chips = chips(record.tags());

    RowView {
        key: entry.key.clone(),
        image: image_slot(record.image_url.as_deref(), &config.placeholder_image),
        header: HeaderView {
            title: record.name.clone(),
            title_max_lines: if expanded {
                None
            } else {
                Some(TITLE_COLLAPSED_LINES)
            },
            badge: is_new.then_some(Badge::New),
            chevron: Chevron::for_expanded(expanded),
            date_label: format_posted_date(record.posted_at, config.date_offset()),
        },
        tag_panel: TagPanelView {
            height: accordion.height(),
            chips: chips.clone(),
        },
        probe: MeasureProbeView {
            offset_y: PROBE_OFFSET_Y,
            opacity: 0.0,
            chips,
        },
        phase: accordion.phase(),
        expanded,
    }
}
