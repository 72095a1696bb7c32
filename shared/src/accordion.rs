//! Per-row expand/collapse controller.
//!
//! The tag panel has no intrinsic auto-height animation on the shell side,
//! so a row first learns its natural content height from an invisible
//! probe, then drives an explicit height tween toward either `0` or that
//! height. Each accordion owns at most one [`Tween`]; redirecting it is a
//! single `&mut self` step, so a toggle always starts from the value the
//! cancelled tween had reached at the toggle's timestamp.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::{Timing, Tween};

const SETTLE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AccordionPhase {
    /// Probe not laid out yet. `expanded` tracks toggles issued meanwhile.
    Unmeasured { expanded: bool },
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

impl Default for AccordionPhase {
    fn default() -> Self {
        Self::Unmeasured { expanded: false }
    }
}

impl AccordionPhase {
    #[must_use]
    pub const fn is_expanded(self) -> bool {
        match self {
            Self::Unmeasured { expanded } => expanded,
            Self::Expanding | Self::Expanded => true,
            Self::Collapsed | Self::Collapsing => false,
        }
    }

    #[must_use]
    pub const fn is_animating(self) -> bool {
        matches!(self, Self::Expanding | Self::Collapsing)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unmeasured { .. } => "unmeasured",
            Self::Collapsed => "collapsed",
            Self::Expanding => "expanding",
            Self::Expanded => "expanded",
            Self::Collapsing => "collapsing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accordion {
    phase: AccordionPhase,
    content_height: Option<f64>,
    height: f64,
    tween: Option<Tween>,
    timing: Timing,
}

impl Default for Accordion {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl Accordion {
    #[must_use]
    pub fn new(timing: Timing) -> Self {
        Self {
            phase: AccordionPhase::default(),
            content_height: None,
            height: 0.0,
            tween: None,
            timing,
        }
    }

    /// Rebuilds a previously measured row at rest, without replaying any
    /// animation.
    #[must_use]
    pub fn settled(expanded: bool, content_height: f64, timing: Timing) -> Self {
        let content_height = sanitize_height(content_height);
        Self {
            phase: if expanded {
                AccordionPhase::Expanded
            } else {
                AccordionPhase::Collapsed
            },
            content_height: Some(content_height),
            height: if expanded { content_height } else { 0.0 },
            tween: None,
            timing,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> AccordionPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.phase.is_expanded()
    }

    #[must_use]
    pub const fn is_measured(&self) -> bool {
        self.content_height.is_some()
    }

    #[must_use]
    pub const fn content_height(&self) -> Option<f64> {
        self.content_height
    }

    /// Height as of the last frame or intent.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub const fn tween(&self) -> Option<&Tween> {
        self.tween.as_ref()
    }

    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// The height the row is currently heading to.
    #[must_use]
    pub fn target(&self) -> f64 {
        if self.is_expanded() {
            self.content_height.unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Interpolated height at `at_ms` without mutating the row.
    #[must_use]
    pub fn height_at(&self, at_ms: f64) -> f64 {
        let raw = self
            .tween
            .as_ref()
            .map_or(self.height, |tween| tween.value_at(at_ms));
        raw.clamp(0.0, self.content_height.unwrap_or(0.0))
    }

    /// Applies the timing to tweens started from now on.
    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    /// Records the probe height. Accepted once; later reports are ignored.
    ///
    /// Returns `true` when the measurement was taken.
    pub fn on_measured(&mut self, content_height: f64, at_ms: f64) -> bool {
        let AccordionPhase::Unmeasured { expanded } = self.phase else {
            debug!(phase = self.phase.name(), "ignoring repeated measurement");
            return false;
        };

        self.content_height = Some(sanitize_height(content_height));
        self.phase = AccordionPhase::Collapsed;

        if expanded {
            // Toggled open before layout settled: head for the real height now.
            self.redirect(true, at_ms);
        }
        true
    }

    pub fn toggle(&mut self, at_ms: f64) {
        let expanded = !self.is_expanded();
        self.redirect(expanded, at_ms);
    }

    /// Returns `false` when the row was already expanded or expanding.
    pub fn expand(&mut self, at_ms: f64) -> bool {
        if self.is_expanded() {
            return false;
        }
        self.redirect(true, at_ms);
        true
    }

    /// Returns `false` when the row was already collapsed or collapsing.
    pub fn collapse(&mut self, at_ms: f64) -> bool {
        if !self.is_expanded() {
            return false;
        }
        self.redirect(false, at_ms);
        true
    }

    /// Moves the running tween to `at_ms`. Returns whether it is still running.
    pub fn advance(&mut self, at_ms: f64) -> bool {
        let Some(tween) = self.tween else {
            return false;
        };

        if tween.is_finished_at(at_ms) {
            self.height = tween.to();
            self.tween = None;
            self.phase = self.rest_phase();
            false
        } else {
            self.height = self.height_at(at_ms);
            true
        }
    }

    /// Jumps to the current target and drops any running tween.
    pub fn settle(&mut self) {
        self.tween = None;
        self.height = self.target();
        if self.content_height.is_some() {
            self.phase = self.rest_phase();
        }
    }

    // Cancels the running tween and starts the next one from its current
    // value, in one step.
    fn redirect(&mut self, expanded: bool, at_ms: f64) {
        let from = self.height_at(at_ms);
        self.tween = None;

        if let AccordionPhase::Unmeasured { .. } = self.phase {
            self.phase = AccordionPhase::Unmeasured { expanded };
            self.height = 0.0;
            debug!(expanded, "toggled before measurement; height stays 0");
            return;
        }

        self.phase = if expanded {
            AccordionPhase::Expanding
        } else {
            AccordionPhase::Collapsing
        };
        let to = self.target();
        self.height = from;

        // Without a usable clock the tween could never finish.
        if !at_ms.is_finite() || (to - from).abs() < SETTLE_EPSILON {
            self.height = to;
            self.phase = self.rest_phase();
        } else {
            self.tween = Some(Tween::new(from, to, at_ms, self.timing));
        }
    }

    fn rest_phase(&self) -> AccordionPhase {
        if self.is_expanded() {
            AccordionPhase::Expanded
        } else {
            AccordionPhase::Collapsed
        }
    }
}

/// Negative or non-finite layout results count as "no content".
#[must_use]
pub fn sanitize_height(height: f64) -> f64 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}
