//! Accordion state for the rows the host currently has mounted.
//!
//! The host recycles row views as the list scrolls. State lives here keyed
//! by [`RecordKey`] rather than in the view, and a row that leaves the
//! viewport is parked in a bounded LRU so scrolling back restores it
//! without a second measurement pass.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::accordion::Accordion;
use crate::easing::Timing;
use crate::model::RecordKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// New accordion; the probe still has to be measured.
    Fresh,
    /// Rebuilt from parked state; no measurement needed.
    Restored,
    AlreadyMounted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ParkedRow {
    expanded: bool,
    content_height: f64,
    tags: blake3::Hash,
}

#[derive(Debug)]
struct MountedRow {
    accordion: Accordion,
    tags: blake3::Hash,
}

#[derive(Debug)]
pub struct RowRegistry {
    mounted: HashMap<RecordKey, MountedRow>,
    parked: LruCache<RecordKey, ParkedRow>,
}

fn capacity(rows: usize) -> NonZeroUsize {
    NonZeroUsize::new(rows).unwrap_or(NonZeroUsize::MIN)
}

impl RowRegistry {
    pub fn new(retained_rows: usize) -> Self {
        Self {
            mounted: HashMap::new(),
            parked: LruCache::new(capacity(retained_rows)),
        }
    }

    /// Mounts `key`. Parked state is reused only while the tag content it
    /// was measured against is unchanged.
    pub fn mount(&mut self, key: RecordKey, tags: blake3::Hash, timing: Timing) -> MountOutcome {
        if self.mounted.contains_key(&key) {
            return MountOutcome::AlreadyMounted;
        }

        let (accordion, outcome) = match self.parked.pop(&key) {
            Some(parked) if parked.tags == tags => (
                Accordion::settled(parked.expanded, parked.content_height, timing),
                MountOutcome::Restored,
            ),
            Some(_) => {
                debug!(%key, "tags changed while parked; remeasuring");
                (Accordion::new(timing), MountOutcome::Fresh)
            }
            None => (Accordion::new(timing), MountOutcome::Fresh),
        };

        self.mounted.insert(key, MountedRow { accordion, tags });
        outcome
    }

    /// Unmounts `key`, parking its settled state if it was ever measured.
    pub fn unmount(&mut self, key: &RecordKey) -> bool {
        let Some(MountedRow { mut accordion, tags }) = self.mounted.remove(key) else {
            return false;
        };

        accordion.settle();
        if let Some(content_height) = accordion.content_height() {
            self.parked.put(
                key.clone(),
                ParkedRow {
                    expanded: accordion.is_expanded(),
                    content_height,
                    tags,
                },
            );
        }
        true
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Accordion> {
        self.mounted.get(key).map(|row| &row.accordion)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut Accordion> {
        self.mounted.get_mut(key).map(|row| &mut row.accordion)
    }

    pub fn is_parked(&self, key: &RecordKey) -> bool {
        self.parked.contains(key)
    }

    pub fn is_animating(&self) -> bool {
        self.mounted.values().any(|row| row.accordion.is_animating())
    }

    /// Steps every running tween to `at_ms`. Returns whether any is still
    /// running afterwards.
    pub fn advance_all(&mut self, at_ms: f64) -> bool {
        let mut running = false;
        for row in self.mounted.values_mut() {
            running |= row.accordion.advance(at_ms);
        }
        running
    }

    pub fn set_timing(&mut self, timing: Timing) {
        for row in self.mounted.values_mut() {
            row.accordion.set_timing(timing);
        }
    }

    pub fn resize(&mut self, retained_rows: usize) {
        self.parked.resize(capacity(retained_rows));
    }

    /// Forgets mounted and parked state for keys outside `live`.
    pub fn retain_keys(&mut self, live: &HashSet<RecordKey>) {
        self.mounted.retain(|key, _| live.contains(key));

        let stale: Vec<RecordKey> = self
            .parked
            .iter()
            .filter(|(key, _)| !live.contains(*key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.parked.pop(&key);
        }
    }

    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    pub fn retained_len(&self) -> usize {
        self.parked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accordion::AccordionPhase;
    use crate::tags::fingerprint;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s)
    }

    #[test]
    fn fresh_mount_needs_measurement() {
        let mut rows = RowRegistry::new(4);
        let tags = fingerprint(Some("a"));
        assert_eq!(rows.mount(key("r1"), tags, Timing::default()), MountOutcome::Fresh);
        assert_eq!(
            rows.mount(key("r1"), tags, Timing::default()),
            MountOutcome::AlreadyMounted
        );
        assert!(!rows.get(&key("r1")).unwrap().is_measured());
    }

    #[test]
    fn remount_restores_settled_state() {
        let mut rows = RowRegistry::new(4);
        let tags = fingerprint(Some("a,b"));
        rows.mount(key("r1"), tags, Timing::default());
        let accordion = rows.get_mut(&key("r1")).unwrap();
        accordion.on_measured(64.0, 0.0);
        accordion.expand(0.0);
        accordion.advance(100.0);

        assert!(rows.unmount(&key("r1")));
        assert!(rows.is_parked(&key("r1")));

        assert_eq!(
            rows.mount(key("r1"), tags, Timing::default()),
            MountOutcome::Restored
        );
        let restored = rows.get(&key("r1")).unwrap();
        assert_eq!(restored.phase(), AccordionPhase::Expanded);
        assert_eq!(restored.height(), 64.0);
        assert!(!rows.is_parked(&key("r1")));
    }

    #[test]
    fn changed_tags_force_remeasure() {
        let mut rows = RowRegistry::new(4);
        rows.mount(key("r1"), fingerprint(Some("a")), Timing::default());
        rows.get_mut(&key("r1")).unwrap().on_measured(30.0, 0.0);
        rows.unmount(&key("r1"));

        assert_eq!(
            rows.mount(key("r1"), fingerprint(Some("a,b")), Timing::default()),
            MountOutcome::Fresh
        );
    }

    #[test]
    fn unmeasured_rows_are_not_parked() {
        let mut rows = RowRegistry::new(4);
        rows.mount(key("r1"), fingerprint(None), Timing::default());
        assert!(rows.unmount(&key("r1")));
        assert_eq!(rows.retained_len(), 0);
        assert!(!rows.unmount(&key("r1")));
    }

    #[test]
    fn parking_is_bounded() {
        let mut rows = RowRegistry::new(2);
        for name in ["a", "b", "c"] {
            rows.mount(key(name), fingerprint(None), Timing::default());
            rows.get_mut(&key(name)).unwrap().on_measured(10.0, 0.0);
            rows.unmount(&key(name));
        }
        assert_eq!(rows.retained_len(), 2);
        assert!(!rows.is_parked(&key("a")));
        assert!(rows.is_parked(&key("c")));
    }

    #[test]
    fn advance_all_reports_running_tweens() {
        let mut rows = RowRegistry::new(4);
        rows.mount(key("r1"), fingerprint(None), Timing::default());
        let accordion = rows.get_mut(&key("r1")).unwrap();
        accordion.on_measured(50.0, 0.0);
        accordion.toggle(0.0);

        assert!(rows.is_animating());
        assert!(rows.advance_all(300.0));
        assert!(!rows.advance_all(600.0));
        assert!(!rows.is_animating());
    }

    #[test]
    fn retain_keys_drops_parked_and_mounted() {
        let mut rows = RowRegistry::new(4);
        rows.mount(key("gone"), fingerprint(None), Timing::default());
        rows.get_mut(&key("gone")).unwrap().on_measured(10.0, 0.0);
        rows.unmount(&key("gone"));
        rows.mount(key("kept"), fingerprint(None), Timing::default());
        rows.mount(key("dropped"), fingerprint(None), Timing::default());

        let live: HashSet<RecordKey> = [key("kept")].into_iter().collect();
        rows.retain_keys(&live);

        assert_eq!(rows.mounted_len(), 1);
        assert_eq!(rows.retained_len(), 0);
    }
}
