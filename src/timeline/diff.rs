use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::timeline::model::Overlay;

/// An overlay that appeared or disappeared between versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub id: String,
    pub overlay: Overlay,
}

/// An overlay present in both versions with changed content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffChange {
    pub id: String,
    pub before: Overlay,
    pub after: Overlay,
}

/// Structural diff between two overlay lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayDiff {
    pub added: Vec<DiffEntry>,
    pub removed: Vec<DiffEntry>,
    pub updated: Vec<DiffChange>,
}

impl OverlayDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Diff key: the overlay id when present, else the positional index.
/// Index keys are stable only within a single list; they exist so legacy
/// unkeyed payloads still diff instead of erroring.
fn overlay_key(overlay: &Overlay, idx: usize) -> String {
    let id = overlay.id.trim();
    if id.is_empty() {
        format!("idx_{idx}")
    } else {
        id.to_string()
    }
}

/// Compute added/removed/updated overlays between two lists.
///
/// Updated compares whole objects; any field change counts. Output order
/// follows the current list for added/updated and the previous list for
/// removed, so identical inputs always produce identical output.
pub fn diff_overlays(previous: &[Overlay], current: &[Overlay]) -> OverlayDiff {
    let prev_map: HashMap<String, &Overlay> = previous
        .iter()
        .enumerate()
        .map(|(i, o)| (overlay_key(o, i), o))
        .collect();
    let curr_map: HashMap<String, &Overlay> = current
        .iter()
        .enumerate()
        .map(|(i, o)| (overlay_key(o, i), o))
        .collect();

    let mut diff = OverlayDiff::default();
    let mut seen = std::collections::HashSet::new();

    for (idx, overlay) in current.iter().enumerate() {
        let key = overlay_key(overlay, idx);
        if !seen.insert(key.clone()) {
            continue;
        }
        match prev_map.get(&key) {
            None => diff.added.push(DiffEntry {
                id: key,
                overlay: overlay.clone(),
            }),
            Some(before) if *before != overlay => diff.updated.push(DiffChange {
                id: key,
                before: (*before).clone(),
                after: overlay.clone(),
            }),
            Some(_) => {}
        }
    }

    seen.clear();
    for (idx, overlay) in previous.iter().enumerate() {
        let key = overlay_key(overlay, idx);
        if !seen.insert(key.clone()) {
            continue;
        }
        if !curr_map.contains_key(&key) {
            diff.removed.push(DiffEntry {
                id: key,
                overlay: overlay.clone(),
            });
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::model::{Anchor, Position};

    fn overlay(id: &str, text: &str) -> Overlay {
        Overlay {
            id: id.to_string(),
            kind: "callout".to_string(),
            start_sec: 1.0,
            end_sec: 2.0,
            text: text.to_string(),
            position: Position {
                x: 0.5,
                y: 0.5,
                anchor: Anchor::Center,
            },
            style: Default::default(),
            asset_ref: None,
        }
    }

    #[test]
    fn identical_lists_diff_empty() {
        let overlays = vec![overlay("a", "one"), overlay("b", "two")];
        let diff = diff_overlays(&overlays, &overlays);
        assert!(diff.is_empty());
    }

    #[test]
    fn added_removed_updated_are_partitioned_by_id() {
        let previous = vec![overlay("a", "one"), overlay("b", "two")];
        let current = vec![overlay("a", "one changed"), overlay("c", "three")];

        let diff = diff_overlays(&previous, &current);

        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].id, "a");
        assert_eq!(diff.updated[0].before.text, "one");
        assert_eq!(diff.updated[0].after.text, "one changed");

        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].id, "b");

        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].id, "c");
    }

    #[test]
    fn unkeyed_overlays_fall_back_to_positional_keys() {
        let previous = vec![overlay("", "one"), overlay("", "two")];
        let mut current = previous.clone();
        current[1].text = "two changed".to_string();

        let diff = diff_overlays(&previous, &current);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].id, "idx_1");
    }

    #[test]
    fn output_order_follows_input_order() {
        let previous = vec![overlay("a", "1"), overlay("b", "2"), overlay("c", "3")];
        let current = vec![overlay("d", "4"), overlay("e", "5")];

        let diff = diff_overlays(&previous, &current);
        let added: Vec<&str> = diff.added.iter().map(|e| e.id.as_str()).collect();
        let removed: Vec<&str> = diff.removed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(added, vec!["d", "e"]);
        assert_eq!(removed, vec!["a", "b", "c"]);
    }

    #[test]
    fn style_change_counts_as_update() {
        let previous = vec![overlay("a", "one"), overlay("cta1", "go")];
        let mut current = previous.clone();
        current[1]
            .style
            .insert("font_size".into(), serde_json::json!(72));

        let diff = diff_overlays(&previous, &current);
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].id, "cta1");
    }
}
