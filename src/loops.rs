//! Loop Resolution & Connection Detection
//!
//! A lone loop on an end piece is tied to the anchor, never to a neighbour.
//! Effective loops are derived on every evaluation and never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::section::WebbingSection;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveLoop {
    pub left: bool,
    pub right: bool,
}

impl EffectiveLoop {
    pub fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    fn raw(section: &WebbingSection) -> Self {
        Self::new(section.left_loop, section.right_loop)
    }
}

/// One effective loop per section, same order and count.
pub fn resolve_loops(sections: &[WebbingSection]) -> Vec<EffectiveLoop> {
    let last = sections.len().saturating_sub(1);

    sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            if !section.has_single_loop() {
                return EffectiveLoop::raw(section);
            }
            // A one-section line hits the first-section branch.
            if index == 0 {
                EffectiveLoop::new(false, true)
            } else if index == last {
                EffectiveLoop::new(true, false)
            } else {
                EffectiveLoop::raw(section)
            }
        })
        .collect()
}

/// Boundaries `i` (joining sections `i` and `i + 1`) where a splice exists.
pub fn connection_boundaries(effective: &[EffectiveLoop]) -> Vec<usize> {
    effective
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].right && pair[1].left)
        .map(|(i, _)| i)
        .collect()
}

/// Indices of every section that takes part in at least one splice.
pub fn detect_connections(effective: &[EffectiveLoop]) -> BTreeSet<usize> {
    let mut connected = BTreeSet::new();
    for i in connection_boundaries(effective) {
        connected.insert(i);
        connected.insert(i + 1);
    }
    connected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(left: bool, right: bool) -> WebbingSection {
        WebbingSection::new(10.0).with_loops(left, right)
    }

    #[test]
    fn test_first_single_loop_faces_next_splice() {
        let effective = resolve_loops(&[s(true, false), s(true, true)]);
        assert_eq!(effective[0], EffectiveLoop::new(false, true));
    }

    #[test]
    fn test_last_single_loop_faces_previous_splice() {
        let effective = resolve_loops(&[s(true, true), s(false, true)]);
        assert_eq!(effective[1], EffectiveLoop::new(true, false));
    }

    #[test]
    fn test_middle_and_double_loops_unchanged() {
        let sections = [s(true, true), s(false, true), s(false, false)];
        let effective = resolve_loops(&sections);
        assert_eq!(effective[0], EffectiveLoop::new(true, true));
        assert_eq!(effective[1], EffectiveLoop::new(false, true));
        assert_eq!(effective[2], EffectiveLoop::new(false, false));
    }

    #[test]
    fn test_empty_line() {
        assert!(resolve_loops(&[]).is_empty());
        assert!(detect_connections(&[]).is_empty());
    }

    #[test]
    fn test_detect_connections() {
        let effective = resolve_loops(&[s(false, true), s(true, true), s(false, true), s(true, false)]);
        // 0-1 spliced, 1-2 not (2 has no left loop), 2-3 spliced
        assert_eq!(connection_boundaries(&effective), vec![0, 2]);
        let connected: Vec<_> = detect_connections(&effective).into_iter().collect();
        assert_eq!(connected, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_corrected_end_loop_creates_splice() {
        // Raw left loop on the first piece still splices to its neighbour.
        let effective = resolve_loops(&[s(true, false), s(true, false)]);
        assert_eq!(connection_boundaries(&effective), vec![0]);
    }
}
