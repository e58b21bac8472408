//! Section Model - Webbing Sections and Lines
//!
//! A line is an ordered splice of webbing sections from one anchor to the other.
//! Order is physical: index 0 sits at the first anchor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type WebbingId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Main,
    Backup,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Main => "main",
            LineKind::Backup => "backup",
        }
    }
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single physical piece of webbing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebbingSection {
    /// Meters, always positive for a structurally valid configuration.
    pub length: f64,
    #[serde(default)]
    pub left_loop: bool,
    #[serde(default)]
    pub right_loop: bool,
    #[serde(default)]
    pub webbing_id: Option<WebbingId>,
}

impl WebbingSection {
    pub fn new(length: f64) -> Self {
        Self {
            length,
            left_loop: false,
            right_loop: false,
            webbing_id: None,
        }
    }

    pub fn with_loops(mut self, left_loop: bool, right_loop: bool) -> Self {
        self.left_loop = left_loop;
        self.right_loop = right_loop;
        self
    }

    pub fn with_webbing(mut self, webbing_id: impl Into<WebbingId>) -> Self {
        self.webbing_id = Some(webbing_id.into());
        self
    }

    pub fn loop_count(&self) -> usize {
        self.left_loop as usize + self.right_loop as usize
    }

    /// Exactly one of the two loops is set.
    pub fn has_single_loop(&self) -> bool {
        self.left_loop != self.right_loop
    }
}

/// Ordered sections of one line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Line(Vec<WebbingSection>);

impl Line {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn sections(&self) -> &[WebbingSection] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WebbingSection> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WebbingSection> {
        self.0.iter()
    }

    pub fn push(&mut self, section: WebbingSection) {
        self.0.push(section);
    }

    /// Inserts at `index`, clamped to the end of the line.
    pub fn insert(&mut self, index: usize, section: WebbingSection) {
        let index = index.min(self.0.len());
        self.0.insert(index, section);
    }

    pub fn remove(&mut self, index: usize) -> Option<WebbingSection> {
        if index < self.0.len() {
            Some(self.0.remove(index))
        } else {
            None
        }
    }

    /// Swaps the section at `index` for `section`, returning the old one.
    pub fn replace(&mut self, index: usize, section: WebbingSection) -> Option<WebbingSection> {
        self.0
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, section))
    }

    /// First or last position of a line.
    pub fn is_end_index(&self, index: usize) -> bool {
        !self.0.is_empty() && (index == 0 || index == self.0.len() - 1)
    }

    pub fn total_length(&self) -> f64 {
        self.0.iter().map(|s| s.length).sum()
    }

    /// `cumulative[k]` is the summed length of sections `0..=k`.
    pub fn cumulative_lengths(&self) -> Vec<f64> {
        self.0
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s.length;
                Some(*acc)
            })
            .collect()
    }
}

impl From<Vec<WebbingSection>> for Line {
    fn from(sections: Vec<WebbingSection>) -> Self {
        Self(sections)
    }
}

impl FromIterator<WebbingSection> for Line {
    fn from_iter<I: IntoIterator<Item = WebbingSection>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Line {
    type Item = &'a WebbingSection;
    type IntoIter = std::slice::Iter<'a, WebbingSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Highline length must be positive, got {0}")]
    NonPositiveHighlineLength(f64),

    #[error("Section {index} of the {line} line must have a positive length, got {length}")]
    NonPositiveSectionLength {
        line: LineKind,
        index: usize,
        length: f64,
    },
}

/// Immutable snapshot of a rig plan as fed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RigConfiguration {
    #[serde(default)]
    pub main: Line,
    #[serde(default)]
    pub backup: Line,
    pub highline_length: f64,
}

impl RigConfiguration {
    pub fn new(main: Line, backup: Line, highline_length: f64) -> Self {
        Self {
            main,
            backup,
            highline_length,
        }
    }

    pub fn line(&self, kind: LineKind) -> &Line {
        match kind {
            LineKind::Main => &self.main,
            LineKind::Backup => &self.backup,
        }
    }

    /// Caller-side invariants. Empty lines are allowed; they fail the length rule instead.
    pub fn check_invariants(&self) -> Result<(), ConfigurationError> {
        if !(self.highline_length > 0.0) || !self.highline_length.is_finite() {
            return Err(ConfigurationError::NonPositiveHighlineLength(self.highline_length));
        }

        for kind in [LineKind::Main, LineKind::Backup] {
            for (index, section) in self.line(kind).iter().enumerate() {
                if !(section.length > 0.0) || !section.length.is_finite() {
                    return Err(ConfigurationError::NonPositiveSectionLength {
                        line: kind,
                        index,
                        length: section.length,
                    });
                }
            }
        }

        Ok(())
    }
}
