//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured error kinds, at most one per check.
//! Policy (the profile's failure mode) is applied by the pipeline.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profiles::RuleProfile;
use crate::section::{Line, LineKind, RigConfiguration};

/// Configuration-quality signal. Text is for logs only; presentation formats from `code()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("The {line} line is not longer than the highline")]
    TooShort { line: LineKind },

    #[error("End section {section_index} needs at least one loop")]
    MissingEndLoop { section_index: usize },

    #[error("Middle section {section_index} needs loops on both ends")]
    MissingMiddleLoop { section_index: usize },

    #[error("Backup splice after section {backup_section_index} is outside the offset window past main splice {main_section_index}")]
    BadOffset {
        backup_section_index: usize,
        main_section_index: usize,
    },
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::TooShort { .. } => "too_short",
            ErrorKind::MissingEndLoop { .. } => "missing_end_loop",
            ErrorKind::MissingMiddleLoop { .. } => "missing_middle_loop",
            ErrorKind::BadOffset { .. } => "bad_offset",
        }
    }
}

/// The three independent checks, one result slot each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Main,
    Backup,
    Connection,
}

impl From<LineKind> for Check {
    fn from(kind: LineKind) -> Self {
        match kind {
            LineKind::Main => Check::Main,
            LineKind::Backup => Check::Backup,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub main: Option<ErrorKind>,
    pub backup: Option<ErrorKind>,
    pub connection: Option<ErrorKind>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.main.is_none() && self.backup.is_none() && self.connection.is_none()
    }

    pub fn error_for(&self, check: Check) -> Option<ErrorKind> {
        match check {
            Check::Main => self.main,
            Check::Backup => self.backup,
            Check::Connection => self.connection,
        }
    }

    /// Up to three errors, in main, backup, connection order.
    pub fn errors(&self) -> impl Iterator<Item = (Check, ErrorKind)> + '_ {
        [Check::Main, Check::Backup, Check::Connection]
            .into_iter()
            .filter_map(|check| self.error_for(check).map(|e| (check, e)))
    }

    fn set(&mut self, check: Check, error: Option<ErrorKind>) {
        match check {
            Check::Main => self.main = error,
            Check::Backup => self.backup = error,
            Check::Connection => self.connection = error,
        }
    }
}

/// Accepted distance, in meters, from a main splice to the next backup splice. Inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OffsetWindow {
    pub min: f64,
    pub max: f64,
}

impl OffsetWindow {
    pub const STANDARD: OffsetWindow = OffsetWindow { min: 2.0, max: 10.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, diff: f64) -> bool {
        !(diff < self.min || diff > self.max)
    }
}

impl Default for OffsetWindow {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Length sufficiency, then loop placement. First violation wins.
pub fn validate_section_loops(line: &Line, kind: LineKind, highline_length: f64) -> Option<ErrorKind> {
    if line.total_length() <= highline_length {
        return Some(ErrorKind::TooShort { line: kind });
    }

    // One section runs anchor to anchor.
    if line.len() == 1 {
        return None;
    }

    line.iter().enumerate().find_map(|(index, section)| {
        if line.is_end_index(index) {
            (section.loop_count() == 0).then_some(ErrorKind::MissingEndLoop { section_index: index })
        } else {
            (section.loop_count() < 2).then_some(ErrorKind::MissingMiddleLoop { section_index: index })
        }
    })
}

/// Backup splice offsets with the standard 2-10 m window.
pub fn validate_connections(main: &Line, backup: &Line) -> Option<ErrorKind> {
    validate_connections_within(main, backup, OffsetWindow::STANDARD)
}

pub fn validate_connections_within(main: &Line, backup: &Line, window: OffsetWindow) -> Option<ErrorKind> {
    let main_cumulative = main.cumulative_lengths();
    let last_main = main_cumulative.len().saturating_sub(1);

    for (backup_index, backup_pos) in backup.cumulative_lengths().into_iter().enumerate() {
        // Lower bound: first main position not less than the backup position.
        let m = main_cumulative.partition_point(|&pos| pos < backup_pos);
        if m == main_cumulative.len() {
            // Beyond the end of main: exits the whole check, not just this
            // backup section. Kept as-is until the intended behaviour is settled.
            return None;
        }

        let comparison_index = m.saturating_sub(1);
        if comparison_index == last_main {
            continue;
        }

        let diff = backup_pos - main_cumulative[comparison_index];
        if !window.contains(diff) {
            return Some(ErrorKind::BadOffset {
                backup_section_index: backup_index,
                main_section_index: comparison_index,
            });
        }
    }

    None
}

/// Validation rule trait - produces at most one error for its check
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn check(&self) -> Check;
    fn enabled(&self, profile: &RuleProfile) -> bool;
    fn validate(&self, config: &RigConfiguration, profile: &RuleProfile) -> Option<ErrorKind>;
}

// --- Concrete Rules ---

pub struct SectionLoopsRule {
    pub line: LineKind,
}

impl ValidationRule for SectionLoopsRule {
    fn name(&self) -> &'static str {
        match self.line {
            LineKind::Main => "main_section_loops",
            LineKind::Backup => "backup_section_loops",
        }
    }

    fn check(&self) -> Check { self.line.into() }

    fn enabled(&self, profile: &RuleProfile) -> bool {
        profile.rules.section_loops.enabled
    }

    fn validate(&self, config: &RigConfiguration, _profile: &RuleProfile) -> Option<ErrorKind> {
        validate_section_loops(config.line(self.line), self.line, config.highline_length)
    }
}

pub struct ConnectionOffsetRule;

impl ValidationRule for ConnectionOffsetRule {
    fn name(&self) -> &'static str { "connection_offset" }

    fn check(&self) -> Check { Check::Connection }

    fn enabled(&self, profile: &RuleProfile) -> bool {
        profile.rules.connection_offset.enabled
    }

    fn validate(&self, config: &RigConfiguration, profile: &RuleProfile) -> Option<ErrorKind> {
        validate_connections_within(
            &config.main,
            &config.backup,
            profile.rules.connection_offset.window(),
        )
    }
}

/// Validator runs every rule; each fills its own slot.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SectionLoopsRule { line: LineKind::Main }),
                Box::new(SectionLoopsRule { line: LineKind::Backup }),
                Box::new(ConnectionOffsetRule),
            ],
        }
    }

    pub fn validate(&self, config: &RigConfiguration, profile: &RuleProfile) -> ValidationResult {
        let mut result = ValidationResult::default();

        for rule in &self.rules {
            if !rule.enabled(profile) {
                continue;
            }
            let error = rule.validate(config, profile);
            debug!("rule {}: {:?}", rule.name(), error);
            result.set(rule.check(), error);
        }

        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// All three checks with the standard profile.
pub fn validate(config: &RigConfiguration) -> ValidationResult {
    Validator::new().validate(config, &RuleProfile::standard())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::WebbingSection;

    fn lengths(ls: &[f64]) -> Line {
        ls.iter().map(|&l| WebbingSection::new(l).with_loops(true, true)).collect()
    }

    fn looped(sections: &[(f64, bool, bool)]) -> Line {
        sections.iter()
            .map(|&(l, left, right)| WebbingSection::new(l).with_loops(left, right))
            .collect()
    }

    #[test]
    fn test_too_short_skips_loop_checks() {
        let line = looped(&[(30.0, false, false), (30.0, false, false), (40.0, false, false)]);
        assert_eq!(
            validate_section_loops(&line, LineKind::Backup, 100.0),
            Some(ErrorKind::TooShort { line: LineKind::Backup })
        );
    }

    #[test]
    fn test_empty_line_is_too_short() {
        assert_eq!(
            validate_section_loops(&Line::new(), LineKind::Main, 1.0),
            Some(ErrorKind::TooShort { line: LineKind::Main })
        );
    }

    #[test]
    fn test_two_section_line_needs_an_end_loop_each() {
        let line = looped(&[(60.0, false, true), (60.0, false, false)]);
        assert_eq!(
            validate_section_loops(&line, LineKind::Main, 100.0),
            Some(ErrorKind::MissingEndLoop { section_index: 1 })
        );
        let line = looped(&[(60.0, false, true), (60.0, true, false)]);
        assert_eq!(validate_section_loops(&line, LineKind::Main, 100.0), None);
    }

    #[test]
    fn test_first_violation_only() {
        let line = looped(&[(60.0, true, true), (60.0, false, true), (60.0, false, false), (60.0, false, false)]);
        assert_eq!(
            validate_section_loops(&line, LineKind::Main, 100.0),
            Some(ErrorKind::MissingMiddleLoop { section_index: 1 })
        );
    }

    #[test]
    fn test_offset_window_is_inclusive() {
        let main = lengths(&[40.0, 60.0]);
        assert_eq!(validate_connections(&main, &lengths(&[42.0])), None);
        assert_eq!(validate_connections(&main, &lengths(&[50.0])), None);
        assert_eq!(
            validate_connections(&main, &lengths(&[50.5])),
            Some(ErrorKind::BadOffset { backup_section_index: 0, main_section_index: 0 })
        );
    }

    #[test]
    fn test_backup_splice_before_first_main_splice() {
        // Lower bound is main index 0, so the comparison stays at index 0.
        let main = lengths(&[40.0, 60.0]);
        assert_eq!(
            validate_connections(&main, &lengths(&[30.0])),
            Some(ErrorKind::BadOffset { backup_section_index: 0, main_section_index: 0 })
        );
    }

    #[test]
    fn test_splice_at_terminal_main_point_is_skipped() {
        // Single-section main: every comparison lands on the last main index.
        let main = lengths(&[40.0]);
        assert_eq!(validate_connections(&main, &lengths(&[10.0, 25.0])), None);
    }

    #[test]
    fn test_beyond_main_exits_whole_check() {
        let main = lengths(&[40.0, 60.0]);
        let backup = lengths(&[45.0, 155.0]);
        assert_eq!(validate_connections(&main, &backup), None);

        // A bad splice before the escape point is still reported.
        let backup = lengths(&[41.0, 160.0]);
        assert_eq!(
            validate_connections(&main, &backup),
            Some(ErrorKind::BadOffset { backup_section_index: 0, main_section_index: 0 })
        );
    }

    #[test]
    fn test_later_violation_reported_with_its_indices() {
        let main = lengths(&[40.0, 60.0, 50.0]);
        // 45 - 40 = 5 ok, 115 - 100 = 15 bad
        let backup = lengths(&[45.0, 70.0, 40.0]);
        assert_eq!(
            validate_connections(&main, &backup),
            Some(ErrorKind::BadOffset { backup_section_index: 1, main_section_index: 1 })
        );
    }

    #[test]
    fn test_empty_lines_have_no_connection_error() {
        assert_eq!(validate_connections(&Line::new(), &lengths(&[10.0])), None);
        assert_eq!(validate_connections(&lengths(&[10.0]), &Line::new()), None);
    }

    #[test]
    fn test_disabled_rules_leave_slots_empty() {
        let config = RigConfiguration::new(lengths(&[50.0]), lengths(&[40.0]), 100.0);
        let mut profile = RuleProfile::standard();
        profile.rules.section_loops.enabled = false;

        let result = Validator::new().validate(&config, &profile);
        assert!(result.is_valid());

        let result = validate(&config);
        assert_eq!(result.main, Some(ErrorKind::TooShort { line: LineKind::Main }));
        assert_eq!(result.backup, Some(ErrorKind::TooShort { line: LineKind::Backup }));
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_error_kind_wire_format() {
        let e = ErrorKind::BadOffset { backup_section_index: 3, main_section_index: 1 };
        let json = serde_json::to_value(e).unwrap();
        assert_eq!(json["kind"], "bad_offset");
        assert_eq!(json["backup_section_index"], 3);
        assert_eq!(e.code(), "bad_offset");
    }
}
