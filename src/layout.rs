//! Layout Engine - Abstract Line Geometry
//!
//! Produces logical offsets and flags only. Colors, curves and pixel
//! coordinates belong to the renderer.

use serde::{Deserialize, Serialize};

use crate::loops::{connection_boundaries, resolve_loops};
use crate::section::{Line, RigConfiguration, WebbingSection};

/// Meters of empty line drawn before the first section.
pub const DEFAULT_LEADING_PADDING: f64 = 1.0;

fn default_leading_padding() -> f64 { DEFAULT_LEADING_PADDING }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    #[serde(default = "default_leading_padding")]
    pub leading_padding: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { leading_padding: DEFAULT_LEADING_PADDING }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Loops girth-hitched or otherwise joined directly.
    LoopToLoop,
    /// Loops joined through hardware.
    Shackle,
    Unspecified,
}

impl ConnectorKind {
    pub fn is_emphasized(self) -> bool {
        !matches!(self, ConnectorKind::Unspecified)
    }
}

/// Decides which connector joins two spliced neighbours.
pub trait ConnectorResolver {
    fn resolve(&self, left: &WebbingSection, right: &WebbingSection) -> ConnectorKind;
}

/// Every splice is a plain loop-to-loop connection.
pub struct LoopSpliceResolver;

impl ConnectorResolver for LoopSpliceResolver {
    fn resolve(&self, _left: &WebbingSection, _right: &WebbingSection) -> ConnectorKind {
        ConnectorKind::LoopToLoop
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionGeometry {
    pub start_offset: f64,
    pub end_offset: f64,
    /// Effective (anchor-corrected) loops.
    pub left_loop: bool,
    pub right_loop: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayoutDescriptor {
    pub sections: Vec<SectionGeometry>,
    /// End offset of the last section, or the padding for an empty line.
    pub span: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RigLayout {
    pub main: LayoutDescriptor,
    pub backup: LayoutDescriptor,
}

pub fn layout_line(line: &Line, options: &LayoutOptions) -> LayoutDescriptor {
    layout_line_with(line, options, &LoopSpliceResolver)
}

pub fn layout_line_with(
    line: &Line,
    options: &LayoutOptions,
    resolver: &dyn ConnectorResolver,
) -> LayoutDescriptor {
    let sections = line.sections();
    let effective = resolve_loops(sections);

    let mut highlighted = vec![false; sections.len()];
    for i in connection_boundaries(&effective) {
        if resolver.resolve(&sections[i], &sections[i + 1]).is_emphasized() {
            highlighted[i] = true;
            highlighted[i + 1] = true;
        }
    }

    let mut offset = options.leading_padding;
    let geometry = sections
        .iter()
        .zip(effective)
        .zip(highlighted)
        .map(|((section, loops), highlighted)| {
            let start_offset = offset;
            offset += section.length;
            SectionGeometry {
                start_offset,
                end_offset: offset,
                left_loop: loops.left,
                right_loop: loops.right,
                highlighted,
            }
        })
        .collect();

    LayoutDescriptor {
        sections: geometry,
        span: offset,
    }
}

pub fn layout_rig(
    config: &RigConfiguration,
    options: &LayoutOptions,
    resolver: &dyn ConnectorResolver,
) -> RigLayout {
    RigLayout {
        main: layout_line_with(&config.main, options, resolver),
        backup: layout_line_with(&config.backup, options, resolver),
    }
}
