//! Depth analysis over an NBT tree.
//!
//! One depth-first pass computes, for the whole document:
//! - the maximum nesting depth and the path to the node that reaches it,
//! - the total node count,
//! - a histogram of subtree depths keyed by depth,
//! - the containers whose subtree meets the warning threshold.
//!
//! Depth counting: the root sits at depth 0 and every step into a child adds
//! one. A leaf reports its own depth; an empty container reports its own depth;
//! any other container reports the largest depth among its children. Ties go to
//! the child met first in insertion/index order.
//!
//! The walk never mutates the tree. Flagged nodes are recorded by path so the
//! reducer can re-resolve them later under a fresh mutable borrow.
use std::collections::BTreeMap;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::path::{PathSegment, TagPath};
use crate::tag::Tag;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Subtree depth → paths of every node whose subtree reaches that depth.
/// Duplicates are kept here; the report collapses them.
pub type DepthHistogram = BTreeMap<usize, Vec<TagPath>>;

/// A container whose subtree meets the warning threshold.
///
/// Parent and key-in-parent are `path.parent()` / `path.last()`. The record
/// goes stale once the tree is mutated along that path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblematicNode {
    pub path: TagPath,
    /// Depth of the node itself.
    pub level: usize,
    /// Depth reached inside its subtree.
    pub max_depth: usize,
}

/// A root child measured as if it were the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopLevel {
    pub segment: PathSegment,
    /// Max depth counted from this child (0 for a leaf or empty container).
    pub depth: usize,
    /// Path to its deepest node, starting with `segment`.
    pub deep_path: TagPath,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub max_depth: usize,
    pub max_path: TagPath,
    pub total_nodes: usize,
    pub histogram: DepthHistogram,
    pub problematic: Vec<ProblematicNode>,
    pub top_level: Vec<TopLevel>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

pub fn analyze(root: &Tag, config: &AnalysisConfig) -> Analysis {
    let mut acc = Accumulator {
        config,
        path: TagPath::root(),
        histogram: DepthHistogram::new(),
        problematic: Vec::new(),
        top_level: Vec::new(),
    };
    let visit = acc.visit(root, 0);
    Analysis {
        max_depth: visit.max_depth,
        max_path: visit.suffix.into_iter().rev().collect(),
        total_nodes: visit.size,
        histogram: acc.histogram,
        problematic: acc.problematic,
        top_level: acc.top_level,
    }
}

/// Result of visiting one subtree.
struct Visit {
    max_depth: usize,
    /// Path from this node down to its deepest descendant, stored leaf-first
    /// so parents extend it with a push.
    suffix: Vec<PathSegment>,
    size: usize,
}

/// Explicit accumulator threaded through the recursion; `path` always holds
/// the segments of the node being visited.
struct Accumulator<'a> {
    config: &'a AnalysisConfig,
    path: TagPath,
    histogram: DepthHistogram,
    problematic: Vec<ProblematicNode>,
    top_level: Vec<TopLevel>,
}

impl Accumulator<'_> {
    fn visit(&mut self, tag: &Tag, depth: usize) -> Visit {
        match tag {
            Tag::Leaf(_) => Visit { max_depth: depth, suffix: Vec::new(), size: 1 },
            Tag::List(list) => self.visit_children(
                depth,
                list.items().iter().enumerate().map(|(i, child)| (PathSegment::Index(i), child)),
            ),
            Tag::Compound(map) => self.visit_children(
                depth,
                map.iter().map(|(key, child)| (PathSegment::Key(key.clone()), child)),
            ),
        }
    }

    fn visit_children<'t>(
        &mut self,
        depth: usize,
        children: impl Iterator<Item = (PathSegment, &'t Tag)>,
    ) -> Visit {
        let mut out = Visit { max_depth: depth, suffix: Vec::new(), size: 1 };
        let mut seen_child = false;

        for (segment, child) in children {
            self.path.push(segment.clone());
            let mark = self.problematic.len();
            let visit = self.visit(child, depth + 1);

            out.size += visit.size;
            self.histogram.entry(visit.max_depth).or_default().push(self.path.clone());

            if child.is_container() && visit.max_depth >= self.config.warning_depth {
                // keep only the topmost flagged node on this branch
                self.problematic.truncate(mark);
                self.problematic.push(ProblematicNode {
                    path: self.path.clone(),
                    level: depth + 1,
                    max_depth: visit.max_depth,
                });
            }
            if depth == 0 {
                self.top_level.push(TopLevel {
                    segment: segment.clone(),
                    depth: visit.max_depth - 1,
                    deep_path: std::iter::once(segment.clone())
                        .chain(visit.suffix.iter().rev().cloned())
                        .collect(),
                });
            }
            self.path.pop();

            // strict `>`: earlier siblings win ties
            if !seen_child || visit.max_depth > out.max_depth {
                seen_child = true;
                out.max_depth = visit.max_depth;
                out.suffix = visit.suffix;
                out.suffix.push(segment);
            }
        }
        out
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
