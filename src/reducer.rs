//! Structural reduction: halve oversized containers and splice them back.
use log::{debug, warn};
use thiserror::Error;

use crate::path::{PathSegment, TagPath};
use crate::tag::{Tag, TagError, TagKind};
use crate::walker::ProblematicNode;

/// Why a single flagged node could not be replaced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReductionSkip {
    #[error("the document root cannot be replaced")]
    EmptyPath,
    #[error("no key `{0}` in compound")]
    MissingKey(String),
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("segment `{segment}` cannot step into a {found}")]
    NotAContainer { segment: PathSegment, found: TagKind },
    #[error(transparent)]
    KindMismatch(#[from] TagError),
}

#[derive(Debug, Default)]
pub struct ReductionOutcome {
    pub applied: usize,
    pub skipped: Vec<(TagPath, ReductionSkip)>,
}

/// Same variant (and list element kind) with the first half of the children.
/// Leaves come back unchanged.
pub fn reduce(tag: &Tag) -> Tag {
    match tag {
        Tag::Leaf(_) => tag.clone(),
        Tag::List(list) => Tag::List(list.prefix(list.len() / 2)),
        Tag::Compound(map) => {
            let mid = map.len() / 2;
            Tag::Compound(map.iter().take(mid).map(|(k, v)| (k.clone(), v.clone())).collect())
        }
    }
}

/// Replace every flagged node (from one prior analysis of `root`) with its
/// reduced form. Unresolvable records are skipped and reported, never fatal.
pub fn apply_reductions(root: &mut Tag, problematic: &[ProblematicNode]) -> ReductionOutcome {
    let mut outcome = ReductionOutcome::default();
    for node in problematic {
        match splice_reduced(root, &node.path) {
            Ok(()) => {
                debug!("reduced {} (max depth {})", node.path, node.max_depth);
                outcome.applied += 1;
            }
            Err(skip) => {
                warn!("skipping {}: {skip}", node.path);
                outcome.skipped.push((node.path.clone(), skip));
            }
        }
    }
    outcome
}

fn splice_reduced(root: &mut Tag, path: &TagPath) -> Result<(), ReductionSkip> {
    let key = path.last().ok_or(ReductionSkip::EmptyPath)?;
    let parent = resolve_mut(root, path.parent())?;
    match (parent, key) {
        (Tag::Compound(map), PathSegment::Key(k)) => {
            let slot = map.get_mut(k).ok_or_else(|| ReductionSkip::MissingKey(k.clone()))?;
            *slot = reduce(slot);
            Ok(())
        }
        (Tag::List(list), PathSegment::Index(i)) => {
            let len = list.len();
            let reduced = match list.items().get(*i) {
                Some(current) => reduce(current),
                None => return Err(ReductionSkip::IndexOutOfRange { index: *i, len }),
            };
            list.replace(*i, reduced)?;
            Ok(())
        }
        (other, segment) => Err(ReductionSkip::NotAContainer {
            segment: segment.clone(),
            found: other.kind(),
        }),
    }
}

fn resolve_mut<'t>(mut tag: &'t mut Tag, segments: &[PathSegment]) -> Result<&'t mut Tag, ReductionSkip> {
    for segment in segments {
        tag = match (tag, segment) {
            (Tag::Compound(map), PathSegment::Key(k)) => {
                map.get_mut(k).ok_or_else(|| ReductionSkip::MissingKey(k.clone()))?
            }
            (Tag::List(list), PathSegment::Index(i)) => {
                let len = list.len();
                list.get_mut(*i).ok_or(ReductionSkip::IndexOutOfRange { index: *i, len })?
            }
            (other, segment) => {
                return Err(ReductionSkip::NotAContainer {
                    segment: segment.clone(),
                    found: other.kind(),
                });
            }
        };
    }
    Ok(tag)
}
