//! Find and cut down over-deep structures in NBT documents.
//!
//! [`walker::analyze`] measures a decoded tree, [`reducer::apply_reductions`]
//! halves the structures it flags, and [`repair::repair`] wraps the reduction
//! in the backup-then-save sequence used by the CLI.
pub mod tag;
pub mod path;
pub mod config;
pub mod walker;
pub mod reducer;
pub mod codec;
pub mod backup;
pub mod error;
pub mod decision;
pub mod repair;
pub mod report;
pub mod cli;

pub use codec::{Compression, NbtFile, read_tree, write_tree};
pub use config::{AnalysisConfig, ReportOptions};
pub use path::{PathSegment, TagPath};
pub use reducer::{ReductionOutcome, ReductionSkip, apply_reductions, reduce};
pub use tag::{List, Scalar, Tag, TagKind};
pub use walker::{Analysis, ProblematicNode, analyze};
