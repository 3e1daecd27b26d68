//! FieldMerge Core
//!
//! Rebuilds an interlaced frame from two separately captured fields:
//! - Raster model shared by fields and merged frames
//! - Merge Engine: row interleaving with vertical/horizontal alignment
//! - Image loading and PNG/JPEG saving
//! - Display adaptation (zoom + pan) for previews
//! - Session object that owns the loaded fields and the latest merge

pub mod display;
pub mod io;
pub mod merge;
pub mod raster;
pub mod session;

pub use merge::{merge_fields, AlignmentOffset};
pub use raster::{Field, MergedFrame, Raster};
pub use session::{FieldSlot, MergeSession};
