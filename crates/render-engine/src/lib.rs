//! FieldMerge Render Engine
//!
//! Post-processing of merged frames through an external deinterlace filter.
//!
//! # Pipeline Architecture
//!
//! ```text
//! merged frame ── PNG ──> temp input ──┐
//!                                      ├── ffmpeg -vf yadif
//!                    temp output <─────┘        │
//!                        │                      ▼
//!                        ▼               stderr diagnostics
//!                 deinterlaced frame     (on non-zero exit)
//! ```
//!
//! [`deinterlace::DeinterlaceBridge`] is async; [`worker`] runs it on a
//! background thread and reports back over a channel so a UI event loop
//! never blocks on the filter.

pub mod deinterlace;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use deinterlace::*;
pub use worker::*;
