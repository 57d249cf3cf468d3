//! Playback core for RPE-style rhythm charts.
//!
//! A chart is a tempo table, judge lines carrying layered keyframe events,
//! and notes that scroll toward their line along its speed integral. This
//! crate turns a [`chart::Chart`] plus a playback second into resolved line
//! poses, note positions and renderer-agnostic draw descriptors; it does no
//! audio, input or drawing itself.
//!
//! Typical frame loop:
//!
//! ```no_run
//! use phiplay::chart::Chart;
//! use phiplay::playback::Scheduler;
//!
//! # fn chart() -> Chart { unimplemented!() }
//! let mut chart = chart();
//! chart.mark_simultaneous();
//! let scheduler = Scheduler::default();
//! let mut seconds = 0.0;
//! loop {
//!     seconds += 1.0 / 60.0;
//!     for hit in scheduler.advance(&mut chart, seconds) {
//!         // play the hit sound for hit.kind
//!     }
//!     for call in scheduler.frame(&chart, seconds) {
//!         // paint call.kind at call.position
//!     }
//! }
//! ```

pub mod chart;
pub mod error;
pub mod math;
pub mod playback;

pub use chart::{Beats, BpmList, BpmPoint, Chart, EasingKind, Event, JudgeLine, Note, NoteKind};
pub use error::{ConfigurationError, ValidationError};
pub use playback::{DrawCall, NoteHit, Scheduler};
