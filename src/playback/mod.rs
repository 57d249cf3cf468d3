pub mod scheduler;
pub mod scroll;

pub use scheduler::{
    DrawCall, DrawContent, DrawKind, FxConfig, NoteHit, NoteMetrics, Scheduler, SchedulerConfig,
};
pub use scroll::{NotePosition, integrate_line, integrate_track, note_position};
