pub mod beats;
pub mod easing;
pub mod event;
pub mod line;
pub mod note;

pub use beats::{Beats, BpmList, BpmPoint};
pub use easing::{EasingKind, cubic_bezier};
pub use event::{Event, Rgb, evaluate_color, evaluate_number, evaluate_text, find_active_event};
pub use line::{EventLayer, ExtendedLayer, JudgeLine, LineFields, LineState};
pub use note::{Judgement, JudgeProfile, JudgeWindows, Note, NoteKind};

use crate::error::ConfigurationError;
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// A loaded chart: validated tempo table plus ordered judge lines.
///
/// Cached seconds on events and notes are derived from their beats and the
/// BPM list. Construction derives them; after in-place edits call
/// [`refresh`](Self::refresh), and after deserializing call it before
/// playback — the caches do not travel on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chart {
    bpm: BpmList,
    /// Audio offset in milliseconds, subtracted from every query second by
    /// the scheduler.
    pub offset_ms: f32,
    pub lines: Vec<JudgeLine>,
}

impl Chart {
    pub fn new(
        bpm: Vec<BpmPoint>,
        offset_ms: f32,
        lines: Vec<JudgeLine>,
    ) -> Result<Self, ConfigurationError> {
        let bpm = BpmList::new(bpm)?;
        let mut chart = Self { bpm, offset_ms, lines };
        chart.refresh();
        info!(
            "chart loaded: {} judge lines, {} notes, {} tempo points",
            chart.lines.len(),
            chart.note_count(),
            chart.bpm.points().len()
        );
        Ok(chart)
    }

    #[inline(always)]
    pub fn bpm(&self) -> &BpmList {
        &self.bpm
    }

    /// Replace the tempo table. Every cached second in the chart depends on
    /// it, so a successful swap re-derives them all.
    pub fn set_bpm_list(&mut self, points: Vec<BpmPoint>) -> Result<(), ConfigurationError> {
        self.bpm = BpmList::new(points)?;
        self.refresh();
        Ok(())
    }

    /// Re-derive cached seconds from beats and re-sort speed tracks by start
    /// beats, the order the integrator requires.
    pub fn refresh(&mut self) {
        let bpm = &self.bpm;
        for line in &mut self.lines {
            for layer in &mut line.event_layers {
                for e in &mut layer.move_x {
                    e.refresh_seconds(bpm);
                }
                for e in &mut layer.move_y {
                    e.refresh_seconds(bpm);
                }
                for e in &mut layer.rotate {
                    e.refresh_seconds(bpm);
                }
                for e in &mut layer.alpha {
                    e.refresh_seconds(bpm);
                }
                for e in &mut layer.speed {
                    e.refresh_seconds(bpm);
                }
                layer.speed.sort_by(|a, b| a.start_beats().cmp(&b.start_beats()));
            }
            for e in &mut line.extended.scale_x {
                e.refresh_seconds(bpm);
            }
            for e in &mut line.extended.scale_y {
                e.refresh_seconds(bpm);
            }
            for e in &mut line.extended.paint {
                e.refresh_seconds(bpm);
            }
            for e in &mut line.extended.color {
                e.refresh_seconds(bpm);
            }
            for e in &mut line.extended.text {
                e.refresh_seconds(bpm);
            }
            for note in &mut line.notes {
                note.refresh_seconds(bpm);
            }
        }
    }

    /// Absolute state of one judge line at `seconds`. Father chains are
    /// followed recursively; a cycle aborts only this call.
    pub fn resolve_line(
        &self,
        index: usize,
        seconds: f32,
        fields: LineFields,
    ) -> Result<LineState, ConfigurationError> {
        let mut visited = FxHashSet::default();
        line::resolve_line_inner(self, index, seconds, fields, &mut visited)
    }

    /// Flag notes that start on the same exact beat anywhere in the chart;
    /// skins render those wider. Exact rational equality, no epsilon.
    pub fn mark_simultaneous(&mut self) {
        let mut counts: FxHashMap<Beats, u32> = FxHashMap::default();
        for line in &self.lines {
            for note in &line.notes {
                *counts.entry(note.start_beats()).or_default() += 1;
            }
        }
        for line in &mut self.lines {
            for note in &mut line.notes {
                note.highlight = counts[&note.start_beats()] > 1;
            }
        }
    }

    pub fn note_count(&self) -> usize {
        self.lines.iter().map(|l| l.notes.len()).sum()
    }
}
