use crate::chart::line::{JudgeLine, LineFields, LineState};
use crate::chart::note::{Judgement, JudgeProfile, Note, NoteKind};
use crate::chart::{Chart, Rgb};
use crate::math::move_and_rotate;
use crate::playback::scroll::note_position;
use glam::Vec2;
use log::{debug, warn};
use smallvec::SmallVec;

/// What a draw descriptor depicts. The renderer maps these onto its skin.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    Line,
    Note(NoteKind),
    HoldHead,
    HoldBody,
    HoldTail,
    HitEffect { judgement: Judgement, frame: u32 },
}

/// Fill for a descriptor: a named skin texture, a flat color, or text.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawContent {
    Texture(String),
    Color(Rgb),
    Text(String),
}

/// One renderer-agnostic draw descriptor. World-space position and size,
/// angle in degrees, alpha already normalized to 0..=1. Descriptors come out
/// of [`Scheduler::frame`] sorted by `priority` ascending, so painting them
/// in order layers them correctly.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub kind: DrawKind,
    pub position: Vec2,
    pub angle: f32,
    pub alpha: f32,
    /// World width and height of the sprite.
    pub size: Vec2,
    pub content: DrawContent,
    pub priority: i32,
    pub highlight: bool,
}

/// One auto-play hit reported by [`Scheduler::advance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteHit {
    pub line: usize,
    pub note: usize,
    pub kind: NoteKind,
    pub judgement: Judgement,
    /// Chart-time second the hit was recorded at.
    pub seconds: f32,
}

/// Hit-effect animation parameters.
#[derive(Clone, Copy, Debug)]
pub struct FxConfig {
    /// Seconds one effect animation lasts.
    pub duration: f32,
    pub perfect_frames: u32,
    pub good_frames: u32,
    /// Seconds between repeated effects along a running hold.
    pub hold_interval: f32,
    /// Effects follow the line's rotation instead of staying upright.
    pub rotate_with_line: bool,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            duration: 0.5,
            perfect_frames: 30,
            good_frames: 30,
            hold_interval: 0.25,
            rotate_with_line: false,
        }
    }
}

/// Sprite proportions, expressed as height over width so they scale with
/// the note width.
#[derive(Clone, Copy, Debug)]
pub struct NoteMetrics {
    pub tap_aspect: f32,
    pub drag_aspect: f32,
    pub flick_aspect: f32,
    pub hold_head_aspect: f32,
    pub hold_tail_aspect: f32,
    /// Width multiplier for simultaneous notes.
    pub highlight_factor: f32,
    /// Keep drawing a hold's head sprite after its start has passed.
    pub hold_keep_head: bool,
}

impl Default for NoteMetrics {
    fn default() -> Self {
        Self {
            tap_aspect: 0.11,
            drag_aspect: 0.066,
            flick_aspect: 0.14,
            hold_head_aspect: 0.05,
            hold_tail_aspect: 0.05,
            highlight_factor: 1.09,
            hold_keep_head: true,
        }
    }
}

/// World-space dimensions of the playfield sprites.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub line_length: f32,
    pub line_width: f32,
    /// Base width of a size-1.0 note.
    pub note_width: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { line_length: 4000.0, line_width: 8.0, note_width: 200.0 }
    }
}

/// Drives auto-play and turns chart state into draw descriptors.
///
/// [`advance`](Self::advance) mutates hit bookkeeping and should run once
/// per frame before [`frame`](Self::frame), which is read-only. Both
/// subtract the chart's audio offset, so callers pass raw playback seconds.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pub profile: JudgeProfile,
    pub fx: FxConfig,
    pub metrics: NoteMetrics,
    pub config: SchedulerConfig,
}

impl Scheduler {
    /// Record auto-play hits up to `seconds` and report the new ones.
    ///
    /// Seeking backwards clears hits whose notes are ahead of the playhead
    /// again, so replaying the same span reports them a second time. Fake
    /// notes are never hit.
    pub fn advance(&self, chart: &mut Chart, seconds: f32) -> Vec<NoteHit> {
        let seconds = seconds - chart.offset_ms / 1000.0;
        let mut hits = Vec::new();
        for (li, line) in chart.lines.iter_mut().enumerate() {
            for (ni, note) in line.notes.iter_mut().enumerate() {
                if let Some(hit) = note.hit_seconds() {
                    if seconds < hit {
                        note.clear_hit();
                    }
                    continue;
                }
                if note.is_fake || seconds < note.start_seconds() {
                    continue;
                }
                note.record_hit(seconds);
                let judgement = note.judgement(&self.profile).unwrap_or(Judgement::Perfect);
                if judgement != Judgement::Perfect {
                    debug!(
                        "late hit on line {li} note {ni}: {:.3}s after its start",
                        seconds - note.start_seconds()
                    );
                }
                hits.push(NoteHit { line: li, note: ni, kind: note.kind, judgement, seconds });
            }
        }
        hits
    }

    /// Draw descriptors for the whole playfield at `seconds`, sorted by
    /// priority. A line whose father chain fails to resolve is skipped with
    /// a warning; the rest of the frame is unaffected.
    pub fn frame(&self, chart: &Chart, seconds: f32) -> Vec<DrawCall> {
        let seconds = seconds - chart.offset_ms / 1000.0;
        let mut calls = Vec::new();

        // Highest z-order first; the stable priority sort below keeps this
        // relative order within each priority band.
        let mut order: Vec<usize> = (0..chart.lines.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(chart.lines[i].z_order));

        for index in order {
            let line = &chart.lines[index];
            let state = match chart.resolve_line(index, seconds, LineFields::ALL) {
                Ok(state) => state,
                Err(err) => {
                    warn!("skipping line {index} this frame: {err}");
                    continue;
                }
            };
            self.push_line(&mut calls, line, &state);
            for note in &line.notes {
                self.push_hit_effects(&mut calls, chart, index, note, seconds);
                self.push_note(&mut calls, line, &state, note, seconds);
            }
        }

        calls.sort_by_key(|c| c.priority);
        calls
    }

    fn push_line(&self, calls: &mut Vec<DrawCall>, line: &JudgeLine, state: &LineState) {
        // The threshold is on the raw summed value; a line alpha of 1 or 2
        // still draws, just very faint.
        if state.alpha <= 0.01 {
            return;
        }
        let alpha = (state.alpha / 255.0).clamp(0.0, 1.0);
        let content = if let Some(texture) = &line.texture {
            DrawContent::Texture(texture.clone())
        } else if let Some(text) = &state.text {
            DrawContent::Text(text.clone())
        } else {
            DrawContent::Color(state.color)
        };
        calls.push(DrawCall {
            kind: DrawKind::Line,
            position: state.position(),
            angle: state.angle,
            alpha,
            size: Vec2::new(
                self.config.line_length * state.scale_x,
                self.config.line_width * state.scale_y,
            ),
            content,
            priority: 0,
            highlight: false,
        });
    }

    fn push_note(
        &self,
        calls: &mut Vec<DrawCall>,
        line: &JudgeLine,
        state: &LineState,
        note: &Note,
        seconds: f32,
    ) {
        // A negative summed line alpha hides the line's notes entirely.
        if state.alpha < 0.0 {
            return;
        }
        if note.start_seconds() - seconds > note.visible_time {
            return;
        }
        // Consumed: hit and fully past. Instant notes vanish on hit, holds
        // keep their body until the tail arrives and then drop whether or
        // not anything judged them (fake holds are never hit).
        if note.hit_seconds().is_some() && seconds >= note.end_seconds() {
            return;
        }
        if note.kind == NoteKind::Hold && seconds >= note.end_seconds() {
            return;
        }

        let pos = note_position(line, state, note, seconds);
        if pos.covered {
            return;
        }

        let mut alpha = (note.alpha / 255.0).clamp(0.0, 1.0);
        // An instant note nobody judged (fake, or advance never ran) fades
        // out across its miss window instead of lingering.
        if note.kind.is_instant() && note.hit_seconds().is_none() && seconds > note.start_seconds()
        {
            let miss = self.profile.miss_window(note.kind);
            if miss <= 0.0 {
                return;
            }
            let fade = 1.0 - (seconds - note.start_seconds()) / miss;
            if fade <= 0.0 {
                return;
            }
            alpha *= fade;
        }
        let width = self.config.note_width
            * note.size
            * if note.highlight { self.metrics.highlight_factor } else { 1.0 };

        if note.kind == NoteKind::Hold {
            let started = seconds >= note.start_seconds();
            if !started || self.metrics.hold_keep_head {
                calls.push(DrawCall {
                    kind: DrawKind::HoldHead,
                    position: pos.head,
                    angle: state.angle,
                    alpha,
                    size: Vec2::new(width, width * self.metrics.hold_head_aspect),
                    content: DrawContent::Color(state.color),
                    priority: note.kind.priority(),
                    highlight: note.highlight,
                });
            }
            calls.push(DrawCall {
                kind: DrawKind::HoldBody,
                position: (pos.head + pos.tail) * 0.5,
                angle: state.angle,
                alpha,
                size: Vec2::new(width, (pos.tail_offset - pos.head_offset).abs()),
                content: DrawContent::Color(state.color),
                priority: note.kind.priority(),
                highlight: note.highlight,
            });
            calls.push(DrawCall {
                kind: DrawKind::HoldTail,
                position: pos.tail,
                angle: state.angle,
                alpha,
                size: Vec2::new(width, width * self.metrics.hold_tail_aspect),
                content: DrawContent::Color(state.color),
                priority: note.kind.priority(),
                highlight: note.highlight,
            });
            return;
        }

        let aspect = match note.kind {
            NoteKind::Tap => self.metrics.tap_aspect,
            NoteKind::Drag => self.metrics.drag_aspect,
            NoteKind::Flick => self.metrics.flick_aspect,
            NoteKind::Hold => unreachable!("holds are emitted as pieces above"),
        };
        calls.push(DrawCall {
            kind: DrawKind::Note(note.kind),
            position: pos.head,
            angle: state.angle,
            alpha,
            size: Vec2::new(width, width * aspect),
            content: DrawContent::Color(state.color),
            priority: note.kind.priority(),
            highlight: note.highlight,
        });
    }

    /// Effect anchors for one hit note. Instant notes flash once at the hit
    /// second; holds repeat every `hold_interval` until the tail.
    fn effect_anchors(&self, note: &Note) -> SmallVec<[f32; 8]> {
        let mut anchors = SmallVec::new();
        let Some(hit) = note.hit_seconds() else {
            return anchors;
        };
        anchors.push(hit);
        if note.kind == NoteKind::Hold && self.fx.hold_interval > 0.0 {
            let mut at = hit + self.fx.hold_interval;
            while at < note.end_seconds() {
                anchors.push(at);
                at += self.fx.hold_interval;
            }
        }
        anchors
    }

    fn push_hit_effects(
        &self,
        calls: &mut Vec<DrawCall>,
        chart: &Chart,
        index: usize,
        note: &Note,
        seconds: f32,
    ) {
        let Some(judgement) = note.judgement(&self.profile) else {
            return;
        };
        let frames = match judgement {
            Judgement::Perfect => self.fx.perfect_frames,
            Judgement::Good => self.fx.good_frames,
            Judgement::Bad => return,
        };
        for anchor in self.effect_anchors(note) {
            let age = seconds - anchor;
            if age < 0.0 || age >= self.fx.duration {
                continue;
            }
            // The effect stays where the line was at the moment it fired.
            let Ok(pose) = chart.resolve_line(index, anchor, LineFields::POSE) else {
                continue;
            };
            let position = move_and_rotate(
                pose.position(),
                pose.angle,
                Vec2::new(note.position_x, note.y_offset),
            );
            let frame =
                ((age / self.fx.duration * frames as f32) as u32).min(frames.saturating_sub(1));
            calls.push(DrawCall {
                kind: DrawKind::HitEffect { judgement, frame },
                position,
                angle: if self.fx.rotate_with_line { pose.angle } else { 0.0 },
                alpha: 1.0,
                size: Vec2::splat(self.config.note_width * note.size),
                content: DrawContent::Color(crate::chart::event::WHITE),
                priority: 5,
                highlight: false,
            });
        }
    }
}
