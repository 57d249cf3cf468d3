use crate::chart::beats::{Beats, BpmList};
use serde::{Deserialize, Serialize};

/// Note kinds in chart wire order. Holds are the only kind with a duration;
/// the other three are instant and keep `end == start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NoteKind {
    Tap = 1,
    Hold = 2,
    Flick = 3,
    Drag = 4,
}

impl NoteKind {
    /// Fixed z-priority for the draw queue. Hit effects sit above all of
    /// these at priority 5.
    #[inline(always)]
    pub fn priority(self) -> i32 {
        match self {
            NoteKind::Hold => 1,
            NoteKind::Drag => 2,
            NoteKind::Tap => 3,
            NoteKind::Flick => 4,
        }
    }

    #[inline(always)]
    pub fn is_instant(self) -> bool {
        self != NoteKind::Hold
    }
}

impl TryFrom<u8> for NoteKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(NoteKind::Tap),
            2 => Ok(NoteKind::Hold),
            3 => Ok(NoteKind::Flick),
            4 => Ok(NoteKind::Drag),
            other => Err(format!("'{other}' is not a valid note kind (1..=4)")),
        }
    }
}

impl From<NoteKind> for u8 {
    fn from(kind: NoteKind) -> Self {
        kind as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Judgement {
    Perfect,
    Good,
    Bad,
}

// Default judgement half-windows in seconds. The playback core only consumes
// these; gameplay tuning lives with the caller.
pub const TAP_PERFECT_S: f32 = 0.08;
pub const TAP_GOOD_S: f32 = 0.16;
pub const TAP_BAD_S: f32 = 0.18;
pub const DRAGFLICK_PERFECT_S: f32 = 0.18;

/// Half-width judgement windows for one note family, in seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JudgeWindows {
    pub perfect: f32,
    pub good: f32,
    pub bad: f32,
}

/// Caller-supplied judgement thresholds per note kind.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JudgeProfile {
    pub tap: JudgeWindows,
    pub hold: JudgeWindows,
    /// Drags and flicks judge as Perfect anywhere inside this window.
    pub drag_flick: f32,
}

impl JudgeProfile {
    pub fn default_phigros() -> Self {
        let tap = JudgeWindows { perfect: TAP_PERFECT_S, good: TAP_GOOD_S, bad: TAP_BAD_S };
        Self { tap, hold: tap, drag_flick: DRAGFLICK_PERFECT_S }
    }

    /// Outer window after which an unjudged note counts as missed; also the
    /// fade-out span for an instant note that crossed its line unjudged.
    #[inline(always)]
    pub fn miss_window(&self, kind: NoteKind) -> f32 {
        match kind {
            NoteKind::Tap => self.tap.bad,
            NoteKind::Hold => self.hold.bad,
            NoteKind::Drag | NoteKind::Flick => self.drag_flick,
        }
    }
}

impl Default for JudgeProfile {
    fn default() -> Self {
        Self::default_phigros()
    }
}

/// One note owned by a judge line.
///
/// `hit_seconds` is the only field playback mutates; everything else is
/// authoring state. Cached seconds are derived from the beats and the BPM
/// list, re-derived by [`Chart::refresh`].
///
/// [`Chart::refresh`]: crate::chart::Chart::refresh
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    pub kind: NoteKind,
    start_beats: Beats,
    end_beats: Beats,
    /// Lane offset along the judge line.
    pub position_x: f32,
    /// Scroll-speed multiplier applied on top of the integrated offset.
    pub speed: f32,
    pub size: f32,
    /// Authoring alpha on the 0..=255 scale.
    pub alpha: f32,
    /// Offset perpendicular to the line, added after the speed integral.
    pub y_offset: f32,
    /// The note is drawn only within this many seconds before its start.
    pub visible_time: f32,
    /// Fake notes render but are never hit.
    pub is_fake: bool,
    /// Side of the line the note approaches from.
    pub above: bool,
    /// Marked by [`Chart::mark_simultaneous`]; skins widen these.
    ///
    /// [`Chart::mark_simultaneous`]: crate::chart::Chart::mark_simultaneous
    #[serde(skip)]
    pub highlight: bool,
    #[serde(skip)]
    hit_seconds: Option<f32>,
    #[serde(skip)]
    start_seconds: f32,
    #[serde(skip)]
    end_seconds: f32,
}

impl Note {
    pub fn new(kind: NoteKind, start_beats: Beats, end_beats: Beats, clock: &BpmList) -> Self {
        let (start_beats, end_beats) = if end_beats < start_beats {
            (end_beats, start_beats)
        } else {
            (start_beats, end_beats)
        };
        let end_beats = if kind.is_instant() { start_beats } else { end_beats };
        Self {
            kind,
            position_x: 0.0,
            speed: 1.0,
            size: 1.0,
            alpha: 255.0,
            y_offset: 0.0,
            visible_time: 999_999.0,
            is_fake: false,
            above: true,
            highlight: false,
            hit_seconds: None,
            start_seconds: clock.time_at(start_beats),
            end_seconds: clock.time_at(end_beats),
            start_beats,
            end_beats,
        }
    }

    /// Instant note helper; `end` follows `start`.
    pub fn instant(kind: NoteKind, beats: Beats, clock: &BpmList) -> Self {
        Self::new(kind, beats, beats, clock)
    }

    #[inline(always)]
    pub fn start_beats(&self) -> Beats {
        self.start_beats
    }

    #[inline(always)]
    pub fn end_beats(&self) -> Beats {
        self.end_beats
    }

    #[inline(always)]
    pub fn start_seconds(&self) -> f32 {
        self.start_seconds
    }

    #[inline(always)]
    pub fn end_seconds(&self) -> f32 {
        self.end_seconds
    }

    pub fn set_span(&mut self, start: Beats, end: Beats, clock: &BpmList) {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        self.start_beats = start;
        self.end_beats = if self.kind.is_instant() { start } else { end };
        self.refresh_seconds(clock);
    }

    pub fn refresh_seconds(&mut self, clock: &BpmList) {
        self.start_seconds = clock.time_at(self.start_beats);
        self.end_seconds = clock.time_at(self.end_beats);
    }

    #[inline(always)]
    pub fn hit_seconds(&self) -> Option<f32> {
        self.hit_seconds
    }

    pub(crate) fn record_hit(&mut self, seconds: f32) {
        self.hit_seconds = Some(seconds);
    }

    pub(crate) fn clear_hit(&mut self) {
        self.hit_seconds = None;
    }

    /// Classify the recorded hit against the caller-supplied thresholds.
    /// `None` when the note has not been hit.
    pub fn judgement(&self, profile: &JudgeProfile) -> Option<Judgement> {
        let hit = self.hit_seconds?;
        let offset = (hit - self.start_seconds).abs();
        let windows = match self.kind {
            NoteKind::Tap => profile.tap,
            NoteKind::Hold => profile.hold,
            NoteKind::Drag | NoteKind::Flick => return Some(Judgement::Perfect),
        };
        Some(if offset <= windows.perfect {
            Judgement::Perfect
        } else if offset <= windows.good {
            Judgement::Good
        } else {
            Judgement::Bad
        })
    }
}
