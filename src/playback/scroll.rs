use crate::chart::event::{Event, evaluate_number};
use crate::chart::line::{JudgeLine, LineState};
use crate::chart::note::{Note, NoteKind};
use crate::math::move_and_rotate;
use glam::Vec2;

#[inline(always)]
fn trapezoid(a: f32, b: f32, h: f32) -> f32 {
    (a + b) * h * 0.5
}

/// Integral of one speed track over the window `[l, r]`.
///
/// The speed signal is the eased event value inside each event and holds the
/// prior event's end value flat across the gap to the next event (and past
/// the final event forever). Each event and each gap is tested against the
/// window in four overlap shapes — window inside the segment, window
/// covering it, and the two single-edge overlaps — so adjacent windows agree
/// exactly at shared boundaries. Tracks must be sorted by start beats;
/// [`Chart::refresh`] maintains that order.
///
/// [`Chart::refresh`]: crate::chart::Chart::refresh
pub fn integrate_track(track: &[Event<f32>], l: f32, r: f32) -> f32 {
    let mut total = 0.0_f32;
    for (i, cur) in track.iter().enumerate() {
        let cs = cur.start_seconds();
        let ce = cur.end_seconds();
        let ns = track.get(i + 1).map_or(f32::INFINITY, |n| n.start_seconds());

        // Event span: trapezoids on the eased signal.
        if cs <= l && l <= ce && ce <= r {
            total += trapezoid(evaluate_number(cur, l), cur.end, ce - l);
        } else if l <= cs && cs <= r && r <= ce {
            total += trapezoid(cur.start, evaluate_number(cur, r), r - cs);
        } else if l <= cs && ce <= r {
            total += trapezoid(cur.start, cur.end, ce - cs);
        } else if cs <= l && r <= ce {
            total += trapezoid(evaluate_number(cur, l), evaluate_number(cur, r), r - l);
        }

        // Gap to the next event: flat at this event's end value.
        if ce <= l && l <= ns && ns <= r {
            total += cur.end * (ns - l);
        } else if l <= ce && ns <= r {
            total += cur.end * (ns - ce);
        } else if l <= ce && ce <= r && r <= ns {
            total += cur.end * (r - ce);
        } else if ce <= l && r <= ns {
            total += cur.end * (r - l);
        }
    }
    total
}

/// Integral of a line's whole speed signal: layer tracks sum.
pub fn integrate_line(line: &JudgeLine, l: f32, r: f32) -> f32 {
    line.event_layers
        .iter()
        .map(|layer| integrate_track(&layer.speed, l, r))
        .sum()
}

/// Where a note's head and tail sit right now, in world space.
#[derive(Clone, Copy, Debug)]
pub struct NotePosition {
    pub head: Vec2,
    pub tail: Vec2,
    /// Signed local offsets perpendicular to the line, after the speed
    /// multiplier, side sign and y offset.
    pub head_offset: f32,
    pub tail_offset: f32,
    /// Obscured by a cover line; must not be drawn.
    pub covered: bool,
}

/// Both scroll offsets for one note at the reference second, plus the world
/// positions through the line's pose.
///
/// The head window is anchored at the note's start, the tail window at its
/// end, both against the same reference second. Once the reference second
/// passes an anchor that offset flips sign: the note has moved from
/// "approaching" to "behind" the line. Hold heads whose start has passed
/// stay pinned to the line instead of scrolling on.
pub fn note_position(line: &JudgeLine, pose: &LineState, note: &Note, seconds: f32) -> NotePosition {
    let ns = note.start_seconds();
    let ne = note.end_seconds();

    let mut head_offset = if note.kind == NoteKind::Hold && ns < seconds {
        0.0
    } else {
        integrate_line(line, seconds.min(ns), seconds.max(ns))
    };
    let mut tail_offset = integrate_line(line, seconds.min(ne), seconds.max(ne));

    if seconds >= ns {
        head_offset = -head_offset;
    }
    if seconds >= ne {
        tail_offset = -tail_offset;
    }
    let covered = line.is_cover && tail_offset < 0.0 && seconds < ne;

    let dir = if note.above { 1.0 } else { -1.0 };
    head_offset = head_offset * note.speed * dir + note.y_offset;
    tail_offset = tail_offset * note.speed * dir + note.y_offset;

    let head = move_and_rotate(pose.position(), pose.angle, Vec2::new(note.position_x, head_offset));
    let tail = move_and_rotate(pose.position(), pose.angle, Vec2::new(note.position_x, tail_offset));
    NotePosition { head, tail, head_offset, tail_offset, covered }
}
