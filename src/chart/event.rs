use crate::chart::beats::{Beats, BpmList};
use crate::chart::easing::{EasingKind, cubic_bezier};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// RGB channels on the 0..=255 scale, interpolated as floats.
pub type Rgb = [f32; 3];

pub const WHITE: Rgb = [255.0, 255.0, 255.0];

/// One keyframed change of a value over a beat span.
///
/// The span and the easing window are validated fields: an inverted span is
/// auto-swapped and an inverted window is rejected, keeping the previous
/// value. Start/end seconds are derived caches; [`Chart::refresh`] (or any
/// span setter, which takes the tempo table) keeps them in sync with the
/// beats and the BPM list.
///
/// [`Chart::refresh`]: crate::chart::Chart::refresh
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event<T> {
    pub start: T,
    pub end: T,
    pub easing: EasingKind,
    /// Cubic-bezier control quad; takes precedence over `easing` when set.
    pub bezier: Option<[f32; 4]>,
    easing_left: f32,
    easing_right: f32,
    start_beats: Beats,
    end_beats: Beats,
    #[serde(skip)]
    start_seconds: f32,
    #[serde(skip)]
    end_seconds: f32,
}

impl<T> Event<T> {
    pub fn new(start_beats: Beats, end_beats: Beats, start: T, end: T, clock: &BpmList) -> Self {
        let (start_beats, end_beats) = if end_beats < start_beats {
            (end_beats, start_beats)
        } else {
            (start_beats, end_beats)
        };
        Self {
            start,
            end,
            easing: EasingKind::Linear,
            bezier: None,
            easing_left: 0.0,
            easing_right: 1.0,
            start_seconds: clock.time_at(start_beats),
            end_seconds: clock.time_at(end_beats),
            start_beats,
            end_beats,
        }
    }

    pub fn with_easing(mut self, easing: EasingKind) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_easing_window(mut self, left: f32, right: f32) -> Result<Self, ValidationError> {
        self.set_easing_window(left, right)?;
        Ok(self)
    }

    pub fn with_bezier(mut self, points: [f32; 4]) -> Self {
        self.bezier = Some(points);
        self
    }

    /// Restrict the named easing curve to `[left, right]`. Inverted or
    /// out-of-range windows are rejected and the previous window stays.
    pub fn set_easing_window(&mut self, left: f32, right: f32) -> Result<(), ValidationError> {
        if !(0.0..1.0).contains(&left) || !(left..=1.0).contains(&right) || left >= right {
            return Err(ValidationError::BadEasingWindow { left, right });
        }
        self.easing_left = left;
        self.easing_right = right;
        Ok(())
    }

    #[inline(always)]
    pub fn easing_window(&self) -> (f32, f32) {
        (self.easing_left, self.easing_right)
    }

    /// Move the event to a new beat span, auto-swapping an inverted span,
    /// and re-derive the cached seconds.
    pub fn set_span(&mut self, start: Beats, end: Beats, clock: &BpmList) {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        self.start_beats = start;
        self.end_beats = end;
        self.refresh_seconds(clock);
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

    pub fn refresh_seconds(&mut self, clock: &BpmList) {
        self.start_seconds = clock.time_at(self.start_beats);
        self.end_seconds = clock.time_at(self.end_beats);
    }

    /// Shared easing factor for a normalized progress in [0, 1).
    fn factor(&self, progress: f32) -> f32 {
        if let Some(points) = self.bezier {
            return cubic_bezier(points, progress);
        }
        let (left, right) = (self.easing_left, self.easing_right);
        let f_left = self.easing.apply(left);
        let f_right = self.easing.apply(right);
        let dy = f_right - f_left;
        if dy.abs() <= f32::EPSILON {
            // The curve is flat over the window; fall back to linear so the
            // rescale cannot divide by zero.
            return progress;
        }
        (self.easing.apply(progress * (right - left) + left) - f_left) / dy
    }
}

/// Sample a number event at an absolute second.
///
/// At or past the end the value freezes at `end` exactly; that is the
/// intended hold semantics, not clamping drift.
pub fn evaluate_number(event: &Event<f32>, seconds: f32) -> f32 {
    if seconds >= event.end_seconds {
        return event.end;
    }
    let span = event.end_seconds - event.start_seconds;
    if span <= 0.0 {
        return event.end;
    }
    let progress = (seconds - event.start_seconds) / span;
    event.start + event.factor(progress) * (event.end - event.start)
}

/// Sample a color event: three independent channel interpolations, each an
/// ephemeral number event borrowing the parent's easing and bezier setup.
pub fn evaluate_color(event: &Event<Rgb>, seconds: f32) -> Rgb {
    if seconds >= event.end_seconds {
        return event.end;
    }
    let mut out = [0.0; 3];
    for ch in 0..3 {
        out[ch] = evaluate_number(&channel_event(event, ch), seconds);
    }
    out
}

fn channel_event(event: &Event<Rgb>, ch: usize) -> Event<f32> {
    Event {
        start: event.start[ch],
        end: event.end[ch],
        easing: event.easing,
        bezier: event.bezier,
        easing_left: event.easing_left,
        easing_right: event.easing_right,
        start_beats: event.start_beats,
        end_beats: event.end_beats,
        start_seconds: event.start_seconds,
        end_seconds: event.end_seconds,
    }
}

/// Sample a text event. Only prefix pairs animate: the visible length is
/// interpolated through a synthesized number event (reusing the parent's
/// easing and bezier parameters) and the longer string is truncated to the
/// rounded length. Any other pair freezes at `start` until the window ends.
pub fn evaluate_text(event: &Event<String>, seconds: f32) -> String {
    if seconds >= event.end_seconds {
        return event.end.clone();
    }
    let (start, end) = (&event.start, &event.end);
    if !start.starts_with(end.as_str()) && !end.starts_with(start.as_str()) {
        return start.clone();
    }
    let start_len = start.chars().count();
    let end_len = end.chars().count();
    let length_event = Event {
        start: start_len as f32,
        end: end_len as f32,
        easing: event.easing,
        bezier: event.bezier,
        easing_left: event.easing_left,
        easing_right: event.easing_right,
        start_beats: event.start_beats,
        end_beats: event.end_beats,
        start_seconds: event.start_seconds,
        end_seconds: event.end_seconds,
    };
    let length = evaluate_number(&length_event, seconds).round().max(0.0) as usize;
    let longer = if start_len > end_len { start } else { end };
    longer.chars().take(length).collect()
}

/// The nearest past event: largest `start_seconds <= seconds`. Events that
/// share a start second tie-break toward the later list position. Returns
/// `None` when nothing has started yet; callers substitute the field's
/// neutral default.
pub fn find_active_event<'a, T>(events: &'a [Event<T>], seconds: f32) -> Option<&'a Event<T>> {
    let mut active: Option<&Event<T>> = None;
    for event in events {
        if event.start_seconds > seconds {
            continue;
        }
        match active {
            Some(best) if event.start_seconds < best.start_seconds => {}
            _ => active = Some(event),
        }
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> BpmList {
        BpmList::constant(120.0).unwrap()
    }

    fn b(whole: i32) -> Beats {
        Beats::new(whole, 0, 1).unwrap()
    }

    #[test]
    fn freezes_at_end_exactly() {
        let clock = clock();
        let e = Event::new(b(0), b(2), 10.0, 90.0, &clock).with_easing(EasingKind::ElasticOut);
        // 2 beats at 120 BPM end at 1.0s.
        assert_eq!(evaluate_number(&e, 1.0), 90.0);
        assert_eq!(evaluate_number(&e, 100.0), 90.0);
    }

    #[test]
    fn linear_midpoint() {
        let clock = clock();
        let e = Event::new(b(0), b(2), 0.0, 100.0, &clock);
        assert!((evaluate_number(&e, 0.5) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn inverted_span_is_swapped() {
        let clock = clock();
        let e = Event::new(b(4), b(0), 0.0, 1.0, &clock);
        assert_eq!(e.start_beats(), b(0));
        assert_eq!(e.end_beats(), b(4));
        assert!(e.start_seconds() < e.end_seconds());
    }

    #[test]
    fn easing_window_rescales_to_full_output() {
        let clock = clock();
        let full = Event::new(b(0), b(2), 0.0, 1.0, &clock).with_easing(EasingKind::QuadIn);
        let windowed = full.clone().with_easing_window(0.5, 1.0).unwrap();
        // The restricted window must span the full output range.
        assert!(evaluate_number(&windowed, 0.0).abs() < 1e-4);
        assert!((evaluate_number(&windowed, 0.9999) - 1.0).abs() < 1e-2);
        // Quad over [0.5, 1] is steeper than quad from 0, so the windowed
        // midpoint sits below the full curve scaled naively.
        let mid = evaluate_number(&windowed, 0.5);
        let expected = (EasingKind::QuadIn.apply(0.75) - 0.25) / 0.75;
        assert!((mid - expected).abs() < 1e-4);
    }

    #[test]
    fn bad_easing_window_keeps_previous_value() {
        let clock = clock();
        let mut e = Event::new(b(0), b(2), 0.0, 1.0, &clock);
        e.set_easing_window(0.25, 0.75).unwrap();
        assert!(e.set_easing_window(0.9, 0.1).is_err());
        assert!(e.set_easing_window(-0.5, 0.5).is_err());
        assert_eq!(e.easing_window(), (0.25, 0.75));
    }

    #[test]
    fn bezier_takes_precedence() {
        let clock = clock();
        let e = Event::new(b(0), b(2), 0.0, 1.0, &clock)
            .with_easing(EasingKind::ElasticIn)
            .with_bezier([0.0, 0.0, 1.0, 1.0]);
        // Identity bezier, so halfway through the span the value is 0.5.
        assert!((evaluate_number(&e, 0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn color_channels_interpolate_independently() {
        let clock = clock();
        let e = Event::new(b(0), b(2), [0.0, 100.0, 255.0], [255.0, 100.0, 0.0], &clock);
        let mid = evaluate_color(&e, 0.5);
        assert!((mid[0] - 127.5).abs() < 1e-3);
        assert!((mid[1] - 100.0).abs() < 1e-3);
        assert!((mid[2] - 127.5).abs() < 1e-3);
        assert_eq!(evaluate_color(&e, 2.0), [255.0, 100.0, 0.0]);
    }

    #[test]
    fn text_prefix_truncates_by_rounded_length() {
        let clock = clock();
        let e = Event::new(b(0), b(2), "ABC".to_string(), "AB".to_string(), &clock);
        // Halfway: length lerps 3 -> 2, rounds 2.5 away from zero to 3.
        let mid = evaluate_text(&e, 0.5);
        assert!(mid == "ABC" || mid == "AB");
        assert!("ABC".starts_with(&mid));
        assert_eq!(mid.chars().count(), 3);
        assert_eq!(evaluate_text(&e, 1.0), "AB");
    }

    #[test]
    fn text_without_prefix_relation_freezes_at_start() {
        let clock = clock();
        let e = Event::new(b(0), b(2), "left".to_string(), "right".to_string(), &clock);
        assert_eq!(evaluate_text(&e, 0.7), "left");
        assert_eq!(evaluate_text(&e, 1.0), "right");
    }

    #[test]
    fn growing_text_extends_toward_end() {
        let clock = clock();
        let e = Event::new(b(0), b(2), "AB".to_string(), "ABCD".to_string(), &clock);
        let late = evaluate_text(&e, 0.8);
        assert!("ABCD".starts_with(&late));
        assert!(late.chars().count() >= 3);
    }

    #[test]
    fn active_event_prefers_nearest_past_then_later_index() {
        let clock = clock();
        let a = Event::new(b(0), b(1), 1.0, 1.0, &clock);
        let bx = Event::new(b(2), b(3), 2.0, 2.0, &clock);
        let c = Event::new(b(2), b(3), 3.0, 3.0, &clock);
        let events = vec![a, bx, c];
        assert!(find_active_event(&events, -0.1).is_none());
        assert_eq!(find_active_event(&events, 0.2).unwrap().start, 1.0);
        // Equal starts: the later entry wins.
        assert_eq!(find_active_event(&events, 1.5).unwrap().start, 3.0);
    }
}
