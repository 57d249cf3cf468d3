use crate::chart::Chart;
use crate::chart::event::{
    Event, Rgb, WHITE, evaluate_color, evaluate_number, evaluate_text, find_active_event,
};
use crate::chart::note::Note;
use crate::error::ConfigurationError;
use crate::math::move_and_rotate;
use glam::Vec2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// One stack of animatable number tracks. A judge line sums the sampled
/// value of every layer per field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLayer {
    #[serde(default)]
    pub move_x: Vec<Event<f32>>,
    #[serde(default)]
    pub move_y: Vec<Event<f32>>,
    #[serde(default)]
    pub rotate: Vec<Event<f32>>,
    #[serde(default)]
    pub alpha: Vec<Event<f32>>,
    #[serde(default)]
    pub speed: Vec<Event<f32>>,
}

/// Extended tracks; one set per line rather than per layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtendedLayer {
    #[serde(default)]
    pub scale_x: Vec<Event<f32>>,
    #[serde(default)]
    pub scale_y: Vec<Event<f32>>,
    #[serde(default)]
    pub paint: Vec<Event<f32>>,
    #[serde(default)]
    pub color: Vec<Event<Rgb>>,
    #[serde(default)]
    pub text: Vec<Event<String>>,
}

/// A moving, rotating anchor that owns notes and may follow a father line.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JudgeLine {
    #[serde(default)]
    pub event_layers: Vec<EventLayer>,
    #[serde(default)]
    pub extended: ExtendedLayer,
    /// Index of the father line, if any. An out-of-range index is treated as
    /// "no father".
    #[serde(default)]
    pub father: Option<usize>,
    #[serde(default)]
    pub z_order: i32,
    /// Cosmetic texture name the renderer may substitute for the plain line.
    #[serde(default)]
    pub texture: Option<String>,
    /// Cover lines hide notes that have scrolled behind them.
    #[serde(default)]
    pub is_cover: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Field selection mask for [`Chart::resolve_line`]. Selective computation
/// is purely an optimization; every field formula is independent.
///
/// [`Chart::resolve_line`]: crate::chart::Chart::resolve_line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFields(u16);

#[allow(non_upper_case_globals)]
impl LineFields {
    pub const X: Self = Self(1 << 0);
    pub const Y: Self = Self(1 << 1);
    pub const Angle: Self = Self(1 << 2);
    pub const Alpha: Self = Self(1 << 3);
    pub const Speed: Self = Self(1 << 4);
    pub const ScaleX: Self = Self(1 << 5);
    pub const ScaleY: Self = Self(1 << 6);
    pub const Color: Self = Self(1 << 7);
    pub const Paint: Self = Self(1 << 8);
    pub const Text: Self = Self(1 << 9);

    /// The x/y/angle triple father composition needs.
    pub const POSE: Self = Self(0b111);
    pub const ALL: Self = Self(0x3ff);

    #[inline(always)]
    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A judge line's absolute state at one second.
#[derive(Clone, Debug, PartialEq)]
pub struct LineState {
    pub x: f32,
    pub y: f32,
    /// Degrees; positive rotates the +x axis toward -y.
    pub angle: f32,
    /// Summed authoring alpha on the 0..=255 scale; may go negative, which
    /// suppresses the line's notes.
    pub alpha: f32,
    pub speed: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub paint: f32,
    pub color: Rgb,
    pub text: Option<String>,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            alpha: 0.0,
            speed: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            paint: 0.0,
            color: WHITE,
            text: None,
        }
    }
}

impl LineState {
    #[inline(always)]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[inline(always)]
fn sum_track(track: &[Event<f32>], seconds: f32) -> f32 {
    find_active_event(track, seconds).map_or(0.0, |e| evaluate_number(e, seconds))
}

/// Recursive resolution with a call-scoped visited set. Revisiting an index
/// inside one top-level call means the father graph has a cycle; that call
/// aborts without touching any other line's result.
pub(crate) fn resolve_line_inner(
    chart: &Chart,
    index: usize,
    seconds: f32,
    fields: LineFields,
    visited: &mut FxHashSet<usize>,
) -> Result<LineState, ConfigurationError> {
    if !visited.insert(index) {
        return Err(ConfigurationError::CyclicFather(index));
    }
    let line = chart
        .lines
        .get(index)
        .ok_or(ConfigurationError::LineOutOfRange(index))?;

    let mut state = LineState::default();
    for layer in &line.event_layers {
        if fields.contains(LineFields::X) {
            state.x += sum_track(&layer.move_x, seconds);
        }
        if fields.contains(LineFields::Y) {
            state.y += sum_track(&layer.move_y, seconds);
        }
        if fields.contains(LineFields::Angle) {
            state.angle += sum_track(&layer.rotate, seconds);
        }
        if fields.contains(LineFields::Alpha) {
            state.alpha += sum_track(&layer.alpha, seconds);
        }
        if fields.contains(LineFields::Speed) {
            state.speed += sum_track(&layer.speed, seconds);
        }
    }

    if let Some(father) = line.father {
        if father < chart.lines.len() {
            let f = resolve_line_inner(chart, father, seconds, LineFields::POSE, visited)?;
            // Rotate the local offset into the father's frame, then
            // translate. The child keeps its own angle.
            let p = move_and_rotate(f.position(), f.angle, Vec2::new(state.x, state.y));
            state.x = p.x;
            state.y = p.y;
        }
    }

    let ext = &line.extended;
    if fields.contains(LineFields::ScaleX) {
        state.scale_x =
            find_active_event(&ext.scale_x, seconds).map_or(1.0, |e| evaluate_number(e, seconds));
    }
    if fields.contains(LineFields::ScaleY) {
        state.scale_y =
            find_active_event(&ext.scale_y, seconds).map_or(1.0, |e| evaluate_number(e, seconds));
    }
    if fields.contains(LineFields::Paint) {
        state.paint = sum_track(&ext.paint, seconds);
    }
    if fields.contains(LineFields::Color) {
        state.color =
            find_active_event(&ext.color, seconds).map_or(WHITE, |e| evaluate_color(e, seconds));
    }
    if fields.contains(LineFields::Text) {
        state.text = find_active_event(&ext.text, seconds).map(|e| evaluate_text(e, seconds));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::beats::{Beats, BpmList, BpmPoint};
    use crate::chart::easing::EasingKind;

    fn clock() -> BpmList {
        BpmList::constant(120.0).unwrap()
    }

    fn b(whole: i32) -> Beats {
        Beats::new(whole, 0, 1).unwrap()
    }

    fn constant_layer(x: f32, y: f32, angle: f32, alpha: f32, clock: &BpmList) -> EventLayer {
        EventLayer {
            move_x: vec![Event::new(b(0), b(0), x, x, clock)],
            move_y: vec![Event::new(b(0), b(0), y, y, clock)],
            rotate: vec![Event::new(b(0), b(0), angle, angle, clock)],
            alpha: vec![Event::new(b(0), b(0), alpha, alpha, clock)],
            speed: vec![],
        }
    }

    fn chart_with(lines: Vec<JudgeLine>) -> Chart {
        Chart::new(
            vec![BpmPoint { beats: Beats::ZERO, bpm: 120.0 }],
            0.0,
            lines,
        )
        .unwrap()
    }

    #[test]
    fn layers_sum_per_field() {
        let clock = clock();
        let line = JudgeLine {
            event_layers: vec![
                constant_layer(100.0, 10.0, 15.0, 200.0, &clock),
                constant_layer(-30.0, 5.0, -5.0, 55.0, &clock),
            ],
            ..Default::default()
        };
        let chart = chart_with(vec![line]);
        let st = chart.resolve_line(0, 1.0, LineFields::ALL).unwrap();
        assert!((st.x - 70.0).abs() < 1e-4);
        assert!((st.y - 15.0).abs() < 1e-4);
        assert!((st.angle - 10.0).abs() < 1e-4);
        assert!((st.alpha - 255.0).abs() < 1e-4);
        // Neutral defaults where no event is active.
        assert_eq!(st.scale_x, 1.0);
        assert_eq!(st.color, WHITE);
        assert_eq!(st.text, None);
    }

    #[test]
    fn three_level_chain_composes_twice() {
        let clock = clock();
        let grandparent = JudgeLine {
            event_layers: vec![constant_layer(100.0, 50.0, 90.0, 255.0, &clock)],
            ..Default::default()
        };
        let parent = JudgeLine {
            event_layers: vec![constant_layer(10.0, 0.0, 30.0, 255.0, &clock)],
            father: Some(0),
            ..Default::default()
        };
        let child = JudgeLine {
            event_layers: vec![constant_layer(0.0, 20.0, 45.0, 255.0, &clock)],
            father: Some(1),
            ..Default::default()
        };
        let chart = chart_with(vec![grandparent, parent, child]);

        let expected_parent = move_and_rotate(Vec2::new(100.0, 50.0), 90.0, Vec2::new(10.0, 0.0));
        let expected_child = move_and_rotate(expected_parent, 30.0, Vec2::new(0.0, 20.0));

        let st = chart.resolve_line(2, 0.5, LineFields::POSE).unwrap();
        assert!((st.x - expected_child.x).abs() < 1e-3, "{} vs {}", st.x, expected_child.x);
        assert!((st.y - expected_child.y).abs() < 1e-3);
        // Orientation does not inherit.
        assert!((st.angle - 45.0).abs() < 1e-4);

        // Hand-computed: grandparent at (100, 50) rotated 90 degrees sends
        // the parent's +x offset toward -y.
        assert!((expected_parent.x - 100.0).abs() < 1e-3);
        assert!((expected_parent.y - 40.0).abs() < 1e-3);
    }

    #[test]
    fn cycle_is_rejected_not_recursed() {
        let clock = clock();
        let a = JudgeLine {
            event_layers: vec![constant_layer(1.0, 0.0, 0.0, 255.0, &clock)],
            father: Some(1),
            ..Default::default()
        };
        let bline = JudgeLine {
            event_layers: vec![constant_layer(2.0, 0.0, 0.0, 255.0, &clock)],
            father: Some(0),
            ..Default::default()
        };
        let chart = chart_with(vec![a, bline]);
        for index in 0..2 {
            assert!(matches!(
                chart.resolve_line(index, 0.0, LineFields::POSE),
                Err(ConfigurationError::CyclicFather(_))
            ));
        }
    }

    #[test]
    fn out_of_range_father_means_no_father() {
        let clock = clock();
        let line = JudgeLine {
            event_layers: vec![constant_layer(7.0, 8.0, 0.0, 255.0, &clock)],
            father: Some(99),
            ..Default::default()
        };
        let chart = chart_with(vec![line]);
        let st = chart.resolve_line(0, 0.0, LineFields::POSE).unwrap();
        assert_eq!((st.x, st.y), (7.0, 8.0));
    }

    #[test]
    fn eased_track_animates_between_keyframes() {
        let clock = clock();
        let line = JudgeLine {
            event_layers: vec![EventLayer {
                move_x: vec![
                    Event::new(b(0), b(2), 0.0, 100.0, &clock).with_easing(EasingKind::QuadIn),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let chart = chart_with(vec![line]);
        let st = chart.resolve_line(0, 0.5, LineFields::X).unwrap();
        assert!((st.x - 25.0).abs() < 1e-3);
        let frozen = chart.resolve_line(0, 5.0, LineFields::X).unwrap();
        assert_eq!(frozen.x, 100.0);
    }
}
