use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Named easing curves in chart wire order (1..=29).
///
/// Outputs are not clamped to [0, 1]; the back and elastic families
/// deliberately overshoot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EasingKind {
    #[default]
    Linear = 1,
    SineOut = 2,
    SineIn = 3,
    QuadOut = 4,
    QuadIn = 5,
    SineInOut = 6,
    QuadInOut = 7,
    CubicOut = 8,
    CubicIn = 9,
    QuartOut = 10,
    QuartIn = 11,
    CubicInOut = 12,
    QuartInOut = 13,
    QuintOut = 14,
    QuintIn = 15,
    ExpoOut = 16,
    ExpoIn = 17,
    CircOut = 18,
    CircIn = 19,
    BackOut = 20,
    BackIn = 21,
    CircInOut = 22,
    BackInOut = 23,
    ElasticOut = 24,
    ElasticIn = 25,
    BounceOut = 26,
    BounceIn = 27,
    BounceInOut = 28,
    ElasticInOut = 29,
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = 2.0 * PI / 3.0;
const ELASTIC_C5: f32 = 2.0 * PI / 4.5;

#[inline(always)]
fn bounce_out(x: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if x < 1.0 / D1 {
        N1 * x * x
    } else if x < 2.0 / D1 {
        let x = x - 1.5 / D1;
        N1 * x * x + 0.75
    } else if x < 2.5 / D1 {
        let x = x - 2.25 / D1;
        N1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / D1;
        N1 * x * x + 0.984375
    }
}

impl EasingKind {
    /// Sample the curve at `x`. Callers normalize `x` to [0, 1]; the curve
    /// itself is defined for any input so restricted sub-domains stay cheap.
    pub fn apply(self, x: f32) -> f32 {
        use EasingKind::*;
        match self {
            Linear => x,
            SineOut => (x * PI / 2.0).sin(),
            SineIn => 1.0 - (x * PI / 2.0).cos(),
            SineInOut => -((PI * x).cos() - 1.0) / 2.0,
            QuadOut => 1.0 - (1.0 - x) * (1.0 - x),
            QuadIn => x * x,
            QuadInOut => {
                if x < 0.5 {
                    2.0 * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
                }
            }
            CubicOut => 1.0 - (1.0 - x).powi(3),
            CubicIn => x * x * x,
            CubicInOut => {
                if x < 0.5 {
                    4.0 * x * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
                }
            }
            QuartOut => 1.0 - (1.0 - x).powi(4),
            QuartIn => x.powi(4),
            QuartInOut => {
                if x < 0.5 {
                    8.0 * x.powi(4)
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(4) / 2.0
                }
            }
            QuintOut => 1.0 - (1.0 - x).powi(5),
            QuintIn => x.powi(5),
            ExpoOut => {
                if x >= 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * x)
                }
            }
            ExpoIn => {
                if x <= 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * x - 10.0)
                }
            }
            CircOut => (1.0 - (x - 1.0) * (x - 1.0)).max(0.0).sqrt(),
            CircIn => 1.0 - (1.0 - x * x).max(0.0).sqrt(),
            CircInOut => {
                if x < 0.5 {
                    (1.0 - (1.0 - (2.0 * x).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * x + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }
            BackOut => 1.0 + BACK_C3 * (x - 1.0).powi(3) + BACK_C1 * (x - 1.0).powi(2),
            BackIn => BACK_C3 * x * x * x - BACK_C1 * x * x,
            BackInOut => {
                if x < 0.5 {
                    ((2.0 * x).powi(2) * ((BACK_C2 + 1.0) * 2.0 * x - BACK_C2)) / 2.0
                } else {
                    ((2.0 * x - 2.0).powi(2) * ((BACK_C2 + 1.0) * (x * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }
            ElasticOut => {
                if x <= 0.0 {
                    0.0
                } else if x >= 1.0 {
                    1.0
                } else {
                    2.0_f32.powf(-10.0 * x) * ((x * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            ElasticIn => {
                if x <= 0.0 {
                    0.0
                } else if x >= 1.0 {
                    1.0
                } else {
                    -(2.0_f32.powf(10.0 * x - 10.0)) * ((x * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            ElasticInOut => {
                if x <= 0.0 {
                    0.0
                } else if x >= 1.0 {
                    1.0
                } else if x < 0.5 {
                    -(2.0_f32.powf(20.0 * x - 10.0) * ((20.0 * x - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    2.0_f32.powf(-20.0 * x + 10.0) * ((20.0 * x - 11.125) * ELASTIC_C5).sin() / 2.0
                        + 1.0
                }
            }
            BounceOut => bounce_out(x),
            BounceIn => 1.0 - bounce_out(1.0 - x),
            BounceInOut => {
                if x < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * x)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * x - 1.0)) / 2.0
                }
            }
        }
    }
}

impl TryFrom<u8> for EasingKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        use EasingKind::*;
        const TABLE: [EasingKind; 29] = [
            Linear, SineOut, SineIn, QuadOut, QuadIn, SineInOut, QuadInOut, CubicOut, CubicIn,
            QuartOut, QuartIn, CubicInOut, QuartInOut, QuintOut, QuintIn, ExpoOut, ExpoIn,
            CircOut, CircIn, BackOut, BackIn, CircInOut, BackInOut, ElasticOut, ElasticIn,
            BounceOut, BounceIn, BounceInOut, ElasticInOut,
        ];
        match v {
            1..=29 => Ok(TABLE[(v - 1) as usize]),
            other => Err(format!("'{other}' is not a valid easing id (1..=29)")),
        }
    }
}

impl From<EasingKind> for u8 {
    fn from(kind: EasingKind) -> Self {
        kind as u8
    }
}

/// Generic cubic-bezier easing with scalar controls `[x1, y1, x2, y2]`
/// describing the two inner control points of a unit curve.
///
/// Solve the curve parameter whose x component equals the queried progress
/// (Newton iterations, bisection fallback), then return the y component.
pub fn cubic_bezier(points: [f32; 4], x: f32) -> f32 {
    let [p1x, p1y, p2x, p2y] = points;

    // Horner coefficients for B(t) with B(0) = 0, B(1) = 1.
    let cx = 3.0 * p1x;
    let bx = 3.0 * (p2x - p1x) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * p1y;
    let by = 3.0 * (p2y - p1y) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |t: f32| ((ax * t + bx) * t + cx) * t;
    let sample_y = |t: f32| ((ay * t + by) * t + cy) * t;
    let sample_dx = |t: f32| (3.0 * ax * t + 2.0 * bx) * t + cx;

    let x = x.clamp(0.0, 1.0);
    let mut t = x;
    for _ in 0..8 {
        let err = sample_x(t) - x;
        if err.abs() < 1e-6 {
            return sample_y(t);
        }
        let d = sample_dx(t);
        if d.abs() < 1e-6 {
            break;
        }
        t -= err / d;
    }

    // Newton left the bracket or hit a flat spot; bisect instead.
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    t = x;
    while hi - lo > 1e-6 {
        if sample_x(t) < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    sample_y(t)
}
