use crate::error::{ConfigurationError, ValidationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[inline(always)]
fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Exact rational beat time: `whole + num / den`.
///
/// Kept canonical (num < den, fraction reduced) so equality and hashing are
/// exact. Floating conversion happens only at the seconds boundary, which is
/// what keeps long charts from drifting against the audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i32, u32, u32)", into = "(i32, u32, u32)")]
pub struct Beats {
    whole: i32,
    num: u32,
    den: u32,
}

impl Beats {
    pub const ZERO: Self = Self { whole: 0, num: 0, den: 1 };

    pub fn new(whole: i32, num: u32, den: u32) -> Result<Self, ValidationError> {
        if den == 0 {
            return Err(ValidationError::ZeroDenominator);
        }
        let whole = whole.wrapping_add((num / den) as i32);
        let num = num % den;
        let g = gcd(num, den).max(1);
        Ok(Self { whole, num: num / g, den: den / g })
    }

    /// Whole beats, `whole.floor()` semantics for the integer part.
    #[inline(always)]
    pub fn whole(self) -> i32 {
        self.whole
    }

    #[inline(always)]
    pub fn num(self) -> u32 {
        self.num
    }

    #[inline(always)]
    pub fn den(self) -> u32 {
        self.den
    }

    /// Collapse to a floating beat count. Boundary use only; comparisons stay
    /// on the rational form.
    #[inline(always)]
    pub fn value(self) -> f32 {
        self.whole as f32 + self.num as f32 / self.den as f32
    }
}

impl PartialOrd for Beats {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Beats {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross-multiplied exact comparison; i64 cannot overflow with
        // i32 wholes and u32 fractions.
        let a = (self.whole as i64 * self.den as i64 + self.num as i64) * other.den as i64;
        let b = (other.whole as i64 * other.den as i64 + other.num as i64) * self.den as i64;
        a.cmp(&b)
    }
}

impl TryFrom<(i32, u32, u32)> for Beats {
    type Error = ValidationError;

    fn try_from((whole, num, den): (i32, u32, u32)) -> Result<Self, Self::Error> {
        Self::new(whole, num, den)
    }
}

impl From<Beats> for (i32, u32, u32) {
    fn from(b: Beats) -> Self {
        (b.whole, b.num, b.den)
    }
}

impl std::fmt::Display for Beats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}/{}", self.whole, self.num, self.den)
    }
}

/// One tempo change: from `beats` onward the chart runs at `bpm`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BpmPoint {
    pub beats: Beats,
    pub bpm: f32,
}

/// Validated tempo table converting beats to seconds and back.
///
/// Construction checks the table invariants once (non-empty, positive finite
/// BPM, first point at beat 0) and precomputes cumulative seconds per point,
/// so the per-frame conversions are infallible binary searches.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<BpmPoint>", into = "Vec<BpmPoint>")]
pub struct BpmList {
    points: Vec<BpmPoint>,
    cum_seconds: Vec<f32>,
}

impl BpmList {
    pub fn new(mut points: Vec<BpmPoint>) -> Result<Self, ConfigurationError> {
        if points.is_empty() {
            return Err(ConfigurationError::EmptyBpmList);
        }
        for p in &points {
            if !(p.bpm.is_finite() && p.bpm > 0.0) {
                return Err(ConfigurationError::BadBpm { beats: p.beats.value(), bpm: p.bpm });
            }
        }
        points.sort_by(|a, b| a.beats.cmp(&b.beats));
        if points[0].beats != Beats::ZERO {
            return Err(ConfigurationError::FirstBpmOffZero(points[0].beats.value()));
        }

        let mut cum_seconds = Vec::with_capacity(points.len());
        let mut elapsed = 0.0_f32;
        let mut last = &points[0];
        for p in &points {
            elapsed += (p.beats.value() - last.beats.value()) * 60.0 / last.bpm;
            cum_seconds.push(elapsed);
            last = p;
        }
        Ok(Self { points, cum_seconds })
    }

    /// Single tempo point at beat 0, handy for tests and tools.
    pub fn constant(bpm: f32) -> Result<Self, ConfigurationError> {
        Self::new(vec![BpmPoint { beats: Beats::ZERO, bpm }])
    }

    #[inline(always)]
    pub fn points(&self) -> &[BpmPoint] {
        &self.points
    }

    /// Absolute seconds at `beats`: full tempo segments before it plus the
    /// partial segment, each at `segment_beats * 60 / bpm`.
    pub fn time_at(&self, beats: Beats) -> f32 {
        let idx = self
            .points
            .partition_point(|p| p.beats <= beats)
            .saturating_sub(1);
        let p = &self.points[idx];
        self.cum_seconds[idx] + (beats.value() - p.beats.value()) * 60.0 / p.bpm
    }

    /// Inverse of [`time_at`](Self::time_at): locate the tempo segment by
    /// cumulative seconds and solve linearly inside it. Returns a floating
    /// beat count since the result is generally not an exact rational.
    pub fn beats_value_at(&self, seconds: f32) -> f32 {
        let idx = self
            .cum_seconds
            .partition_point(|&t| t <= seconds)
            .saturating_sub(1);
        let p = &self.points[idx];
        p.beats.value() + (seconds - self.cum_seconds[idx]) * p.bpm / 60.0
    }
}

impl TryFrom<Vec<BpmPoint>> for BpmList {
    type Error = ConfigurationError;

    fn try_from(points: Vec<BpmPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<BpmList> for Vec<BpmPoint> {
    fn from(list: BpmList) -> Self {
        list.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(whole: i32, num: u32, den: u32, bpm: f32) -> BpmPoint {
        BpmPoint { beats: Beats::new(whole, num, den).unwrap(), bpm }
    }

    #[test]
    fn beats_normalize_and_reduce() {
        let b = Beats::new(1, 6, 4).unwrap();
        assert_eq!((b.whole(), b.num(), b.den()), (2, 1, 2));
        assert_eq!(b, Beats::new(2, 2, 4).unwrap());
        assert!(Beats::new(0, 1, 0).is_err());
    }

    #[test]
    fn exact_ordering() {
        let a = Beats::new(0, 1, 3).unwrap();
        let b = Beats::new(0, 333_333, 1_000_000).unwrap();
        // Compared on the rational form, not through f32.
        assert!(a > b);
    }

    #[test]
    fn one_beat_at_120_bpm_is_half_a_second() {
        let list = BpmList::constant(120.0).unwrap();
        let t = list.time_at(Beats::new(1, 0, 1).unwrap());
        assert_eq!(t, 0.5);
    }

    #[test]
    fn conversion_round_trips() {
        let list = BpmList::new(vec![
            bp(0, 0, 1, 120.0),
            bp(4, 0, 1, 90.0),
            bp(8, 1, 2, 240.0),
        ])
        .unwrap();
        for &(w, n, d) in &[(0, 0, 1), (2, 1, 4), (4, 0, 1), (6, 3, 8), (8, 1, 2), (17, 2, 3)] {
            let b = Beats::new(w, n, d).unwrap();
            let back = list.beats_value_at(list.time_at(b));
            assert!((back - b.value()).abs() < 1e-3, "{b} -> {back}");
        }
    }

    #[test]
    fn time_is_monotonic_across_tempo_changes() {
        let list = BpmList::new(vec![bp(0, 0, 1, 60.0), bp(2, 0, 1, 200.0)]).unwrap();
        let mut last = f32::MIN;
        for i in 0..40 {
            let t = list.time_at(Beats::new(i / 8, (i % 8) as u32, 8).unwrap());
            assert!(t > last);
            last = t;
        }
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(BpmList::new(vec![]).unwrap_err(), ConfigurationError::EmptyBpmList);
        assert!(matches!(
            BpmList::new(vec![bp(0, 0, 1, 0.0)]),
            Err(ConfigurationError::BadBpm { .. })
        ));
        assert!(matches!(
            BpmList::new(vec![bp(0, 0, 1, -120.0)]),
            Err(ConfigurationError::BadBpm { .. })
        ));
        assert!(matches!(
            BpmList::new(vec![bp(1, 0, 1, 120.0)]),
            Err(ConfigurationError::FirstBpmOffZero(_))
        ));
    }
}
