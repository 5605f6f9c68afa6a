//! Exact ratio arithmetic for integer percentages.
//!
//! Every percentage shown to the learner is an integer rounded half-up
//! (`floor(x + 0.5)`), so `-19.5` becomes `-19` and `76.5` becomes `77`.
//! Scores are integer counts, which lets the arithmetic stay in rationals
//! and avoids float drift such as `100 * (0.6 - 0.8) = -20.000000000000004`.

use std::cmp::Ordering;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// A non-negative-denominator rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Ratio {
    /// Returns `None` when `den` is zero.
    #[must_use]
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        Some(Self::reduced(num * sign, den * sign))
    }

    #[must_use]
    pub fn zero() -> Self {
        Self { num: 0, den: 1 }
    }

    /// `score / total` for a single attempt or aggregate; zero when `total` is zero.
    #[must_use]
    pub fn of(score: u64, total: u64) -> Self {
        Self::new(i128::from(score), i128::from(total)).unwrap_or_else(Self::zero)
    }

    fn reduced(num: i128, den: i128) -> Self {
        let g = gcd(num, den).max(1);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    /// Divides by a positive count; returns zero for a zero count.
    #[must_use]
    pub fn div_count(self, count: usize) -> Self {
        let Ok(count) = i128::try_from(count) else {
            return Self::zero();
        };
        if count == 0 {
            return Self::zero();
        }
        Self::reduced(self.num, self.den * count)
    }

    /// `round_half_up(100 * self)`.
    #[must_use]
    pub fn percent(self) -> i32 {
        let scaled = (200 * self.num + self.den).div_euclid(2 * self.den);
        i32::try_from(scaled).unwrap_or(if scaled < 0 { i32::MIN } else { i32::MAX })
    }

    /// Like [`Ratio::percent`] but clamped to `0..=100`.
    #[must_use]
    pub fn percent_clamped(self) -> u8 {
        u8::try_from(self.percent().clamp(0, 100)).unwrap_or(0)
    }
}

impl Add for Ratio {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::reduced(
            self.num * other.den + other.num * self.den,
            self.den * other.den,
        )
    }
}

impl Sub for Ratio {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::reduced(
            self.num * other.den - other.num * self.den,
            self.den * other.den,
        )
    }
}

impl Sum for Ratio {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// `round_half_up(100 * score / total)`, 0 when `total` is zero.
#[must_use]
pub fn score_percent(score: u64, total: u64) -> u8 {
    Ratio::of(score, total).percent_clamped()
}
