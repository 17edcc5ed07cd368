//! Exact rational frame rates.
//!
//! ffprobe reports rates as fractions ("30000/1001") and occasionally as
//! decimals ("29.97"). Both are kept exact: a decimal becomes a fraction over a
//! power of ten before reduction. Values are always stored reduced, so the
//! derived equality is exact equality.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Longest decimal fraction accepted when parsing "29.97" style strings.
const MAX_DECIMAL_DIGITS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    num: u32,
    den: u32,
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl FrameRate {
    /// Builds a reduced rate; `None` when either part is zero or the reduced
    /// value does not fit in 32 bits.
    #[must_use]
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }
        let g = gcd(num, den);
        Some(Self {
            num: u32::try_from(num / g).ok()?,
            den: u32::try_from(den / g).ok()?,
        })
    }

    /// Whole-number rate such as 60/1.
    #[must_use]
    pub const fn integer(fps: u32) -> Self {
        // Callers pass non-zero literals; zero is clamped to 1.
        Self {
            num: if fps == 0 { 1 } else { fps },
            den: 1,
        }
    }

    #[must_use]
    pub fn num(&self) -> u32 {
        self.num
    }

    #[must_use]
    pub fn den(&self) -> u32 {
        self.den
    }

    /// Approximate value for display and progress math only.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Parses ffprobe notation. "0/0" and other degenerate values yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((num, den)) = s.split_once('/') {
            let num = num.trim().parse::<u64>().ok()?;
            let den = den.trim().parse::<u64>().ok()?;
            return Self::new(num, den);
        }
        if let Some((int_part, frac_part)) = s.split_once('.') {
            if frac_part.is_empty() || frac_part.len() > MAX_DECIMAL_DIGITS {
                return None;
            }
            if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let int_value = if int_part.is_empty() {
                0
            } else {
                int_part.parse::<u64>().ok()?
            };
            let scale = 10u64.pow(frac_part.len() as u32);
            let frac_value = frac_part.parse::<u64>().ok()?;
            let num = int_value.checked_mul(scale)?.checked_add(frac_value)?;
            return Self::new(num, scale);
        }
        Self::new(s.parse::<u64>().ok()?, 1)
    }
}

impl Ord for FrameRate {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.num) * u64::from(other.den);
        let rhs = u64::from(other.num) * u64::from(self.den);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for FrameRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for FrameRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid frame rate '{s}'"))
    }
}

impl Serialize for FrameRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraction_reduces() {
        let rate = FrameRate::parse("60000/2002").unwrap();
        assert_eq!((rate.num(), rate.den()), (30000, 1001));
        assert_eq!(FrameRate::parse("25/1"), Some(FrameRate::integer(25)));
    }

    #[test]
    fn test_parse_integer_and_decimal() {
        assert_eq!(FrameRate::parse("24"), Some(FrameRate::integer(24)));
        let ntsc = FrameRate::parse("29.97").unwrap();
        assert_eq!((ntsc.num(), ntsc.den()), (2997, 100));
        assert_eq!(FrameRate::parse("30.0"), Some(FrameRate::integer(30)));
    }

    #[test]
    fn test_parse_rejects_degenerate_values() {
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("30/0"), None);
        assert_eq!(FrameRate::parse("0"), None);
        assert_eq!(FrameRate::parse(""), None);
        assert_eq!(FrameRate::parse("abc"), None);
        assert_eq!(FrameRate::parse("-25"), None);
        assert_eq!(FrameRate::parse("29."), None);
    }

    #[test]
    fn test_exact_comparison() {
        let ntsc = FrameRate::parse("30000/1001").unwrap();
        let thirty = FrameRate::integer(30);
        assert!(ntsc < thirty);
        assert!(FrameRate::integer(120) > FrameRate::integer(60));
        // 29.97 decimal is not the same rate as 30000/1001.
        assert_ne!(FrameRate::parse("29.97").unwrap(), ntsc);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameRate::integer(60).to_string(), "60");
        assert_eq!(FrameRate::parse("30000/1001").unwrap().to_string(), "30000/1001");
    }
}
