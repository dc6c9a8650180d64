// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Core Primitives
//!
//! Generic interval arithmetic. Everything time-related in the engine (accessibility windows,
//! analysis horizons, elementary slices) is an [`Interval`] over some ordered point type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;

/// A half-open interval `[start, end)`.
///
/// The start is inclusive and the end is exclusive, so `[start, end)` contains every `x`
/// with `start <= x < end`.
///
/// # Examples
///
/// ```
/// use rescue_alloc_core::primitives::Interval;
/// let interval = Interval::new(1, 5);
/// assert_eq!(interval.start(), 1);
/// assert_eq!(interval.end(), 5);
/// assert!(interval.contains(3));
/// assert!(!interval.contains(5));
/// assert_eq!(interval.length::<i32>(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval<T> {
    #[serde(rename = "start")]
    start_inclusive: T,
    #[serde(rename = "end")]
    end_exclusive: T,
}

impl<T> Interval<T> {
    /// Creates a new half-open interval `[start, end)`.
    ///
    /// The bounds are ordered on construction, so `Interval::new(5, 3)` is `[3, 5)`.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are not comparable (NaN).
    #[inline]
    pub fn new(a: T, b: T) -> Self
    where
        T: PartialOrd + Copy,
    {
        let ord = a
            .partial_cmp(&b)
            .expect("Interval::new: non-comparable bounds (NaN?)");
        let (s, e) = match ord {
            Ordering::Greater => (b, a),
            _ => (a, b),
        };
        Self {
            start_inclusive: s,
            end_exclusive: e,
        }
    }

    #[inline]
    pub fn start(&self) -> T
    where
        T: Copy,
    {
        self.start_inclusive
    }

    #[inline]
    pub fn end(&self) -> T
    where
        T: Copy,
    {
        self.end_exclusive
    }

    /// Returns `true` if the interval contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.start_inclusive >= self.end_exclusive
    }

    #[inline]
    pub fn contains(&self, x: T) -> bool
    where
        T: PartialOrd,
    {
        self.start_inclusive <= x && x < self.end_exclusive
    }

    /// Returns `true` if `other` lies completely inside `self`.
    #[inline]
    pub fn contains_interval(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        self.start_inclusive <= other.start_inclusive && other.end_exclusive <= self.end_exclusive
    }

    /// The common part of both intervals, or `None` if they do not intersect.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Self>
    where
        T: PartialOrd + Copy,
    {
        let s = if self.start_inclusive >= other.start_inclusive {
            self.start_inclusive
        } else {
            other.start_inclusive
        };
        let e = if self.end_exclusive <= other.end_exclusive {
            self.end_exclusive
        } else {
            other.end_exclusive
        };
        if s < e {
            Some(Self {
                start_inclusive: s,
                end_exclusive: e,
            })
        } else {
            None
        }
    }

    /// Clamps `self` into `boundary`, returning `None` if nothing is left.
    #[inline]
    pub fn clamp(&self, boundary: &Self) -> Option<Self>
    where
        T: PartialOrd + Copy,
    {
        self.intersection(boundary)
    }

    /// The length of the interval, in the difference type of `T`.
    #[inline]
    pub fn length<D>(&self) -> D
    where
        T: Copy + Sub<Output = D>,
    {
        self.end_exclusive - self.start_inclusive
    }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_inclusive, self.end_exclusive)
    }
}

impl<T: Copy + PartialOrd> From<std::ops::Range<T>> for Interval<T> {
    #[inline]
    fn from(range: std::ops::Range<T>) -> Self {
        Interval::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        let i = Interval::new(7, 2);
        assert_eq!(i.start(), 2);
        assert_eq!(i.end(), 7);
    }

    #[test]
    fn test_half_open_containment() {
        let i = Interval::new(0, 10);
        assert!(i.contains(0));
        assert!(i.contains(9));
        assert!(!i.contains(10));
        assert!(i.contains_interval(&Interval::new(2, 10)));
        assert!(!i.contains_interval(&Interval::new(2, 11)));
    }

    #[test]
    fn test_intersection() {
        let a = Interval::new(0, 10);
        let b = Interval::new(5, 15);
        assert_eq!(a.intersection(&b), Some(Interval::new(5, 10)));
        let c = Interval::new(10, 12);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_empty_interval() {
        let i = Interval::new(3, 3);
        assert!(i.is_empty());
        assert!(!i.contains(3));
        assert_eq!(i.length::<i32>(), 0);
    }

    #[test]
    fn test_serde_uses_start_end_keys() {
        let i = Interval::new(1, 4);
        let json = serde_json::to_string(&i).unwrap();
        assert_eq!(json, r#"{"start":1,"end":4}"#);
        let back: Interval<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, i);
    }
}
