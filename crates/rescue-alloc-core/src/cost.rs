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

use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Zero};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

/// A monetary amount, for example the yearly operating cost of one craft at one station.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost<T>(T);

impl<T: Copy> Cost<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Cost(value)
    }

    #[inline]
    pub const fn value(self) -> T {
        self.0
    }

    #[inline]
    pub fn is_negative(self) -> bool
    where
        T: Zero + PartialOrd,
    {
        self.0 < T::zero()
    }
}

impl<T: Copy + Display> Display for Cost<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cost({})", self.0)
    }
}

impl<T> Add for Cost<T>
where
    T: Copy + CheckedAdd<Output = T>,
{
    type Output = Cost<T>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Cost(self.0.checked_add(&rhs.0).expect("overflow in Cost + Cost"))
    }
}

impl<T> AddAssign for Cost<T>
where
    T: Copy + CheckedAdd<Output = T>,
{
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T> Sub for Cost<T>
where
    T: Copy + CheckedSub<Output = T>,
{
    type Output = Cost<T>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Cost(self.0.checked_sub(&rhs.0).expect("overflow in Cost - Cost"))
    }
}

impl<T> Mul<T> for Cost<T>
where
    T: Copy + CheckedMul<Output = T>,
{
    type Output = Cost<T>;

    #[inline]
    fn mul(self, rhs: T) -> Self::Output {
        Cost(self.0.checked_mul(&rhs).expect("overflow in Cost * scalar"))
    }
}

impl<T: Copy + Zero + CheckedAdd<Output = T>> Zero for Cost<T> {
    #[inline]
    fn zero() -> Self {
        Cost(T::zero())
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl<T: Copy + Zero + CheckedAdd<Output = T>> Sum for Cost<T> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cost::zero(), |acc, x| acc + x)
    }
}

impl<T: Copy + Zero> Default for Cost<T> {
    #[inline]
    fn default() -> Self {
        Cost(T::zero())
    }
}

impl<T> From<T> for Cost<T> {
    #[inline]
    fn from(value: T) -> Self {
        Cost(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Cost::new(10i64);
        let b = Cost::new(3i64);
        assert_eq!(a + b, Cost::new(13));
        assert_eq!(a - b, Cost::new(7));
        assert_eq!(b * 4, Cost::new(12));
    }

    #[test]
    fn test_sum_and_zero() {
        let total: Cost<i64> = vec![Cost::new(1), Cost::new(2), Cost::new(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Cost::new(6));
        assert!(Cost::<i64>::zero().is_zero());
        assert!(Cost::new(-1i64).is_negative());
    }
}
