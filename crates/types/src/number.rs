// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::cmp::Ordering;
use std::fmt;

/// The VM's opaque numeric value (spec.md §3, open question in §9:
/// "Arbitrary-precision arithmetic is used but the behavior... is not
/// pinned down").
///
/// We resolve that open question as follows: `Number` is either an
/// `Integer(i64)` or a `Float(f64)`. Arithmetic between two integers stays
/// integral unless it overflows `i64`, in which case it promotes to
/// `Float`. Arithmetic between an integer and a float promotes the
/// integer to `f64` first. Division always yields a `Float`, so division
/// by zero follows IEEE-754 (`inf`/`NaN`) rather than panicking. `%`
/// follows Rust's truncating remainder; its sign follows the dividend.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(i) => *i == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => match a.checked_add(b) {
                Some(v) => Number::Integer(v),
                None => Number::Float(a as f64 + b as f64),
            },
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => match a.checked_sub(b) {
                Some(v) => Number::Integer(v),
                None => Number::Float(a as f64 - b as f64),
            },
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => match a.checked_mul(b) {
                Some(v) => Number::Integer(v),
                None => Number::Float(a as f64 * b as f64),
            },
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    pub fn div(self, other: Number) -> Number {
        Number::Float(self.as_f64() / other.as_f64())
    }

    pub fn rem(self, other: Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) if b != 0 => Number::Integer(a % b),
            (a, b) => Number::Float(a.as_f64() % b.as_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.partial_cmp(b),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_stays_integral() {
        let sum = Number::Integer(2).add(Number::Integer(3));
        assert_eq!(sum, Number::Integer(5));
    }

    #[test]
    fn integer_overflow_promotes_to_float() {
        let sum = Number::Integer(i64::MAX).add(Number::Integer(1));
        assert!(matches!(sum, Number::Float(_)));
        assert_eq!(sum.as_f64(), i64::MAX as f64 + 1.0);
    }

    #[test]
    fn mixed_arithmetic_widens_the_integer() {
        let sum = Number::Integer(2).add(Number::Float(0.5));
        assert_eq!(sum, Number::Float(2.5));
    }

    #[test]
    fn division_by_zero_yields_infinity_not_a_panic() {
        let result = Number::Integer(1).div(Number::Integer(0));
        match result {
            Number::Float(f) => assert!(f.is_infinite()),
            other => panic!("expected Float(inf), got {other:?}"),
        }
    }

    #[test]
    fn remainder_sign_follows_the_dividend() {
        assert_eq!(Number::Integer(-7).rem(Number::Integer(2)), Number::Integer(-1));
    }

    #[test]
    fn integer_and_float_compare_by_widening() {
        assert!(Number::Integer(2) < Number::Float(2.5));
        assert_eq!(Number::Integer(2), Number::Float(2.0));
    }

    #[test]
    fn zero_detection_covers_both_representations() {
        assert!(Number::Integer(0).is_zero());
        assert!(Number::Float(0.0).is_zero());
        assert!(!Number::Integer(1).is_zero());
    }
}
