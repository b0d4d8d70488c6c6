use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Scalar field the algebra is written against.
///
/// Implemented for `f64` (floating representation) and for
/// [`Expr`](super::Expr) (exact symbolic representation). Which one a value
/// uses is fixed when it is constructed.
pub trait Real:
    Clone
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// `true` for exact domains whose values may not have a numeric value.
    const SYMBOLIC: bool;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_f64(x: f64) -> Self;

    fn sin(&self) -> Self;
    fn cos(&self) -> Self;
    fn sqrt(&self) -> Self;
    /// Four-quadrant arctangent of `self / x`.
    fn atan2(&self, x: &Self) -> Self;

    /// Numeric value, if one is known.
    fn to_f64(&self) -> Option<f64>;

    fn to_degrees(&self) -> Self {
        self.clone() * Self::from_f64(180.0 / std::f64::consts::PI)
    }
}

impl Real for f64 {
    const SYMBOLIC: bool = false;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn from_f64(x: f64) -> Self {
        x
    }

    #[inline]
    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    #[inline]
    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    #[inline]
    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    #[inline]
    fn atan2(&self, x: &Self) -> Self {
        f64::atan2(*self, *x)
    }

    #[inline]
    fn to_f64(&self) -> Option<f64> {
        Some(*self)
    }

    #[inline]
    fn to_degrees(&self) -> Self {
        f64::to_degrees(*self)
    }
}

/// Sum of pairwise products, starting from zero.
pub fn dot<T: Real>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (x, y)| acc + x.clone() * y.clone())
}

/// Checks that a power exponent is integral and returns it.
pub fn integer_exponent(exponent: f64) -> crate::error::Result<i32> {
    if exponent.is_finite()
        && exponent.fract() == 0.0
        && exponent >= i32::MIN as f64
        && exponent <= i32::MAX as f64
    {
        Ok(exponent as i32)
    } else {
        Err(crate::error::RigidError::NonIntegerExponent(exponent))
    }
}
