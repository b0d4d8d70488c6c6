use std::ops::{Add, Mul, Neg, Sub};

use crate::core::geometry::se2::Se2;
use crate::core::geometry::twist::Twist2;

/// A smooth manifold whose local motion is described by a tangent space.
/// Separates the point (a pose) from the change (a twist).
pub trait Manifold {
    /// The point on the manifold, e.g. a rigid transform.
    type Point: Clone + std::fmt::Debug;

    /// A vector in the tangent space, e.g. a twist.
    type Tangent: Clone
        + Copy
        + std::fmt::Debug
        + Add<Output = Self::Tangent>
        + Sub<Output = Self::Tangent>
        + Neg<Output = Self::Tangent>
        + Mul<f64, Output = Self::Tangent>;

    /// Degrees of freedom.
    fn dim() -> usize;

    /// Moves `p` along `v`. For Lie groups this is `p * exp(v)`.
    fn retract(p: &Self::Point, v: Self::Tangent) -> Self::Point;

    /// The `v` with `retract(p, v) == q`. For Lie groups this is
    /// `log(p⁻¹ * q)`.
    fn local(p: &Self::Point, q: &Self::Point) -> Self::Tangent;
}

/// The special Euclidean group SE(2), with twists as tangents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SE2;

impl Manifold for SE2 {
    type Point = Se2<f64>;
    type Tangent = Twist2;

    fn dim() -> usize {
        3
    }

    fn retract(p: &Se2<f64>, v: Twist2) -> Se2<f64> {
        p.compose(&v.exp())
    }

    fn local(p: &Se2<f64>, q: &Se2<f64>) -> Twist2 {
        p.inverse().compose(q).log()
    }
}

impl Se2<f64> {
    /// Interpolates along the geodesic from `self` (`s = 0`) to `other`
    /// (`s = 1`).
    pub fn interp(&self, other: &Self, s: f64) -> Self {
        SE2::retract(self, SE2::local(self, other) * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_local_inverts_retract() {
        let p = Se2::from_xyt(1.0, -2.0, 0.7);
        let v = Twist2::new(0.3, 0.1, -0.4);
        let back = SE2::local(&p, &SE2::retract(&p, v));
        assert_abs_diff_eq!(back.v.x, v.v.x, epsilon = 1e-12);
        assert_abs_diff_eq!(back.v.y, v.v.y, epsilon = 1e-12);
        assert_abs_diff_eq!(back.w, v.w, epsilon = 1e-12);
    }

    #[test]
    fn test_interp_endpoints_and_midpoint() {
        let a = Se2::from_xyt(0.0, 0.0, 0.0);
        let b = Se2::from_xyt(2.0, 0.0, 0.0);
        assert_eq!(a.interp(&b, 0.0), a);
        let end = a.interp(&b, 1.0);
        assert_abs_diff_eq!(end.translation()[0], 2.0, epsilon = 1e-12);
        let mid = a.interp(&b, 0.5);
        assert_abs_diff_eq!(mid.translation()[0], 1.0, epsilon = 1e-12);
        assert_eq!(SE2::dim(), 3);
    }
}
