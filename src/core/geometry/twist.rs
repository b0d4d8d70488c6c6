use std::ops::{Add, Mul, Neg, Sub};

use glam::{DMat2, DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::core::batch::Batch;
use crate::core::geometry::se2::Se2;
use crate::core::math::matrix::{from_dmat3, rot2};

/// Below this rotation magnitude the closed forms switch to Taylor series.
const SMALL_ANGLE: f64 = 1e-8;

/// A twist in se(2), the Lie algebra of SE(2).
///
/// `v` is the translational part and `w` the rotation rate; the generator
/// matrix is
/// ```text
/// | 0  -w  vx |
/// | w   0  vy |
/// | 0   0   0 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2 {
    pub v: DVec2,
    pub w: f64,
}

impl Twist2 {
    pub const ZERO: Self = Self {
        v: DVec2::ZERO,
        w: 0.0,
    };

    pub fn new(vx: f64, vy: f64, w: f64) -> Self {
        Self {
            v: DVec2::new(vx, vy),
            w,
        }
    }

    /// From `[vx, vy, w]`.
    pub fn from_vector(x: [f64; 3]) -> Self {
        Self::new(x[0], x[1], x[2])
    }

    pub fn to_vector(&self) -> [f64; 3] {
        [self.v.x, self.v.y, self.w]
    }

    pub fn generator(&self) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(0.0, self.w, 0.0),
            DVec3::new(-self.w, 0.0, 0.0),
            DVec3::new(self.v.x, self.v.y, 0.0),
        )
    }

    /// Matrix exponential of the generator.
    pub fn exp(&self) -> Se2 {
        let t = left_jacobian(self.w) * self.v;
        Se2::from_parts(rot2(&self.w), [t.x, t.y])
    }
}

/// The `V` matrix with `exp(ξ).t = V·v`:
/// ```text
/// | a  -b |     a = sin θ / θ
/// | b   a |     b = (1 - cos θ) / θ
/// ```
fn left_jacobian(theta: f64) -> DMat2 {
    let (a, b) = if theta.abs() < SMALL_ANGLE {
        let t2 = theta * theta;
        (1.0 - t2 / 6.0, theta / 2.0 - theta * t2 / 24.0)
    } else {
        (theta.sin() / theta, (1.0 - theta.cos()) / theta)
    };
    DMat2::from_cols(DVec2::new(a, b), DVec2::new(-b, a))
}

impl Se2<f64> {
    /// Matrix logarithm, as a twist. The rotation part lies in `(-π, π]`.
    pub fn log(&self) -> Twist2 {
        let w = self.angle();
        let [x, y] = self.translation();
        // V is a scaled rotation, invertible for |θ| < 2π.
        let v = left_jacobian(w).inverse() * DVec2::new(x, y);
        Twist2 { v, w }
    }

    pub fn exp(twist: &Twist2) -> Self {
        twist.exp()
    }

    /// Homogeneous matrix of the generator of [`log`](Self::log).
    pub fn log_matrix(&self) -> [[f64; 3]; 3] {
        from_dmat3(&self.log().generator())
    }
}

impl Batch<Se2<f64>> {
    pub fn log(&self) -> Batch<Twist2> {
        self.map(|a| a.log())
    }
}

impl Batch<Twist2> {
    pub fn exp(&self) -> Batch<Se2<f64>> {
        self.map(|t| t.exp())
    }
}

impl Add for Twist2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            v: self.v + rhs.v,
            w: self.w + rhs.w,
        }
    }
}

impl Sub for Twist2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            v: self.v - rhs.v,
            w: self.w - rhs.w,
        }
    }
}

impl Neg for Twist2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            v: -self.v,
            w: -self.w,
        }
    }
}

impl Mul<f64> for Twist2 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self {
            v: self.v * s,
            w: self.w * s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn assert_close(a: &Se2, b: &Se2) {
        for (ra, rb) in a.matrix().iter().zip(b.matrix()) {
            for (x, y) in ra.iter().zip(rb) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_exp_of_zero_is_identity() {
        assert_eq!(Twist2::ZERO.exp(), Se2::identity());
    }

    #[test]
    fn test_pure_translation_log() {
        let a = Se2::from_translation(3.0, -4.0);
        let xi = a.log();
        assert_abs_diff_eq!(xi.v.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(xi.v.y, -4.0, epsilon = 1e-12);
        assert_eq!(xi.w, 0.0);
    }

    #[test]
    fn test_round_trip() {
        for &(x, y, t) in &[
            (1.0, 2.0, 0.5),
            (-3.0, 0.1, -2.9),
            (0.0, 0.0, PI),
            (5.0, -5.0, 1e-10),
            (0.2, 0.3, 0.0),
        ] {
            let a = Se2::from_xyt(x, y, t);
            assert_close(&a.log().exp(), &a);
        }
    }

    #[test]
    fn test_exp_of_rotation_about_origin() {
        // Quarter turn along a unit arc ends at (1, 1) from (0, 0) when
        // the twist moves forward one quarter circumference of radius 1.
        let xi = Twist2::new(PI / 2.0, 0.0, PI / 2.0);
        let a = xi.exp();
        let [x, y] = a.translation();
        assert_abs_diff_eq!(x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_generator_layout() {
        let m = Se2::from_xyt(1.0, 2.0, 0.3).log_matrix();
        assert_eq!(m[2], [0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(m[1][0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(m[0][1], -0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_batch_round_trip() {
        let poses: Batch<Se2> = (0..4)
            .map(|i| Se2::from_xyt(i as f64, 1.0, 0.4 * i as f64))
            .collect();
        let back = poses.log().exp();
        for (a, b) in poses.iter().zip(&back) {
            assert_close(a, b);
        }
    }
}
