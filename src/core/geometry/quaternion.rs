use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use glam::DQuat;
use serde::{Deserialize, Serialize};

use crate::core::batch::Batch;
use crate::core::math::matrix::{Mat3, Vec3, cross3, mul3_vec, skew3, to_dmat3};
use crate::core::math::real::{dot, integer_exponent};
use crate::core::math::{Expr, Real};
use crate::error::{Result, RigidError};

/// A quaternion `s + v₁i + v₂j + v₃k`, not necessarily of unit norm.
///
/// Equality is exact on the four components, so `q` and `-q` compare
/// unequal even though they encode the same rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion<T = f64> {
    s: T,
    v: Vec3<T>,
}

impl<T: Real> Quaternion<T> {
    pub fn new(s: T, v: Vec3<T>) -> Self {
        Self { s, v }
    }

    /// Builds from a scalar and a vector part given as a slice, which must
    /// have exactly three components.
    pub fn try_new(s: T, v: &[T]) -> Result<Self> {
        Ok(Self { s, v: vector_part(v)? })
    }

    pub fn identity() -> Self {
        Self::new(T::one(), [T::zero(), T::zero(), T::zero()])
    }

    /// Pure quaternion `(0, v)`.
    pub fn pure(v: Vec3<T>) -> Self {
        Self::new(T::zero(), v)
    }

    /// From `[s, v₁, v₂, v₃]`.
    pub fn from_vector4(q: [T; 4]) -> Self {
        let [s, x, y, z] = q;
        Self::new(s, [x, y, z])
    }

    pub fn to_vector4(&self) -> [T; 4] {
        let [x, y, z] = self.v.clone();
        [self.s.clone(), x, y, z]
    }

    pub fn s(&self) -> &T {
        &self.s
    }

    pub fn v(&self) -> &Vec3<T> {
        &self.v
    }

    /// Same vector part, scalar part replaced.
    pub fn with_s(&self, s: T) -> Self {
        Self::new(s, self.v.clone())
    }

    /// Same scalar part, vector part replaced.
    pub fn try_with_v(&self, v: &[T]) -> Result<Self> {
        Self::try_new(self.s.clone(), v)
    }

    /// Hamilton product `self * other`.
    pub fn hamilton(&self, other: &Self) -> Self {
        let (s1, v1) = (&self.s, &self.v);
        let (s2, v2) = (&other.s, &other.v);
        let s = s1.clone() * s2.clone() - dot(v1, v2);
        let c = cross3(v1, v2);
        let v = std::array::from_fn(|i| {
            s1.clone() * v2[i].clone() + s2.clone() * v1[i].clone() + c[i].clone()
        });
        Self::new(s, v)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.s.clone(), self.v.clone().map(|x| -x))
    }

    pub fn norm_squared(&self) -> T {
        self.inner(self)
    }

    /// Euclidean norm of `[s, v]`.
    pub fn norm(&self) -> T {
        self.norm_squared().sqrt()
    }

    /// Dot product of the 4-component representations.
    pub fn inner(&self, other: &Self) -> T {
        self.s.clone() * other.s.clone() + dot(&self.v, &other.v)
    }

    /// `conjugate / ‖q‖²`.
    pub fn inverse(&self) -> Self {
        self.conjugate().unscale(&self.norm_squared())
    }

    pub fn unit(&self) -> Self {
        self.unscale(&self.norm())
    }

    /// Multiplies every component by `k`.
    pub fn scale(&self, k: &T) -> Self {
        Self::new(
            self.s.clone() * k.clone(),
            self.v.clone().map(|x| x * k.clone()),
        )
    }

    /// Divides every component by `k`.
    pub fn unscale(&self, k: &T) -> Self {
        Self::new(
            self.s.clone() / k.clone(),
            self.v.clone().map(|x| x / k.clone()),
        )
    }

    /// `self * other⁻¹`.
    pub fn divide(&self, other: &Self) -> Self {
        self.hamilton(&other.inverse())
    }

    pub fn plus(&self, other: &Self) -> Self {
        Self::new(
            self.s.clone() + other.s.clone(),
            std::array::from_fn(|i| self.v[i].clone() + other.v[i].clone()),
        )
    }

    pub fn minus(&self, other: &Self) -> Self {
        Self::new(
            self.s.clone() - other.s.clone(),
            std::array::from_fn(|i| self.v[i].clone() - other.v[i].clone()),
        )
    }

    /// Repeated Hamilton product from the identity; negative powers invert
    /// the result.
    pub fn pow(&self, n: i32) -> Self {
        let mut acc = Self::identity();
        for _ in 0..n.unsigned_abs() {
            acc = acc.hamilton(self);
        }
        if n < 0 { acc.inverse() } else { acc }
    }

    pub fn try_pow(&self, exponent: f64) -> Result<Self> {
        Ok(self.pow(integer_exponent(exponent)?))
    }

    /// Time derivative of this quaternion under angular velocity `omega`.
    ///
    /// Not a group operation: the result is a rate, packaged as a quaternion.
    /// With `E = s·I - [v]×`, the scalar rate is `-½ v·ω` and the vector rate
    /// is `½ E ω`.
    pub fn dot(&self, omega: &Vec3<T>) -> Self {
        let half = T::from_f64(0.5);
        let s = -(half.clone() * dot(&self.v, omega));
        let c = mul3_vec(&skew3(&self.v), omega);
        let v = std::array::from_fn(|i| {
            half.clone() * (self.s.clone() * omega[i].clone() - c[i].clone())
        });
        Self::new(s, v)
    }

    /// 4×4 matrix `M` with `self * p == M · p` on `[s, v]` columns.
    pub fn matrix(&self) -> [[T; 4]; 4] {
        let s = self.s.clone();
        let [x, y, z] = self.v.clone();
        [
            [s.clone(), -x.clone(), -y.clone(), -z.clone()],
            [x.clone(), s.clone(), -z.clone(), y.clone()],
            [y.clone(), z.clone(), s.clone(), -x.clone()],
            [z, -y, x, s],
        ]
    }

    /// Rotation matrix of a unit quaternion.
    pub fn to_rotation_matrix(&self) -> Mat3<T> {
        let two = T::from_f64(2.0);
        let one = T::one();
        let s = self.s.clone();
        let [x, y, z] = self.v.clone();
        let (xx, yy, zz) = (x.clone() * x.clone(), y.clone() * y.clone(), z.clone() * z.clone());
        let (xy, xz, yz) = (x.clone() * y.clone(), x.clone() * z.clone(), y.clone() * z.clone());
        let (sx, sy, sz) = (s.clone() * x, s.clone() * y, s * z);
        [
            [
                one.clone() - two.clone() * (yy.clone() + zz.clone()),
                two.clone() * (xy.clone() - sz.clone()),
                two.clone() * (xz.clone() + sy.clone()),
            ],
            [
                two.clone() * (xy + sz),
                one.clone() - two.clone() * (xx.clone() + zz),
                two.clone() * (yz.clone() - sx.clone()),
            ],
            [
                two.clone() * (xz - sy),
                two.clone() * (yz + sx),
                one - two * (xx + yy),
            ],
        ]
    }
}

impl Quaternion<f64> {
    /// Unit quaternion of a numeric rotation matrix.
    pub fn from_rotation_matrix(r: &Mat3<f64>) -> Self {
        DQuat::from_mat3(&to_dmat3(r)).into()
    }
}

fn vector_part<T: Clone>(v: &[T]) -> Result<Vec3<T>> {
    match v {
        [x, y, z] => Ok([x.clone(), y.clone(), z.clone()]),
        _ => Err(RigidError::MalformedComponent(format!(
            "vector part needs 3 components, got {}",
            v.len()
        ))),
    }
}

impl From<DQuat> for Quaternion<f64> {
    fn from(q: DQuat) -> Self {
        Self::new(q.w, [q.x, q.y, q.z])
    }
}

impl From<Quaternion<f64>> for DQuat {
    fn from(q: Quaternion<f64>) -> Self {
        DQuat::from_xyzw(q.v[0], q.v[1], q.v[2], q.s)
    }
}

impl From<Quaternion<f64>> for Quaternion<Expr> {
    fn from(q: Quaternion<f64>) -> Self {
        Self::new(Expr::Num(q.s), q.v.map(Expr::Num))
    }
}

impl<T: Real> Default for Quaternion<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Real> Mul for Quaternion<T> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.hamilton(&rhs)
    }
}

impl<T: Real> Mul<&Quaternion<T>> for &Quaternion<T> {
    type Output = Quaternion<T>;
    fn mul(self, rhs: &Quaternion<T>) -> Quaternion<T> {
        self.hamilton(rhs)
    }
}

impl<T: Real> Div for Quaternion<T> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self.divide(&rhs)
    }
}

impl<T: Real> Add for Quaternion<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.plus(&rhs)
    }
}

impl<T: Real> Sub for Quaternion<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.minus(&rhs)
    }
}

impl<T: Real> Neg for Quaternion<T> {
    type Output = Self;
    fn neg(self) -> Self {
        self.scale(&-T::one())
    }
}

impl Mul<f64> for Quaternion<f64> {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        self.scale(&k)
    }
}

impl Div<f64> for Quaternion<f64> {
    type Output = Self;
    fn div(self, k: f64) -> Self {
        self.unscale(&k)
    }
}

impl<T: Real + fmt::Display> fmt::Display for Quaternion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = f.precision().unwrap_or(4);
        let s = &self.s;
        let [x, y, z] = &self.v;
        write!(f, "{s:.p$} < {x:.p$}, {y:.p$}, {z:.p$} >")
    }
}

/// Right-hand operand of an array quaternion operation.
#[derive(Debug, Clone)]
pub enum QuatOperand<'a, T> {
    Quaternions(&'a Batch<Quaternion<T>>),
    Scalar(T),
}

impl<T: Real> Batch<Quaternion<T>> {
    /// Hamilton product with quaternions, or componentwise scaling by a
    /// real scalar.
    pub fn times(&self, rhs: QuatOperand<'_, T>) -> Result<Self> {
        match rhs {
            QuatOperand::Quaternions(b) => self.zip_with(b, |p, q| p.hamilton(q)),
            QuatOperand::Scalar(k) => Ok(self.map(|q| q.scale(&k))),
        }
    }

    /// `self * rhs⁻¹`, or componentwise division by a real scalar.
    pub fn divide(&self, rhs: QuatOperand<'_, T>) -> Result<Self> {
        match rhs {
            QuatOperand::Quaternions(b) => self.zip_with(b, |p, q| p.divide(q)),
            QuatOperand::Scalar(k) => Ok(self.map(|q| q.unscale(&k))),
        }
    }

    pub fn plus(&self, rhs: QuatOperand<'_, T>) -> Result<Self> {
        match rhs {
            QuatOperand::Quaternions(b) => self.zip_with(b, |p, q| p.plus(q)),
            QuatOperand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "plus",
                operand: "scalar",
            }),
        }
    }

    pub fn minus(&self, rhs: QuatOperand<'_, T>) -> Result<Self> {
        match rhs {
            QuatOperand::Quaternions(b) => self.zip_with(b, |p, q| p.minus(q)),
            QuatOperand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "minus",
                operand: "scalar",
            }),
        }
    }

    pub fn conjugate(&self) -> Self {
        self.map(|q| q.conjugate())
    }

    pub fn inverse(&self) -> Self {
        self.map(|q| q.inverse())
    }

    pub fn unit(&self) -> Self {
        self.map(|q| q.unit())
    }

    pub fn norm(&self) -> Batch<T> {
        self.map(|q| q.norm())
    }

    pub fn pow(&self, n: i32) -> Self {
        self.map(|q| q.pow(n))
    }

    pub fn try_pow(&self, exponent: f64) -> Result<Self> {
        let n = integer_exponent(exponent)?;
        Ok(self.pow(n))
    }

    /// Rates of every element under the same angular velocity.
    pub fn dot(&self, omega: &Vec3<T>) -> Self {
        self.map(|q| q.dot(omega))
    }
}

impl From<Batch<Quaternion<f64>>> for Batch<Quaternion<Expr>> {
    fn from(b: Batch<Quaternion<f64>>) -> Self {
        b.into_iter().map(Quaternion::<Expr>::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_quat_close(a: &Quaternion, b: &Quaternion) {
        for (x, y) in a.to_vector4().iter().zip(b.to_vector4()) {
            assert_abs_diff_eq!(*x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_basis_products() {
        let i = Quaternion::pure([1.0, 0.0, 0.0]);
        let j = Quaternion::pure([0.0, 1.0, 0.0]);
        let k = Quaternion::pure([0.0, 0.0, 1.0]);
        assert_eq!(i * j, k);
        assert_eq!(j * i, -k);
        assert_eq!(i * i, Quaternion::new(-1.0, [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_identity_is_neutral() {
        let q = Quaternion::new(0.5, [1.0, -2.0, 3.0]);
        assert_eq!(Quaternion::identity() * q, q);
        assert_eq!(q * Quaternion::identity(), q);
    }

    #[test]
    fn test_inverse_law() {
        let q = Quaternion::new(0.5, [1.0, -2.0, 3.0]);
        assert_quat_close(&(q * q.inverse()), &Quaternion::identity());
        assert_quat_close(&(q / q), &Quaternion::identity());
    }

    #[test]
    fn test_norm_and_unit() {
        let q = Quaternion::new(1.0, [2.0, 2.0, 4.0]);
        assert_eq!(q.norm(), 5.0);
        assert_abs_diff_eq!(q.unit().norm(), 1.0, epsilon = 1e-15);
        assert_eq!(q.conjugate(), Quaternion::new(1.0, [-2.0, -2.0, -4.0]));
    }

    #[test]
    fn test_scalar_ops() {
        let q = Quaternion::new(1.0, [2.0, 3.0, 4.0]);
        assert_eq!(q * 2.0, Quaternion::new(2.0, [4.0, 6.0, 8.0]));
        assert_eq!(q / 2.0, Quaternion::new(0.5, [1.0, 1.5, 2.0]));
    }

    #[test]
    fn test_malformed_vector_part() {
        let err = Quaternion::try_new(1.0, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RigidError::MalformedComponent(_)));
        let q = Quaternion::identity();
        assert!(q.try_with_v(&[1.0, 2.0, 3.0, 4.0]).is_err());
        assert_eq!(q.try_with_v(&[1.0, 2.0, 3.0]).unwrap().v(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_negation_compares_unequal() {
        let q = Quaternion::new(0.0, [1.0, 0.0, 0.0]);
        assert_ne!(q, -q);
        assert_eq!(q.to_rotation_matrix(), (-q).to_rotation_matrix());
    }

    #[test]
    fn test_pow() {
        let q = Quaternion::new(0.5, [0.5, -0.5, 0.5]);
        assert_eq!(q.pow(0), Quaternion::identity());
        assert_quat_close(&q.pow(3), &(q * q * q));
        assert_quat_close(&q.pow(-2), &q.pow(2).inverse());
        assert_eq!(q.try_pow(1.5), Err(RigidError::NonIntegerExponent(1.5)));
    }

    #[test]
    fn test_dot_matches_product_form() {
        // q̇ = ½ (0, ω) ⊗ q
        let q = Quaternion::new(0.8, [0.1, -0.3, 0.5]);
        let w = [0.4, -1.2, 2.0];
        let expected = (Quaternion::pure(w) * q).scale(&0.5);
        assert_quat_close(&q.dot(&w), &expected);
    }

    #[test]
    fn test_matrix_form() {
        let q = Quaternion::new(0.3, [1.0, -2.0, 0.5]);
        let p = Quaternion::new(-1.0, [0.2, 0.7, 3.0]);
        let m = q.matrix();
        let pv = p.to_vector4();
        let mp: [f64; 4] = std::array::from_fn(|r| dot(&m[r], &pv));
        assert_quat_close(&Quaternion::from_vector4(mp), &(q * p));
    }

    #[test]
    fn test_rotation_matrix_round_trip() {
        let g = DQuat::from_rotation_y(0.9) * DQuat::from_rotation_z(-0.4);
        let q = Quaternion::from(g);
        let back = Quaternion::from_rotation_matrix(&q.to_rotation_matrix());
        assert!(
            (back.inner(&q) - 1.0).abs() < 1e-12 || (back.inner(&q) + 1.0).abs() < 1e-12
        );
        let round: DQuat = q.into();
        assert_eq!(round, g);
    }

    #[test]
    fn test_display() {
        let q = Quaternion::new(1.0, [0.0, -0.5, 2.0]);
        assert_eq!(q.to_string(), "1.0000 < 0.0000, -0.5000, 2.0000 >");
    }

    #[test]
    fn test_batch_broadcast_and_errors() {
        let a = Batch::new(vec![
            Quaternion::new(1.0, [0.0, 0.0, 0.0]),
            Quaternion::new(0.0, [1.0, 0.0, 0.0]),
        ]);
        let j = Batch::one(Quaternion::pure([0.0, 1.0, 0.0]));
        let out = a.times(QuatOperand::Quaternions(&j)).unwrap();
        assert_eq!(out[0], Quaternion::pure([0.0, 1.0, 0.0]));
        assert_eq!(out[1], Quaternion::pure([0.0, 0.0, 1.0]));

        let scaled = a.times(QuatOperand::Scalar(3.0)).unwrap();
        assert_eq!(scaled[1], Quaternion::pure([3.0, 0.0, 0.0]));

        let three = Batch::new(vec![Quaternion::identity(); 3]);
        assert!(matches!(
            a.times(QuatOperand::Quaternions(&three)),
            Err(RigidError::LengthMismatch { left: 2, right: 3 })
        ));
        assert!(matches!(
            a.plus(QuatOperand::Scalar(1.0)),
            Err(RigidError::InvalidOperandType { .. })
        ));
    }
    #[test]
    fn test_batch_divide_with_quaternions() {
        let a = Batch::new(vec![
            Quaternion::new(0.5, [1.0, -2.0, 3.0]),
            Quaternion::new(-1.0, [0.2, 0.7, 3.0]),
            Quaternion::new(0.8, [0.1, -0.3, 0.5]),
        ]);
        let d = Batch::one(Quaternion::new(0.3, [1.0, -2.0, 0.5]));

        let right = a.divide(QuatOperand::Quaternions(&d)).unwrap();
        assert_eq!(right.len(), 3);
        for (r, q) in right.iter().zip(a.iter()) {
            assert_quat_close(&(*r * d[0]), q);
        }

        let left = d.divide(QuatOperand::Quaternions(&a)).unwrap();
        assert_eq!(left.len(), 3);
        for (l, q) in left.iter().zip(a.iter()) {
            assert_quat_close(l, &(d[0] * q.inverse()));
        }

        let pairwise = a.divide(QuatOperand::Quaternions(&a)).unwrap();
        for q in pairwise.iter() {
            assert_quat_close(q, &Quaternion::identity());
        }

        let two = Batch::new(vec![Quaternion::identity(); 2]);
        assert!(matches!(
            a.divide(QuatOperand::Quaternions(&two)),
            Err(RigidError::LengthMismatch { left: 3, right: 2 })
        ));
    }
}
