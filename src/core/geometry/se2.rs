use std::fmt;
use std::ops::{Div, Mul};

use glam::DMat3;
use serde::{Deserialize, Serialize};

use crate::core::batch::{Batch, broadcast_len};
use crate::core::block::Block;
use crate::core::geometry::validity::homogeneous2_ok;
use crate::core::math::matrix::{
    Mat2, Mat3, Vec2, from_dmat3, identity2, identity3, map3, mul2_vec, mul3, rot2, to_dmat3,
    transpose2,
};
use crate::core::math::real::integer_exponent;
use crate::core::math::{Expr, Real};
use crate::error::{Result, RigidError};

/// An element of SE(2), the group of planar rigid motions.
///
/// Stored as the homogeneous matrix
/// ```text
/// | R  t |
/// | 0  1 |
/// ```
/// with `R` a 2×2 rotation and `t` the translation column. Values are
/// immutable: every operation returns a new transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Se2<T = f64> {
    matrix: Mat3<T>,
}

impl<T: Real> Se2<T> {
    pub fn identity() -> Self {
        Self {
            matrix: identity3(),
        }
    }

    /// Pure translation.
    pub fn from_translation(x: T, y: T) -> Self {
        Self::from_parts(identity2(), [x, y])
    }

    /// Translation `(x, y)` and rotation by `theta` radians.
    pub fn from_xyt(x: T, y: T, theta: T) -> Self {
        Self::from_parts(rot2(&theta), [x, y])
    }

    /// Pure rotation. `r` is taken as given.
    pub fn from_rotation(r: Mat2<T>) -> Self {
        Self::from_parts(r, [T::zero(), T::zero()])
    }

    pub fn from_parts(r: Mat2<T>, t: Vec2<T>) -> Self {
        let [[r00, r01], [r10, r11]] = r;
        let [x, y] = t;
        Self {
            matrix: [[r00, r01, x], [r10, r11, y], [T::zero(), T::zero(), T::one()]],
        }
    }

    /// Embeds a homogeneous matrix without checking it.
    pub fn from_matrix(matrix: Mat3<T>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Mat3<T> {
        &self.matrix
    }

    pub fn into_matrix(self) -> Mat3<T> {
        self.matrix
    }

    pub fn rotation(&self) -> Mat2<T> {
        let m = &self.matrix;
        [
            [m[0][0].clone(), m[0][1].clone()],
            [m[1][0].clone(), m[1][1].clone()],
        ]
    }

    pub fn translation(&self) -> Vec2<T> {
        [self.matrix[0][2].clone(), self.matrix[1][2].clone()]
    }

    /// Same rotation, translation replaced.
    pub fn with_translation(&self, t: Vec2<T>) -> Self {
        Self::from_parts(self.rotation(), t)
    }

    /// Rotation angle in radians, in `(-π, π]` for numeric transforms.
    pub fn angle(&self) -> T {
        self.matrix[1][0].atan2(&self.matrix[0][0])
    }

    pub fn xyt(&self) -> (T, T, T) {
        let [x, y] = self.translation();
        (x, y, self.angle())
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            matrix: mul3(&self.matrix, &other.matrix),
        }
    }

    /// Closed form `(Rᵀ, -Rᵀt)`.
    pub fn inverse(&self) -> Self {
        let rt = transpose2(&self.rotation());
        let t = mul2_vec(&rt, &self.translation());
        Self::from_parts(rt, t.map(|x| -x))
    }

    /// `self ∘ other⁻¹`.
    pub fn divide(&self, other: &Self) -> Self {
        self.compose(&other.inverse())
    }

    /// Repeated composition from the identity; negative powers invert the
    /// result.
    pub fn pow(&self, n: i32) -> Self {
        let mut acc = Self::identity();
        for _ in 0..n.unsigned_abs() {
            acc = acc.compose(self);
        }
        if n < 0 { acc.inverse() } else { acc }
    }

    /// [`pow`](Self::pow) for an exponent given as a real number, which must
    /// be integral.
    pub fn try_pow(&self, exponent: f64) -> Result<Self> {
        Ok(self.pow(integer_exponent(exponent)?))
    }

    pub fn transform_point(&self, p: &Vec2<T>) -> Vec2<T> {
        let [x, y] = mul2_vec(&self.rotation(), p);
        let [tx, ty] = self.translation();
        [x + tx, y + ty]
    }

    /// Transforms every column of a `2 × N` block of points.
    pub fn transform_points(&self, points: &Block<T>) -> Result<Block<T>> {
        check_points(points)?;
        if points.cols() == 0 {
            return Ok(points.clone());
        }
        let cols: Vec<Vec2<T>> = (0..points.cols())
            .map(|c| self.transform_point(&point_at(points, c)))
            .collect();
        Block::from_columns(&cols)
    }
}

impl Se2<f64> {
    pub fn from_dmat3(m: &DMat3) -> Self {
        Self::from_matrix(from_dmat3(m))
    }

    /// Strict validity of the stored matrix, `k` as in the predicates.
    pub fn is_valid(&self, k: f64) -> bool {
        homogeneous2_ok(&self.matrix, k)
    }
}

impl From<Se2<f64>> for DMat3 {
    fn from(t: Se2<f64>) -> Self {
        to_dmat3(&t.matrix)
    }
}

impl From<Se2<f64>> for Se2<Expr> {
    fn from(t: Se2<f64>) -> Self {
        Se2::from_matrix(map3(&t.matrix, |&x| Expr::Num(x)))
    }
}

impl<T: Real> Mul for Se2<T> {
    type Output = Se2<T>;

    fn mul(self, rhs: Se2<T>) -> Se2<T> {
        self.compose(&rhs)
    }
}

impl<T: Real> Mul<&Se2<T>> for &Se2<T> {
    type Output = Se2<T>;

    fn mul(self, rhs: &Se2<T>) -> Se2<T> {
        self.compose(rhs)
    }
}

impl<T: Real> Mul<[T; 2]> for &Se2<T> {
    type Output = [T; 2];

    fn mul(self, p: [T; 2]) -> [T; 2] {
        self.transform_point(&p)
    }
}

impl<T: Real> Div for Se2<T> {
    type Output = Se2<T>;

    fn div(self, rhs: Se2<T>) -> Se2<T> {
        self.divide(&rhs)
    }
}

impl<T: Real> Div<&Se2<T>> for &Se2<T> {
    type Output = Se2<T>;

    fn div(self, rhs: &Se2<T>) -> Se2<T> {
        self.divide(rhs)
    }
}

impl<T: Real> Default for Se2<T> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Translation and rotation angle (degrees).
impl<T: Real + fmt::Display> fmt::Display for Se2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, theta) = self.xyt();
        let deg = theta.to_degrees();
        let p = f.precision().unwrap_or(4);
        write!(f, "t = ({x:.p$}, {y:.p$}), {deg:.p$} deg")
    }
}

/// Right-hand operand of an array product or quotient.
#[derive(Debug, Clone)]
pub enum Se2Operand<'a, T> {
    Transforms(&'a Batch<Se2<T>>),
    /// `2 × N` block of column points.
    Points(&'a Block<T>),
    Scalar(T),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Se2Product<T> {
    Transforms(Batch<Se2<T>>),
    Points(Block<T>),
}

impl<T: Real> Batch<Se2<T>> {
    pub fn compose(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |a, b| a.compose(b))
    }

    pub fn inverse(&self) -> Self {
        self.map(|a| a.inverse())
    }

    /// Inverts every element of `rhs`, then composes.
    pub fn divide(&self, rhs: &Self) -> Result<Self> {
        self.compose(&rhs.inverse())
    }

    pub fn pow(&self, n: i32) -> Self {
        self.map(|a| a.pow(n))
    }

    pub fn try_pow(&self, exponent: f64) -> Result<Self> {
        let n = integer_exponent(exponent)?;
        Ok(self.pow(n))
    }

    /// Product dispatched on the right operand: transforms compose, points
    /// are transformed.
    pub fn apply(&self, rhs: Se2Operand<'_, T>) -> Result<Se2Product<T>> {
        match rhs {
            Se2Operand::Transforms(b) => self.compose(b).map(Se2Product::Transforms),
            Se2Operand::Points(p) => self.transform_points(p).map(Se2Product::Points),
            Se2Operand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "compose",
                operand: "scalar",
            }),
        }
    }

    /// Quotient dispatched on the right operand, which must be transforms.
    pub fn apply_divide(&self, rhs: Se2Operand<'_, T>) -> Result<Self> {
        match rhs {
            Se2Operand::Transforms(b) => self.divide(b),
            Se2Operand::Points(_) => Err(RigidError::InvalidOperandType {
                op: "divide",
                operand: "raw matrix",
            }),
            Se2Operand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "divide",
                operand: "scalar",
            }),
        }
    }

    /// Transforms `2 × N` column points. A single transform maps every
    /// column; otherwise transforms and columns pair under broadcasting.
    pub fn transform_points(&self, points: &Block<T>) -> Result<Block<T>> {
        if let [single] = self.as_slice() {
            return single.transform_points(points);
        }
        check_points(points)?;
        let n = broadcast_len(self.len(), points.cols())?;
        let cols: Vec<Vec2<T>> = (0..n)
            .map(|i| {
                let a = &self[if self.is_singleton() { 0 } else { i }];
                let c = if points.cols() == 1 { 0 } else { i };
                a.transform_point(&point_at(points, c))
            })
            .collect();
        if cols.is_empty() {
            return Block::from_rows(&[Vec::<T>::new(), Vec::new()]);
        }
        Block::from_columns(&cols)
    }

    /// All matrices as a `3 × 3 × N` block.
    pub fn matrices(&self) -> Block<T> {
        let pages: Vec<Mat3<T>> = self.iter().map(|t| t.matrix.clone()).collect();
        Block::stack_mat3(&pages)
    }
}

impl From<Batch<Se2<f64>>> for Batch<Se2<Expr>> {
    fn from(b: Batch<Se2<f64>>) -> Self {
        b.into_iter().map(Se2::<Expr>::from).collect()
    }
}

impl<T: Real + fmt::Display> fmt::Display for Batch<Se2<T>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match f.precision() {
                Some(p) => write!(f, "{t:.p$}")?,
                None => write!(f, "{t}")?,
            }
        }
        Ok(())
    }
}

fn check_points<T: Clone>(points: &Block<T>) -> Result<()> {
    if points.rows() == 2 && points.pages() == 1 {
        Ok(())
    } else {
        Err(RigidError::InvalidOperandType {
            op: "compose",
            operand: "block that is not 2 × N",
        })
    }
}

fn point_at<T: Clone>(points: &Block<T>, c: usize) -> Vec2<T> {
    [points.get(0, c, 0).clone(), points.get(1, c, 0).clone()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;
    use std::f64::consts::FRAC_PI_2;

    fn assert_se2_eq(a: &Se2, b: &Se2) {
        for (ra, rb) in a.matrix().iter().zip(b.matrix()) {
            for (x, y) in ra.iter().zip(rb) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_compose_order() {
        let forward = Se2::from_xyt(1.0, 0.0, 0.0);
        let turn = Se2::from_xyt(0.0, 0.0, FRAC_PI_2);

        let a = forward * turn;
        assert_abs_diff_eq!(a.translation()[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.translation()[1], 0.0, epsilon = 1e-12);

        let b = turn * forward;
        assert_abs_diff_eq!(b.translation()[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.translation()[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.angle(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_closed_form() {
        let a = Se2::from_xyt(1.0, 2.0, 0.5);
        let inv = a.inverse();
        assert_eq!(inv.rotation(), transpose2(&a.rotation()));
        assert_se2_eq(&(a * inv), &Se2::identity());
        assert_se2_eq(&(inv * a), &Se2::identity());
    }

    #[test]
    fn test_pow() {
        let a = Se2::from_xyt(1.0, 0.0, 0.25);
        assert_eq!(a.pow(0), Se2::identity());
        assert_eq!(a.pow(1), a);
        assert_se2_eq(&a.pow(3), &(a * a * a));
        assert_se2_eq(&a.pow(-2), &a.pow(2).inverse());
    }

    #[test]
    fn test_try_pow_rejects_fractions() {
        let a = Se2::from_xyt(1.0, 0.0, 0.25);
        assert_eq!(a.try_pow(2.0).unwrap(), a.pow(2));
        assert_eq!(a.try_pow(0.5), Err(RigidError::NonIntegerExponent(0.5)));
        assert!(a.try_pow(f64::NAN).is_err());
    }

    #[test]
    fn test_transform_point() {
        let pose = Se2::from_xyt(1.0, 0.0, FRAC_PI_2);
        let p = &pose * [1.0, 0.0];
        assert_abs_diff_eq!(p[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_points_block() {
        let pose = Se2::from_translation(1.0, -1.0);
        let pts = Block::from_columns(&[[0.0, 0.0], [1.0, 2.0], [3.0, 4.0]]).unwrap();
        let out = pose.transform_points(&pts).unwrap();
        assert_eq!(out.shape(), (2, 3, 1));
        assert_eq!(out.column_values(2, 0), vec![4.0, 3.0]);
        assert!(pose.transform_points(&Block::row([1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    fn test_display_in_degrees() {
        let a = Se2::from_xyt(1.0, 2.0, FRAC_PI_2);
        assert_eq!(a.to_string(), "t = (1.0000, 2.0000), 90.0000 deg");
        assert_eq!(format!("{a:.1}"), "t = (1.0, 2.0), 90.0 deg");
    }

    #[test]
    fn test_with_translation_replaces() {
        let a = Se2::from_xyt(1.0, 2.0, 0.3);
        let b = a.with_translation([5.0, 6.0]);
        assert_eq!(b.rotation(), a.rotation());
        assert_eq!(b.translation(), [5.0, 6.0]);
        assert_eq!(a.translation(), [1.0, 2.0]);
    }

    #[test]
    fn test_glam_conversion() {
        let a = Se2::from_xyt(1.0, 2.0, 0.3);
        let m: DMat3 = a.into();
        assert_eq!(m.z_axis.x, 1.0);
        assert_eq!(m.z_axis.y, 2.0);
        assert_eq!(Se2::from_dmat3(&m), a);
    }

    #[test]
    fn test_operand_dispatch() {
        let a = Batch::one(Se2::from_xyt(1.0, 0.0, 0.0));
        let pts = Block::from_columns(&[[0.0, 0.0]]).unwrap();
        match a.apply(Se2Operand::Points(&pts)).unwrap() {
            Se2Product::Points(out) => assert_eq!(out.column_values(0, 0), vec![1.0, 0.0]),
            other => panic!("expected points, got {other:?}"),
        }
        assert!(matches!(
            a.apply(Se2Operand::Scalar(2.0)),
            Err(RigidError::InvalidOperandType { .. })
        ));
        assert!(matches!(
            a.apply_divide(Se2Operand::Points(&pts)),
            Err(RigidError::InvalidOperandType { .. })
        ));
    }

    #[test]
    fn test_array_points_broadcast() {
        let poses = Batch::new(vec![
            Se2::from_translation(1.0, 0.0),
            Se2::from_translation(0.0, 1.0),
        ]);
        let one = Block::from_columns(&[[0.0, 0.0]]).unwrap();
        let out = poses.transform_points(&one).unwrap();
        assert_eq!(out.column_values(0, 0), vec![1.0, 0.0]);
        assert_eq!(out.column_values(1, 0), vec![0.0, 1.0]);

        let three = Block::from_columns(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
        assert!(matches!(
            poses.transform_points(&three),
            Err(RigidError::LengthMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn test_empty_batch_maps_no_points() {
        let none = Batch::<Se2<f64>>::new(Vec::new());
        let one = Block::from_columns(&[[5.0, 7.0]]).unwrap();
        let out = none.transform_points(&one).unwrap();
        assert_eq!(out.shape(), (2, 0, 1));
        assert!(out.is_empty());
    }

    #[test]
    fn test_batch_divide_broadcasts_singleton() {
        let poses = Batch::new(vec![
            Se2::from_xyt(1.0, 0.0, 0.2),
            Se2::from_xyt(0.0, 2.0, -0.7),
            Se2::from_xyt(-1.0, 1.0, 1.4),
        ]);
        let base = Batch::one(Se2::from_xyt(0.5, -0.5, 0.3));

        let right = poses.divide(&base).unwrap();
        assert_eq!(right.len(), 3);
        for (q, p) in right.iter().zip(poses.iter()) {
            assert_se2_eq(q, &(*p * base[0].inverse()));
        }

        let left = base.divide(&poses).unwrap();
        assert_eq!(left.len(), 3);
        for (q, p) in left.iter().zip(poses.iter()) {
            assert_se2_eq(q, &(base[0] * p.inverse()));
        }

        let two = Batch::new(vec![Se2::identity(); 2]);
        assert!(matches!(
            poses.divide(&two),
            Err(RigidError::LengthMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_symbolic_inverse_is_exact() {
        let a = Se2::<Expr>::from_xyt("x".into(), "y".into(), "q".into());
        let inv = a.inverse();
        assert_eq!(inv.rotation(), transpose2(&a.rotation()));

        let bindings = HashMap::from([
            ("x".to_string(), 0.4),
            ("y".to_string(), -1.5),
            ("q".to_string(), 2.2),
        ]);
        let product = a.compose(&inv);
        let expected = identity3::<f64>();
        for r in 0..3 {
            for c in 0..3 {
                let value = product.matrix()[r][c].eval(&bindings).unwrap();
                assert_abs_diff_eq!(value, expected[r][c], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_promotion_to_symbolic() {
        let a = Se2::from_xyt(1.0, 2.0, 0.0);
        let s: Se2<Expr> = a.into();
        assert_eq!(s.translation(), [Expr::Num(1.0), Expr::Num(2.0)]);
        assert_eq!(s.to_string(), "t = (1.0000, 2.0000), 0.0000 deg");
    }
}
