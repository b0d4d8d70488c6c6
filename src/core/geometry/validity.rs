//! Validity predicates for raw rotation and homogeneous-transform blocks.
//!
//! The shape tests are cheap classification guards. The strict tests also
//! check, page by page, that the rotation part is orthonormal with unit
//! determinant to within `k·ε`, stopping at the first failing page. None of
//! these report errors: an invalid block is simply `false`.

use glam::{DMat2, DMat3, DVec2};

use crate::core::block::Block;
use crate::core::math::matrix::{Mat2, Mat3, to_dmat2, to_dmat3};

/// Default `k` in the strict tolerance `k·ε`.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = 10.0;

/// `2 × 2` or `2 × 2 × N`.
pub fn is_rot2<T: Clone>(m: &Block<T>) -> bool {
    m.rows() == 2 && m.cols() == 2
}

/// `3 × 3` or `3 × 3 × N`.
pub fn is_rot3<T: Clone>(m: &Block<T>) -> bool {
    m.rows() == 3 && m.cols() == 3
}

/// Planar homogeneous transform, `3 × 3` or `3 × 3 × N`.
pub fn is_homog2<T: Clone>(m: &Block<T>) -> bool {
    is_rot3(m)
}

/// Spatial homogeneous transform, `4 × 4` or `4 × 4 × N`.
pub fn is_homog3<T: Clone>(m: &Block<T>) -> bool {
    m.rows() == 4 && m.cols() == 4
}

pub fn is_rot2_strict(m: &Block<f64>, k: f64) -> bool {
    is_rot2(m) && (0..m.pages()).all(|p| rotation2_ok(&m.page2(p), k))
}

pub fn is_rot3_strict(m: &Block<f64>, k: f64) -> bool {
    is_rot3(m) && (0..m.pages()).all(|p| rotation3_ok(&m.page3(p), k))
}

pub fn is_homog2_strict(m: &Block<f64>, k: f64) -> bool {
    is_homog2(m) && (0..m.pages()).all(|p| homogeneous2_ok(&m.page3(p), k))
}

pub fn is_homog3_strict(m: &Block<f64>, k: f64) -> bool {
    if !is_homog3(m) {
        return false;
    }
    (0..m.pages()).all(|p| {
        let rot: Mat3<f64> = std::array::from_fn(|r| std::array::from_fn(|c| *m.get(r, c, p)));
        let bottom = [0.0, 0.0, 0.0, 1.0];
        rotation3_ok(&rot, k) && (0..4).all(|c| *m.get(3, c, p) == bottom[c])
    })
}

/// Strict test of a single `2 × 2` rotation.
pub fn rotation2_ok(r: &Mat2<f64>, k: f64) -> bool {
    let tol = k * f64::EPSILON;
    let m = to_dmat2(r);
    let e = m.transpose() * m - DMat2::IDENTITY;
    frobenius(&[e.x_axis, e.y_axis]) <= tol && (m.determinant() - 1.0).abs() <= tol
}

/// Strict test of a single `3 × 3` rotation.
pub fn rotation3_ok(r: &Mat3<f64>, k: f64) -> bool {
    let tol = k * f64::EPSILON;
    let m = to_dmat3(r);
    let e = m.transpose() * m - DMat3::IDENTITY;
    let norm = [e.x_axis, e.y_axis, e.z_axis]
        .iter()
        .map(|v| v.length_squared())
        .sum::<f64>()
        .sqrt();
    norm <= tol && (m.determinant() - 1.0).abs() <= tol
}

/// Strict test of a single planar homogeneous matrix: rotation block plus
/// a bottom row of exactly `[0 0 1]`.
pub fn homogeneous2_ok(t: &Mat3<f64>, k: f64) -> bool {
    let rot = [[t[0][0], t[0][1]], [t[1][0], t[1][1]]];
    rotation2_ok(&rot, k) && t[2] == [0.0, 0.0, 1.0]
}

fn frobenius(cols: &[DVec2]) -> f64 {
    cols.iter().map(|v| v.length_squared()).sum::<f64>().sqrt()
}
