//! Fixed-size row-major matrix helpers over any [`Real`] scalar.
//!
//! `m[r][c]` is row `r`, column `c`. Numeric matrices convert to and from
//! glam types, which are column-major.

use glam::{DMat2, DMat3};

use super::real::{dot, Real};

pub type Vec2<T> = [T; 2];
pub type Vec3<T> = [T; 3];
pub type Mat2<T> = [[T; 2]; 2];
pub type Mat3<T> = [[T; 3]; 3];

pub fn identity2<T: Real>() -> Mat2<T> {
    std::array::from_fn(|r| std::array::from_fn(|c| if r == c { T::one() } else { T::zero() }))
}

pub fn identity3<T: Real>() -> Mat3<T> {
    std::array::from_fn(|r| std::array::from_fn(|c| if r == c { T::one() } else { T::zero() }))
}

/// Planar rotation by `theta` radians.
pub fn rot2<T: Real>(theta: &T) -> Mat2<T> {
    let (s, c) = (theta.sin(), theta.cos());
    [[c.clone(), -s.clone()], [s, c]]
}

pub fn transpose2<T: Real>(m: &Mat2<T>) -> Mat2<T> {
    std::array::from_fn(|r| std::array::from_fn(|c| m[c][r].clone()))
}

pub fn mul2_vec<T: Real>(m: &Mat2<T>, v: &Vec2<T>) -> Vec2<T> {
    std::array::from_fn(|r| dot(&m[r], v))
}

pub fn mul3<T: Real>(a: &Mat3<T>, b: &Mat3<T>) -> Mat3<T> {
    std::array::from_fn(|r| {
        std::array::from_fn(|c| {
            (0..3).fold(T::zero(), |acc, k| acc + a[r][k].clone() * b[k][c].clone())
        })
    })
}

pub fn mul3_vec<T: Real>(m: &Mat3<T>, v: &Vec3<T>) -> Vec3<T> {
    std::array::from_fn(|r| dot(&m[r], v))
}

pub fn cross3<T: Real>(a: &Vec3<T>, b: &Vec3<T>) -> Vec3<T> {
    [
        a[1].clone() * b[2].clone() - a[2].clone() * b[1].clone(),
        a[2].clone() * b[0].clone() - a[0].clone() * b[2].clone(),
        a[0].clone() * b[1].clone() - a[1].clone() * b[0].clone(),
    ]
}

/// Skew-symmetric matrix `[v]×` such that `[v]× w == v × w`.
pub fn skew3<T: Real>(v: &Vec3<T>) -> Mat3<T> {
    let z = T::zero;
    [
        [z(), -v[2].clone(), v[1].clone()],
        [v[2].clone(), z(), -v[0].clone()],
        [-v[1].clone(), v[0].clone(), z()],
    ]
}

pub fn map3<T, U>(m: &Mat3<T>, f: impl Fn(&T) -> U) -> Mat3<U> {
    std::array::from_fn(|r| std::array::from_fn(|c| f(&m[r][c])))
}

pub fn to_dmat2(m: &Mat2<f64>) -> DMat2 {
    DMat2::from_cols_array_2d(m).transpose()
}

pub fn to_dmat3(m: &Mat3<f64>) -> DMat3 {
    DMat3::from_cols_array_2d(m).transpose()
}

pub fn from_dmat3(m: &DMat3) -> Mat3<f64> {
    m.transpose().to_cols_array_2d()
}
