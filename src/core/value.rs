//! Resolved values tagged with their scalar domain.
//!
//! A value is numeric (`f64`) or symbolic ([`Expr`]) from the moment it is
//! built. Binary operations between the two promote the numeric side; the
//! reverse never happens.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::batch::Batch;
use crate::core::block::Block;
use crate::core::geometry::quaternion::Quaternion;
use crate::core::geometry::se2::Se2;
use crate::core::geometry::twist::Twist2;
use crate::core::math::Expr;
use crate::core::math::matrix::Vec3;
use crate::error::{Result, RigidError};

/// A raw block (points, norms) in a fixed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockValue {
    Numeric(Block<f64>),
    Symbolic(Block<Expr>),
}

impl BlockValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, BlockValue::Symbolic(_))
    }

    pub fn numeric(&self) -> Option<&Block<f64>> {
        match self {
            BlockValue::Numeric(b) => Some(b),
            BlockValue::Symbolic(_) => None,
        }
    }

    pub fn into_symbolic(self) -> Block<Expr> {
        match self {
            BlockValue::Numeric(b) => b.map(|x| Expr::Num(*x)),
            BlockValue::Symbolic(b) => b,
        }
    }
}

impl From<Block<f64>> for BlockValue {
    fn from(b: Block<f64>) -> Self {
        BlockValue::Numeric(b)
    }
}

impl From<Block<Expr>> for BlockValue {
    fn from(b: Block<Expr>) -> Self {
        BlockValue::Symbolic(b)
    }
}

/// Right-hand operand of [`Se2Value::apply`] and [`Se2Value::apply_divide`].
#[derive(Debug, Clone, Copy)]
pub enum ValueOperand<'a> {
    Transforms(&'a Se2Value),
    Points(&'a BlockValue),
    Scalar(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueProduct {
    Transforms(Se2Value),
    Points(BlockValue),
}

/// One or more planar transforms in a fixed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Se2Value {
    Numeric(Batch<Se2<f64>>),
    Symbolic(Batch<Se2<Expr>>),
}

impl Se2Value {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Se2Value::Symbolic(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Se2Value::Numeric(b) => b.len(),
            Se2Value::Symbolic(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn numeric(&self) -> Option<&Batch<Se2<f64>>> {
        match self {
            Se2Value::Numeric(b) => Some(b),
            Se2Value::Symbolic(_) => None,
        }
    }

    pub fn into_numeric(self) -> Option<Batch<Se2<f64>>> {
        match self {
            Se2Value::Numeric(b) => Some(b),
            Se2Value::Symbolic(_) => None,
        }
    }

    /// The same transforms in the symbolic domain.
    pub fn into_symbolic(self) -> Batch<Se2<Expr>> {
        match self {
            Se2Value::Numeric(b) => b.into(),
            Se2Value::Symbolic(b) => b,
        }
    }

    pub fn compose(&self, rhs: &Se2Value) -> Result<Se2Value> {
        match (self, rhs) {
            (Se2Value::Numeric(a), Se2Value::Numeric(b)) => a.compose(b).map(Se2Value::Numeric),
            _ => self
                .clone()
                .into_symbolic()
                .compose(&rhs.clone().into_symbolic())
                .map(Se2Value::Symbolic),
        }
    }

    pub fn divide(&self, rhs: &Se2Value) -> Result<Se2Value> {
        self.compose(&rhs.inverse())
    }

    pub fn inverse(&self) -> Se2Value {
        match self {
            Se2Value::Numeric(b) => Se2Value::Numeric(b.inverse()),
            Se2Value::Symbolic(b) => Se2Value::Symbolic(b.inverse()),
        }
    }

    pub fn try_pow(&self, exponent: f64) -> Result<Se2Value> {
        Ok(match self {
            Se2Value::Numeric(b) => Se2Value::Numeric(b.try_pow(exponent)?),
            Se2Value::Symbolic(b) => Se2Value::Symbolic(b.try_pow(exponent)?),
        })
    }

    /// Transforms `2 × N` column points, promoting across domains.
    pub fn transform_points(&self, points: &BlockValue) -> Result<BlockValue> {
        match (self, points) {
            (Se2Value::Numeric(a), BlockValue::Numeric(p)) => {
                a.transform_points(p).map(BlockValue::Numeric)
            }
            _ => self
                .clone()
                .into_symbolic()
                .transform_points(&points.clone().into_symbolic())
                .map(BlockValue::Symbolic),
        }
    }

    /// Product dispatched on the right operand: transforms compose, points
    /// are transformed.
    pub fn apply(&self, rhs: ValueOperand<'_>) -> Result<ValueProduct> {
        match rhs {
            ValueOperand::Transforms(b) => self.compose(b).map(ValueProduct::Transforms),
            ValueOperand::Points(p) => self.transform_points(p).map(ValueProduct::Points),
            ValueOperand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "compose",
                operand: "scalar",
            }),
        }
    }

    pub fn apply_divide(&self, rhs: ValueOperand<'_>) -> Result<Se2Value> {
        match rhs {
            ValueOperand::Transforms(b) => self.divide(b),
            ValueOperand::Points(_) => Err(RigidError::InvalidOperandType {
                op: "divide",
                operand: "raw matrix",
            }),
            ValueOperand::Scalar(_) => Err(RigidError::InvalidOperandType {
                op: "divide",
                operand: "scalar",
            }),
        }
    }

    /// Twists of every transform. Symbolic transforms have no closed-form
    /// logarithm here.
    pub fn log(&self) -> Result<Batch<Twist2>> {
        match self {
            Se2Value::Numeric(b) => Ok(b.log()),
            Se2Value::Symbolic(_) => Err(RigidError::InvalidOperandType {
                op: "log",
                operand: "symbolic transform",
            }),
        }
    }

    pub fn exp(twists: &Batch<Twist2>) -> Se2Value {
        Se2Value::Numeric(twists.exp())
    }

    /// Exact elementwise equality, promoting across domains.
    pub fn eq_elementwise(&self, rhs: &Se2Value) -> Result<Batch<bool>> {
        match (self, rhs) {
            (Se2Value::Numeric(a), Se2Value::Numeric(b)) => a.eq_elementwise(b),
            _ => self
                .clone()
                .into_symbolic()
                .eq_elementwise(&rhs.clone().into_symbolic()),
        }
    }
}

impl From<Se2<f64>> for Se2Value {
    fn from(t: Se2<f64>) -> Self {
        Se2Value::Numeric(Batch::one(t))
    }
}

impl From<Se2<Expr>> for Se2Value {
    fn from(t: Se2<Expr>) -> Self {
        Se2Value::Symbolic(Batch::one(t))
    }
}

impl From<Batch<Se2<f64>>> for Se2Value {
    fn from(b: Batch<Se2<f64>>) -> Self {
        Se2Value::Numeric(b)
    }
}

impl From<Batch<Se2<Expr>>> for Se2Value {
    fn from(b: Batch<Se2<Expr>>) -> Self {
        Se2Value::Symbolic(b)
    }
}

impl fmt::Display for Se2Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Se2Value::Numeric(b) => fmt::Display::fmt(b, f),
            Se2Value::Symbolic(b) => fmt::Display::fmt(b, f),
        }
    }
}

/// One or more quaternions in a fixed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuaternionValue {
    Numeric(Batch<Quaternion<f64>>),
    Symbolic(Batch<Quaternion<Expr>>),
}

impl QuaternionValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, QuaternionValue::Symbolic(_))
    }

    pub fn len(&self) -> usize {
        match self {
            QuaternionValue::Numeric(b) => b.len(),
            QuaternionValue::Symbolic(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn numeric(&self) -> Option<&Batch<Quaternion<f64>>> {
        match self {
            QuaternionValue::Numeric(b) => Some(b),
            QuaternionValue::Symbolic(_) => None,
        }
    }

    pub fn into_numeric(self) -> Option<Batch<Quaternion<f64>>> {
        match self {
            QuaternionValue::Numeric(b) => Some(b),
            QuaternionValue::Symbolic(_) => None,
        }
    }

    pub fn into_symbolic(self) -> Batch<Quaternion<Expr>> {
        match self {
            QuaternionValue::Numeric(b) => b.into(),
            QuaternionValue::Symbolic(b) => b,
        }
    }

    /// Hamilton product, promoting across domains.
    pub fn times(&self, rhs: &QuaternionValue) -> Result<QuaternionValue> {
        match (self, rhs) {
            (QuaternionValue::Numeric(a), QuaternionValue::Numeric(b)) => {
                a.zip_with(b, |p, q| p.hamilton(q)).map(QuaternionValue::Numeric)
            }
            _ => self
                .clone()
                .into_symbolic()
                .zip_with(&rhs.clone().into_symbolic(), |p, q| p.hamilton(q))
                .map(QuaternionValue::Symbolic),
        }
    }

    pub fn divide(&self, rhs: &QuaternionValue) -> Result<QuaternionValue> {
        self.times(&rhs.inverse())
    }

    pub fn plus(&self, rhs: &QuaternionValue) -> Result<QuaternionValue> {
        match (self, rhs) {
            (QuaternionValue::Numeric(a), QuaternionValue::Numeric(b)) => {
                a.zip_with(b, |p, q| p.plus(q)).map(QuaternionValue::Numeric)
            }
            _ => self
                .clone()
                .into_symbolic()
                .zip_with(&rhs.clone().into_symbolic(), |p, q| p.plus(q))
                .map(QuaternionValue::Symbolic),
        }
    }

    pub fn minus(&self, rhs: &QuaternionValue) -> Result<QuaternionValue> {
        self.plus(&rhs.negated())
    }

    pub fn conjugate(&self) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.conjugate()),
            QuaternionValue::Symbolic(b) => QuaternionValue::Symbolic(b.conjugate()),
        }
    }

    pub fn inverse(&self) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.inverse()),
            QuaternionValue::Symbolic(b) => QuaternionValue::Symbolic(b.inverse()),
        }
    }

    /// Componentwise product with a real scalar.
    pub fn scale(&self, k: f64) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.map(|q| q.scale(&k))),
            QuaternionValue::Symbolic(b) => {
                let k = Expr::Num(k);
                QuaternionValue::Symbolic(b.map(|q| q.scale(&k)))
            }
        }
    }

    /// Componentwise division by a real scalar.
    pub fn unscale(&self, k: f64) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.map(|q| q.unscale(&k))),
            QuaternionValue::Symbolic(b) => {
                let k = Expr::Num(k);
                QuaternionValue::Symbolic(b.map(|q| q.unscale(&k)))
            }
        }
    }

    /// Norms as a `1 × N` row.
    pub fn norm(&self) -> BlockValue {
        match self {
            QuaternionValue::Numeric(b) => BlockValue::Numeric(Block::row(b.norm())),
            QuaternionValue::Symbolic(b) => BlockValue::Symbolic(Block::row(b.norm())),
        }
    }

    pub fn unit(&self) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.unit()),
            QuaternionValue::Symbolic(b) => QuaternionValue::Symbolic(b.unit()),
        }
    }

    /// Rates under the angular velocity `omega`.
    pub fn dot(&self, omega: &Vec3<f64>) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.dot(omega)),
            QuaternionValue::Symbolic(b) => {
                QuaternionValue::Symbolic(b.dot(&omega.map(Expr::Num)))
            }
        }
    }

    fn negated(&self) -> QuaternionValue {
        match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.map(|q| -q.clone())),
            QuaternionValue::Symbolic(b) => QuaternionValue::Symbolic(b.map(|q| -q.clone())),
        }
    }

    pub fn try_pow(&self, exponent: f64) -> Result<QuaternionValue> {
        Ok(match self {
            QuaternionValue::Numeric(b) => QuaternionValue::Numeric(b.try_pow(exponent)?),
            QuaternionValue::Symbolic(b) => QuaternionValue::Symbolic(b.try_pow(exponent)?),
        })
    }

    pub fn eq_elementwise(&self, rhs: &QuaternionValue) -> Result<Batch<bool>> {
        match (self, rhs) {
            (QuaternionValue::Numeric(a), QuaternionValue::Numeric(b)) => a.eq_elementwise(b),
            _ => self
                .clone()
                .into_symbolic()
                .eq_elementwise(&rhs.clone().into_symbolic()),
        }
    }
}

impl From<Quaternion<f64>> for QuaternionValue {
    fn from(q: Quaternion<f64>) -> Self {
        QuaternionValue::Numeric(Batch::one(q))
    }
}

impl From<Quaternion<Expr>> for QuaternionValue {
    fn from(q: Quaternion<Expr>) -> Self {
        QuaternionValue::Symbolic(Batch::one(q))
    }
}

impl From<Batch<Quaternion<f64>>> for QuaternionValue {
    fn from(b: Batch<Quaternion<f64>>) -> Self {
        QuaternionValue::Numeric(b)
    }
}

impl From<Batch<Quaternion<Expr>>> for QuaternionValue {
    fn from(b: Batch<Quaternion<Expr>>) -> Self {
        QuaternionValue::Symbolic(b)
    }
}

impl fmt::Display for QuaternionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn lines<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            items: &[T],
        ) -> fmt::Result {
            for (i, q) in items.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                match f.precision() {
                    Some(p) => write!(f, "{q:.p$}")?,
                    None => write!(f, "{q}")?,
                }
            }
            Ok(())
        }
        match self {
            QuaternionValue::Numeric(b) => lines(f, b.as_slice()),
            QuaternionValue::Symbolic(b) => lines(f, b.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_numeric_stays_numeric() {
        let a = Se2Value::from(Se2::from_xyt(1.0, 2.0, 0.5));
        let b = Se2Value::from(Se2::from_translation(3.0, 0.0));
        let c = a.compose(&b).unwrap();
        assert!(!c.is_symbolic());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_mixed_domains_promote() {
        let a = Se2Value::from(Se2::from_translation(1.0, 0.0));
        let b = Se2Value::from(Se2::<Expr>::from_translation("x".into(), "y".into()));
        let c = a.compose(&b).unwrap();
        assert!(c.is_symbolic());
        let t = c.into_symbolic()[0].translation();
        let bindings = HashMap::from([("x".to_string(), 2.0), ("y".to_string(), 5.0)]);
        assert_eq!(t[0].eval(&bindings), Some(3.0));
        assert_eq!(t[1].eval(&bindings), Some(5.0));
        assert!(b.compose(&a).unwrap().is_symbolic());
    }

    #[test]
    fn test_broadcast_error_propagates() {
        let two = Se2Value::from(Batch::new(vec![Se2::<f64>::identity(); 2]));
        let three = Se2Value::from(Batch::new(vec![Se2::<f64>::identity(); 3]));
        assert_eq!(
            two.compose(&three),
            Err(RigidError::LengthMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_quaternion_value_ops() {
        let i = QuaternionValue::from(Quaternion::new(0.0, [1.0, 0.0, 0.0]));
        let ii = i.times(&i).unwrap();
        assert_eq!(ii, QuaternionValue::from(Quaternion::new(-1.0, [0.0, 0.0, 0.0])));
        let zero = i.minus(&i).unwrap();
        assert_eq!(zero, QuaternionValue::from(Quaternion::new(0.0, [0.0; 3])));
        assert!(i.try_pow(1.5).is_err());
    }

    #[test]
    fn test_quaternion_plus_promotes() {
        let p = QuaternionValue::from(Quaternion::new(1.0, [2.0, 0.0, -1.0]));
        let q = QuaternionValue::from(Quaternion::<Expr>::new(
            "a".into(),
            [Expr::Num(0.5), "b".into(), Expr::Num(0.0)],
        ));
        let bindings = HashMap::from([("a".to_string(), 3.0), ("b".to_string(), -4.0)]);
        for sum in [p.plus(&q).unwrap(), q.plus(&p).unwrap()] {
            assert!(sum.is_symbolic());
            let values = sum.into_symbolic()[0]
                .to_vector4()
                .map(|e| e.eval(&bindings).unwrap());
            assert_eq!(values, [4.0, 2.5, -4.0, -1.0]);
        }
        assert!(!p.plus(&p).unwrap().is_symbolic());
    }

    #[test]
    fn test_quaternion_value_scalar_and_norm() {
        let q = QuaternionValue::from(Quaternion::new(1.0, [2.0, 2.0, 4.0]));
        assert_eq!(
            q.scale(2.0),
            QuaternionValue::from(Quaternion::new(2.0, [4.0, 4.0, 8.0]))
        );
        assert_eq!(
            q.unscale(2.0),
            QuaternionValue::from(Quaternion::new(0.5, [1.0, 1.0, 2.0]))
        );
        assert_eq!(q.norm(), BlockValue::Numeric(Block::row([5.0])));
        assert_eq!(
            q.unit(),
            QuaternionValue::from(Quaternion::new(0.2, [0.4, 0.4, 0.8]))
        );

        let zero = || Expr::Num(0.0);
        let s = QuaternionValue::from(Quaternion::<Expr>::new("s".into(), [zero(), zero(), zero()]));
        assert!(s.norm().is_symbolic());
        let bindings = HashMap::from([("s".to_string(), 3.0)]);
        let doubled = s.scale(2.0).into_symbolic();
        assert_eq!(doubled[0].s().eval(&bindings), Some(6.0));
    }

    #[test]
    fn test_quaternion_value_dot() {
        let q = Quaternion::new(0.8, [0.1, -0.3, 0.5]);
        let w = [0.4, -1.2, 2.0];
        let value = QuaternionValue::from(q).dot(&w);
        assert_eq!(value, QuaternionValue::from(q.dot(&w)));

        let symbolic = QuaternionValue::from(Quaternion::<Expr>::from(q)).dot(&w);
        assert!(symbolic.is_symbolic());
        let expected = q.dot(&w).to_vector4();
        let got = symbolic.into_symbolic()[0].to_vector4();
        for (e, g) in expected.iter().zip(got) {
            let g = g.eval(&HashMap::new()).unwrap();
            assert!((e - g).abs() < 1e-12);
        }
    }

    #[test]
    fn test_se2_value_points_overload() {
        let a = Se2Value::from(Se2::from_translation(1.0, -1.0));
        let pts = BlockValue::from(Block::from_columns(&[[0.0, 0.0], [2.0, 3.0]]).unwrap());
        match a.apply(ValueOperand::Points(&pts)).unwrap() {
            ValueProduct::Points(BlockValue::Numeric(out)) => {
                assert_eq!(out.column_values(1, 0), vec![3.0, 2.0]);
            }
            other => panic!("expected numeric points, got {other:?}"),
        }
        assert!(matches!(
            a.apply(ValueOperand::Scalar(2.0)),
            Err(RigidError::InvalidOperandType { .. })
        ));
        assert!(matches!(
            a.apply_divide(ValueOperand::Points(&pts)),
            Err(RigidError::InvalidOperandType { .. })
        ));
        let back = a.apply_divide(ValueOperand::Transforms(&a)).unwrap();
        assert_eq!(back, Se2Value::from(Se2::<f64>::identity()));

        let column = [Expr::symbol("x"), Expr::Num(0.0)];
        let sym = BlockValue::from(Block::from_columns(&[column]).unwrap());
        let out = a.transform_points(&sym).unwrap();
        assert!(out.is_symbolic());
        let x = out.into_symbolic().get(0, 0, 0).clone();
        let bindings = HashMap::from([("x".to_string(), 4.0)]);
        assert_eq!(x.eval(&bindings), Some(5.0));
    }

    #[test]
    fn test_se2_value_log_exp() {
        let a = Se2::from_xyt(1.0, 2.0, 0.5);
        let twists = Se2Value::from(a).log().unwrap();
        let back = Se2Value::exp(&twists).into_numeric().unwrap();
        for (r, e) in back[0].matrix().iter().zip(a.matrix()) {
            for (x, y) in r.iter().zip(e) {
                assert!((x - y).abs() < 1e-12);
            }
        }

        let s = Se2Value::from(Se2::<Expr>::from_translation("x".into(), Expr::Num(0.0)));
        assert!(matches!(s.log(), Err(RigidError::InvalidOperandType { .. })));
    }

    #[test]
    fn test_quaternion_equality_is_raw() {
        let q = QuaternionValue::from(Quaternion::new(0.5, [0.5, 0.5, 0.5]));
        let neg = QuaternionValue::from(Quaternion::new(-0.5, [-0.5, -0.5, -0.5]));
        assert!(!q.eq_elementwise(&neg).unwrap().any());
        assert!(q.eq_elementwise(&q).unwrap().all());
    }
}
