use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::real::Real;

/// An exact symbolic expression.
///
/// Arithmetic builds expression trees instead of evaluating, so matrices
/// assembled from symbols stay exact. Constructors fold constant
/// sub-expressions and drop additive and multiplicative identities; there is
/// no further algebraic simplification, and equality is structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Num(f64),
    Sym(String),
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Sqrt(Box<Expr>),
    Atan2(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Sym(name.into())
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Expr::Num(x) => Some(*x),
            _ => None,
        }
    }

    /// `true` if the expression mentions no symbol.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Num(_) => true,
            Expr::Sym(_) => false,
            Expr::Neg(a) | Expr::Sin(a) | Expr::Cos(a) | Expr::Sqrt(a) => a.is_constant(),
            Expr::Add(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Atan2(a, b) => {
                a.is_constant() && b.is_constant()
            }
        }
    }

    /// Evaluates the expression with the given symbol values.
    ///
    /// Returns `None` if a symbol has no binding.
    pub fn eval(&self, bindings: &HashMap<String, f64>) -> Option<f64> {
        Some(match self {
            Expr::Num(x) => *x,
            Expr::Sym(name) => *bindings.get(name)?,
            Expr::Add(a, b) => a.eval(bindings)? + b.eval(bindings)?,
            Expr::Mul(a, b) => a.eval(bindings)? * b.eval(bindings)?,
            Expr::Div(a, b) => a.eval(bindings)? / b.eval(bindings)?,
            Expr::Neg(a) => -a.eval(bindings)?,
            Expr::Sin(a) => a.eval(bindings)?.sin(),
            Expr::Cos(a) => a.eval(bindings)?.cos(),
            Expr::Sqrt(a) => a.eval(bindings)?.sqrt(),
            Expr::Atan2(a, b) => a.eval(bindings)?.atan2(b.eval(bindings)?),
        })
    }

    fn is_num(&self, value: f64) -> bool {
        matches!(self, Expr::Num(x) if *x == value)
    }

    fn unary(self, fold: fn(f64) -> f64, wrap: fn(Box<Expr>) -> Expr) -> Expr {
        match self {
            Expr::Num(x) => Expr::Num(fold(x)),
            other => wrap(Box::new(other)),
        }
    }
}

impl From<f64> for Expr {
    fn from(x: f64) -> Self {
        Expr::Num(x)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::symbol(name)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Num(a), Expr::Num(b)) => Expr::Num(a + b),
            (a, b) if a.is_num(0.0) => b,
            (a, b) if b.is_num(0.0) => a,
            (a, b) => Expr::Add(Box::new(a), Box::new(b)),
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Num(a), Expr::Num(b)) => Expr::Num(a * b),
            (a, _) if a.is_num(0.0) => Expr::Num(0.0),
            (_, b) if b.is_num(0.0) => Expr::Num(0.0),
            (a, b) if a.is_num(1.0) => b,
            (a, b) if b.is_num(1.0) => a,
            (a, b) if a.is_num(-1.0) => -b,
            (a, b) if b.is_num(-1.0) => -a,
            (a, b) => Expr::Mul(Box::new(a), Box::new(b)),
        }
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Num(a), Expr::Num(b)) if b != 0.0 => Expr::Num(a / b),
            (a, b) if b.is_num(1.0) => a,
            (a, b) if a.is_num(0.0) && !b.is_num(0.0) => Expr::Num(0.0),
            (a, b) => Expr::Div(Box::new(a), Box::new(b)),
        }
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Num(x) => Expr::Num(-x),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }
}

impl Real for Expr {
    const SYMBOLIC: bool = true;

    fn zero() -> Self {
        Expr::Num(0.0)
    }

    fn one() -> Self {
        Expr::Num(1.0)
    }

    fn from_f64(x: f64) -> Self {
        Expr::Num(x)
    }

    fn sin(&self) -> Self {
        self.clone().unary(f64::sin, Expr::Sin)
    }

    fn cos(&self) -> Self {
        self.clone().unary(f64::cos, Expr::Cos)
    }

    fn sqrt(&self) -> Self {
        self.clone().unary(f64::sqrt, Expr::Sqrt)
    }

    fn atan2(&self, x: &Self) -> Self {
        match (self, x) {
            (Expr::Num(y), Expr::Num(x)) => Expr::Num(f64::atan2(*y, *x)),
            (y, x) => Expr::Atan2(Box::new(y.clone()), Box::new(x.clone())),
        }
    }

    fn to_f64(&self) -> Option<f64> {
        self.as_num()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(x) => match f.precision() {
                Some(p) => write!(f, "{x:.p$}"),
                None => write!(f, "{x}"),
            },
            Expr::Sym(name) => f.write_str(name),
            Expr::Add(a, b) => match b.as_ref() {
                Expr::Neg(b) => write!(f, "({a} - {b})"),
                b => write!(f, "({a} + {b})"),
            },
            Expr::Mul(a, b) => write!(f, "{a}*{b}"),
            Expr::Div(a, b) => write!(f, "{a}/{b}"),
            Expr::Neg(a) => write!(f, "-{a}"),
            Expr::Sin(a) => write!(f, "sin({a})"),
            Expr::Cos(a) => write!(f, "cos({a})"),
            Expr::Sqrt(a) => write!(f, "sqrt({a})"),
            Expr::Atan2(a, b) => write!(f, "atan2({a}, {b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folding() {
        let e = Expr::from(2.0) * Expr::from(3.0) + Expr::from(1.0);
        assert_eq!(e, Expr::Num(7.0));
    }

    #[test]
    fn test_identities_dropped() {
        let x = Expr::symbol("x");
        assert_eq!(x.clone() + Expr::zero(), x);
        assert_eq!(Expr::one() * x.clone(), x);
        assert_eq!(Expr::zero() * x.clone(), Expr::Num(0.0));
        assert_eq!(-(-x.clone()), x);
        assert_eq!(x.clone() / Expr::one(), x);
    }

    #[test]
    fn test_symbols_stay_exact() {
        let q = Expr::symbol("q");
        let c = q.cos();
        assert_eq!(c, Expr::Cos(Box::new(Expr::symbol("q"))));
        assert!(!c.is_constant());
        assert_eq!(c.to_f64(), None);
    }

    #[test]
    fn test_eval_with_bindings() {
        let q = Expr::symbol("q");
        let e = q.sin() * q.sin() + q.cos() * q.cos();
        let bindings = HashMap::from([("q".to_string(), 0.7)]);
        let value = e.eval(&bindings).unwrap();
        assert!((value - 1.0).abs() < 1e-12);
        assert_eq!(e.eval(&HashMap::new()), None);
    }

    #[test]
    fn test_atan2_folds_constants_and_keeps_symbols() {
        let folded = Expr::Num(1.0).atan2(&Expr::Num(1.0));
        assert_eq!(folded, Expr::Num(std::f64::consts::FRAC_PI_4));

        let y = Expr::symbol("y");
        let kept = y.atan2(&Expr::one());
        assert_eq!(kept, Expr::Atan2(Box::new(y), Box::new(Expr::Num(1.0))));
        let bindings = HashMap::from([("y".to_string(), 1.0)]);
        let value = kept.eval(&bindings).unwrap();
        assert!((value - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let e = Expr::symbol("x") - Expr::symbol("y").cos();
        assert_eq!(e.to_string(), "(x - cos(y))");
        assert_eq!(format!("{:.2}", Expr::Num(0.5)), "0.50");
    }
}
