//! Constructor argument resolution.
//!
//! A free-form argument list is first classified into one [`InputKind`],
//! then built into a canonical value. Classification looks only at arity
//! and shapes; validity of rotation blocks is checked while building.

pub mod options;

use std::fmt;

use crate::config::{AlgebraConfig, AngleUnit};
use crate::core::batch::Batch;
use crate::core::block::Block;
use crate::core::geometry::quaternion::Quaternion;
use crate::core::geometry::se2::Se2;
use crate::core::geometry::validity::{
    is_homog2, is_homog2_strict, is_rot2, is_rot2_strict, is_rot3, is_rot3_strict,
};
use crate::core::math::{Expr, Real};
use crate::core::value::{BlockValue, QuaternionValue, Se2Value};
use crate::error::{Result, RigidError};

use self::options::OptionDef;

/// One constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Num(Block<f64>),
    Sym(Block<Expr>),
    Transform(Se2Value),
    Quaternion(QuaternionValue),
    /// Keyword, e.g. `"deg"`.
    Text(String),
}

impl Arg {
    fn describe(&self) -> String {
        match self {
            Arg::Num(b) => format!("numeric {}", shape(b)),
            Arg::Sym(b) => format!("symbolic {}", shape(b)),
            Arg::Transform(v) => format!("{} transform(s)", v.len()),
            Arg::Quaternion(v) => format!("{} quaternion(s)", v.len()),
            Arg::Text(s) => format!("keyword '{s}'"),
        }
    }
}

fn shape<T: Clone>(b: &Block<T>) -> String {
    match b.shape() {
        (r, c, 1) => format!("{r}x{c}"),
        (r, c, p) => format!("{r}x{c}x{p}"),
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Arg::Num(Block::scalar(x))
    }
}

impl<const N: usize> From<[f64; N]> for Arg {
    fn from(v: [f64; N]) -> Self {
        Arg::Num(Block::row(v))
    }
}

impl From<Vec<f64>> for Arg {
    fn from(v: Vec<f64>) -> Self {
        Arg::Num(Block::row(v))
    }
}

impl From<Block<f64>> for Arg {
    fn from(b: Block<f64>) -> Self {
        Arg::Num(b)
    }
}

impl From<Expr> for Arg {
    fn from(x: Expr) -> Self {
        Arg::Sym(Block::scalar(x))
    }
}

impl<const N: usize> From<[Expr; N]> for Arg {
    fn from(v: [Expr; N]) -> Self {
        Arg::Sym(Block::row(v))
    }
}

impl From<Block<Expr>> for Arg {
    fn from(b: Block<Expr>) -> Self {
        Arg::Sym(b)
    }
}

impl From<Se2<f64>> for Arg {
    fn from(t: Se2<f64>) -> Self {
        Arg::Transform(t.into())
    }
}

impl From<Batch<Se2<f64>>> for Arg {
    fn from(b: Batch<Se2<f64>>) -> Self {
        Arg::Transform(b.into())
    }
}

impl From<Se2Value> for Arg {
    fn from(v: Se2Value) -> Self {
        Arg::Transform(v)
    }
}

impl From<Quaternion<f64>> for Arg {
    fn from(q: Quaternion<f64>) -> Self {
        Arg::Quaternion(q.into())
    }
}

impl From<QuaternionValue> for Arg {
    fn from(v: QuaternionValue) -> Self {
        Arg::Quaternion(v)
    }
}

impl From<BlockValue> for Arg {
    fn from(v: BlockValue) -> Self {
        match v {
            BlockValue::Numeric(b) => Arg::Num(b),
            BlockValue::Symbolic(b) => Arg::Sym(b),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

/// Builds a `Vec<Arg>` from anything convertible into [`Arg`].
///
/// ```
/// use rigid::args;
/// let args = args![1.0, 2.0, 90.0, "deg"];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::resolve::Arg::from($arg)),*]
    };
}

/// Construction mode selected for an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `[x y]`.
    Translation,
    /// `[x y θ]`.
    XyTheta,
    /// `2 × 2 (× N)` rotation.
    RotationBlock,
    /// `3 × 3 (× N)` homogeneous matrix.
    HomogeneousBlock,
    /// Existing transform value(s).
    TransformClone,
    /// `N × 2` or `N × 3`, one transform per row.
    RowArray,
    /// `x, y`.
    TranslationPair,
    /// `[x y], θ`.
    TranslationAngle,
    /// `R, [x y]`.
    RotationTranslation,
    /// `x, y, θ`.
    XyThetaScalars,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Construction mode for quaternion arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuaternionKind {
    /// `s`.
    Scalar,
    /// `[x y z]`.
    Pure,
    /// `[s x y z]`.
    Components,
    /// `3 × 3 (× N)` rotation.
    RotationBlock,
    /// Existing quaternion value(s).
    QuaternionClone,
    /// `N × 4`, one quaternion per row.
    RowArray,
    /// `s, [x y z]`.
    ScalarVector,
}

const SE2_UNIT_CHOICES: &[&str] = &["rad", "deg"];

/// Resolves argument lists under a fixed [`AlgebraConfig`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: AlgebraConfig,
}

impl Resolver {
    pub fn new(config: AlgebraConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlgebraConfig {
        &self.config
    }

    /// Resolves planar transform arguments. A `"rad"` or `"deg"` keyword
    /// anywhere in the list sets the unit of angle arguments.
    pub fn se2(&self, args: Vec<Arg>) -> Result<Se2Value> {
        let defs = [OptionDef::Choice {
            name: "unit",
            choices: SE2_UNIT_CHOICES,
            default: self.config.angle_unit.keyword().to_string(),
        }];
        let (opts, residue) = options::parse(&defs, args)?;
        let unit = opts
            .choice("unit")
            .and_then(AngleUnit::from_keyword)
            .unwrap_or(self.config.angle_unit);

        if let [Arg::Transform(v)] = residue.as_slice() {
            tracing::debug!(kind = %InputKind::TransformClone, n = v.len(), "resolved se2");
            return Ok(v.clone());
        }

        let value = match raw_blocks(residue)? {
            RawBlocks::Numeric(blocks) => Se2Value::Numeric(self.build_se2(&blocks, unit)?),
            RawBlocks::Symbolic(blocks) => Se2Value::Symbolic(self.build_se2(&blocks, unit)?),
        };
        Ok(value)
    }

    /// Resolves quaternion arguments.
    pub fn quaternion(&self, args: Vec<Arg>) -> Result<QuaternionValue> {
        if let [Arg::Quaternion(v)] = args.as_slice() {
            tracing::debug!(
                kind = ?QuaternionKind::QuaternionClone,
                n = v.len(),
                "resolved quaternion"
            );
            return Ok(v.clone());
        }
        let value = match raw_blocks(args)? {
            RawBlocks::Numeric(blocks) => QuaternionValue::Numeric(self.build_quaternion(&blocks)?),
            RawBlocks::Symbolic(blocks) => {
                QuaternionValue::Symbolic(self.build_quaternion(&blocks)?)
            }
        };
        Ok(value)
    }

    fn build_se2<T: Real>(&self, args: &[Block<T>], unit: AngleUnit) -> Result<Batch<Se2<T>>> {
        let kind = classify_se2(args)?;
        let angle = |theta: &T| to_radians(theta, unit);

        let batch: Batch<Se2<T>> = match kind {
            InputKind::Translation | InputKind::XyTheta => {
                Batch::one(se2_from_row(args[0].as_slice(), unit)?)
            }
            InputKind::RotationBlock => {
                self.check_strict(&args[0], is_rot2_strict)?;
                (0..args[0].pages())
                    .map(|p| Se2::from_rotation(args[0].page2(p)))
                    .collect()
            }
            InputKind::HomogeneousBlock => {
                self.check_strict(&args[0], is_homog2_strict)?;
                (0..args[0].pages())
                    .map(|p| Se2::from_matrix(args[0].page3(p)))
                    .collect()
            }
            InputKind::RowArray => (0..args[0].rows())
                .map(|r| se2_from_row(args[0].row_values(r), unit))
                .collect::<Result<_>>()?,
            InputKind::TranslationPair => Batch::one(Se2::from_translation(
                args[0].as_slice()[0].clone(),
                args[1].as_slice()[0].clone(),
            )),
            InputKind::TranslationAngle => {
                let t = args[0].as_slice();
                Batch::one(Se2::from_xyt(
                    t[0].clone(),
                    t[1].clone(),
                    angle(&args[1].as_slice()[0]),
                ))
            }
            InputKind::RotationTranslation => {
                self.check_strict(&args[0], is_rot2_strict)?;
                let t = args[1].as_slice();
                Batch::one(Se2::from_parts(args[0].page2(0), [t[0].clone(), t[1].clone()]))
            }
            InputKind::XyThetaScalars => Batch::one(Se2::from_xyt(
                args[0].as_slice()[0].clone(),
                args[1].as_slice()[0].clone(),
                angle(&args[2].as_slice()[0]),
            )),
            InputKind::TransformClone => {
                return Err(RigidError::UnrecognizedArgument(
                    "transform mixed with raw arguments".into(),
                ));
            }
        };

        tracing::debug!(%kind, n = batch.len(), symbolic = T::SYMBOLIC, ?unit, "resolved se2");
        Ok(batch)
    }

    fn build_quaternion<T: Real>(&self, args: &[Block<T>]) -> Result<Batch<Quaternion<T>>> {
        let kind = classify_quaternion(args)?;
        let batch: Batch<Quaternion<T>> = match kind {
            QuaternionKind::Scalar => {
                let s = args[0].as_slice()[0].clone();
                Batch::one(Quaternion::new(s, std::array::from_fn(|_| T::zero())))
            }
            QuaternionKind::Pure | QuaternionKind::Components => {
                Batch::one(quaternion_from_row(args[0].as_slice())?)
            }
            QuaternionKind::RowArray => (0..args[0].rows())
                .map(|r| quaternion_from_row(args[0].row_values(r)))
                .collect::<Result<_>>()?,
            QuaternionKind::ScalarVector => {
                if !args[0].is_scalar() {
                    return Err(RigidError::MalformedComponent(format!(
                        "scalar part must be a scalar, got {}",
                        shape(&args[0])
                    )));
                }
                let v = &args[1];
                if !v.is_vector() {
                    return Err(RigidError::MalformedComponent(format!(
                        "vector part must be a vector, got {}",
                        shape(v)
                    )));
                }
                Batch::one(Quaternion::try_new(args[0].as_slice()[0].clone(), v.as_slice())?)
            }
            QuaternionKind::RotationBlock => {
                if T::SYMBOLIC {
                    return Err(RigidError::UnrecognizedArgument(
                        "symbolic rotation block for quaternion".into(),
                    ));
                }
                self.check_strict(&args[0], is_rot3_strict)?;
                let m = numeric(&args[0]);
                (0..m.pages())
                    .map(|p| {
                        let q = Quaternion::from_rotation_matrix(&m.page3(p));
                        Quaternion::new(T::from_f64(*q.s()), q.v().map(T::from_f64))
                    })
                    .collect()
            }
            QuaternionKind::QuaternionClone => {
                return Err(RigidError::UnrecognizedArgument(
                    "quaternion mixed with raw arguments".into(),
                ));
            }
        };
        tracing::debug!(?kind, n = batch.len(), symbolic = T::SYMBOLIC, "resolved quaternion");
        Ok(batch)
    }

    /// Runs a strict predicate on a numeric block when enabled.
    /// Symbolic blocks pass unchecked.
    fn check_strict<T: Real>(
        &self,
        block: &Block<T>,
        test: fn(&Block<f64>, f64) -> bool,
    ) -> Result<()> {
        if T::SYMBOLIC || !self.config.strict_rotations {
            return Ok(());
        }
        if test(&numeric(block), self.config.tolerance_factor) {
            Ok(())
        } else {
            Err(RigidError::UnrecognizedArgument(format!(
                "{} block is not a valid rotation",
                shape(block)
            )))
        }
    }
}

/// Classifies raw SE(2) arguments by arity and shape.
pub fn classify_se2<T: Clone>(args: &[Block<T>]) -> Result<InputKind> {
    let kind = match args {
        [a] if a.is_vector_of(2) => InputKind::Translation,
        [a] if a.is_vector_of(3) => InputKind::XyTheta,
        [a] if is_rot2(a) => InputKind::RotationBlock,
        [a] if is_homog2(a) => InputKind::HomogeneousBlock,
        [a] if a.pages() == 1 && a.rows() > 1 && (a.cols() == 2 || a.cols() == 3) => {
            InputKind::RowArray
        }
        [a, b] if a.is_scalar() && b.is_scalar() => InputKind::TranslationPair,
        [a, b] if a.is_vector_of(2) && b.is_scalar() => InputKind::TranslationAngle,
        [a, b] if is_rot2(a) && a.pages() == 1 && b.is_vector_of(2) => {
            InputKind::RotationTranslation
        }
        [a, b, c] if a.is_scalar() && b.is_scalar() && c.is_scalar() => InputKind::XyThetaScalars,
        _ => {
            return Err(RigidError::UnrecognizedArgument(format!(
                "no transform construction takes ({})",
                args.iter().map(shape).collect::<Vec<_>>().join(", ")
            )));
        }
    };
    Ok(kind)
}

/// Classifies raw quaternion arguments by arity and shape.
pub fn classify_quaternion<T: Clone>(args: &[Block<T>]) -> Result<QuaternionKind> {
    let kind = match args {
        [a] if a.is_scalar() => QuaternionKind::Scalar,
        [a] if a.is_vector_of(3) => QuaternionKind::Pure,
        [a] if a.is_vector_of(4) => QuaternionKind::Components,
        [a] if is_rot3(a) => QuaternionKind::RotationBlock,
        [a] if a.pages() == 1 && a.rows() > 1 && a.cols() == 4 => QuaternionKind::RowArray,
        [_, _] => QuaternionKind::ScalarVector,
        _ => {
            return Err(RigidError::UnrecognizedArgument(format!(
                "no quaternion construction takes ({})",
                args.iter().map(shape).collect::<Vec<_>>().join(", ")
            )));
        }
    };
    Ok(kind)
}

fn to_radians<T: Real>(theta: &T, unit: AngleUnit) -> T {
    match unit {
        AngleUnit::Radians => theta.clone(),
        AngleUnit::Degrees => theta.clone() * T::from_f64(unit.radians_per_unit()),
    }
}

/// `[x y]` as a translation, `[x y θ]` with `θ` in `unit`.
fn se2_from_row<T: Real>(row: &[T], unit: AngleUnit) -> Result<Se2<T>> {
    match row {
        [x, y, theta] => Ok(Se2::from_xyt(x.clone(), y.clone(), to_radians(theta, unit))),
        [x, y] => Ok(Se2::from_translation(x.clone(), y.clone())),
        _ => Err(RigidError::UnrecognizedArgument(format!(
            "transform row of {} values",
            row.len()
        ))),
    }
}

/// `[x y z]` as a pure quaternion, `[s x y z]` componentwise.
fn quaternion_from_row<T: Real>(row: &[T]) -> Result<Quaternion<T>> {
    match row {
        [s, x, y, z] => Ok(Quaternion::new(s.clone(), [x.clone(), y.clone(), z.clone()])),
        [x, y, z] => Ok(Quaternion::pure([x.clone(), y.clone(), z.clone()])),
        _ => Err(RigidError::UnrecognizedArgument(format!(
            "quaternion row of {} values",
            row.len()
        ))),
    }
}

fn numeric<T: Real>(block: &Block<T>) -> Block<f64> {
    block.map(|x| x.to_f64().unwrap_or(f64::NAN))
}

/// Raw arguments, all in one domain.
enum RawBlocks {
    Numeric(Vec<Block<f64>>),
    Symbolic(Vec<Block<Expr>>),
}

/// Collects raw blocks, promoting every argument to symbolic if any is.
fn raw_blocks(args: Vec<Arg>) -> Result<RawBlocks> {
    if let Some(bad) = args
        .iter()
        .find(|a| !matches!(a, Arg::Num(_) | Arg::Sym(_)))
    {
        return Err(RigidError::UnrecognizedArgument(bad.describe()));
    }
    let symbolic = args.iter().any(|a| matches!(a, Arg::Sym(_)));
    let raw = if symbolic {
        RawBlocks::Symbolic(
            args.into_iter()
                .filter_map(|a| match a {
                    Arg::Num(b) => Some(b.map(|&x| Expr::Num(x))),
                    Arg::Sym(b) => Some(b),
                    _ => None,
                })
                .collect(),
        )
    } else {
        RawBlocks::Numeric(
            args.into_iter()
                .filter_map(|a| match a {
                    Arg::Num(b) => Some(b),
                    _ => None,
                })
                .collect(),
        )
    };
    Ok(raw)
}

/// [`Resolver::se2`] with the default configuration.
pub fn se2(args: Vec<Arg>) -> Result<Se2Value> {
    Resolver::default().se2(args)
}

/// [`Resolver::quaternion`] with the default configuration.
pub fn quaternion(args: Vec<Arg>) -> Result<QuaternionValue> {
    Resolver::default().quaternion(args)
}
