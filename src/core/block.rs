use serde::{Deserialize, Serialize};

use crate::core::math::Expr;
use crate::core::math::matrix::{Mat2, Mat3};
use crate::error::{Result, RigidError};

/// A raw numeric block of up to three dimensions: `rows × cols × pages`.
///
/// Entries are stored page by page, each page in row-major order, so for a
/// single-row or single-column block the storage order is the element order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock<T>")]
pub struct Block<T> {
    rows: usize,
    cols: usize,
    pages: usize,
    data: Vec<T>,
}

/// Deserialized form of [`Block`], checked before it becomes one.
#[derive(Deserialize)]
struct RawBlock<T> {
    rows: usize,
    cols: usize,
    pages: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawBlock<T>> for Block<T> {
    type Error = RigidError;

    fn try_from(raw: RawBlock<T>) -> Result<Self> {
        let RawBlock {
            rows,
            cols,
            pages,
            data,
        } = raw;
        let expected = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(pages));
        if expected != Some(data.len()) {
            return Err(RigidError::UnrecognizedArgument(format!(
                "block of shape {rows} x {cols} x {pages} holds {} entries",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            pages,
            data,
        })
    }
}

impl<T: Clone> Block<T> {
    pub fn scalar(x: T) -> Self {
        Self {
            rows: 1,
            cols: 1,
            pages: 1,
            data: vec![x],
        }
    }

    /// A `1 × n` row vector.
    pub fn row(values: impl IntoIterator<Item = T>) -> Self {
        let data: Vec<T> = values.into_iter().collect();
        Self {
            rows: 1,
            cols: data.len(),
            pages: 1,
            data,
        }
    }

    /// An `n × 1` column vector.
    pub fn column(values: impl IntoIterator<Item = T>) -> Self {
        let data: Vec<T> = values.into_iter().collect();
        Self {
            rows: data.len(),
            cols: 1,
            pages: 1,
            data,
        }
    }

    /// Builds a matrix from its rows. Ragged input is rejected.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        if rows.iter().any(|r| r.as_ref().len() != cols) {
            return Err(RigidError::UnrecognizedArgument(
                "matrix rows have different lengths".into(),
            ));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            pages: 1,
            data: rows.iter().flat_map(|r| r.as_ref().iter().cloned()).collect(),
        })
    }

    /// Builds a `2 × n` or `3 × n` block whose columns are the given points.
    pub fn from_columns<C: AsRef<[T]>>(columns: &[C]) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.as_ref().len());
        if columns.iter().any(|c| c.as_ref().len() != rows) {
            return Err(RigidError::UnrecognizedArgument(
                "matrix columns have different lengths".into(),
            ));
        }
        let data = (0..rows)
            .flat_map(|r| columns.iter().map(move |c| c.as_ref()[r].clone()))
            .collect();
        Ok(Self {
            rows,
            cols: columns.len(),
            pages: 1,
            data,
        })
    }

    /// Stacks equally-shaped 2-D blocks along the third axis.
    pub fn stack(pages: &[Block<T>]) -> Result<Self> {
        let Some(first) = pages.first() else {
            return Err(RigidError::UnrecognizedArgument("empty stack".into()));
        };
        if pages
            .iter()
            .any(|p| p.pages != 1 || p.rows != first.rows || p.cols != first.cols)
        {
            return Err(RigidError::UnrecognizedArgument(
                "stacked pages have different shapes".into(),
            ));
        }
        Ok(Self {
            rows: first.rows,
            cols: first.cols,
            pages: pages.len(),
            data: pages.iter().flat_map(|p| p.data.iter().cloned()).collect(),
        })
    }

    pub fn stack_mat2(pages: &[Mat2<T>]) -> Self {
        Self {
            rows: 2,
            cols: 2,
            pages: pages.len(),
            data: pages.iter().flatten().flatten().cloned().collect(),
        }
    }

    pub fn stack_mat3(pages: &[Mat3<T>]) -> Self {
        Self {
            rows: 3,
            cols: 3,
            pages: pages.len(),
            data: pages.iter().flatten().flatten().cloned().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.pages)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.data.len() == 1
    }

    /// A single row or single column.
    pub fn is_vector(&self) -> bool {
        self.pages == 1 && (self.rows == 1 || self.cols == 1)
    }

    pub fn is_vector_of(&self, n: usize) -> bool {
        self.is_vector() && self.data.len() == n
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize, page: usize) -> &T {
        &self.data[(page * self.rows + row) * self.cols + col]
    }

    /// Row `r` of the first page.
    pub fn row_values(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn column_values(&self, c: usize, page: usize) -> Vec<T> {
        (0..self.rows).map(|r| self.get(r, c, page).clone()).collect()
    }

    /// Page `p` of a `2 × 2 × N` block.
    pub fn page2(&self, p: usize) -> Mat2<T> {
        std::array::from_fn(|r| std::array::from_fn(|c| self.get(r, c, p).clone()))
    }

    /// Page `p` of a `3 × 3 × N` block.
    pub fn page3(&self, p: usize) -> Mat3<T> {
        std::array::from_fn(|r| std::array::from_fn(|c| self.get(r, c, p).clone()))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Block<U> {
        Block {
            rows: self.rows,
            cols: self.cols,
            pages: self.pages,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl From<f64> for Block<f64> {
    fn from(x: f64) -> Self {
        Block::scalar(x)
    }
}

impl From<Expr> for Block<Expr> {
    fn from(x: Expr) -> Self {
        Block::scalar(x)
    }
}

impl<T: Clone, const N: usize> From<[T; N]> for Block<T> {
    fn from(values: [T; N]) -> Self {
        Block::row(values)
    }
}

impl<T: Clone> From<Vec<T>> for Block<T> {
    fn from(values: Vec<T>) -> Self {
        Block::row(values)
    }
}
