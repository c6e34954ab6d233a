//! Row-major 2D grid used for per-cell annotations.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix<T> {
    pub data: Vec<Vec<T>>,
}

impl<T> Matrix<T> {
    pub fn new(data: Vec<Vec<T>>) -> Self {
        Self { data }
    }

    /// Build a `(nrows, ncols)` matrix, calling `f` once per cell.
    pub fn default_with(shape: (usize, usize), mut f: impl FnMut() -> T) -> Self {
        let (nrows, ncols) = shape;
        Self {
            data: (0..nrows)
                .map(|_| (0..ncols).map(|_| f()).collect())
                .collect(),
        }
    }

    /// `(nrows, ncols)`; fails when rows have different lengths.
    pub fn shape(&self) -> Result<(usize, usize)> {
        let Some(first) = self.data.first() else {
            return Ok((0, 0));
        };
        let ncols = first.len();
        if self.data.iter().any(|row| row.len() != ncols) {
            return Err(ModelError::NotRectangular);
        }
        Ok((self.data.len(), ncols))
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.data.get(row)?.get(col)
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.data.get_mut(row)?.get_mut(col)
    }

    pub fn row(&self, row: usize) -> Option<&[T]> {
        self.data.get(row).map(Vec::as_slice)
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Matrix<U> {
        Matrix {
            data: self
                .data
                .into_iter()
                .map(|row| row.into_iter().map(&mut f).collect())
                .collect(),
        }
    }

    pub fn flat_iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter().flatten()
    }

    /// Iterate `(row, col, item)` in row-major order.
    pub fn enumerate_flat_iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.data
            .iter()
            .enumerate()
            .flat_map(|(ri, row)| row.iter().enumerate().map(move |(ci, item)| (ri, ci, item)))
    }
}

impl<T: Default> Matrix<T> {
    pub fn default_of_shape(shape: (usize, usize)) -> Self {
        Self::default_with(shape, T::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_of_empty_matrix() {
        let m: Matrix<u8> = Matrix::new(vec![]);
        assert_eq!(m.shape().unwrap(), (0, 0));
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let m = Matrix::new(vec![vec![1, 2], vec![3]]);
        assert!(matches!(m.shape(), Err(ModelError::NotRectangular)));
    }

    #[test]
    fn default_and_flat_iteration() {
        let mut m: Matrix<Vec<u8>> = Matrix::default_of_shape((2, 3));
        assert_eq!(m.shape().unwrap(), (2, 3));
        m.get_mut(1, 2).unwrap().push(7);

        let cells: Vec<(usize, usize)> = m
            .enumerate_flat_iter()
            .filter(|(_, _, v)| !v.is_empty())
            .map(|(r, c, _)| (r, c))
            .collect();
        assert_eq!(cells, vec![(1, 2)]);
        assert_eq!(m.flat_iter().count(), 6);
    }
}
