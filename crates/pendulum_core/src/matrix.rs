use crate::error::AlgebraError;
use crate::vector::{Operand, Vector};
use nalgebra::{DMatrix, DVector, Rotation3, Unit, Vector3};
use std::fmt;

/// Small dense N×N matrix intended for transforms. No determinant or inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: DMatrix<f64>,
}

impl SquareMatrix {
    /// Builds a matrix from a flat row-major array of length N².
    pub fn new(values: Vec<f64>) -> Result<Self, AlgebraError> {
        let len = values.len();
        let n = (len as f64).sqrt().round() as usize;
        if n == 0 || n * n != len {
            return Err(AlgebraError::NotSquare(len));
        }
        Ok(Self {
            n,
            data: DMatrix::from_row_slice(n, n, &values),
        })
    }

    pub fn identity(n: usize) -> Result<Self, AlgebraError> {
        if n == 0 {
            return Err(AlgebraError::InvalidSize);
        }
        Ok(Self {
            n,
            data: DMatrix::identity(n, n),
        })
    }

    /// Rotation by `theta` radians about the x axis.
    ///
    /// All three factories build active right-handed rotations: applied with
    /// `vecmul`, a positive `theta` turns vectors counter-clockwise when
    /// viewed from the positive end of the axis. Their transposes rotate by
    /// `-theta`.
    pub fn rot3d_x(theta: f64) -> Self {
        Self::from_rotation(Vector3::x_axis(), theta)
    }

    pub fn rot3d_y(theta: f64) -> Self {
        Self::from_rotation(Vector3::y_axis(), theta)
    }

    pub fn rot3d_z(theta: f64) -> Self {
        Self::from_rotation(Vector3::z_axis(), theta)
    }

    fn from_rotation(axis: Unit<Vector3<f64>>, theta: f64) -> Self {
        let rotation = Rotation3::from_axis_angle(&axis, theta);
        let m = rotation.matrix();
        Self {
            n: 3,
            data: DMatrix::from_fn(3, 3, |i, j| m[(i, j)]),
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), AlgebraError> {
        if row >= self.n || col >= self.n {
            return Err(AlgebraError::IndexOutOfRange {
                row,
                col,
                size: self.n,
            });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64, AlgebraError> {
        self.check_index(row, col)?;
        Ok(self.data[(row, col)])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), AlgebraError> {
        self.check_index(row, col)?;
        self.data[(row, col)] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<Vector, AlgebraError> {
        self.check_index(row, 0)?;
        let values: Vec<f64> = self.data.row(row).iter().copied().collect();
        Vector::new(values)
    }

    pub fn col(&self, col: usize) -> Result<Vector, AlgebraError> {
        self.check_index(0, col)?;
        let values: Vec<f64> = self.data.column(col).iter().copied().collect();
        Vector::new(values)
    }

    /// Scales the diagonal element-wise, leaving off-diagonal entries alone.
    pub fn stretch<'a>(&self, factors: impl Into<Operand<'a>>) -> Result<Self, AlgebraError> {
        let factors = factors.into().broadcast(self.n)?;
        let mut out = self.clone();
        for i in 0..self.n {
            out.data[(i, i)] *= factors[i];
        }
        Ok(out)
    }

    pub fn matmul(&self, other: &SquareMatrix) -> Result<Self, AlgebraError> {
        if other.n != self.n {
            return Err(AlgebraError::DimensionMismatch {
                expected: self.n,
                actual: other.n,
            });
        }
        Ok(Self {
            n: self.n,
            data: &self.data * &other.data,
        })
    }

    /// Applies the matrix to `vector`.
    pub fn vecmul(&self, vector: &Vector) -> Result<Vector, AlgebraError> {
        if vector.len() != self.n {
            return Err(AlgebraError::DimensionMismatch {
                expected: self.n,
                actual: vector.len(),
            });
        }
        let product: DVector<f64> = &self.data * vector.as_dvector();
        Ok(Vector::from_dvector(product))
    }

    /// Packs a homogeneous 2D transform
    ///
    /// ```text
    /// [a c e]
    /// [b d f]
    /// [0 0 1]
    /// ```
    ///
    /// as `[a, b, c, d, e, f]`, the layout canvas `transform()` expects.
    pub fn to_dom_array(&self) -> Result<[f64; 6], AlgebraError> {
        Ok([
            self.get(0, 0)?,
            self.get(1, 0)?,
            self.get(0, 1)?,
            self.get(1, 1)?,
            self.get(0, 2)?,
            self.get(1, 2)?,
        ])
    }

    /// Row-major copy of the entries.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.transpose().as_slice().to_vec()
    }
}

impl fmt::Display for SquareMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.to_vec().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_close(actual: &Vector, expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.as_slice().iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "expected {expected:?}, got {actual}");
        }
    }

    #[test]
    fn rejects_non_square_backing_arrays() {
        assert_eq!(
            SquareMatrix::new(vec![1.0, 2.0, 3.0]),
            Err(AlgebraError::NotSquare(3))
        );
        assert_eq!(SquareMatrix::new(Vec::new()), Err(AlgebraError::NotSquare(0)));
        assert_eq!(SquareMatrix::identity(0), Err(AlgebraError::InvalidSize));
    }

    #[test]
    fn entries_are_row_major() {
        let mut m = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(0, 1).unwrap(), 2.0);
        assert_eq!(m.get(1, 0).unwrap(), 3.0);
        m.set(1, 1, 9.0).unwrap();
        assert_eq!(m.row(1).unwrap().as_slice(), &[3.0, 9.0]);
        assert_eq!(m.col(0).unwrap().as_slice(), &[1.0, 3.0]);
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0, 9.0]);
    }

    #[test]
    fn index_access_is_validated() {
        let mut m = SquareMatrix::identity(2).unwrap();
        assert!(matches!(
            m.get(2, 0),
            Err(AlgebraError::IndexOutOfRange { row: 2, col: 0, size: 2 })
        ));
        assert!(m.set(0, 5, 1.0).is_err());
        assert!(m.row(3).is_err());
        assert!(m.col(2).is_err());
    }

    #[test]
    fn identity_leaves_vectors_unchanged() {
        for values in [vec![1.5], vec![-1.0, 2.0, 3.5], vec![0.0, 7.0, -2.0, 1e-4, 3.0]] {
            let v = Vector::new(values.clone()).unwrap();
            let id = SquareMatrix::identity(values.len()).unwrap();
            assert_eq!(id.vecmul(&v).unwrap(), v);
        }
    }

    #[test]
    fn stretch_scales_only_the_diagonal() {
        let m = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let s = m.stretch(&[10.0, 0.5]).unwrap();
        assert_eq!(s.to_vec(), vec![10.0, 2.0, 3.0, 2.0]);
        let uniform = m.stretch(2.0).unwrap();
        assert_eq!(uniform.to_vec(), vec![2.0, 2.0, 3.0, 8.0]);
        assert!(m.stretch(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn matmul_matches_hand_computation() {
        let a = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = SquareMatrix::new(vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(a.matmul(&b).unwrap().to_vec(), vec![2.0, 1.0, 4.0, 3.0]);
        assert!(a.matmul(&SquareMatrix::identity(3).unwrap()).is_err());
    }

    #[test]
    fn vecmul_checks_dimensions() {
        let m = SquareMatrix::identity(3).unwrap();
        let err = m.vecmul(&Vector::zeros(2).unwrap()).unwrap_err();
        assert_eq!(
            err,
            AlgebraError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn axis_rotations_are_right_handed() {
        let x = Vector::new(vec![1.0, 0.0, 0.0]).unwrap();
        let y = Vector::new(vec![0.0, 1.0, 0.0]).unwrap();
        let z = Vector::new(vec![0.0, 0.0, 1.0]).unwrap();

        assert_vec_close(&SquareMatrix::rot3d_z(FRAC_PI_2).vecmul(&x).unwrap(), &[0.0, 1.0, 0.0]);
        assert_vec_close(&SquareMatrix::rot3d_x(FRAC_PI_2).vecmul(&y).unwrap(), &[0.0, 0.0, 1.0]);
        assert_vec_close(&SquareMatrix::rot3d_y(FRAC_PI_2).vecmul(&z).unwrap(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn rotation_sign_puts_sine_below_the_diagonal() {
        let theta: f64 = 0.4;
        let rz = SquareMatrix::rot3d_z(theta);
        assert!((rz.get(1, 0).unwrap() - theta.sin()).abs() < 1e-12);
        assert!((rz.get(0, 1).unwrap() + theta.sin()).abs() < 1e-12);

        let back = SquareMatrix::rot3d_z(-theta);
        for i in 0..3 {
            for j in 0..3 {
                assert!((back.get(i, j).unwrap() - rz.get(j, i).unwrap()).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn z_rotation_agrees_with_vector_rotate() {
        let v = Vector::new(vec![0.3, -1.2, 5.0]).unwrap();
        let theta = 0.77;
        let by_matrix = SquareMatrix::rot3d_z(theta).vecmul(&v).unwrap();
        assert_vec_close(&by_matrix, v.rotate(theta).unwrap().as_slice());
    }

    #[test]
    fn dom_array_packs_affine_columns() {
        let m = SquareMatrix::new(vec![
            1.0, 2.0, 5.0, //
            3.0, 4.0, 6.0, //
            0.0, 0.0, 1.0,
        ])
        .unwrap();
        assert_eq!(m.to_dom_array().unwrap(), [1.0, 3.0, 2.0, 4.0, 5.0, 6.0]);
        assert!(SquareMatrix::identity(2).unwrap().to_dom_array().is_err());
    }
}
