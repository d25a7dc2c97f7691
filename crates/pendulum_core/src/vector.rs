use crate::error::AlgebraError;
use log::warn;
use nalgebra::DVector;
use std::fmt;
use std::ops::Index;

/// Right-hand side of an element-wise vector operation.
///
/// A scalar is broadcast to the receiver's length; a component slice must
/// already have that length.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Scalar(f64),
    Components(&'a [f64]),
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a> From<&'a Vector> for Operand<'a> {
    fn from(value: &'a Vector) -> Self {
        Operand::Components(value.as_slice())
    }
}

impl<'a> From<&'a [f64]> for Operand<'a> {
    fn from(value: &'a [f64]) -> Self {
        Operand::Components(value)
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for Operand<'a> {
    fn from(value: &'a [f64; N]) -> Self {
        Operand::Components(value.as_slice())
    }
}

impl Operand<'_> {
    /// Expands the operand to exactly `len` components.
    pub(crate) fn broadcast(self, len: usize) -> Result<DVector<f64>, AlgebraError> {
        match self {
            Operand::Scalar(value) => Ok(DVector::from_element(len, value)),
            Operand::Components(values) => {
                if values.len() != len {
                    return Err(AlgebraError::DimensionMismatch {
                        expected: len,
                        actual: values.len(),
                    });
                }
                Ok(DVector::from_column_slice(values))
            }
        }
    }
}

/// Fixed-length numeric vector.
///
/// The length is chosen at construction and never changes. Algebraic
/// operations return new vectors; only the `set_x`/`set_y`/`set_z`
/// accessors write in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(DVector<f64>);

impl Vector {
    pub fn new(components: Vec<f64>) -> Result<Self, AlgebraError> {
        if components.is_empty() {
            return Err(AlgebraError::EmptyVector);
        }
        Ok(Self(DVector::from_vec(components)))
    }

    /// A vector of `len` copies of `value`.
    pub fn splat(value: f64, len: usize) -> Result<Self, AlgebraError> {
        if len == 0 {
            return Err(AlgebraError::EmptyVector);
        }
        Ok(Self(DVector::from_element(len, value)))
    }

    pub fn zeros(len: usize) -> Result<Self, AlgebraError> {
        Self::splat(0.0, len)
    }

    /// Wraps storage that is already known to be non-empty.
    pub(crate) fn from_dvector(data: DVector<f64>) -> Self {
        debug_assert!(!data.is_empty());
        Self(data)
    }

    pub(crate) fn as_dvector(&self) -> &DVector<f64> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.as_slice().to_vec()
    }

    fn component(&self, index: usize, name: char) -> f64 {
        if index >= self.len() {
            warn!("Accessing .{} of vector of length {}", name, self.len());
            return 0.0;
        }
        self.0[index]
    }

    fn set_component(&mut self, index: usize, name: char, value: f64) -> Result<(), AlgebraError> {
        if index >= self.len() {
            return Err(AlgebraError::MissingComponent {
                component: name,
                len: self.len(),
            });
        }
        self.0[index] = value;
        Ok(())
    }

    /// First component, or `0.0` (with a warning) if absent.
    pub fn x(&self) -> f64 {
        self.component(0, 'x')
    }

    pub fn y(&self) -> f64 {
        self.component(1, 'y')
    }

    pub fn z(&self) -> f64 {
        self.component(2, 'z')
    }

    pub fn set_x(&mut self, value: f64) -> Result<(), AlgebraError> {
        self.set_component(0, 'x', value)
    }

    pub fn set_y(&mut self, value: f64) -> Result<(), AlgebraError> {
        self.set_component(1, 'y', value)
    }

    pub fn set_z(&mut self, value: f64) -> Result<(), AlgebraError> {
        self.set_component(2, 'z', value)
    }

    pub fn add<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Vector, AlgebraError> {
        let rhs = other.into().broadcast(self.len())?;
        Ok(Self(&self.0 + rhs))
    }

    pub fn sub<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Vector, AlgebraError> {
        let rhs = other.into().broadcast(self.len())?;
        Ok(Self(&self.0 - rhs))
    }

    pub fn mult<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Vector, AlgebraError> {
        let rhs = other.into().broadcast(self.len())?;
        Ok(Self(self.0.component_mul(&rhs)))
    }

    /// Element-wise division, computed as multiplication by the reciprocal.
    /// A zero divisor gives an infinite component rather than an error.
    pub fn divide<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Vector, AlgebraError> {
        let rhs = other.into().broadcast(self.len())?.map(|q| 1.0 / q);
        Ok(Self(self.0.component_mul(&rhs)))
    }

    pub fn dot<'a>(&self, other: impl Into<Operand<'a>>) -> Result<f64, AlgebraError> {
        let rhs = other.into().broadcast(self.len())?;
        Ok(self.0.dot(&rhs))
    }

    /// Euclidean length.
    pub fn size(&self) -> f64 {
        self.0.norm()
    }

    /// Angle from the +x axis, `atan2(y, x)`.
    pub fn heading(&self) -> f64 {
        self.y().atan2(self.x())
    }

    pub fn normalise(&self) -> Result<Vector, AlgebraError> {
        let size = self.size();
        if size == 0.0 {
            return Err(AlgebraError::NullVector);
        }
        self.divide(size)
    }

    /// Rotates about the z axis by `theta` radians.
    ///
    /// Length-1 vectors come back unchanged and a third component is carried
    /// through untouched. Higher dimensions are rejected.
    pub fn rotate(&self, theta: f64) -> Result<Vector, AlgebraError> {
        let (sin, cos) = theta.sin_cos();
        match self.len() {
            0 | 1 => Ok(self.clone()),
            2 | 3 => {
                let mut out = self.0.clone();
                out[0] = self.0[0] * cos - self.0[1] * sin;
                out[1] = self.0[0] * sin + self.0[1] * cos;
                Ok(Self(out))
            }
            n => Err(AlgebraError::UnsupportedRotation(n)),
        }
    }

    /// Deep copy.
    pub fn copy(&self) -> Vector {
        self.clone()
    }

    pub fn concat(&self, other: &Vector) -> Vector {
        let mut data = Vec::with_capacity(self.len() + other.len());
        data.extend_from_slice(self.as_slice());
        data.extend_from_slice(other.as_slice());
        Self(DVector::from_vec(data))
    }
}

impl TryFrom<Vec<f64>> for Vector {
    type Error = AlgebraError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Vector::new(value)
    }
}

impl TryFrom<&[f64]> for Vector {
    type Error = AlgebraError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        Vector::new(value.to_vec())
    }
}

impl<const N: usize> TryFrom<[f64; N]> for Vector {
    type Error = AlgebraError;

    fn try_from(value: [f64; N]) -> Result<Self, Self::Error> {
        Vector::new(value.to_vec())
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
