//! Supervised learning data.

use crate::error::LcsError;

/// Input/target pairs stored row-major in two flat buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    x_dim: usize,
    y_dim: usize,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Samples {
    #[must_use]
    pub fn new(x_dim: usize, y_dim: usize) -> Self {
        Self {
            x_dim,
            y_dim,
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    #[must_use]
    pub fn x_dim(&self) -> usize {
        self.x_dim
    }

    #[must_use]
    pub fn y_dim(&self) -> usize {
        self.y_dim
    }

    /// Appends a sample.
    pub fn push(&mut self, x: &[f64], y: &[f64]) -> Result<(), LcsError> {
        check_len("input", self.x_dim, x)?;
        check_len("target", self.y_dim, y)?;
        self.x.extend_from_slice(x);
        self.y.extend_from_slice(y);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len().checked_div(self.y_dim).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn input(&self, index: usize) -> &[f64] {
        &self.x[index * self.x_dim..(index + 1) * self.x_dim]
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn target(&self, index: usize) -> &[f64] {
        &self.y[index * self.y_dim..(index + 1) * self.y_dim]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        (0..self.len()).map(|i| (self.input(i), self.target(i)))
    }
}

pub(crate) fn check_len(
    kind: &'static str,
    expected: usize,
    values: &[f64],
) -> Result<(), LcsError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(LcsError::DimensionMismatch {
            kind,
            expected,
            actual: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_index() {
        let mut samples = Samples::new(2, 1);
        samples.push(&[0.1, 0.2], &[1.0]).unwrap();
        samples.push(&[0.3, 0.4], &[2.0]).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.input(1), &[0.3, 0.4]);
        assert_eq!(samples.target(0), &[1.0]);
        assert_eq!(samples.iter().count(), 2);
    }

    #[test]
    fn test_push_rejects_wrong_shape() {
        let mut samples = Samples::new(2, 1);
        assert!(matches!(
            samples.push(&[0.1], &[1.0]),
            Err(LcsError::DimensionMismatch {
                kind: "input",
                expected: 2,
                actual: 1
            })
        ));
        assert!(samples.push(&[0.1, 0.2], &[]).is_err());
        assert!(samples.is_empty());
    }
}
