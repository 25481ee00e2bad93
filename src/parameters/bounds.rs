//! Range bounds
//!
//! Closed intervals used by range optimization specs, both to validate
//! explicitly set values and to draw uniform samples.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with range bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Range bounds must be finite, got [{min}, {max}]")]
    InfiniteBounds { min: f64, max: f64 },

    #[error("Range [{min}, {max}] is too wide to sample")]
    UnboundedWidth { min: f64, max: f64 },

    #[error("Range [{min}, {max}] contains no integer")]
    NoIntegerInRange { min: f64, max: f64 },
}

/// A closed interval `[min, max]` with finite ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower end of the interval
    pub min: f64,

    /// Upper end of the interval
    pub max: f64,
}

impl Bounds {
    /// Create new bounds with min and max values
    ///
    /// # Arguments
    ///
    /// * `min` - Lower end of the interval
    /// * `max` - Upper end of the interval
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if both ends are finite, min <= max and the width
    /// `max - min` is finite, or an error otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(250.0, 350.0).unwrap();
    /// assert_eq!(bounds.min, 250.0);
    /// assert_eq!(bounds.max, 350.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(BoundsError::InfiniteBounds { min, max });
        }
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        let bounds = Self { min, max };
        if !bounds.width().is_finite() {
            return Err(BoundsError::UnboundedWidth { min, max });
        }

        Ok(bounds)
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check a value, returning the violation as an error
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        if self.is_within_bounds(value) {
            Ok(())
        } else {
            Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// The smallest and largest integers inside the bounds
    pub fn integer_range(&self) -> Result<(i64, i64), BoundsError> {
        let low = self.min.ceil();
        let high = self.max.floor();
        if low > high {
            return Err(BoundsError::NoIntegerInRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok((low as i64, high as i64))
    }

    /// Width of the interval
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

impl From<Bounds> for (f64, f64) {
    fn from(bounds: Bounds) -> Self {
        (bounds.min, bounds.max)
    }
}
