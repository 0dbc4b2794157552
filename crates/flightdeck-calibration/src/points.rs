//! Calibration point definitions and interpolation

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{CalibrationError, CalibrationResult};

/// One entry of a calibration table.
///
/// # Examples
///
/// ```
/// use flightdeck_calibration::CalibrationPoint;
///
/// let point = CalibrationPoint::new(0.5, 200.0);
/// assert!((point.input - 0.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Raw value as exported by the simulator.
    pub input: f64,
    /// Engineering value shown to the pilot.
    pub output: f64,
}

impl CalibrationPoint {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Piecewise-linear mapping from raw wire scalars to engineering units.
///
/// Points are kept sorted by input. Values between two points are linearly
/// interpolated; values outside the table follow the slope of the nearest
/// boundary segment, so there is no implicit clamping.
///
/// # Examples
///
/// ```
/// use flightdeck_calibration::{CalibrationPoint, CalibrationPointCollection};
///
/// let table = CalibrationPointCollection::new(vec![
///     CalibrationPoint::new(0.0, 0.0),
///     CalibrationPoint::new(0.5, 100.0),
///     CalibrationPoint::new(1.0, 400.0),
/// ])?;
///
/// assert!((table.interpolate(0.25) - 50.0).abs() < 1e-9);
/// assert!((table.interpolate(0.75) - 250.0).abs() < 1e-9);
/// // Beyond the table the last segment is extended.
/// assert!((table.interpolate(1.5) - 700.0).abs() < 1e-9);
/// # Ok::<(), flightdeck_calibration::CalibrationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CalibrationPoint>", into = "Vec<CalibrationPoint>")]
pub struct CalibrationPointCollection {
    points: Vec<CalibrationPoint>,
}

impl CalibrationPointCollection {
    /// Builds a table from points in any order.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty, contains a non-finite coordinate, or
    /// repeats an input value.
    pub fn new(mut points: Vec<CalibrationPoint>) -> CalibrationResult<Self> {
        if points.is_empty() {
            return Err(CalibrationError::Empty);
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.input.is_finite() || !p.output.is_finite())
        {
            return Err(CalibrationError::NonFinite { index });
        }

        points.sort_by(|a, b| a.input.total_cmp(&b.input));
        for pair in points.windows(2) {
            if let [a, b] = pair
                && a.input.total_cmp(&b.input) == Ordering::Equal
            {
                return Err(CalibrationError::DuplicateInput { input: a.input });
            }
        }

        Ok(Self { points })
    }

    /// Straight line through two points, the common case for linear gauges.
    ///
    /// # Errors
    ///
    /// Fails when both points share the same input.
    pub fn linear(from: CalibrationPoint, to: CalibrationPoint) -> CalibrationResult<Self> {
        Self::new(vec![from, to])
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maps a raw value through the table.
    ///
    /// Every table point maps exactly onto its own output.
    pub fn interpolate(&self, value: f64) -> f64 {
        // Index of the first point whose input is >= value.
        let upper = self.points.partition_point(|p| p.input < value);

        if let Some(point) = self.points.get(upper)
            && point.input.total_cmp(&value) == Ordering::Equal
        {
            return point.output;
        }

        let (left, right) = match self.segment_around(upper) {
            Some(segment) => segment,
            None => {
                return self.points.first().map_or(value, |p| p.output);
            }
        };

        let span = right.input - left.input;
        left.output + (value - left.input) * (right.output - left.output) / span
    }

    /// Segment used for a value that sorts before `upper`.
    ///
    /// Values below the first point use the first segment and values past the
    /// last point use the last one.
    fn segment_around(&self, upper: usize) -> Option<(CalibrationPoint, CalibrationPoint)> {
        let count = self.points.len();
        if count < 2 {
            return None;
        }
        let right_index = upper.clamp(1, count - 1);
        let left = self.points.get(right_index - 1)?;
        let right = self.points.get(right_index)?;
        Some((*left, *right))
    }
}

impl TryFrom<Vec<CalibrationPoint>> for CalibrationPointCollection {
    type Error = CalibrationError;

    fn try_from(points: Vec<CalibrationPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<CalibrationPointCollection> for Vec<CalibrationPoint> {
    fn from(table: CalibrationPointCollection) -> Self {
        table.points
    }
}
