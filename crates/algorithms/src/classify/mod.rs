//! Matrix Method density classification
//!
//! Maps per-cell coverage percentages onto ordered density classes using
//! three thresholds. Bands are half-open: a value exactly on a threshold
//! belongs to the higher band. Values above 100 (overlapping footprints)
//! land in the top band; cells without a readable coverage value are
//! `NoData`, which is distinct from a measured 0.

use tracing::{debug, info};

use urbanmatrix_core::{
    Algorithm, AttributeValue, DensityClass, Error, Grid, Result, CLASS_FIELD, COVERAGE_FIELD,
};

/// Band boundaries in coverage percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Upper bound of the Low band
    pub low: f64,
    /// Upper bound of the Moderate band
    pub mid: f64,
    /// Upper bound of the High band; everything above is VeryHigh
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 25.0,
            mid: 50.0,
            high: 75.0,
        }
    }
}

impl Thresholds {
    pub fn new(low: f64, mid: f64, high: f64) -> Self {
        Self { low, mid, high }
    }

    /// Check `0 <= low < mid < high <= 100`. Out-of-order thresholds are an
    /// error, never silently reordered or clamped.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("low", self.low), ("mid", self.mid), ("high", self.high)] {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "thresholds",
                    value: value.to_string(),
                    reason: format!("{} threshold must be finite", name),
                });
            }
        }
        if !(0.0 <= self.low && self.low < self.mid && self.mid < self.high && self.high <= 100.0)
        {
            return Err(Error::InvalidParameter {
                name: "thresholds",
                value: format!("{}/{}/{}", self.low, self.mid, self.high),
                reason: "must satisfy 0 <= low < mid < high <= 100".to_string(),
            });
        }
        Ok(())
    }

    /// Band for a coverage value. Boundary values go to the higher band.
    pub fn class_for(&self, coverage: f64) -> DensityClass {
        if coverage.is_nan() {
            DensityClass::NoData
        } else if coverage < self.low {
            DensityClass::Low
        } else if coverage < self.mid {
            DensityClass::Moderate
        } else if coverage < self.high {
            DensityClass::High
        } else {
            DensityClass::VeryHigh
        }
    }
}

/// Parameters for classification
#[derive(Debug, Clone)]
pub struct ClassifyParams {
    pub thresholds: Thresholds,
    /// Attribute read for coverage (default `coverage_pct`)
    pub input_field: String,
    /// Attribute receiving the class label (default `density_class`)
    pub output_field: String,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            input_field: COVERAGE_FIELD.to_string(),
            output_field: CLASS_FIELD.to_string(),
        }
    }
}

/// Per-class cell counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub no_data: usize,
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub very_high: usize,
}

impl ClassifySummary {
    pub fn total(&self) -> usize {
        self.no_data + self.low + self.moderate + self.high + self.very_high
    }

    pub fn count(&self, class: DensityClass) -> usize {
        match class {
            DensityClass::NoData => self.no_data,
            DensityClass::Low => self.low,
            DensityClass::Moderate => self.moderate,
            DensityClass::High => self.high,
            DensityClass::VeryHigh => self.very_high,
        }
    }

    fn bump(&mut self, class: DensityClass) {
        match class {
            DensityClass::NoData => self.no_data += 1,
            DensityClass::Low => self.low += 1,
            DensityClass::Moderate => self.moderate += 1,
            DensityClass::High => self.high += 1,
            DensityClass::VeryHigh => self.very_high += 1,
        }
    }
}

/// Matrix Method classification algorithm
#[derive(Debug, Clone, Default)]
pub struct MatrixClassifier;

impl Algorithm for MatrixClassifier {
    type Input = Grid;
    type Output = (Grid, ClassifySummary);
    type Params = ClassifyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "MatrixClassifier"
    }

    fn description(&self) -> &'static str {
        "Classify per-cell coverage into density classes by thresholds"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let mut grid = input;
        let summary = classify(&mut grid, params)?;
        Ok((grid, summary))
    }
}

/// Classify every cell of the grid by its coverage value.
///
/// Reads `params.input_field`, writes the class label to
/// `params.output_field`. A cell whose input is absent, null, `NaN` or a
/// non-numeric string becomes `NoData`. Running the same classification
/// twice yields identical output.
///
/// # Arguments
/// * `grid` - Grid with coverage values
/// * `params` - Thresholds and field names
///
/// # Returns
/// Per-class cell counts
pub fn classify(grid: &mut Grid, params: ClassifyParams) -> Result<ClassifySummary> {
    params.thresholds.validate()?;

    let mut summary = ClassifySummary::default();
    for cell in grid.cells_mut() {
        let coverage = cell
            .attribute(&params.input_field)
            .and_then(AttributeValue::as_f64);
        let class = match coverage {
            Some(v) => params.thresholds.class_for(v),
            None => DensityClass::NoData,
        };
        debug!("cell {}: coverage {:?} -> {}", cell.id(), coverage, class);

        cell.set_attribute(
            params.output_field.clone(),
            AttributeValue::String(class.label().to_string()),
        );
        summary.bump(class);
    }

    info!(
        "Classified {} cells: {} NoData, {} Low, {} Moderate, {} High, {} VeryHigh",
        summary.total(),
        summary.no_data,
        summary.low,
        summary.moderate,
        summary.high,
        summary.very_high
    );

    Ok(summary)
}
