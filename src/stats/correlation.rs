//! Pairwise Pearson correlation across the numeric case columns.

use crate::data::{Capabilities, CaseRecord, Metric};
use crate::stats::aggregate::{ChartResult, Unavailable};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Square, symmetric correlation matrix indexed by metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<Metric>,
    pub values: Vec<Vec<f64>>,
    /// Complete rows the coefficients were computed from.
    pub sample_size: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.columns.iter().position(|m| *m == a)?;
        let j = self.columns.iter().position(|m| *m == b)?;
        Some(self.values[i][j])
    }

    /// Correlate every present metric over the rows where none of them is null.
    ///
    /// Needs at least two present columns and one complete row.
    pub fn compute(view: &[CaseRecord], capabilities: &Capabilities) -> ChartResult<Self> {
        let columns = capabilities.present();
        if columns.len() < 2 {
            return Err(Unavailable::ColumnsMissing(capabilities.missing(&Metric::ALL)));
        }

        // Column-major samples over complete rows only.
        let mut samples: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
        for record in view {
            let row: Option<Vec<f64>> = columns.iter().map(|m| record.get(*m)).collect();
            if let Some(row) = row {
                for (col, v) in samples.iter_mut().zip(row) {
                    col.push(v);
                }
            }
        }

        let sample_size = samples[0].len();
        if sample_size == 0 {
            return Err(Unavailable::Empty);
        }

        let n = columns.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let coefficients: Vec<(usize, usize, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| (i, j, pearson(&samples[i], &samples[j])))
            .collect();

        let mut values = vec![vec![1.0; n]; n];
        for (i, j, r) in coefficients {
            values[i][j] = r;
            values[j][i] = r;
        }

        Ok(Self {
            columns,
            values,
            sample_size,
        })
    }
}

/// Pearson r; NaN when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    let denom = xs.iter().std_dev() * ys.iter().std_dev();
    if denom == 0.0 || denom.is_nan() {
        return f64::NAN;
    }
    xs.iter().covariance(ys.iter()) / denom
}
