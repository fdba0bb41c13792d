//! Sample Statistics
//!
//! Mean and standard error of per-run measurements.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Mean and standard error of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub mean: f64,
    /// Sample standard deviation over sqrt(n); zero for a single value
    pub stderr: f64,
    pub n: usize,
}

impl SampleStats {
    pub fn from_samples(samples: &[f64]) -> Result<Self, ReportError> {
        let n = samples.len();
        if n == 0 {
            return Err(ReportError::EmptySample);
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let stderr = if n < 2 {
            0.0
        } else {
            let variance =
                samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt() / (n as f64).sqrt()
        };
        Ok(Self { mean, stderr, n })
    }
}
