//! Confidence intervals over the report entries of repeated runs.

use std::collections::BTreeMap;

use bikeshare_core::simulation::SimulationResult;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::ExperimentError;

/// Spread of one report entry across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    /// Per-run estimates in run order.
    pub raw: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Standard error of the mean, from the sample standard deviation.
    pub se: f64,
    pub n: usize,
    pub confidence: f64,
    /// Two-sided Student-t interval around the mean.
    pub confidence_interval: [f64; 2],
}

/// Report entry name to its spread across runs.
pub type ConfidenceSummary = BTreeMap<String, EstimateSummary>;

/// Summarizes `values` with a two-sided Student-t interval at `confidence`.
pub fn summarize(values: Vec<f64>, confidence: f64) -> Result<EstimateSummary, ExperimentError> {
    let n = values.len();
    if n < 2 {
        return Err(ExperimentError::TooFewRuns(n));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ExperimentError::InvalidConfidence(confidence));
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let std = (sum_sq / nf).sqrt();
    let se = (sum_sq / (nf - 1.0)).sqrt() / nf.sqrt();

    let t = StudentsT::new(0.0, 1.0, nf - 1.0)?;
    let half_width = t.inverse_cdf(0.5 + confidence / 2.0) * se;

    Ok(EstimateSummary {
        raw: values,
        mean,
        std,
        se,
        n,
        confidence,
        confidence_interval: [mean - half_width, mean + half_width],
    })
}

/// Collects every named report entry across `results` and summarizes each one.
pub fn summarize_report(
    results: &[SimulationResult],
    confidence: f64,
) -> Result<ConfidenceSummary, ExperimentError> {
    let Some(first) = results.first() else {
        return Err(ExperimentError::TooFewRuns(0));
    };

    first
        .report
        .keys()
        .map(|name| {
            let values = results
                .iter()
                .enumerate()
                .map(|(run, result)| {
                    result.estimate(name).ok_or_else(|| ExperimentError::MissingEntry {
                        name: name.clone(),
                        run,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((name.clone(), summarize(values, confidence)?))
        })
        .collect()
}
