//! Random vs. Preferential Aggregation
//!
//! Pairs the runs of two batches by run index and summarizes the quality
//! of each along with the preferential/random ratio.

use market_events::{ResultRow, SimulationOutput};

use crate::error::ReportError;
use crate::stats::SampleStats;

/// Per-run preferential/random ratios, pairing samples by position. Pairs
/// whose random quality is not positive are skipped.
pub fn paired_ratios(random: &[f64], preferential: &[f64]) -> Vec<f64> {
    random
        .iter()
        .zip(preferential)
        .filter(|(r, _)| **r > 0.0)
        .map(|(r, p)| p / r)
        .collect()
}

/// Summarize one parameter point.
pub fn compare(
    param: f64,
    random: &SimulationOutput,
    preferential: &SimulationOutput,
) -> Result<ResultRow, ReportError> {
    let random_q = random.qualities();
    let preferential_q = preferential.qualities();

    let r = SampleStats::from_samples(&random_q)?;
    let p = SampleStats::from_samples(&preferential_q)?;

    // runs that failed in either batch have no partner
    let (paired_r, paired_p): (Vec<f64>, Vec<f64>) = random
        .runs
        .iter()
        .filter_map(|run| preferential.run(run.run).map(|other| (run.quality, other.quality)))
        .unzip();
    let ratios = paired_ratios(&paired_r, &paired_p);
    let ratio = SampleStats::from_samples(&ratios)?;

    if ratios.len() < random_q.len().max(preferential_q.len()) {
        tracing::warn!(
            param,
            unpaired = random_q.len().max(preferential_q.len()) - paired_r.len(),
            zero_random = paired_r.len() - ratios.len(),
            "Some runs left out of the ratio"
        );
    }

    Ok(ResultRow {
        param,
        random_mean: r.mean,
        random_stderr: r.stderr,
        preferential_mean: p.mean,
        preferential_stderr: p.stderr,
        ratio_mean: ratio.mean,
        ratio_stderr: ratio.stderr,
    })
}
