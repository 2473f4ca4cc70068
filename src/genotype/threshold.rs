use anyhow::{bail, Result};
use clap::ValueEnum;

use crate::genotype::classify::{GenotypeObservation, MatchClass};

/// Grid resolution for the smoothed density curve
const KDE_GRID_POINTS: usize = 512;

/// Search domain for the density minimum, in log10 read counts (1 to 1000 reads)
const LOG10_DOMAIN: (f64, f64) = (0.0, 3.0);

////////////////
/// How to derive the read-support cutoff from the classified observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThresholdStrategy {
    /// p-th quantile of read support across OtherGene observations
    Quantile,
    /// Local minimum between the two modes of the NoGene read-support density
    BimodalMinimum,
}

////////////////
/// Estimate the read-support cutoff. Both strategies are deterministic
/// given identical inputs.
pub fn estimate_threshold(
    strategy: ThresholdStrategy,
    observations: &[GenotypeObservation],
    quantile_p: f64,
) -> Result<f64> {
    match strategy {
        ThresholdStrategy::Quantile => {
            let values = support_of_class(observations, MatchClass::OtherGene);
            if values.is_empty() {
                bail!("no OtherGene observations to estimate a quantile threshold from");
            }
            Ok(quantile(&values, quantile_p))
        }
        ThresholdStrategy::BimodalMinimum => {
            let values = support_of_class(observations, MatchClass::NoGene);
            bimodal_minimum(&values)
        }
    }
}

fn support_of_class(observations: &[GenotypeObservation], class: MatchClass) -> Vec<u32> {
    observations
        .iter()
        .filter(|o| o.match_class == class)
        .map(|o| o.total_dups_wt_mut)
        .collect()
}

////////////////
/// Linear-interpolated quantile over unsorted values (R type 7)
pub fn quantile(values: &[u32], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

////////////////
/// Cutoff between the two modes of the read-support distribution: smooth
/// the log10 supports with a Gaussian kernel and take the lowest interior
/// minimum of the density curve over 1..1000 reads.
///
/// A distribution without two modes still yields a number (the flattest
/// point of the curve); the caller should sanity-check the result against
/// the data range.
pub fn bimodal_minimum(values: &[u32]) -> Result<f64> {
    let logs: Vec<f64> = values
        .iter()
        .filter(|&&v| v > 0)
        .map(|&v| (v as f64).log10())
        .collect();
    if logs.len() < 2 {
        bail!(
            "only {} NoGene observations with nonzero read support, cannot estimate a density minimum",
            logs.len()
        );
    }

    let bw = silverman_bandwidth(&logs);

    let (x0, x1) = LOG10_DOMAIN;
    let step = (x1 - x0) / (KDE_GRID_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..KDE_GRID_POINTS).map(|i| x0 + i as f64 * step).collect();
    let density: Vec<f64> = grid.iter().map(|&x| kernel_density(&logs, x, bw)).collect();

    //Lowest interior local minimum of the smoothed curve
    let mut best: Option<usize> = None;
    for i in 1..KDE_GRID_POINTS - 1 {
        if density[i] <= density[i - 1] && density[i] <= density[i + 1] {
            if best.map_or(true, |b| density[i] < density[b]) {
                best = Some(i);
            }
        }
    }

    //A unimodal curve has no interior minimum; fall back to the global argmin
    let argmin = best.unwrap_or_else(|| {
        density
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    });

    Ok(10f64.powf(grid[argmin]))
}

/// Silverman's rule-of-thumb bandwidth, as R's bw.nrd0
fn silverman_bandwidth(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let sd = (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

    let iqr = quantile_f64(xs, 0.75) - quantile_f64(xs, 0.25);
    let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };

    let bw = 0.9 * spread * n.powf(-0.2);
    if bw > 0.0 {
        bw
    } else {
        //all values identical; any narrow kernel gives the same argmin
        0.1
    }
}

fn quantile_f64(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn kernel_density(xs: &[f64], x: f64, bw: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bw * xs.len() as f64);
    xs.iter()
        .map(|xi| (-0.5 * ((x - xi) / bw).powi(2)).exp())
        .sum::<f64>()
        * norm
}
