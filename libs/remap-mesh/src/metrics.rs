//! # Misfit Metrics
//!
//! Error measures of a remapped field against its analytical reference.
//! Integrals are area-weighted sums with weights taken from the `area` field
//! of the respective filtered mesh.

use pipeline_types::MisfitMetrics;

use crate::error::{RemapError, RemapResult};

/// Offset keeping the relative error finite where the reference is zero.
const MISFIT_OFFSET: f64 = 1.0e-20;

/// Area-weighted sum of `values`.
pub fn weighted_integral(values: &[f64], weights: &[f64]) -> RemapResult<f64> {
    if values.len() != weights.len() {
        return Err(RemapError::shape_mismatch(format!(
            "{} values for {} weights",
            values.len(),
            weights.len()
        )));
    }
    Ok(values.iter().zip(weights).map(|(v, w)| v * w).sum())
}

/// Pointwise relative error of `mapped` against `analytic`.
pub fn pointwise_misfit(mapped: &[f64], analytic: &[f64]) -> RemapResult<Vec<f64>> {
    if mapped.len() != analytic.len() {
        return Err(RemapError::shape_mismatch(format!(
            "{} mapped values for {} reference values",
            mapped.len(),
            analytic.len()
        )));
    }
    Ok(mapped
        .iter()
        .zip(analytic)
        .map(|(m, a)| {
            let (m, a) = (m + MISFIT_OFFSET, a + MISFIT_OFFSET);
            (m - a).abs() / a.abs() - MISFIT_OFFSET
        })
        .collect())
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Computes all misfit metrics of one remapping.
///
/// `mapped`, `analytic_tgt` and `tgt_weights` live on the target grid;
/// `analytic_src` and `src_weights` on the source grid.
pub fn misfit_metrics(
    mapped: &[f64],
    analytic_tgt: &[f64],
    analytic_src: &[f64],
    tgt_weights: &[f64],
    src_weights: &[f64],
) -> RemapResult<MisfitMetrics> {
    if mapped.is_empty() || analytic_src.is_empty() {
        return Err(RemapError::shape_mismatch("empty field"));
    }

    let misfit = pointwise_misfit(mapped, analytic_tgt)?;
    let n = misfit.len() as f64;
    let mean_misfit = misfit.iter().sum::<f64>() / n;
    let max_misfit = max(&misfit);
    let rms_misfit = (misfit.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    let scale = analytic_tgt.iter().map(|a| a.abs()).fold(0.0, f64::max);
    let l_min = (min(analytic_tgt) - min(mapped)) / scale;
    let l_max = (max(mapped) - max(analytic_tgt)) / scale;

    let mapped_integral = weighted_integral(mapped, tgt_weights)?;
    let src_integral = weighted_integral(analytic_src, src_weights)?;
    let tgt_integral = weighted_integral(analytic_tgt, tgt_weights)?;

    Ok(MisfitMetrics {
        mean_misfit,
        max_misfit,
        rms_misfit,
        l_min,
        l_max,
        glob_cons_src: (mapped_integral - src_integral).abs() / src_integral.abs(),
        glob_cons_tgt: (mapped_integral - tgt_integral).abs() / tgt_integral.abs(),
    })
}
