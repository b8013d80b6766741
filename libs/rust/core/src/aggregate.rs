//! Parameter aggregation: unweighted elementwise mean across the
//! contributions of one round, independently per structural component.

use tracing::warn;

use crate::variant::ModelParams;

/// Averages the eligible contributions of a round. Returns `None` when
/// there is nothing to average, so an all-errored round leaves the central
/// model untouched instead of dividing by zero. Contributions whose shape
/// does not match the first one are skipped with a warning, mirroring how
/// mismatched updates are dropped rather than corrupting the mean.
pub fn average(contributions: &[&ModelParams]) -> Option<ModelParams> {
    let first = contributions.first()?;
    match first {
        ModelParams::Dense { weights, bias } => {
            let (w_dim, b_dim) = (weights.len(), bias.len());
            let rows: Vec<(&[f32], &[f32])> = contributions
                .iter()
                .filter_map(|p| match p {
                    ModelParams::Dense { weights, bias }
                        if weights.len() == w_dim && bias.len() == b_dim =>
                    {
                        Some((weights.as_slice(), bias.as_slice()))
                    }
                    other => {
                        warn!(?other, "skipping contribution with mismatched shape");
                        None
                    }
                })
                .collect();
            Some(ModelParams::Dense {
                weights: mean_rows(rows.iter().map(|(w, _)| *w), w_dim),
                bias: mean_rows(rows.iter().map(|(_, b)| *b), b_dim),
            })
        }
        ModelParams::Flat { weights } => {
            let dim = weights.len();
            let rows: Vec<&[f32]> = contributions
                .iter()
                .filter_map(|p| match p {
                    ModelParams::Flat { weights } if weights.len() == dim => {
                        Some(weights.as_slice())
                    }
                    other => {
                        warn!(?other, "skipping contribution with mismatched shape");
                        None
                    }
                })
                .collect();
            Some(ModelParams::Flat { weights: mean_rows(rows.into_iter(), dim) })
        }
    }
}

fn mean_rows<'a>(rows: impl Iterator<Item = &'a [f32]>, dim: usize) -> Vec<f32> {
    let mut acc = vec![0.0f32; dim];
    let mut count = 0usize;
    for row in rows {
        for (a, v) in acc.iter_mut().zip(row) {
            *a += *v;
        }
        count += 1;
    }
    if count > 0 {
        for a in &mut acc {
            *a /= count as f32;
        }
    }
    acc
}
