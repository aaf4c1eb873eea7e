use crate::error::{NetError, Result};

/// Encodes class labels as one-hot target vectors.
///
/// Classes must be densely enumerated: with `N = max(label) + 1`, every
/// class in `0..N` has to occur at least once.
pub fn one_hot_targets(labels: &[usize]) -> Result<Vec<Vec<f64>>> {
    let classes = labels.iter().max().map(|&m| m + 1).ok_or(NetError::EmptyDataset)?;
    let mut seen = vec![false; classes];
    for &label in labels {
        seen[label] = true;
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(NetError::SparseClasses { classes, missing });
    }
    labels.iter().map(|&label| one_hot(label, classes)).collect()
}

/// A `classes`-wide vector with a single 1 at `label`.
pub fn one_hot(label: usize, classes: usize) -> Result<Vec<f64>> {
    if label >= classes {
        return Err(NetError::LabelOutOfRange { label, classes });
    }
    let mut v = vec![0.0; classes];
    v[label] = 1.0;
    Ok(v)
}
