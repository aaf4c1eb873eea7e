//! Computation nodes and the flat parameter-addressing protocol.
//!
//! Every node exposes its scalar parameters as if they were one contiguous
//! vector of length `param_count()`. Composites concatenate their children in
//! a fixed order, so an arbitrarily nested graph can be read, written and
//! replayed through a single index space:
//!
//! - `Sequence`: first stage, then second stage.
//! - `Aggregate`: children in the order they were supplied.
//! - `Join`: left sub-graph, then right sub-graph.
//! - `Network`: layer order, then each layer's own order.

pub mod affine;
pub mod aggregate;
pub mod index;
pub mod join;
pub mod sequence;

pub use affine::AffineNode;
pub use aggregate::Aggregate;
pub use index::ParamIndex;
pub use join::Join;
pub use sequence::Sequence;

use crate::error::{NetError, Result};

pub trait ComputationNode {
    type Input;
    type Output;

    /// Number of scalar parameters owned by this node and its children.
    fn param_count(&self) -> usize;

    /// Forward computation. May overwrite cached scratch state, never
    /// parameters.
    fn calculate(&mut self, input: &Self::Input) -> Result<Self::Output>;

    /// Reads parameter `index`; `None` when out of range.
    fn get_param(&self, index: usize) -> Option<f64>;

    /// Writes (or, with `is_delta`, adds to) parameter `index`. Returns
    /// `false` without touching anything when out of range.
    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool;

    /// Consumes exactly `param_count()` values starting at `*cursor` and
    /// advances the cursor by that amount. Fails, leaving the node and the
    /// cursor untouched, when fewer values remain.
    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()>;

    /// Appends every parameter in canonical order.
    fn collect_params(&self, out: &mut Vec<f64>);

    fn params(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.param_count());
        self.collect_params(&mut out);
        out
    }
}

/// Checks that `needed` values are available at `cursor`.
pub(crate) fn ensure_available(values: &[f64], cursor: usize, needed: usize) -> Result<()> {
    let available = values.len().saturating_sub(cursor);
    if available < needed {
        return Err(NetError::ParamCountMismatch {
            expected: needed,
            offset: cursor,
            available,
        });
    }
    Ok(())
}

/// Applies `values[cursor..cursor + target.len()]` to `target` and advances
/// the cursor.
pub(crate) fn apply_slice(
    target: &mut [f64],
    values: &[f64],
    is_delta: bool,
    cursor: &mut usize,
) -> Result<()> {
    ensure_available(values, *cursor, target.len())?;
    let src = &values[*cursor..*cursor + target.len()];
    if is_delta {
        target.iter_mut().zip(src).for_each(|(t, v)| *t += v);
    } else {
        target.copy_from_slice(src);
    }
    *cursor += target.len();
    Ok(())
}
