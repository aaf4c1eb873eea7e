use crate::error::{invalid, Result};
use crate::node::{ensure_available, ComputationNode, ParamIndex};

/// Feeds the same input to every child and merges their outputs.
///
/// Parameters follow the children in the order they were supplied. The
/// children are fixed at construction, so the offset table is built once.
pub struct Aggregate<N, M> {
    children: Vec<N>,
    merge: M,
    index: ParamIndex,
}

impl<N, M, O> Aggregate<N, M>
where
    N: ComputationNode,
    M: Fn(Vec<N::Output>) -> Result<O>,
{
    pub fn new(children: Vec<N>, merge: M) -> Result<Aggregate<N, M>> {
        if children.is_empty() {
            return Err(invalid("aggregate needs at least one child"));
        }
        let index = ParamIndex::from_counts(children.iter().map(|c| c.param_count()));
        Ok(Aggregate { children, merge, index })
    }

    pub fn children(&self) -> &[N] {
        &self.children
    }
}

impl<N, M, O> ComputationNode for Aggregate<N, M>
where
    N: ComputationNode,
    M: Fn(Vec<N::Output>) -> Result<O>,
{
    type Input = N::Input;
    type Output = O;

    fn param_count(&self) -> usize {
        self.index.total()
    }

    fn calculate(&mut self, input: &N::Input) -> Result<O> {
        let outputs = self
            .children
            .iter_mut()
            .map(|c| c.calculate(input))
            .collect::<Result<Vec<_>>>()?;
        (self.merge)(outputs)
    }

    fn get_param(&self, index: usize) -> Option<f64> {
        let (slot, local) = self.index.locate(index)?;
        self.children[slot].get_param(local)
    }

    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool {
        match self.index.locate(index) {
            Some((slot, local)) => self.children[slot].set_param(local, value, is_delta),
            None => false,
        }
    }

    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()> {
        ensure_available(values, *cursor, self.param_count())?;
        for child in &mut self.children {
            child.update_params(values, is_delta, cursor)?;
        }
        Ok(())
    }

    fn collect_params(&self, out: &mut Vec<f64>) {
        for child in &self.children {
            child.collect_params(out);
        }
    }
}
