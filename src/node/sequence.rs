use crate::error::Result;
use crate::node::{ensure_available, ComputationNode};

/// Two nodes run back to back: `second(first(x))`.
///
/// Parameter order is `first`'s, then `second`'s.
#[derive(Debug, Clone)]
pub struct Sequence<A, B> {
    first: A,
    second: B,
}

impl<A, B> Sequence<A, B>
where
    A: ComputationNode,
    B: ComputationNode<Input = A::Output>,
{
    pub fn new(first: A, second: B) -> Sequence<A, B> {
        Sequence { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> ComputationNode for Sequence<A, B>
where
    A: ComputationNode,
    B: ComputationNode<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn param_count(&self) -> usize {
        self.first.param_count() + self.second.param_count()
    }

    fn calculate(&mut self, input: &A::Input) -> Result<B::Output> {
        let mid = self.first.calculate(input)?;
        self.second.calculate(&mid)
    }

    fn get_param(&self, index: usize) -> Option<f64> {
        let split = self.first.param_count();
        if index < split {
            self.first.get_param(index)
        } else {
            self.second.get_param(index - split)
        }
    }

    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool {
        let split = self.first.param_count();
        if index < split {
            self.first.set_param(index, value, is_delta)
        } else {
            self.second.set_param(index - split, value, is_delta)
        }
    }

    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()> {
        ensure_available(values, *cursor, self.param_count())?;
        self.first.update_params(values, is_delta, cursor)?;
        self.second.update_params(values, is_delta, cursor)
    }

    fn collect_params(&self, out: &mut Vec<f64>) {
        self.first.collect_params(out);
        self.second.collect_params(out);
    }
}
