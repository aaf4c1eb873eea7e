use crate::error::Result;
use crate::node::{ensure_available, ComputationNode};

/// Two distinct sub-graphs fed the same input, merged into one output.
///
/// Parameter order is `left`'s, then `right`'s.
pub struct Join<A, B, M> {
    left: A,
    right: B,
    merge: M,
}

impl<A, B, M, O> Join<A, B, M>
where
    A: ComputationNode,
    B: ComputationNode<Input = A::Input>,
    M: Fn(A::Output, B::Output) -> Result<O>,
{
    pub fn new(left: A, right: B, merge: M) -> Join<A, B, M> {
        Join { left, right, merge }
    }

    pub fn left(&self) -> &A {
        &self.left
    }

    pub fn right(&self) -> &B {
        &self.right
    }
}

impl<A, B, M, O> ComputationNode for Join<A, B, M>
where
    A: ComputationNode,
    B: ComputationNode<Input = A::Input>,
    M: Fn(A::Output, B::Output) -> Result<O>,
{
    type Input = A::Input;
    type Output = O;

    fn param_count(&self) -> usize {
        self.left.param_count() + self.right.param_count()
    }

    fn calculate(&mut self, input: &A::Input) -> Result<O> {
        let l = self.left.calculate(input)?;
        let r = self.right.calculate(input)?;
        (self.merge)(l, r)
    }

    fn get_param(&self, index: usize) -> Option<f64> {
        let split = self.left.param_count();
        if index < split {
            self.left.get_param(index)
        } else {
            self.right.get_param(index - split)
        }
    }

    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool {
        let split = self.left.param_count();
        if index < split {
            self.left.set_param(index, value, is_delta)
        } else {
            self.right.set_param(index - split, value, is_delta)
        }
    }

    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()> {
        ensure_available(values, *cursor, self.param_count())?;
        self.left.update_params(values, is_delta, cursor)?;
        self.right.update_params(values, is_delta, cursor)
    }

    fn collect_params(&self, out: &mut Vec<f64>) {
        self.left.collect_params(out);
        self.right.collect_params(out);
    }
}
