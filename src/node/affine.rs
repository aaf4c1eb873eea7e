use crate::activation::activation::ActivationFunction;
use crate::error::{invalid, NetError, Result};
use crate::math::tensor::{Shape, Tensor};
use crate::node::{apply_slice, ComputationNode};

/// Leaf node: `f(W·x + b)` over a flattened input, producing an
/// `outputs × 1 × 1` tensor.
///
/// Parameters are laid out output-unit by output-unit (one row of
/// `inputs` weights each), biases last.
#[derive(Debug, Clone)]
pub struct AffineNode {
    inputs: usize,
    outputs: usize,
    params: Vec<f64>,
    activation: ActivationFunction,
}

impl AffineNode {
    pub fn new(inputs: usize, outputs: usize, activation: ActivationFunction) -> Result<AffineNode> {
        if inputs == 0 || outputs == 0 {
            return Err(invalid("affine node needs at least one input and one output"));
        }
        Ok(AffineNode {
            inputs,
            outputs,
            params: vec![0.0; inputs * outputs + outputs],
            activation,
        })
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }
}

impl ComputationNode for AffineNode {
    type Input = Tensor;
    type Output = Tensor;

    fn param_count(&self) -> usize {
        self.params.len()
    }

    fn calculate(&mut self, input: &Tensor) -> Result<Tensor> {
        if input.shape().len() != self.inputs {
            return Err(NetError::InputShape {
                expected: Shape::vector(self.inputs),
                found: input.shape(),
            });
        }
        let x = input.as_slice();
        let (weights, biases) = self.params.split_at(self.inputs * self.outputs);
        let out = weights
            .chunks(self.inputs)
            .zip(biases)
            .map(|(row, b)| {
                let z = row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + b;
                self.activation.function(z)
            })
            .collect::<Vec<f64>>();
        Ok(Tensor::from(out))
    }

    fn get_param(&self, index: usize) -> Option<f64> {
        self.params.get(index).copied()
    }

    fn set_param(&mut self, index: usize, value: f64, is_delta: bool) -> bool {
        match self.params.get_mut(index) {
            Some(p) if is_delta => *p += value,
            Some(p) => *p = value,
            None => return false,
        }
        true
    }

    fn update_params(&mut self, values: &[f64], is_delta: bool, cursor: &mut usize) -> Result<()> {
        apply_slice(&mut self.params, values, is_delta, cursor)
    }

    fn collect_params(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.params);
    }
}
