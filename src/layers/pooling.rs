use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};
use crate::layers::cache::LayerCache;
use crate::math::tensor::{Shape, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingKind {
    Max,
    Average,
}

/// Per-map spatial pooling without learnable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Pooling {
    kind: PoolingKind,
    input: Shape,
    output: Shape,
    window_h: usize,
    window_w: usize,
    stride: usize,
}

impl Pooling {
    pub fn new(kind: PoolingKind, input: Shape, window: (usize, usize), stride: usize) -> Result<Pooling> {
        let (window_h, window_w) = window;
        if input.is_empty() {
            return Err(invalid(format!("pooling input shape {input} is empty")));
        }
        if stride == 0 || window_h == 0 || window_w == 0 {
            return Err(invalid("pooling window and stride must be positive"));
        }
        if window_h > input.height || window_w > input.width {
            return Err(invalid(format!(
                "pooling window {window_h}x{window_w} exceeds input {input}"
            )));
        }
        if (input.height - window_h) % stride != 0 || (input.width - window_w) % stride != 0 {
            return Err(invalid(format!(
                "pooling window {window_h}x{window_w} with stride {stride} does not tile input {input}"
            )));
        }
        let output = Shape::new(
            input.depth,
            (input.height - window_h) / stride + 1,
            (input.width - window_w) / stride + 1,
        );
        Ok(Pooling { kind, input, output, window_h, window_w, stride })
    }

    /// Non-overlapping `size × size` max pooling.
    pub fn max(input: Shape, size: usize) -> Result<Pooling> {
        Pooling::new(PoolingKind::Max, input, (size, size), size)
    }

    /// Non-overlapping `size × size` average pooling.
    pub fn average(input: Shape, size: usize) -> Result<Pooling> {
        Pooling::new(PoolingKind::Average, input, (size, size), size)
    }

    pub fn kind(&self) -> PoolingKind {
        self.kind
    }

    pub fn is_max(&self) -> bool {
        self.kind == PoolingKind::Max
    }

    pub fn input_shape(&self) -> Shape {
        self.input
    }

    pub fn output_shape(&self) -> Shape {
        self.output
    }

    pub fn window(&self) -> (usize, usize) {
        (self.window_h, self.window_w)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn forward(&self, input: &Tensor, cache: &mut LayerCache) {
        let area = (self.window_h * self.window_w) as f64;
        for d in 0..self.output.depth {
            for oy in 0..self.output.height {
                for ox in 0..self.output.width {
                    let (top, left) = (oy * self.stride, ox * self.stride);
                    let cell = self.output.offset(d, oy, ox);
                    let value = match self.kind {
                        PoolingKind::Max => {
                            let mut best = self.input.offset(d, top, left);
                            for y in top..top + self.window_h {
                                for x in left..left + self.window_w {
                                    let at = self.input.offset(d, y, x);
                                    if input.as_slice()[at] > input.as_slice()[best] {
                                        best = at;
                                    }
                                }
                            }
                            cache.argmax[cell] = best;
                            input.as_slice()[best]
                        }
                        PoolingKind::Average => {
                            let mut sum = 0.0;
                            for y in top..top + self.window_h {
                                for x in left..left + self.window_w {
                                    sum += input[(d, y, x)];
                                }
                            }
                            sum / area
                        }
                    };
                    cache.pre.as_mut_slice()[cell] = value;
                    cache.out.as_mut_slice()[cell] = value;
                }
            }
        }
    }

    /// Max: each error goes only to the input cell that won the window.
    /// Average: each error is spread evenly over its window.
    pub fn backprop(&self, cache: &LayerCache, prev_delta: &mut Tensor) {
        match self.kind {
            PoolingKind::Max => {
                let prev = prev_delta.as_mut_slice();
                for (cell, &d) in cache.delta.as_slice().iter().enumerate() {
                    prev[cache.argmax[cell]] += d;
                }
            }
            PoolingKind::Average => {
                let area = (self.window_h * self.window_w) as f64;
                for d in 0..self.output.depth {
                    for oy in 0..self.output.height {
                        for ox in 0..self.output.width {
                            let share = cache.delta[(d, oy, ox)] / area;
                            let (top, left) = (oy * self.stride, ox * self.stride);
                            for y in top..top + self.window_h {
                                for x in left..left + self.window_w {
                                    prev_delta[(d, y, x)] += share;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;

    fn input() -> Tensor {
        Tensor::from_maps(vec![vec![
            vec![1.0, 3.0, 2.0, 0.0],
            vec![4.0, 2.0, 1.0, 5.0],
            vec![0.0, 1.0, 7.0, 2.0],
            vec![2.0, 6.0, 3.0, 1.0],
        ]])
        .unwrap()
    }

    #[test]
    fn max_pooling_routes_error_to_winner() {
        let pool = Pooling::max(Shape::new(1, 4, 4), 2).unwrap();
        let mut cache = LayerCache::new(&Layer::Pooling(pool.clone()), 0);
        pool.forward(&input(), &mut cache);
        assert_eq!(cache.out.as_slice(), &[4.0, 5.0, 6.0, 7.0]);

        cache.delta = Tensor::from_vec(Shape::new(1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut prev = Tensor::zeros(Shape::new(1, 4, 4));
        pool.backprop(&cache, &mut prev);
        assert_eq!(prev[(0, 1, 0)], 1.0);
        assert_eq!(prev[(0, 1, 3)], 2.0);
        assert_eq!(prev[(0, 3, 1)], 3.0);
        assert_eq!(prev[(0, 2, 2)], 4.0);
        assert_eq!(prev.as_slice().iter().sum::<f64>(), 10.0);
    }

    #[test]
    fn average_pooling_spreads_error() {
        let pool = Pooling::average(Shape::new(1, 4, 4), 2).unwrap();
        let mut cache = LayerCache::new(&Layer::Pooling(pool.clone()), 0);
        pool.forward(&input(), &mut cache);
        assert_eq!(cache.out.as_slice(), &[2.5, 2.0, 2.25, 3.25]);

        cache.delta.fill(4.0);
        let mut prev = Tensor::zeros(Shape::new(1, 4, 4));
        pool.backprop(&cache, &mut prev);
        assert!(prev.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn untileable_window_is_rejected() {
        assert!(Pooling::max(Shape::new(1, 5, 5), 2).is_err());
        assert!(Pooling::new(PoolingKind::Average, Shape::new(1, 5, 5), (3, 3), 2).is_ok());
    }
}
