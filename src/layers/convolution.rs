use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{invalid, Result};
use crate::layers::cache::LayerCache;
use crate::math::init;
use crate::math::tensor::{Shape, Tensor};

/// 2D convolution over a 3D tensor.
///
/// Parameters: a kernel of `filters × in_depth × window_h × window_w`
/// (filter by filter, then input map by input map, row-major window), then
/// one bias per filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolution {
    input: Shape,
    output: Shape,
    window_h: usize,
    window_w: usize,
    stride: usize,
    padding: usize,
    activation: Option<ActivationFunction>,
}

/// `(size - window + 2·padding) / stride + 1`, or an error when that is not a
/// non-negative integer.
fn output_extent(axis: &str, size: usize, window: usize, stride: usize, padding: usize) -> Result<usize> {
    let span = size + 2 * padding;
    if window == 0 || window > span {
        return Err(invalid(format!(
            "{axis}: window {window} does not fit input {size} with padding {padding}"
        )));
    }
    if (span - window) % stride != 0 {
        return Err(invalid(format!(
            "{axis}: ({size} - {window} + 2*{padding}) is not divisible by stride {stride}"
        )));
    }
    Ok((span - window) / stride + 1)
}

impl Convolution {
    /// `activation: None` defers to the network's default at build time.
    pub fn new(
        input: Shape,
        filters: usize,
        window: (usize, usize),
        stride: usize,
        padding: usize,
        activation: Option<ActivationFunction>,
    ) -> Result<Convolution> {
        if input.is_empty() {
            return Err(invalid(format!("convolution input shape {input} is empty")));
        }
        if filters == 0 {
            return Err(invalid("convolution needs at least one filter"));
        }
        if stride == 0 {
            return Err(invalid("convolution stride must be positive"));
        }
        let (window_h, window_w) = window;
        let height = output_extent("height", input.height, window_h, stride, padding)?;
        let width = output_extent("width", input.width, window_w, stride, padding)?;
        Ok(Convolution {
            input,
            output: Shape::new(filters, height, width),
            window_h,
            window_w,
            stride,
            padding,
            activation,
        })
    }

    pub fn input_shape(&self) -> Shape {
        self.input
    }

    pub fn output_shape(&self) -> Shape {
        self.output
    }

    pub fn filters(&self) -> usize {
        self.output.depth
    }

    pub fn window(&self) -> (usize, usize) {
        (self.window_h, self.window_w)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        self.activation
    }

    pub(crate) fn set_activation(&mut self, activation: ActivationFunction) {
        self.activation = Some(activation);
    }

    fn act(&self) -> ActivationFunction {
        self.activation.unwrap_or(ActivationFunction::Identity)
    }

    fn fan_in(&self) -> usize {
        self.input.depth * self.window_h * self.window_w
    }

    fn kernel_len(&self) -> usize {
        self.output.depth * self.fan_in()
    }

    pub fn param_count(&self) -> usize {
        self.kernel_len() + self.output.depth
    }

    #[inline]
    fn kernel_offset(&self, filter: usize, map: usize, ky: usize, kx: usize) -> usize {
        ((filter * self.input.depth + map) * self.window_h + ky) * self.window_w + kx
    }

    /// Visits every in-bounds `(ky, kx, iy, ix)` tap of the window anchored at
    /// output cell `(oy, ox)`. Padded cells are skipped: they contribute zero.
    #[inline]
    fn for_each_tap<F>(&self, oy: usize, ox: usize, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let top = (oy * self.stride) as isize - self.padding as isize;
        let left = (ox * self.stride) as isize - self.padding as isize;
        for ky in 0..self.window_h {
            let iy = top + ky as isize;
            if iy < 0 || iy >= self.input.height as isize {
                continue;
            }
            for kx in 0..self.window_w {
                let ix = left + kx as isize;
                if ix < 0 || ix >= self.input.width as isize {
                    continue;
                }
                f(ky, kx, iy as usize, ix as usize);
            }
        }
    }

    pub fn init_params<R: Rng + ?Sized>(&self, params: &mut [f64], rng: &mut R) {
        let (kernel, bias) = params.split_at_mut(self.kernel_len());
        init::for_activation(kernel, self.fan_in(), self.activation.as_ref(), rng);
        bias.iter_mut().for_each(|b| *b = 0.0);
    }

    pub fn forward(&self, params: &[f64], input: &Tensor, cache: &mut LayerCache) {
        let (kernel, bias) = params.split_at(self.kernel_len());
        let act = self.act();
        for filter in 0..self.output.depth {
            for oy in 0..self.output.height {
                for ox in 0..self.output.width {
                    let mut z = bias[filter];
                    for map in 0..self.input.depth {
                        self.for_each_tap(oy, ox, |ky, kx, iy, ix| {
                            z += kernel[self.kernel_offset(filter, map, ky, kx)] * input[(map, iy, ix)];
                        });
                    }
                    cache.pre[(filter, oy, ox)] = z;
                    cache.out[(filter, oy, ox)] = act.function(z);
                }
            }
        }
    }

    /// Adds ∂L/∂input into `prev_delta`: every output error is pushed back
    /// through the kernel taps its input cells participated in.
    pub fn backprop(&self, params: &[f64], cache: &LayerCache, prev_delta: &mut Tensor) {
        let kernel = &params[..self.kernel_len()];
        for filter in 0..self.output.depth {
            for oy in 0..self.output.height {
                for ox in 0..self.output.width {
                    let d = cache.delta[(filter, oy, ox)];
                    if d == 0.0 {
                        continue;
                    }
                    for map in 0..self.input.depth {
                        self.for_each_tap(oy, ox, |ky, kx, iy, ix| {
                            prev_delta[(map, iy, ix)] += d * kernel[self.kernel_offset(filter, map, ky, kx)];
                        });
                    }
                }
            }
        }
    }

    /// Adds this example's kernel and bias gradient into `grad`.
    pub fn accumulate_gradient(&self, input: &Tensor, cache: &LayerCache, grad: &mut [f64]) {
        let kernel_len = self.kernel_len();
        let (g_kernel, g_bias) = grad.split_at_mut(kernel_len);
        for filter in 0..self.output.depth {
            for oy in 0..self.output.height {
                for ox in 0..self.output.width {
                    let d = cache.delta[(filter, oy, ox)];
                    if d == 0.0 {
                        continue;
                    }
                    g_bias[filter] += d;
                    for map in 0..self.input.depth {
                        self.for_each_tap(oy, ox, |ky, kx, iy, ix| {
                            g_kernel[self.kernel_offset(filter, map, ky, kx)] += d * input[(map, iy, ix)];
                        });
                    }
                }
            }
        }
    }

    /// Multiplies the layer's error by f'(pre).
    pub fn apply_derivative(&self, cache: &mut LayerCache) {
        let act = self.act();
        let LayerCache { pre, delta, .. } = cache;
        delta
            .as_mut_slice()
            .iter_mut()
            .zip(pre.as_slice())
            .for_each(|(d, &z)| *d *= act.derivative(z));
    }
}
