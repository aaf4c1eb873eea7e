/// Categorical cross-entropy over the softmax of the raw network output.
///
/// The network itself never normalizes its output; this loss applies the
/// softmax internally so the last layer can stay linear.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

/// Numerically shifted softmax: exp(x_i - max) / sum(exp(x_j - max)).
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl CrossEntropyLoss {
    /// L = -sum(expected[i] * log(softmax(predicted)[i] + eps))
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        softmax(predicted).iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient with respect to the raw outputs:
    ///   ∂L/∂x_i = softmax(x)_i · sum(expected) - expected[i]
    ///
    /// which is `softmax - expected` for a one-hot target.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let mass: f64 = expected.iter().sum();
        softmax(predicted).iter().zip(expected.iter())
            .map(|(p, e)| p * mass - e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn softmax_is_shift_invariant() {
        let a = softmax(&[1.0, 2.0, 3.0]);
        let b = softmax(&[1001.0, 1002.0, 1003.0]);
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(a.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn derivative_matches_central_differences() {
        let x = [0.3, -1.2, 0.8];
        let e = [0.0, 0.0, 1.0];
        let h = 1e-6;
        let analytic = CrossEntropyLoss::derivative(&x, &e);
        for i in 0..x.len() {
            let mut up = x;
            let mut down = x;
            up[i] += h;
            down[i] -= h;
            let numeric = (CrossEntropyLoss::loss(&up, &e) - CrossEntropyLoss::loss(&down, &e)) / (2.0 * h);
            assert_abs_diff_eq!(analytic[i], numeric, epsilon = 1e-6);
        }
    }
}
