use crate::math::Matrix;
use crate::rng::rng_from_env;
use rand::Rng;

/// Dropout layer that randomly zeros elements during training.
///
/// Each element of the input is kept with probability `1 - p`; kept
/// values are scaled by `1/(1 - p)` to preserve the expected activation
/// ("inverted" dropout).  The generated mask is stored so that it can be
/// reused during the backward pass.
pub struct Dropout {
    p: f32,
    mask: Vec<f32>,
    rng: rand::rngs::StdRng,
}

impl Dropout {
    /// Create a dropout layer dropping with probability `p`.
    pub fn new(p: f32) -> Self {
        Self {
            p,
            mask: Vec::new(),
            rng: rng_from_env(),
        }
    }

    /// Forward pass.  When `train` is `false`, or `p` is zero, the input is
    /// returned unchanged and the mask is all ones.
    pub fn forward(&mut self, x: &Matrix, train: bool) -> Matrix {
        if !train || self.p <= 0.0 {
            self.mask = vec![1.0; x.data.len()];
            return x.clone();
        }
        let mut out = Matrix::zeros(x.rows, x.cols);
        self.mask = vec![0.0; x.data.len()];
        let scale = if self.p < 1.0 { 1.0 / (1.0 - self.p) } else { 0.0 };
        for i in 0..x.data.len() {
            if self.rng.gen::<f32>() < self.p {
                self.mask[i] = 0.0;
            } else {
                self.mask[i] = scale;
                out.data[i] = x.data[i] * scale;
            }
        }
        out
    }

    /// Backward pass using the mask generated in `forward`.
    pub fn backward(&self, grad: &Matrix) -> Matrix {
        let mut grad_input = Matrix::zeros(grad.rows, grad.cols);
        for i in 0..grad.data.len() {
            grad_input.data[i] = grad.data[i] * self.mask[i];
        }
        grad_input
    }
}
