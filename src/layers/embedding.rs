use crate::math::Matrix;
use crate::rng::rng_from_env;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

// Embedding table with rudimentary backprop support.  Gradients are
// accumulated per row between `zero_grad` calls, and the struct keeps Adam
// optimizer statistics so that optimizer state persists across iterations.

pub struct EmbeddingT {
    pub w: Matrix,
    grad: HashMap<usize, Vec<f32>>,
    m: Matrix,
    v: Matrix,
    t: usize,
    sparse: bool,
}

impl EmbeddingT {
    /// Table initialised from `normal(0, 1/dim)`, the usual small-scale
    /// starting point for latent factors.
    pub fn scaled(rows: usize, dim: usize, sparse: bool) -> Self {
        let mut rng = rng_from_env();
        let normal = Normal::new(0.0f32, 1.0 / dim as f32).unwrap();
        let data = (0..rows * dim).map(|_| normal.sample(&mut rng)).collect();
        Self::from_weights(Matrix::from_vec(rows, dim, data), sparse)
    }

    /// Zero-initialised table, used for bias terms.
    pub fn zeros(rows: usize, dim: usize, sparse: bool) -> Self {
        Self::from_weights(Matrix::zeros(rows, dim), sparse)
    }

    pub fn from_weights(w: Matrix, sparse: bool) -> Self {
        let m = Matrix::zeros(w.rows, w.cols);
        let v = Matrix::zeros(w.rows, w.cols);
        Self {
            w,
            grad: HashMap::new(),
            m,
            v,
            t: 0,
            sparse,
        }
    }

    pub fn rows(&self) -> usize {
        self.w.rows
    }

    pub fn dim(&self) -> usize {
        self.w.cols
    }

    /// Borrow the row for `id`.  Panics when `id` is out of range.
    pub fn row(&self, id: usize) -> &[f32] {
        self.w.row(id)
    }

    /// Gather the rows for a batch of ids into a `len x dim` matrix.
    pub fn lookup(&self, ids: &[usize]) -> Matrix {
        let mut out = Matrix::zeros(ids.len(), self.dim());
        for (k, &id) in ids.iter().enumerate() {
            out.row_mut(k).copy_from_slice(self.w.row(id));
        }
        out
    }

    /// Add `g` to the accumulated gradient for row `id`.
    pub fn accumulate(&mut self, id: usize, g: &[f32]) {
        assert_eq!(g.len(), self.w.cols);
        let row = self
            .grad
            .entry(id)
            .or_insert_with(|| vec![0.0; g.len()]);
        for (acc, &gi) in row.iter_mut().zip(g.iter()) {
            *acc += gi;
        }
    }

    pub fn zero_grad(&mut self) {
        self.grad.clear();
    }

    /// SGD update.
    ///
    /// In sparse mode only the rows touched since `zero_grad` are updated;
    /// weight decay of untouched rows is undefined there, so combining
    /// `sparse` with a non-zero `weight_decay` is a caller error (it decays
    /// only the touched rows).
    pub fn sgd_step(&mut self, lr: f32, weight_decay: f32) {
        if self.sparse || weight_decay == 0.0 {
            for (&id, g) in &self.grad {
                let row = self.w.row_mut(id);
                for (wi, &gi) in row.iter_mut().zip(g.iter()) {
                    *wi -= lr * (gi + weight_decay * *wi);
                }
            }
        } else {
            let zeros = vec![0.0; self.w.cols];
            for id in 0..self.w.rows {
                let g = self.grad.get(&id).map(|v| v.as_slice()).unwrap_or(&zeros);
                let row = self.w.row_mut(id);
                for (wi, &gi) in row.iter_mut().zip(g.iter()) {
                    *wi -= lr * (gi + weight_decay * *wi);
                }
            }
        }
    }

    /// Adam update.  Dense mode advances the moment estimates of every row
    /// each step; sparse mode updates moments lazily for touched rows only.
    /// The same weight-decay caveat as [`EmbeddingT::sgd_step`] applies.
    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        self.t += 1;
        let bc1 = 1.0 - beta1.powi(self.t as i32);
        let bc2 = 1.0 - beta2.powi(self.t as i32);
        if self.sparse {
            for (&id, g) in &self.grad {
                Self::adam_row(
                    self.w.row_mut(id),
                    self.m.row_mut(id),
                    self.v.row_mut(id),
                    g,
                    lr,
                    beta1,
                    beta2,
                    eps,
                    weight_decay,
                    bc1,
                    bc2,
                );
            }
        } else {
            let zeros = vec![0.0; self.w.cols];
            for id in 0..self.w.rows {
                let g = self.grad.get(&id).map(|v| v.as_slice()).unwrap_or(&zeros);
                Self::adam_row(
                    self.w.row_mut(id),
                    self.m.row_mut(id),
                    self.v.row_mut(id),
                    g,
                    lr,
                    beta1,
                    beta2,
                    eps,
                    weight_decay,
                    bc1,
                    bc2,
                );
            }
        }
    }

    fn adam_row(
        w: &mut [f32],
        m: &mut [f32],
        v: &mut [f32],
        g: &[f32],
        lr: f32,
        beta1: f32,
        beta2: f32,
        eps: f32,
        weight_decay: f32,
        bc1: f32,
        bc2: f32,
    ) {
        for i in 0..w.len() {
            let gi = g[i] + weight_decay * w[i];
            m[i] = beta1 * m[i] + (1.0 - beta1) * gi;
            v[i] = beta2 * v[i] + (1.0 - beta2) * gi * gi;
            let m_hat = m[i] / bc1;
            let v_hat = v[i] / bc2;
            w[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }
}
