use crate::layers::{Dropout, EmbeddingT};
use crate::math::{self, Matrix};
use serde::{Deserialize, Serialize};

/// Model hyperparameters, persisted alongside the weights so that a saved
/// model can be reconstructed without re-specifying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Number of latent factors per user and item.
    pub embedding_dim: usize,
    /// Dropout probability applied to embedding vectors during training.
    pub dropout_p: f32,
    /// Accumulate gradients row-sparse so optimizer steps touch only the
    /// rows seen in the current batch.  Mutually exclusive with weight
    /// decay, which needs to reach every row.
    pub sparse: bool,
    /// Optional `(min, max)` range; raw scores are squashed into it with a
    /// sigmoid.
    pub y_range: Option<(f32, f32)>,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            embedding_dim: 30,
            dropout_p: 0.0,
            sparse: false,
            y_range: None,
        }
    }
}

/// Matrix factorization recommender.
///
/// A user embedding and an item embedding are dot-producted together and
/// offset by per-user and per-item bias terms to produce a single ranking
/// or rating value:
///
/// `score = dropout(user_emb[u]) . dropout(item_emb[i]) + user_bias[u] + item_bias[i]`
///
/// Dropout applies to the two embedding vectors only, never the biases,
/// and only in the training forward pass.  The tables are allocated once
/// the interaction counts are known and are updated exclusively through
/// [`MatrixFactorization::backward`] plus an optimizer step.
pub struct MatrixFactorization {
    pub hparams: Hyperparameters,
    pub user_embeddings: EmbeddingT,
    pub item_embeddings: EmbeddingT,
    pub user_biases: EmbeddingT,
    pub item_biases: EmbeddingT,
    user_dropout: Dropout,
    item_dropout: Dropout,
    cache: Option<ForwardCache>,
}

/// Values cached by the training forward pass for the backward pass.
struct ForwardCache {
    users: Vec<usize>,
    items: Vec<usize>,
    dropped_user: Matrix,
    dropped_item: Matrix,
    raw: Vec<f32>,
}

impl MatrixFactorization {
    /// Allocate the four parameter tables.  Embeddings start at
    /// `normal(0, 1/embedding_dim)`, biases at zero.
    pub fn new(num_users: usize, num_items: usize, hparams: Hyperparameters) -> Self {
        let dim = hparams.embedding_dim;
        let sparse = hparams.sparse;
        let dropout_p = hparams.dropout_p;
        Self {
            user_embeddings: EmbeddingT::scaled(num_users, dim, sparse),
            item_embeddings: EmbeddingT::scaled(num_items, dim, sparse),
            user_biases: EmbeddingT::zeros(num_users, 1, sparse),
            item_biases: EmbeddingT::zeros(num_items, 1, sparse),
            user_dropout: Dropout::new(dropout_p),
            item_dropout: Dropout::new(dropout_p),
            cache: None,
            hparams,
        }
    }

    pub fn num_users(&self) -> usize {
        self.user_embeddings.rows()
    }

    pub fn num_items(&self) -> usize {
        self.item_embeddings.rows()
    }

    /// Inference forward pass: one prediction per `(user, item)` pair, no
    /// dropout.  Both slices must have equal length; ids out of range
    /// panic with the standard indexing error.
    pub fn forward(&self, users: &[usize], items: &[usize]) -> Vec<f32> {
        assert_eq!(users.len(), items.len());
        users
            .iter()
            .zip(items.iter())
            .map(|(&u, &i)| {
                let raw = math::dot(self.user_embeddings.row(u), self.item_embeddings.row(i))
                    + self.user_biases.row(u)[0]
                    + self.item_biases.row(i)[0];
                self.squash(raw)
            })
            .collect()
    }

    /// Training forward pass: dropout is active and the looked-up rows,
    /// masks and raw scores are cached for [`MatrixFactorization::backward`].
    pub fn forward_train(&mut self, users: &[usize], items: &[usize]) -> Vec<f32> {
        assert_eq!(users.len(), items.len());
        let user_rows = self.user_embeddings.lookup(users);
        let item_rows = self.item_embeddings.lookup(items);
        let dropped_user = self.user_dropout.forward(&user_rows, true);
        let dropped_item = self.item_dropout.forward(&item_rows, true);

        let mut raw = Vec::with_capacity(users.len());
        for k in 0..users.len() {
            raw.push(
                math::dot(dropped_user.row(k), dropped_item.row(k))
                    + self.user_biases.row(users[k])[0]
                    + self.item_biases.row(items[k])[0],
            );
        }
        let preds = raw.iter().map(|&r| self.squash(r)).collect();
        self.cache = Some(ForwardCache {
            users: users.to_vec(),
            items: items.to_vec(),
            dropped_user,
            dropped_item,
            raw,
        });
        preds
    }

    /// Accumulate gradients for the batch of the last training forward.
    ///
    /// `dscore` is the loss gradient with respect to the predictions
    /// returned by `forward_train`, in the same order.  Panics when no
    /// training forward preceded this call.
    pub fn backward(&mut self, dscore: &[f32]) {
        let cache = self
            .cache
            .take()
            .expect("backward called without a training forward");
        assert_eq!(dscore.len(), cache.raw.len());

        // Chain through the sigmoid range squash when configured.
        let draw: Vec<f32> = match self.hparams.y_range {
            Some((min, max)) => cache
                .raw
                .iter()
                .zip(dscore.iter())
                .map(|(&r, &d)| {
                    let s = math::sigmoid(r);
                    d * s * (1.0 - s) * (max - min)
                })
                .collect(),
            None => dscore.to_vec(),
        };

        let n = cache.users.len();
        let dim = self.hparams.embedding_dim;
        let mut grad_user = Matrix::zeros(n, dim);
        let mut grad_item = Matrix::zeros(n, dim);
        for k in 0..n {
            let gu = grad_user.row_mut(k);
            let gi = grad_item.row_mut(k);
            let du = cache.dropped_user.row(k);
            let di = cache.dropped_item.row(k);
            for f in 0..dim {
                gu[f] = draw[k] * di[f];
                gi[f] = draw[k] * du[f];
            }
        }
        // The dropout masks gate the gradients exactly as they gated the
        // activations.
        let grad_user = self.user_dropout.backward(&grad_user);
        let grad_item = self.item_dropout.backward(&grad_item);

        for k in 0..n {
            self.user_embeddings
                .accumulate(cache.users[k], grad_user.row(k));
            self.item_embeddings
                .accumulate(cache.items[k], grad_item.row(k));
            self.user_biases.accumulate(cache.users[k], &[draw[k]]);
            self.item_biases.accumulate(cache.items[k], &[draw[k]]);
        }
    }

    pub fn zero_grad(&mut self) {
        self.user_embeddings.zero_grad();
        self.item_embeddings.zero_grad();
        self.user_biases.zero_grad();
        self.item_biases.zero_grad();
    }

    /// Embedding tables, for the embedding optimizer.
    pub fn embedding_parameters(&mut self) -> Vec<&mut EmbeddingT> {
        vec![&mut self.user_embeddings, &mut self.item_embeddings]
    }

    /// Bias tables, for the (possibly separate) bias optimizer.
    pub fn bias_parameters(&mut self) -> Vec<&mut EmbeddingT> {
        vec![&mut self.user_biases, &mut self.item_biases]
    }

    /// The trained item-embedding matrix, free of any gradient state, for
    /// similarity search or export.
    pub fn item_embedding_matrix(&self) -> &Matrix {
        &self.item_embeddings.w
    }

    fn squash(&self, raw: f32) -> f32 {
        match self.hparams.y_range {
            Some((min, max)) => min + math::sigmoid(raw) * (max - min),
            None => raw,
        }
    }
}
