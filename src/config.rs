use crate::optim::LrScheduleConfig;
use serde::Deserialize;
use std::fs;

/// Training configuration loaded from a TOML or JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// CSV file of `user_id,item_id[,rating]` interactions.
    pub data: String,
    pub epochs: usize,
    pub batch_size: usize,
    /// Number of latent factors.
    pub embedding_dim: usize,
    /// Dropout probability on embedding vectors.
    pub dropout_p: f32,
    /// Row-sparse gradient accumulation; incompatible with `weight_decay`.
    pub sparse: bool,
    /// Embedding learning rate.
    pub lr: f32,
    /// Bias-term learning rate; `None` inherits `lr`.
    pub bias_lr: Option<f32>,
    pub weight_decay: f32,
    /// `"adam"` or `"sgd"`.
    pub optimizer: String,
    /// Separate optimizer for the bias terms; `None` runs a single
    /// optimizer over all parameters.  A slower bias optimizer keeps the
    /// model from optimizing only the popularity offsets.
    pub bias_optimizer: Option<String>,
    /// `"hinge"`, `"bpr"` or `"mse"`.
    pub loss: String,
    /// Optional `(min, max)` output range.
    pub y_range: Option<(f32, f32)>,
    /// Fraction of interactions held out for validation.
    pub val_fraction: f32,
    pub lr_schedule: LrScheduleConfig,
    /// Early-stopping patience, in epochs.
    pub patience: usize,
    /// Checkpoint path for the best model.
    pub checkpoint: String,
    pub log_dir: Option<String>,
    pub experiment: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data: "interactions.csv".to_string(),
            epochs: 10,
            batch_size: 1024,
            embedding_dim: 30,
            dropout_p: 0.0,
            sparse: false,
            lr: 1e-3,
            bias_lr: Some(1e-2),
            weight_decay: 0.0,
            optimizer: "adam".to_string(),
            bias_optimizer: Some("sgd".to_string()),
            loss: "hinge".to_string(),
            y_range: None,
            val_fraction: 0.1,
            lr_schedule: LrScheduleConfig::default(),
            patience: 3,
            checkpoint: "model.json".to_string(),
            log_dir: None,
            experiment: None,
        }
    }
}

impl TrainConfig {
    /// Load configuration from the given path.  Supports TOML or JSON based
    /// on the file extension. Returns `None` if parsing fails.
    pub fn from_path(path: &str) -> Option<Self> {
        let Ok(content) = fs::read_to_string(path) else {
            return None;
        };
        if path.ends_with(".json") {
            serde_json::from_str(&content).ok()
        } else {
            toml::from_str(&content).ok()
        }
    }
}
