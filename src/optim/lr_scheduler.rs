use serde::Deserialize;
use std::f32::consts::PI;

pub trait LearningRateSchedule {
    fn next_lr(&self, step: usize) -> f32;
}

pub struct ConstantLr {
    lr: f32,
}

impl ConstantLr {
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }
}

impl LearningRateSchedule for ConstantLr {
    fn next_lr(&self, _step: usize) -> f32 {
        self.lr
    }
}

pub struct StepLr {
    base_lr: f32,
    step_size: usize,
    gamma: f32,
}

impl StepLr {
    pub fn new(base_lr: f32, step_size: usize, gamma: f32) -> Self {
        Self {
            base_lr,
            step_size,
            gamma,
        }
    }
}

impl LearningRateSchedule for StepLr {
    fn next_lr(&self, step: usize) -> f32 {
        let exp = (step / self.step_size) as f32;
        self.base_lr * self.gamma.powf(exp)
    }
}

pub struct CosineLr {
    base_lr: f32,
    max_steps: usize,
}

impl CosineLr {
    pub fn new(base_lr: f32, max_steps: usize) -> Self {
        Self { base_lr, max_steps }
    }
}

impl LearningRateSchedule for CosineLr {
    fn next_lr(&self, step: usize) -> f32 {
        let t = step.min(self.max_steps) as f32 / self.max_steps as f32;
        0.5 * self.base_lr * (1.0 + (PI * t).cos())
    }
}

/// Reduce the learning rate when the observed validation loss stops
/// improving, the per-epoch counterpart to the step-based schedules.
pub struct PlateauLr {
    lr: f32,
    factor: f32,
    patience: usize,
    best: Option<f32>,
    wait: usize,
}

impl PlateauLr {
    pub fn new(base_lr: f32, factor: f32, patience: usize) -> Self {
        Self {
            lr: base_lr,
            factor,
            patience,
            best: None,
            wait: 0,
        }
    }

    /// Feed one validation loss; returns the learning rate to use for the
    /// next epoch.
    pub fn observe(&mut self, val_loss: f32) -> f32 {
        if self.best.map_or(true, |b| val_loss < b) {
            self.best = Some(val_loss);
            self.wait = 0;
        } else {
            self.wait += 1;
            if self.wait > self.patience {
                self.lr *= self.factor;
                self.wait = 0;
            }
        }
        self.lr
    }
}

/// Schedule selection, deserialized from the training config.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LrScheduleConfig {
    Constant,
    Step { step_size: usize, gamma: f32 },
    Cosine { max_steps: usize },
    Plateau { factor: f32, patience: usize },
}

impl Default for LrScheduleConfig {
    fn default() -> Self {
        LrScheduleConfig::Plateau {
            factor: 0.5,
            patience: 1,
        }
    }
}
