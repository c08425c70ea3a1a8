use crate::layers::EmbeddingT;

pub struct Adam {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    pub weight_decay: f32,
}

impl Adam {
    pub fn new(lr: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay,
        }
    }

    pub fn step(&mut self, params: &mut [&mut EmbeddingT]) {
        for p in params.iter_mut() {
            p.adam_step(self.lr, self.beta1, self.beta2, self.eps, self.weight_decay);
        }
    }
}
