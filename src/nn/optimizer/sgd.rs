/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 梯度下降优化器实现（可选动量）
 */

use std::collections::HashMap;

use super::base::{Optimizer, Updates};
use crate::nn::Parameter;
use crate::tensor::Tensor;

/// SGD (随机梯度下降) 优化器
///
/// - momentum = 0：θ = θ - α * ∇θ
/// - momentum > 0：v = μ * v - α * ∇θ，θ = θ + v
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f32,
    momentum: f32,
    velocity: HashMap<String, Tensor>,
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        Self::with_momentum(learning_rate, 0.)
    }

    pub fn with_momentum(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: HashMap::new(),
        }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }
}

impl Optimizer for SGD {
    fn updates(&mut self, params: &[&Parameter]) -> Updates {
        let mut updates = Updates::new();
        for param in params {
            let step = param.grad() * self.learning_rate;
            let new_value = if self.momentum == 0. {
                param.value() - &step
            } else {
                let v = self
                    .velocity
                    .entry(param.name().to_string())
                    .or_insert_with(|| Tensor::zeros(param.value().shape()));
                *v *= self.momentum;
                *v -= &step;
                param.value() + &*v
            };
            updates.push(param.name(), new_value);
        }
        updates
    }

    fn reset(&mut self) {
        self.velocity.clear();
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
