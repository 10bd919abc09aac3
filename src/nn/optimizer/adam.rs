/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : Adam优化器实现
 */

use std::collections::HashMap;

use super::base::{Optimizer, Updates};
use crate::nn::Parameter;
use crate::tensor::Tensor;

/// Adam 的单个参数状态
#[derive(Debug, Clone)]
struct Moments {
    /// 一阶矩估计
    m: Tensor,
    /// 二阶矩估计
    v: Tensor,
    /// 该参数已被更新的次数
    t: i32,
}

/// Adam优化器
///
/// 时间步按参数分别计数：两个目标共享特征提取层、各自更新不同的回归头时，
/// 每个参数的偏差修正只取决于它自己被更新的次数
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    moments: HashMap<String, Moments>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            moments: HashMap::new(),
        }
    }

    /// 使用默认参数创建Adam优化器
    pub fn new_default(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn updates(&mut self, params: &[&Parameter]) -> Updates {
        let mut updates = Updates::new();
        for param in params {
            let gradient = param.grad();
            let state = self
                .moments
                .entry(param.name().to_string())
                .or_insert_with(|| Moments {
                    m: Tensor::zeros(gradient.shape()),
                    v: Tensor::zeros(gradient.shape()),
                    t: 0,
                });
            state.t += 1;

            // m = β1 * m + (1 - β1) * g
            state.m *= self.beta1;
            state.m += &(gradient * (1.0 - self.beta1));
            // v = β2 * v + (1 - β2) * g²
            state.v *= self.beta2;
            state.v += &(&(gradient * gradient) * (1.0 - self.beta2));

            // 偏差修正
            let m_hat = &state.m / (1.0 - self.beta1.powi(state.t));
            let v_hat = &state.v / (1.0 - self.beta2.powi(state.t));

            // θ = θ - α * m_hat / (√v_hat + ε)
            let update = &m_hat / &(v_hat.sqrt() + self.epsilon);
            let new_value = param.value() - &(update * self.learning_rate);
            updates.push(param.name(), new_value);
        }
        updates
    }

    fn reset(&mut self) {
        self.moments.clear();
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
