/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : 模型基类的配置：输入尺寸与优化器
 */

use serde::{Deserialize, Serialize};

use crate::nn::ModelError;
use crate::nn::optimizer::{Adam, Optimizer, SGD};

/// 优化算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptScheme {
    #[default]
    Adam,
    Sgd,
}

/// 模型基类配置，所有字段均可缺省
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelBaseConfig {
    /// patch 尺寸 [H, W]
    pub input_size: [usize; 2],
    /// patch 通道数
    pub num_ch: usize,
    pub opt_scheme: OptScheme,
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// 仅 SGD 使用
    pub momentum: f32,
    /// 参数初始化与 dropout 的随机种子；缺省时取系统熵
    pub seed: Option<u64>,
}

impl Default for ModelBaseConfig {
    fn default() -> Self {
        Self {
            input_size: [32, 32],
            num_ch: 1,
            opt_scheme: OptScheme::Adam,
            lr: 1e-4,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            momentum: 0.9,
            seed: None,
        }
    }
}

impl ModelBaseConfig {
    /// 单个 patch 的形状 [C, H, W]
    pub fn input_shape(&self) -> Vec<usize> {
        vec![self.num_ch, self.input_size[0], self.input_size[1]]
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.num_ch == 0 || self.input_size.contains(&0) {
            return Err(ModelError::InvalidConfig(format!(
                "输入尺寸不能含0：num_ch={}, input_size={:?}",
                self.num_ch, self.input_size
            )));
        }
        if !(self.lr > 0.) {
            return Err(ModelError::InvalidConfig(format!(
                "学习率须为正数，实际为{}",
                self.lr
            )));
        }
        Ok(())
    }

    pub fn build_optimizer(&self) -> Box<dyn Optimizer> {
        match self.opt_scheme {
            OptScheme::Adam => Box::new(Adam::new(self.lr, self.beta1, self.beta2, self.epsilon)),
            OptScheme::Sgd => Box::new(SGD::with_momentum(self.lr, self.momentum)),
        }
    }
}
