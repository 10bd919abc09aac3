/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 参数初始化策略
 */

use rand::rngs::StdRng;

use crate::tensor::Tensor;

/// 参数初始化方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// Glorot/Xavier 均匀分布：U(-a, a)，a = sqrt(6 / (fan_in + fan_out))
    GlorotUniform { fan_in: usize, fan_out: usize },
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG，保证可复现）
    pub fn generate(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match *self {
            Self::Constant(v) => Tensor::full(v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::GlorotUniform { fan_in, fan_out } => {
                let bound = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Tensor::new_uniform(-bound, bound, shape, rng)
            }
        }
    }
}
