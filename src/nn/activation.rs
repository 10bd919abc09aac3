/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 层内置的非线性激活
 */

use crate::tensor::Tensor;

/// 层输出所用的激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// 恒等（线性输出）
    #[default]
    Linear,
    Relu,
}

impl Activation {
    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Self::Linear => x.clone(),
            Self::Relu => x.map(|v| v.max(0.)),
        }
    }

    /// 由激活后的输出`y`与上游梯度计算激活前的梯度
    pub fn backward(&self, y: &Tensor, upstream_grad: &Tensor) -> Tensor {
        match self {
            Self::Linear => upstream_grad.clone(),
            Self::Relu => {
                let mask = y.map(|v| if v > 0. { 1. } else { 0. });
                upstream_grad * &mask
            }
        }
    }
}
