/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 层库：卷积、池化、全连接、dropout、展平。
 *
 * 约定：
 * - 张量一律 Batch-First，层记录的输入/输出形状均**不含** batch 维；
 * - `forward` 会缓存反向传播所需的中间量，`backward` 据此计算对输入的梯度，
 *   并把参数梯度累加到各自的 `Parameter` 上；
 * - 同一层连续两次 `forward` 后再 `backward`，只对最后一次有效。
 */

mod conv2d;
mod dropout;
mod flatten;
mod linear;
mod max_pool2d;

pub use conv2d::Conv2d;
pub use dropout::Dropout;
pub use flatten::Flatten;
pub use linear::Linear;
pub use max_pool2d::MaxPool2d;

use enum_dispatch::enum_dispatch;

use crate::nn::{ModelError, Parameter};
use crate::tensor::Tensor;

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Linear(Linear),
    Dropout(Dropout),
    Flatten(Flatten),
}

#[enum_dispatch(Layer)]
pub trait TraitLayer {
    fn name(&self) -> &str;

    /// 单个样本的输入形状（不含 batch 维）
    fn input_shape(&self) -> &[usize];

    /// 单个样本的输出形状（不含 batch 维），在构造时即由输入形状推导得出
    fn output_shape(&self) -> &[usize];

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, ModelError>;

    /// 由输出的梯度计算输入的梯度，参数梯度累加到层内参数上
    fn backward(&mut self, upstream_grad: &Tensor) -> Result<Tensor, ModelError>;

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        Vec::new()
    }

    /// 训练/推理模式切换，目前只有 dropout 关心
    fn set_training(&mut self, _training: bool) {}
}

/// 检查一个 batch 的形状是否为 [batch, ...`expected`]，返回 batch 大小
fn check_batch_shape(layer: &str, expected: &[usize], x: &Tensor) -> Result<usize, ModelError> {
    let shape = x.shape();
    if shape.len() != expected.len() + 1 || &shape[1..] != expected {
        let mut full_expected = vec![0];
        full_expected.extend_from_slice(expected);
        return Err(ModelError::ShapeMismatch {
            expected: full_expected,
            got: shape.to_vec(),
            message: format!("层`{layer}`的输入须为[batch, {expected:?}]"),
        });
    }
    Ok(shape[0])
}

/// 检查 `backward` 前是否已 `forward` 过
fn missing_cache(layer: &str) -> ModelError {
    ModelError::InvalidOperation(format!("层`{layer}`在反向传播前没有执行前向传播"))
}
