/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 可训练参数：值 + 累积梯度
 */

use crate::nn::ModelError;
use crate::tensor::Tensor;

/// 参数种类。只有权重参与 L2 正则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Weight,
    Bias,
}

/// 层持有的可训练参数
///
/// 名称形如 `feat/conv1_W`、`reg_mos/fc2_b`，在整个模型内唯一
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    value: Tensor,
    grad: Tensor,
}

impl Parameter {
    pub fn new(name: &str, kind: ParamKind, value: Tensor) -> Self {
        let grad = Tensor::zeros(value.shape());
        Self {
            name: name.to_string(),
            kind,
            value,
            grad,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn is_weight(&self) -> bool {
        self.kind == ParamKind::Weight
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn grad(&self) -> &Tensor {
        &self.grad
    }

    pub fn size(&self) -> usize {
        self.value.size()
    }

    /// 设置新的参数值，形状必须与原值一致
    pub fn set_value(&mut self, value: &Tensor) -> Result<(), ModelError> {
        if !self.value.is_same_shape(value) {
            return Err(ModelError::ShapeMismatch {
                expected: self.value.shape().to_vec(),
                got: value.shape().to_vec(),
                message: format!("参数`{}`的新值形状不符", self.name),
            });
        }
        self.value = value.clone();
        Ok(())
    }

    /// 累加梯度（同一参数可能被多次反向传播）
    pub fn accumulate_grad(&mut self, grad: &Tensor) -> Result<(), ModelError> {
        if !self.grad.is_same_shape(grad) {
            return Err(ModelError::ShapeMismatch {
                expected: self.grad.shape().to_vec(),
                got: grad.shape().to_vec(),
                message: format!("参数`{}`的梯度形状不符", self.name),
            });
        }
        self.grad += grad;
        Ok(())
    }

    pub fn zero_grad(&mut self) {
        self.grad = Tensor::zeros(self.value.shape());
    }
}
