/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : Dropout 层（inverted dropout）
 *
 * - 训练模式：每个元素以概率 p 置零，保留的元素乘以 1/(1-p)，期望值不变
 * - 推理模式：恒等映射
 * 新建的 dropout 层默认处于推理模式，须由模型统一切换
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{TraitLayer, check_batch_shape};
use crate::nn::ModelError;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct Dropout {
    name: String,
    p: f32,
    training: bool,
    rng: StdRng,
    shape: Vec<usize>,
    // 本次前向所用的掩码（已含缩放），推理模式下为 None
    mask: Option<Tensor>,
}

impl Dropout {
    /// # 参数
    /// - `input_shape`: 单样本输入形状，输出形状与之相同
    /// - `p`: 丢弃概率，须在 [0, 1) 内
    /// - `seed`: 掩码随机数种子
    pub fn new(input_shape: &[usize], p: f32, name: &str, seed: u64) -> Result<Self, ModelError> {
        if !(0.0..1.0).contains(&p) {
            return Err(ModelError::InvalidOperation(format!(
                "Dropout 层`{name}`的丢弃概率须在[0, 1)内，实际为{p}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            p,
            training: false,
            rng: StdRng::seed_from_u64(seed),
            shape: input_shape.to_vec(),
            mask: None,
        })
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl TraitLayer for Dropout {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> &[usize] {
        &self.shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, ModelError> {
        check_batch_shape(&self.name, &self.shape, x)?;
        if !self.training || self.p == 0. {
            self.mask = None;
            return Ok(x.clone());
        }
        let keep = 1. - self.p;
        let scale = 1. / keep;
        let mask_data = (0..x.size())
            .map(|_| if self.rng.r#gen::<f32>() < keep { scale } else { 0. })
            .collect::<Vec<_>>();
        let mask = Tensor::try_new(mask_data, x.shape())?;
        let output = x * &mask;
        self.mask = Some(mask);
        Ok(output)
    }

    fn backward(&mut self, upstream_grad: &Tensor) -> Result<Tensor, ModelError> {
        match &self.mask {
            Some(mask) if mask.is_same_shape(upstream_grad) => Ok(upstream_grad * mask),
            Some(mask) => Err(ModelError::ShapeMismatch {
                expected: mask.shape().to_vec(),
                got: upstream_grad.shape().to_vec(),
                message: format!("层`{}`的上游梯度形状不符", self.name),
            }),
            None => Ok(upstream_grad.clone()),
        }
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}
