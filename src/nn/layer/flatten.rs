/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 展平层：把每个 patch 的特征图拉成向量 [batch, C, H, W] -> [batch, C*H*W]
 */

use super::{TraitLayer, check_batch_shape, missing_cache};
use crate::nn::ModelError;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct Flatten {
    name: String,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    batch_shape: Option<Vec<usize>>,
}

impl Flatten {
    pub fn new(input_shape: &[usize], name: &str) -> Self {
        Self {
            name: name.to_string(),
            input_shape: input_shape.to_vec(),
            output_shape: vec![input_shape.iter().product()],
            batch_shape: None,
        }
    }
}

impl TraitLayer for Flatten {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, ModelError> {
        check_batch_shape(&self.name, &self.input_shape, x)?;
        self.batch_shape = Some(x.shape().to_vec());
        Ok(x.flatten_batch()?)
    }

    fn backward(&mut self, upstream_grad: &Tensor) -> Result<Tensor, ModelError> {
        let batch_shape = self
            .batch_shape
            .as_ref()
            .ok_or_else(|| missing_cache(&self.name))?;
        Ok(upstream_grad.reshape(batch_shape)?)
    }
}
