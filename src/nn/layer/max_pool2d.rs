/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 2D 最大池化层
 *
 * 设计决策：
 * - 步长等于池化窗口，不足一个窗口的边缘直接丢弃（ignore border）
 * - 记录最大值位置用于反向传播（稀疏梯度）
 * - 使用 Rayon 在 batch 维度并行
 */

use rayon::prelude::*;

use super::{TraitLayer, check_batch_shape, missing_cache};
use crate::nn::ModelError;
use crate::tensor::Tensor;

/// 2D 最大池化层
#[derive(Debug, Clone)]
pub struct MaxPool2d {
    name: String,
    pool_size: (usize, usize),
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    // 每个输出位置对应的最大值在（整个 batch 展平后的）输入中的位置
    max_indices: Option<Vec<usize>>,
    batch_shape: Option<Vec<usize>>,
}

impl MaxPool2d {
    /// # 参数
    /// - `input_shape`: 单样本输入形状 [C, H, W]
    /// - `pool_size`: 池化窗口 (pH, pW)，步长与之相同
    pub fn new(input_shape: &[usize], pool_size: (usize, usize), name: &str) -> Result<Self, ModelError> {
        let output_shape = Self::infer_output_shape(input_shape, pool_size)?;
        Ok(Self {
            name: name.to_string(),
            pool_size,
            input_shape: input_shape.to_vec(),
            output_shape,
            max_indices: None,
            batch_shape: None,
        })
    }

    pub fn infer_output_shape(
        input_shape: &[usize],
        pool_size: (usize, usize),
    ) -> Result<Vec<usize>, ModelError> {
        if input_shape.len() != 3 {
            return Err(ModelError::ShapeMismatch {
                expected: vec![0, 0, 0],
                got: input_shape.to_vec(),
                message: "MaxPool2d 的输入形状必须是 [C, H, W]".to_string(),
            });
        }
        let (p_h, p_w) = pool_size;
        let (in_h, in_w) = (input_shape[1], input_shape[2]);
        if p_h == 0 || p_w == 0 || p_h > in_h || p_w > in_w {
            return Err(ModelError::InvalidOperation(format!(
                "MaxPool2d 池化窗口 {p_h}x{p_w} 超出输入尺寸 {in_h}x{in_w}"
            )));
        }
        Ok(vec![input_shape[0], in_h / p_h, in_w / p_w])
    }

    pub fn pool_size(&self) -> (usize, usize) {
        self.pool_size
    }
}

impl TraitLayer for MaxPool2d {
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
        let batch_size = check_batch_shape(&self.name, &self.input_shape, x)?;
        let (channels, in_h, in_w) = (self.input_shape[0], self.input_shape[1], self.input_shape[2]);
        let (out_h, out_w) = (self.output_shape[1], self.output_shape[2]);
        let (p_h, p_w) = self.pool_size;
        let in_sample = channels * in_h * in_w;
        let out_sample = channels * out_h * out_w;
        let input = x.to_vec();

        let batch_results: Vec<(Vec<f32>, Vec<usize>)> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let offset = b * in_sample;
                let mut sample_output = vec![0.0f32; out_sample];
                let mut sample_indices = vec![0usize; out_sample];
                for c in 0..channels {
                    for oh in 0..out_h {
                        for ow in 0..out_w {
                            let mut max_val = f32::NEG_INFINITY;
                            let mut max_idx = offset + (c * in_h + oh * p_h) * in_w + ow * p_w;
                            for kh in 0..p_h {
                                for kw in 0..p_w {
                                    let idx = offset + (c * in_h + oh * p_h + kh) * in_w + ow * p_w + kw;
                                    if input[idx] > max_val {
                                        max_val = input[idx];
                                        max_idx = idx;
                                    }
                                }
                            }
                            let out_idx = (c * out_h + oh) * out_w + ow;
                            sample_output[out_idx] = max_val;
                            sample_indices[out_idx] = max_idx;
                        }
                    }
                }
                (sample_output, sample_indices)
            })
            .collect();

        let mut all_output = Vec::with_capacity(batch_size * out_sample);
        let mut all_indices = Vec::with_capacity(batch_size * out_sample);
        for (output, indices) in batch_results {
            all_output.extend(output);
            all_indices.extend(indices);
        }

        self.max_indices = Some(all_indices);
        self.batch_shape = Some(x.shape().to_vec());
        Ok(Tensor::try_new(
            all_output,
            &[batch_size, channels, out_h, out_w],
        )?)
    }

    /// 最大值位置：梯度 = 上游梯度；其他位置：梯度 = 0
    fn backward(&mut self, upstream_grad: &Tensor) -> Result<Tensor, ModelError> {
        let (indices, batch_shape) = match (&self.max_indices, &self.batch_shape) {
            (Some(i), Some(s)) => (i, s),
            _ => return Err(missing_cache(&self.name)),
        };
        if upstream_grad.size() != indices.len() {
            return Err(ModelError::ShapeMismatch {
                expected: vec![batch_shape[0], self.output_shape[0], self.output_shape[1], self.output_shape[2]],
                got: upstream_grad.shape().to_vec(),
                message: format!("层`{}`的上游梯度形状不符", self.name),
            });
        }
        let mut grad_input = vec![0.0f32; batch_shape.iter().product()];
        for (g, &idx) in upstream_grad.to_vec().into_iter().zip(indices.iter()) {
            grad_input[idx] += g;
        }
        Ok(Tensor::try_new(grad_input, batch_shape)?)
    }
}
