/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 张量的变形、切片与拼接。所有方法都返回新的张量
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{ArrayD, Axis, IxDyn, Slice};

impl Tensor {
    /// 变形为`shape`，元素总数必须一致
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor, TensorError> {
        if self.size() != shape.iter().product::<usize>() {
            return Err(TensorError::ReshapeError {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            });
        }
        Tensor::try_new(self.to_vec(), shape)
    }

    /// 保留第0维（batch），其余维度展平：[N, d1, d2, ...] -> [N, d1*d2*...]
    pub fn flatten_batch(&self) -> Result<Tensor, TensorError> {
        let shape = self.shape();
        if shape.is_empty() {
            return Err(TensorError::NotEnoughDims {
                expected: 1,
                got: 0,
            });
        }
        let rest = shape[1..].iter().product::<usize>();
        self.reshape(&[shape[0], rest])
    }

    /// 沿第0维截取[from, to)
    pub fn slice_axis0(&self, from: usize, to: usize) -> Result<Tensor, TensorError> {
        let len = self.shape().first().copied().ok_or(TensorError::NotEnoughDims {
            expected: 1,
            got: 0,
        })?;
        if from > to || to > len {
            return Err(TensorError::RangeOutOfBound { from, to, len });
        }
        Ok(Tensor {
            data: self
                .data
                .slice_axis(Axis(0), Slice::from(from..to))
                .to_owned(),
        })
    }

    /// 沿第0维拼接多个张量，其余维度必须一致
    pub fn concat_axis0(tensors: &[Tensor]) -> Result<Tensor, TensorError> {
        if tensors.is_empty() {
            return Err(TensorError::EmptyList);
        }
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        ndarray::concatenate(Axis(0), &views)
            .map(|data| Tensor { data })
            .map_err(|_| TensorError::InconsitentShape)
    }

    /// 每个样本（第0维）除batch外所有元素的均值，结果形状为[N]
    pub fn mean_per_sample(&self) -> Result<Tensor, TensorError> {
        let flat = self.flatten_batch()?;
        let n = flat.shape()[0];
        let cols = flat.shape()[1];
        if cols == 0 {
            return Ok(Tensor::zeros(&[n]));
        }
        Ok(Tensor {
            data: flat.data.sum_axis(Axis(1)) / cols as f32,
        })
    }

    /// 在第`axis`维插入长度为1的新维度
    pub fn unsqueeze(&self, axis: usize) -> Tensor {
        Tensor {
            data: self.data.clone().insert_axis(Axis(axis)),
        }
    }

    /// 将每个标量分数广播成 repeat×repeat 的单通道图块：[N] -> [N, 1, repeat, repeat]
    pub fn scores_to_tiles(&self, repeat: usize) -> Tensor {
        let scores = self.to_vec();
        let n = scores.len();
        let data = ArrayD::from_shape_fn(IxDyn(&[n, 1, repeat, repeat]), |idx| scores[idx[0]]);
        Tensor { data }
    }

    /// 逐元素映射
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.mapv(f),
        }
    }

    pub fn sqrt(&self) -> Tensor {
        self.map(f32::sqrt)
    }
}
