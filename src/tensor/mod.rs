/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 基于 ndarray 的稠密 f32 张量，为层库提供最基本的数值容器
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::errors::TensorError;

mod ops {
    pub mod elementwise;
}

mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：卷积相关的张量一律采用 Batch-First 的 [batch, C, H, W] 格式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    /// 需要错误处理时请使用`try_new`
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        Self::try_new(data.to_vec(), shape).unwrap_or_else(|e| panic!("{e}"))
    }

    /// 创建一个张量，若`data`长度与`shape`不符则返回错误
    pub fn try_new(data: Vec<f32>, shape: &[usize]) -> Result<Tensor, TensorError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            });
        }
        Array::from_shape_vec(IxDyn(shape), data)
            .map(|data| Tensor { data })
            .map_err(|_| TensorError::DataShapeMismatch {
                data_len: expected,
                shape: shape.to_vec(),
            })
    }

    /// 创建一个全为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Self::full(0., shape)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Self::full(1., shape)
    }

    /// 创建一个标量张量，形状为`[1]`
    pub fn scalar(value: f32) -> Tensor {
        Self::full(value, &[1])
    }

    /// 用给定的随机数生成器创建一个随机张量，其值在[min, max]的闭区间
    pub fn new_uniform<R: Rng + ?Sized>(min: f32, max: f32, shape: &[usize], rng: &mut R) -> Tensor {
        let dist = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 直接由 ndarray 数组构建
    pub fn from_array(data: ArrayD<f32>) -> Tensor {
        Tensor { data }
    }

    pub fn as_array(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }
}
