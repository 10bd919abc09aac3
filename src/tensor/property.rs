/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 本类仅包含一些属性及归约方法，不会修改张量本身
 */

use super::Tensor;
use ndarray::Axis;

impl Tensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.shape().iter().all(|x| *x == 1)
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 按逻辑（行优先）顺序拷贝出所有元素
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 所有元素的均值；空张量返回0
    pub fn mean(&self) -> f32 {
        self.data.mean().unwrap_or(0.)
    }

    /// 所有元素的平方和（即 L2 范数的平方）
    pub fn sum_squares(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum()
    }

    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// 沿第0维求和，结果去掉第0维
    pub fn sum_axis0(&self) -> Tensor {
        Tensor {
            data: self.data.sum_axis(Axis(0)),
        }
    }

    /// 沿第0维求均值并保留该维（形状变为[1, ...]）；第0维长度为0时返回None
    pub fn mean_axis0_keepdims(&self) -> Option<Tensor> {
        self.data.mean_axis(Axis(0)).map(|m| Tensor {
            data: m.insert_axis(Axis(0)),
        })
    }
}
