/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 张量层面的错误类型。模型层面的错误见 `crate::nn::ModelError`
 */

use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    // 构造张量用
    #[error("数据长度{data_len}与形状{shape:?}所需的元素个数不一致")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("无法将形状为{from:?}的张量变形为{to:?}")]
    ReshapeError { from: Vec<usize>, to: Vec<usize> },
    #[error("第0维的索引范围[{from}, {to})超出了长度{len}")]
    RangeOutOfBound { from: usize, to: usize, len: usize },
    #[error("张量的维数须≥{expected}，实际为{got}")]
    NotEnoughDims { expected: usize, got: usize },

    #[error("张量列表为空")]
    EmptyList,
    #[error("张量形状不一致")]
    InconsitentShape,
}
