/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 层库与模型的统一错误类型
 */

use thiserror::Error;

use crate::errors::TensorError;

/// 模型操作错误类型
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("尚未实现：{0}")]
    NotImplemented(String),
    #[error("形状不匹配（预期{expected:?}，实际{got:?}）：{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("{0}")]
    InvalidOperation(String),
    #[error("未知的层组：{0}")]
    UnknownLayerGroup(String),
    #[error("无效的 patch-图像索引集：{0}")]
    InvalidIndexSet(String),
    #[error("配置无效：{0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error("配置解析失败：{0}")]
    Config(#[from] serde_json::Error),
    #[error("IO 错误：{0}")]
    Io(#[from] std::io::Error),
    #[error("参数（反）序列化失败：{0}")]
    Serialization(#[from] bincode::Error),
    #[error("图像写出失败：{0}")]
    Image(#[from] image::ImageError),
    #[error("npy 写出失败：{0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}
