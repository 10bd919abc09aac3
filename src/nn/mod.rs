/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 负责神经网络（neural network）的构建：层库、损失、优化器、模型基类与诊断记录
 */

mod activation;
mod criterion;
mod error;
mod init;
pub mod layer;
mod model_base;
pub mod optimizer;
mod parameter;
mod record;

pub use activation::Activation;
pub use criterion::{LossOutput, MseMaeLoss};
pub use error::ModelError;
pub use init::Init;
pub use layer::{Conv2d, Dropout, Flatten, Layer, Linear, MaxPool2d, TraitLayer};
pub use model_base::{ModelBase, ModelBaseConfig, OptScheme};
pub use optimizer::{Adam, Optimizer, SGD, Updates};
pub use parameter::{ParamKind, Parameter};
pub use record::{ColorAxis, Record, RecordValue};

#[cfg(test)]
mod tests;
