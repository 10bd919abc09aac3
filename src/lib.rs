//! # BIECON
//!
//! `biecon`用纯rust实现无参考图像质量评价（NR-IQA）网络
//! [BIECON](https://ieeexplore.ieee.org/document/7782419)：
//! 先让卷积网络在 patch 上回归全参考指标给出的局部分数，再在共享特征上
//! 逐图像聚合 patch 特征，回归主观评分（MOS）。
//!
//! - [`tensor`]: 基于 ndarray 的稠密张量
//! - [`nn`]: 层库、损失、优化器与模型基类
//! - [`models`]: BIECON 模型
//! - [`data`]: 图像切分与 patch-图像索引集
//!

pub mod data;
pub mod errors;
pub mod models;
pub mod nn;
pub mod tensor;
pub mod utils;
