/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 优化器基础trait和更新规则集合
 */

use std::fmt::Debug;

use crate::nn::Parameter;
use crate::tensor::Tensor;

/// 优化器核心 trait
///
/// 训练循环：
/// ```ignore
/// model.zero_grad();
/// // forward + backward，梯度累加在各参数上
/// let updates = optimizer.updates(&params);   // ← 只生成更新规则
/// model.apply_updates(&updates)?;             // ← 写回参数
/// ```
pub trait Optimizer: Debug {
    /// 根据参数当前值与累积梯度生成更新规则。
    /// 优化器自身的状态（动量、矩估计等）在此推进一步
    fn updates(&mut self, params: &[&Parameter]) -> Updates;

    /// 重置累积状态
    fn reset(&mut self);

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, lr: f32);
}

/// 更新规则：按顺序排列的 (参数名, 新值)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Updates {
    entries: Vec<(String, Tensor)>,
}

impl Updates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, new_value: Tensor) {
        self.entries.push((name.to_string(), new_value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}
