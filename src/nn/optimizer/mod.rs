/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 优化器模块。优化器只负责由梯度生成更新规则（`Updates`），
 *                 何时把更新写回参数由模型决定
 */

mod adam;
mod base;
mod sgd;

pub use adam::Adam;
pub use base::{Optimizer, Updates};
pub use sgd::SGD;
