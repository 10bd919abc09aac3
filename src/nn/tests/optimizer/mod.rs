/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 优化器模块单元测试
 *
 * 测试按功能分组：
 * - sgd: SGD 优化器测试
 * - adam: Adam 优化器测试
 * - trait_tests: Optimizer trait 通用行为测试
 */

mod adam;
mod sgd;
mod trait_tests;

use crate::nn::{ParamKind, Parameter};
use crate::tensor::Tensor;

/// 构造一个带梯度的参数
fn param_with_grad(name: &str, value: &[f32], grad: &[f32]) -> Parameter {
    let shape = [value.len()];
    let mut param = Parameter::new(name, ParamKind::Weight, Tensor::new(value, &shape));
    param.accumulate_grad(&Tensor::new(grad, &shape)).unwrap();
    param
}
