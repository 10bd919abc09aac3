/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : SGD 优化器测试
 */

use approx::assert_abs_diff_eq;

use super::param_with_grad;
use crate::nn::optimizer::{Optimizer, SGD};

#[test]
fn test_sgd_update_formula() {
    // θ = θ - α * ∇θ
    let param = param_with_grad("w", &[1.0, -2.0], &[0.5, -1.0]);
    let mut sgd = SGD::new(0.1);
    let updates = sgd.updates(&[&param]);

    assert_eq!(updates.len(), 1);
    let new_value = updates.get("w").unwrap().to_vec();
    assert_abs_diff_eq!(new_value[0], 0.95, epsilon = 1e-6);
    assert_abs_diff_eq!(new_value[1], -1.9, epsilon = 1e-6);
    // 只生成更新规则，不修改参数本身
    assert_eq!(param.value().to_vec(), vec![1.0, -2.0]);
}

#[test]
fn test_sgd_momentum() {
    // v = μ * v - α * ∇θ，θ = θ + v
    let param = param_with_grad("w", &[1.0], &[1.0]);
    let mut sgd = SGD::with_momentum(0.1, 0.9);
    assert_eq!(sgd.momentum(), 0.9);

    // 第1步：v = -0.1，θ = 0.9
    let first = sgd.updates(&[&param]);
    assert_abs_diff_eq!(first.get("w").unwrap().to_vec()[0], 0.9, epsilon = 1e-6);
    // 第2步（参数值未写回，梯度相同）：v = 0.9 * -0.1 - 0.1 = -0.19
    let second = sgd.updates(&[&param]);
    assert_abs_diff_eq!(second.get("w").unwrap().to_vec()[0], 0.81, epsilon = 1e-6);

    sgd.reset();
    let after_reset = sgd.updates(&[&param]);
    assert_abs_diff_eq!(after_reset.get("w").unwrap().to_vec()[0], 0.9, epsilon = 1e-6);
}
