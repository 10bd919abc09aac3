/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : Adam 优化器测试
 */

use approx::assert_abs_diff_eq;

use super::param_with_grad;
use crate::nn::optimizer::{Adam, Optimizer};

#[test]
fn test_adam_creation() {
    let adam = Adam::new(0.001, 0.9, 0.999, 1e-8);
    assert_eq!(adam.learning_rate(), 0.001);

    let adam_default = Adam::new_default(0.001);
    assert_eq!(adam_default.learning_rate(), 0.001);
}

#[test]
fn test_adam_update() {
    // w=2, grad=3, lr=0.1:
    //   m_1 = 0.1 * 3 = 0.3
    //   v_1 = 0.001 * 9 = 0.009
    //   m_hat = 0.3 / (1-0.9) = 3.0
    //   v_hat = 0.009 / (1-0.999) = 9.0
    //   update = 0.1 * 3.0 / (sqrt(9.0) + 1e-8) ≈ 0.1
    // PyTorch验证: w_new = 1.899999976158142
    let param = param_with_grad("w", &[2.0], &[3.0]);
    let mut adam = Adam::new_default(0.1);
    let updates = adam.updates(&[&param]);
    assert_abs_diff_eq!(updates.get("w").unwrap().to_vec()[0], 1.9, epsilon = 1e-5);
}

#[test]
fn test_adam_first_step_is_lr_times_sign() {
    // 第一步的偏差修正后 |update| ≈ lr，与梯度大小无关
    let param = param_with_grad("w", &[0., 0., 0.], &[100., -0.01, 5.]);
    let mut adam = Adam::new_default(0.01);
    let new_value = adam.updates(&[&param]).get("w").unwrap().to_vec();
    assert_abs_diff_eq!(new_value[0], -0.01, epsilon = 1e-5);
    assert_abs_diff_eq!(new_value[1], 0.01, epsilon = 1e-5);
    assert_abs_diff_eq!(new_value[2], -0.01, epsilon = 1e-5);
}

#[test]
fn test_adam_timestep_is_per_parameter() {
    let shared = param_with_grad("feat/conv1_W", &[1.0], &[0.5]);
    let head = param_with_grad("reg_mos/fc2_W", &[1.0], &[0.5]);
    let mut adam = Adam::new_default(0.1);

    // 共享参数先被更新两次
    adam.updates(&[&shared]);
    adam.updates(&[&shared]);
    // 回归头第一次被更新时，其偏差修正仍按 t=1 计算
    let updates = adam.updates(&[&shared, &head]);
    assert_abs_diff_eq!(updates.get("reg_mos/fc2_W").unwrap().to_vec()[0], 0.9, epsilon = 1e-5);
    assert_eq!(updates.names().collect::<Vec<_>>(), vec!["feat/conv1_W", "reg_mos/fc2_W"]);
}

#[test]
fn test_adam_reset() {
    let param = param_with_grad("w", &[2.0], &[3.0]);
    let mut adam = Adam::new_default(0.1);
    let first = adam.updates(&[&param]);
    adam.updates(&[&param]);
    adam.reset();
    assert_eq!(adam.updates(&[&param]), first);
}
