/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : Conv2d 层单元测试（Batch-First，含 PyTorch 数值对照）
 */

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{check_input_grad, check_param_grad, param_by_suffix, set_params};
use crate::assert_err;
use crate::nn::{Activation, Conv2d, ModelError, TraitLayer};
use crate::tensor::Tensor;

// ==================== PyTorch 参考常量 ====================

// 简单前向传播 (batch=1, C_in=1, H=4, W=4, C_out=2, kernel=2x2)
#[rustfmt::skip]
const PYTORCH_FWD_X: &[f32] = &[
    1.0, 2.0, 3.0, 4.0,
    5.0, 6.0, 7.0, 8.0,
    9.0, 10.0, 11.0, 12.0,
    13.0, 14.0, 15.0, 16.0,
];
#[rustfmt::skip]
const PYTORCH_FWD_KERNEL: &[f32] = &[
    1.0, 0.0, 0.0, 1.0,  // filter 0: 对角线
    0.0, 1.0, 1.0, 0.0,  // filter 1: 反对角线
];
const PYTORCH_FWD_BIAS: &[f32] = &[0.5, -0.5];
#[rustfmt::skip]
const PYTORCH_FWD_OUTPUT: &[f32] = &[
    7.5, 9.5, 11.5,
    15.5, 17.5, 19.5,
    23.5, 25.5, 27.5,
    6.5, 8.5, 10.5,
    14.5, 16.5, 18.5,
    22.5, 24.5, 26.5,
];

// 反向传播梯度 (batch=1, C_in=1, H=3, W=3, C_out=1, kernel=2x2) + MSE
#[rustfmt::skip]
const PYTORCH_BWD_X: &[f32] = &[
    1.0, 2.0, 3.0,
    4.0, 5.0, 6.0,
    7.0, 8.0, 9.0,
];
const PYTORCH_BWD_KERNEL: &[f32] = &[0.1, 0.2, 0.3, 0.4];
const PYTORCH_BWD_BIAS: &[f32] = &[0.5];
const PYTORCH_BWD_TARGET: &[f32] = &[5.0, 6.0, 8.0, 9.0];
const PYTORCH_BWD_OUTPUT: &[f32] = &[4.2, 5.2, 7.2, 8.2];
const PYTORCH_BWD_GRAD_KERNEL: &[f32] = &[-4.8, -6.4, -9.6, -11.2];
const PYTORCH_BWD_GRAD_BIAS: &[f32] = &[-1.6];

fn new_conv(input_shape: &[usize], num_filts: usize, filt_size: (usize, usize), activation: Activation) -> Conv2d {
    let mut rng = StdRng::seed_from_u64(42);
    Conv2d::new(input_shape, num_filts, filt_size, "feat/conv", activation, &mut rng).unwrap()
}

// ==================== 基本属性 ====================

#[test]
fn test_conv2d_creation() {
    let conv = new_conv(&[1, 32, 32], 64, (5, 5), Activation::Relu);
    assert_eq!(conv.name(), "feat/conv");
    assert_eq!(conv.input_shape(), &[1, 32, 32]);
    assert_eq!(conv.output_shape(), &[64, 28, 28]);
    assert_eq!(conv.weight().name(), "feat/conv_W");
    assert_eq!(conv.weight().value().shape(), &[64, 1, 5, 5]);
    assert!(conv.weight().is_weight());
    assert_eq!(conv.bias().name(), "feat/conv_b");
    assert_eq!(conv.bias().value(), &Tensor::zeros(&[64]));
    assert!(!conv.bias().is_weight());

    // Glorot 均匀分布的边界
    let bound = (6.0f32 / (25 + 64 * 25) as f32).sqrt();
    assert!(conv.weight().value().max_value() <= bound);
    assert!(conv.weight().value().min_value() >= -bound);
}

#[test]
fn test_conv2d_output_size() {
    assert_eq!(Conv2d::infer_output_shape(&[64, 14, 14], 64, (5, 5)).unwrap(), vec![64, 10, 10]);
    assert_eq!(Conv2d::infer_output_shape(&[3, 8, 6], 4, (3, 2)).unwrap(), vec![4, 6, 5]);
    assert_err!(
        Conv2d::infer_output_shape(&[1, 4, 4], 2, (5, 5)),
        ModelError::InvalidOperation(_)
    );
    assert_err!(
        Conv2d::infer_output_shape(&[4, 4], 2, (2, 2)),
        ModelError::ShapeMismatch { .. }
    );
}

// ==================== PyTorch 数值对照 ====================

#[test]
fn test_conv2d_forward_pytorch_comparison() {
    let mut conv = new_conv(&[1, 4, 4], 2, (2, 2), Activation::Linear);
    set_params(
        &mut conv,
        &[&Tensor::new(PYTORCH_FWD_KERNEL, &[2, 1, 2, 2]), &Tensor::new(PYTORCH_FWD_BIAS, &[2])],
    );

    let output = conv.forward(&Tensor::new(PYTORCH_FWD_X, &[1, 1, 4, 4])).unwrap();
    assert_eq!(output.shape(), &[1, 2, 3, 3]);
    for (actual, expected) in output.to_vec().iter().zip(PYTORCH_FWD_OUTPUT) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-5);
    }
}

#[test]
fn test_conv2d_backward_pytorch_comparison() {
    let mut conv = new_conv(&[1, 3, 3], 1, (2, 2), Activation::Linear);
    set_params(
        &mut conv,
        &[&Tensor::new(PYTORCH_BWD_KERNEL, &[1, 1, 2, 2]), &Tensor::new(PYTORCH_BWD_BIAS, &[1])],
    );

    let output = conv.forward(&Tensor::new(PYTORCH_BWD_X, &[1, 1, 3, 3])).unwrap();
    for (actual, expected) in output.to_vec().iter().zip(PYTORCH_BWD_OUTPUT) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-5);
    }

    // MSE 对输出的梯度：2 * (y - t) / n
    let target = Tensor::new(PYTORCH_BWD_TARGET, &[1, 1, 2, 2]);
    let upstream = &(&output - &target) * (2. / 4.);
    let grad_x = conv.backward(&upstream).unwrap();

    for (actual, expected) in conv.weight().grad().to_vec().iter().zip(PYTORCH_BWD_GRAD_KERNEL) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-4);
    }
    assert_abs_diff_eq!(conv.bias().grad().to_vec()[0], PYTORCH_BWD_GRAD_BIAS[0], epsilon = 1e-4);

    // 中心像素被4个窗口覆盖：-0.4 * (0.1 + 0.2 + 0.3 + 0.4)
    assert_eq!(grad_x.shape(), &[1, 1, 3, 3]);
    assert_abs_diff_eq!(grad_x.to_vec()[4], -0.4, epsilon = 1e-5);
    assert_abs_diff_eq!(grad_x.to_vec()[0], -0.04, epsilon = 1e-5);
}

// ==================== 梯度数值检验 ====================

#[test]
fn test_conv2d_gradient_check_multi_channel_batch() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut conv = new_conv(&[2, 5, 4], 3, (3, 2), Activation::Linear);
    let x = Tensor::new_uniform(-1., 1., &[2, 2, 5, 4], &mut rng);

    check_input_grad(&mut conv, &x, 1);
    check_param_grad(&mut conv, &x, 0, 2);
    check_param_grad(&mut conv, &x, 1, 3);
}

#[test]
fn test_conv2d_grad_accumulates_over_batch() {
    let mut conv = new_conv(&[1, 3, 3], 1, (2, 2), Activation::Linear);
    let one = Tensor::new(PYTORCH_BWD_X, &[1, 1, 3, 3]);
    let two = Tensor::concat_axis0(&[one.clone(), one.clone()]).unwrap();

    conv.forward(&one).unwrap();
    conv.backward(&Tensor::ones(&[1, 1, 2, 2])).unwrap();
    let single = conv.weight().grad().clone();

    conv.parameters_mut().into_iter().for_each(|p| p.zero_grad());
    conv.forward(&two).unwrap();
    conv.backward(&Tensor::ones(&[2, 1, 2, 2])).unwrap();
    assert_eq!(conv.weight().grad(), &(&single * 2.));
    assert_eq!(param_by_suffix(&conv, "_b").grad().to_vec(), vec![8.]);
}

#[test]
fn test_conv2d_relu_blocks_negative_gradient() {
    let mut conv = new_conv(&[1, 2, 2], 1, (1, 1), Activation::Relu);
    set_params(&mut conv, &[&Tensor::new(&[1.], &[1, 1, 1, 1]), &Tensor::new(&[0.], &[1])]);

    let y = conv.forward(&Tensor::new(&[-1., 2., -3., 4.], &[1, 1, 2, 2])).unwrap();
    assert_eq!(y.to_vec(), vec![0., 2., 0., 4.]);
    let grad_x = conv.backward(&Tensor::ones(&[1, 1, 2, 2])).unwrap();
    assert_eq!(grad_x.to_vec(), vec![0., 1., 0., 1.]);
}

// ==================== 错误处理 ====================

#[test]
fn test_conv2d_wrong_input_shape() {
    let mut conv = new_conv(&[1, 4, 4], 2, (2, 2), Activation::Linear);
    assert_err!(
        conv.forward(&Tensor::zeros(&[1, 1, 5, 4])),
        ModelError::ShapeMismatch { expected, .. } if expected == &[0, 1, 4, 4]
    );
    assert_err!(conv.forward(&Tensor::zeros(&[1, 4, 4])), ModelError::ShapeMismatch { .. });
}

#[test]
fn test_conv2d_backward_before_forward() {
    let mut conv = new_conv(&[1, 4, 4], 2, (2, 2), Activation::Linear);
    assert_err!(conv.backward(&Tensor::zeros(&[1, 2, 3, 3])), ModelError::InvalidOperation(_));
}
