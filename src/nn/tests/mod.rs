mod layer_conv2d;
mod optimizer; // 优化器测试模块（包含 sgd, adam, trait_tests 子模块）
mod record;

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::nn::{Parameter, TraitLayer};
use crate::tensor::Tensor;

/// 依次给层的参数（权重、偏置）赋值
fn set_params(layer: &mut impl TraitLayer, values: &[&Tensor]) {
    let mut params = layer.parameters_mut();
    assert_eq!(params.len(), values.len());
    for (param, value) in params.iter_mut().zip(values) {
        param.set_value(value).unwrap();
    }
}

fn param_by_suffix<'a>(layer: &'a impl TraitLayer, suffix: &str) -> &'a Parameter {
    layer
        .parameters()
        .into_iter()
        .find(|p| p.name().ends_with(suffix))
        .unwrap()
}

/// 以 L = Σ(y ⊙ r) 为目标，用中心差分检验层对输入的梯度。
/// 只适用于在`x`附近光滑的层（线性激活的卷积、全连接等）
fn check_input_grad(layer: &mut impl TraitLayer, x: &Tensor, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let y = layer.forward(x).unwrap();
    let r = Tensor::new_uniform(-1., 1., y.shape(), &mut rng);
    let grad_x = layer.backward(&r).unwrap().to_vec();

    let eps = 1e-2;
    let mut data = x.to_vec();
    for i in 0..data.len() {
        let origin = data[i];
        data[i] = origin + eps;
        let l_plus = (&layer.forward(&Tensor::new(&data, x.shape())).unwrap() * &r).sum();
        data[i] = origin - eps;
        let l_minus = (&layer.forward(&Tensor::new(&data, x.shape())).unwrap() * &r).sum();
        data[i] = origin;

        let numeric = (l_plus - l_minus) / (2. * eps);
        assert_abs_diff_eq!(grad_x[i], numeric, epsilon = 1e-2);
    }
}

/// 同上，检验层对第`param_idx`个参数的梯度
fn check_param_grad(layer: &mut impl TraitLayer, x: &Tensor, param_idx: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    layer.parameters_mut().into_iter().for_each(Parameter::zero_grad);
    let y = layer.forward(x).unwrap();
    let r = Tensor::new_uniform(-1., 1., y.shape(), &mut rng);
    layer.backward(&r).unwrap();

    let (shape, mut data, analytic) = {
        let params = layer.parameters();
        let param = params[param_idx];
        (param.value().shape().to_vec(), param.value().to_vec(), param.grad().to_vec())
    };

    let eps = 1e-2;
    for i in 0..data.len() {
        let origin = data[i];
        data[i] = origin + eps;
        layer.parameters_mut()[param_idx].set_value(&Tensor::new(&data, &shape)).unwrap();
        let l_plus = (&layer.forward(x).unwrap() * &r).sum();
        data[i] = origin - eps;
        layer.parameters_mut()[param_idx].set_value(&Tensor::new(&data, &shape)).unwrap();
        let l_minus = (&layer.forward(x).unwrap() * &r).sum();
        data[i] = origin;
        layer.parameters_mut()[param_idx].set_value(&Tensor::new(&data, &shape)).unwrap();

        let numeric = (l_plus - l_minus) / (2. * eps);
        assert_abs_diff_eq!(analytic[i], numeric, epsilon = 1e-2);
    }
}
