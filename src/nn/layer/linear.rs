/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : Linear（全连接）层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, n_in]
 * - 输出：[batch_size, n_out]
 *
 * 计算：output = act(x @ W + b)，W 形状为 [n_in, n_out]
 */

use ndarray::{Axis, Ix1, Ix2};
use rand::rngs::StdRng;

use super::{TraitLayer, check_batch_shape, missing_cache};
use crate::nn::{Activation, Init, ModelError, ParamKind, Parameter};
use crate::tensor::Tensor;

/// Linear（全连接）层
///
/// # 使用示例
/// ```ignore
/// let fc = Linear::new(128, 1, "reg_loc/fc2", Activation::Linear, &mut rng)?
///     .with_bias_init(Init::Constant(0.5), &mut rng);
/// ```
#[derive(Debug, Clone)]
pub struct Linear {
    name: String,
    /// 权重参数 [n_in, n_out]
    weight: Parameter,
    /// 偏置参数 [n_out]
    bias: Parameter,
    activation: Activation,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    input_cache: Option<Tensor>,
    output_cache: Option<Tensor>,
}

impl Linear {
    /// 创建新的 Linear 层，权重 Glorot 均匀初始化，偏置置零
    pub fn new(
        n_in: usize,
        n_out: usize,
        name: &str,
        activation: Activation,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        if n_in == 0 || n_out == 0 {
            return Err(ModelError::InvalidOperation(format!(
                "Linear 层`{name}`的输入/输出维度不能为0（n_in={n_in}, n_out={n_out}）"
            )));
        }
        let weight = Parameter::new(
            &format!("{name}_W"),
            ParamKind::Weight,
            Init::GlorotUniform {
                fan_in: n_in,
                fan_out: n_out,
            }
            .generate(&[n_in, n_out], rng),
        );
        let bias = Parameter::new(
            &format!("{name}_b"),
            ParamKind::Bias,
            Init::Zeros.generate(&[n_out], rng),
        );
        Ok(Self {
            name: name.to_string(),
            weight,
            bias,
            activation,
            input_shape: vec![n_in],
            output_shape: vec![n_out],
            input_cache: None,
            output_cache: None,
        })
    }

    /// 用指定方式重新初始化偏置（如回归输出层的偏置初始为0.5）
    pub fn with_bias_init(mut self, init: Init, rng: &mut StdRng) -> Self {
        let shape = self.bias.value().shape().to_vec();
        self.bias = Parameter::new(self.bias.name(), ParamKind::Bias, init.generate(&shape, rng));
        self
    }

    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    pub fn bias(&self) -> &Parameter {
        &self.bias
    }
}

fn as_matrix(t: &Tensor, what: &str) -> Result<ndarray::Array2<f32>, ModelError> {
    t.as_array()
        .clone()
        .into_dimensionality::<Ix2>()
        .map_err(|_| ModelError::ShapeMismatch {
            expected: vec![0, 0],
            got: t.shape().to_vec(),
            message: format!("{what}必须是矩阵"),
        })
}

impl TraitLayer for Linear {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, ModelError> {
        check_batch_shape(&self.name, &self.input_shape, x)?;
        let x_mat = as_matrix(x, "Linear 的输入")?;
        let w = as_matrix(self.weight.value(), "Linear 的权重")?;
        let b = self
            .bias
            .value()
            .as_array()
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| ModelError::InvalidOperation(format!("层`{}`的偏置必须是向量", self.name)))?;

        let pre_act = Tensor::from_array((x_mat.dot(&w) + &b).into_dyn());
        let output = self.activation.apply(&pre_act);

        self.input_cache = Some(x.clone());
        self.output_cache = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, upstream_grad: &Tensor) -> Result<Tensor, ModelError> {
        let (input, output) = match (&self.input_cache, &self.output_cache) {
            (Some(i), Some(o)) => (i, o),
            _ => return Err(missing_cache(&self.name)),
        };
        if !upstream_grad.is_same_shape(output) {
            return Err(ModelError::ShapeMismatch {
                expected: output.shape().to_vec(),
                got: upstream_grad.shape().to_vec(),
                message: format!("层`{}`的上游梯度形状不符", self.name),
            });
        }
        let grad_z = as_matrix(&self.activation.backward(output, upstream_grad), "上游梯度")?;
        let x_mat = as_matrix(input, "Linear 的输入")?;
        let w = as_matrix(self.weight.value(), "Linear 的权重")?;

        let grad_w = x_mat.t().dot(&grad_z);
        let grad_b = grad_z.sum_axis(Axis(0));
        let grad_x = grad_z.dot(&w.t());

        self.weight
            .accumulate_grad(&Tensor::from_array(grad_w.into_dyn()))?;
        self.bias
            .accumulate_grad(&Tensor::from_array(grad_b.into_dyn()))?;
        Ok(Tensor::from_array(grad_x.into_dyn()))
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weight, &mut self.bias]
    }
}
