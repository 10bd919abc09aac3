/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : Conv2d (2D 卷积) 层，valid 模式、步长为1
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, num_filts, H - kH + 1, W - kW + 1]
 *
 * 计算：output = act(conv2d(x, W) + b)
 * 使用 Rayon 在 batch 维度并行
 */

use rand::rngs::StdRng;
use rayon::prelude::*;

use super::{TraitLayer, check_batch_shape, missing_cache};
use crate::nn::{Activation, Init, ModelError, ParamKind, Parameter};
use crate::tensor::Tensor;

/// Conv2d (2D 卷积) 层
///
/// # 使用示例
/// ```ignore
/// let conv = Conv2d::new(&[1, 32, 32], 64, (5, 5), "feat/conv1", Activation::Relu, &mut rng)?;
/// assert_eq!(conv.output_shape(), &[64, 28, 28]);
/// ```
#[derive(Debug, Clone)]
pub struct Conv2d {
    name: String,
    /// 卷积核参数 [num_filts, in_channels, kH, kW]
    weight: Parameter,
    /// 偏置参数 [num_filts]
    bias: Parameter,
    activation: Activation,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    // 缓存（用于反向传播）
    input_cache: Option<Tensor>,
    output_cache: Option<Tensor>,
}

impl Conv2d {
    /// 创建新的 Conv2d 层
    ///
    /// # 参数
    /// - `input_shape`: 单样本输入形状 [C_in, H, W]
    /// - `num_filts`: 卷积核个数（输出通道数）
    /// - `filt_size`: 卷积核大小 (kH, kW)
    /// - `name`: 层名称，形如`feat/conv1`
    /// - `activation`: 输出激活
    /// - `rng`: 用于初始化卷积核的随机数生成器
    pub fn new(
        input_shape: &[usize],
        num_filts: usize,
        filt_size: (usize, usize),
        name: &str,
        activation: Activation,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        let output_shape = Self::infer_output_shape(input_shape, num_filts, filt_size)?;
        let (k_h, k_w) = filt_size;
        let in_channels = input_shape[0];

        let fan_in = in_channels * k_h * k_w;
        let fan_out = num_filts * k_h * k_w;
        let weight = Parameter::new(
            &format!("{name}_W"),
            ParamKind::Weight,
            Init::GlorotUniform { fan_in, fan_out }.generate(
                &[num_filts, in_channels, k_h, k_w],
                rng,
            ),
        );
        let bias = Parameter::new(
            &format!("{name}_b"),
            ParamKind::Bias,
            Init::Zeros.generate(&[num_filts], rng),
        );

        Ok(Self {
            name: name.to_string(),
            weight,
            bias,
            activation,
            input_shape: input_shape.to_vec(),
            output_shape,
            input_cache: None,
            output_cache: None,
        })
    }

    /// 由单样本输入形状 [C_in, H, W] 推导输出形状 [num_filts, H', W']
    pub fn infer_output_shape(
        input_shape: &[usize],
        num_filts: usize,
        filt_size: (usize, usize),
    ) -> Result<Vec<usize>, ModelError> {
        if input_shape.len() != 3 {
            return Err(ModelError::ShapeMismatch {
                expected: vec![0, 0, 0],
                got: input_shape.to_vec(),
                message: "Conv2d 的输入形状必须是 [C, H, W]".to_string(),
            });
        }
        let (in_h, in_w) = (input_shape[1], input_shape[2]);
        let (k_h, k_w) = filt_size;
        if k_h == 0 || k_w == 0 || k_h > in_h || k_w > in_w {
            return Err(ModelError::InvalidOperation(format!(
                "卷积输出尺寸无效：输入 {in_h}x{in_w}，核 {k_h}x{k_w}"
            )));
        }
        Ok(vec![num_filts, in_h - k_h + 1, in_w - k_w + 1])
    }

    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    pub fn bias(&self) -> &Parameter {
        &self.bias
    }

    fn kernel_dims(&self) -> (usize, usize, usize, usize) {
        let s = self.weight.value().shape();
        (s[0], s[1], s[2], s[3])
    }
}

impl TraitLayer for Conv2d {
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
        let batch_size = check_batch_shape(&self.name, &self.input_shape, x)?;
        let (out_c, in_c, k_h, k_w) = self.kernel_dims();
        let (in_h, in_w) = (self.input_shape[1], self.input_shape[2]);
        let (out_h, out_w) = (self.output_shape[1], self.output_shape[2]);

        let input = x.to_vec();
        let kernel = self.weight.value().to_vec();
        let bias = self.bias.value().to_vec();
        let in_sample = in_c * in_h * in_w;
        let out_sample = out_c * out_h * out_w;

        let batch_results: Vec<Vec<f32>> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let xs = &input[b * in_sample..(b + 1) * in_sample];
                let mut sample_out = vec![0.0f32; out_sample];
                for oc in 0..out_c {
                    for oh in 0..out_h {
                        for ow in 0..out_w {
                            let mut sum = bias[oc];
                            for ic in 0..in_c {
                                for kh in 0..k_h {
                                    let x_row = (ic * in_h + oh + kh) * in_w + ow;
                                    let k_row = ((oc * in_c + ic) * k_h + kh) * k_w;
                                    for kw in 0..k_w {
                                        sum += xs[x_row + kw] * kernel[k_row + kw];
                                    }
                                }
                            }
                            sample_out[(oc * out_h + oh) * out_w + ow] = sum;
                        }
                    }
                }
                sample_out
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        let pre_act = Tensor::try_new(all_data, &[batch_size, out_c, out_h, out_w])?;
        let output = self.activation.apply(&pre_act);

        self.input_cache = Some(x.clone());
        self.output_cache = Some(output.clone());
        Ok(output)
    }

    /// 对于 Y = conv(X, W) + b:
    /// - dL/dX: 转置卷积
    /// - dL/dW: 输入与上游梯度的相关运算，跨 batch 累加
    /// - dL/db: 上游梯度在 batch 与空间维度上求和
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
        let grad_z = self.activation.backward(output, upstream_grad).to_vec();
        let input_data = input.to_vec();
        let kernel = self.weight.value().to_vec();

        let batch_size = input.shape()[0];
        let (out_c, in_c, k_h, k_w) = self.kernel_dims();
        let (in_h, in_w) = (self.input_shape[1], self.input_shape[2]);
        let (out_h, out_w) = (self.output_shape[1], self.output_shape[2]);
        let in_sample = in_c * in_h * in_w;
        let out_sample = out_c * out_h * out_w;
        let kernel_size = kernel.len();

        // (dX 单样本, dW 单样本, db 单样本)
        let batch_results: Vec<(Vec<f32>, Vec<f32>, Vec<f32>)> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let xs = &input_data[b * in_sample..(b + 1) * in_sample];
                let gs = &grad_z[b * out_sample..(b + 1) * out_sample];
                let mut dx = vec![0.0f32; in_sample];
                let mut dw = vec![0.0f32; kernel_size];
                let mut db = vec![0.0f32; out_c];
                for oc in 0..out_c {
                    for oh in 0..out_h {
                        for ow in 0..out_w {
                            let g = gs[(oc * out_h + oh) * out_w + ow];
                            if g == 0. {
                                continue;
                            }
                            db[oc] += g;
                            for ic in 0..in_c {
                                for kh in 0..k_h {
                                    let x_row = (ic * in_h + oh + kh) * in_w + ow;
                                    let k_row = ((oc * in_c + ic) * k_h + kh) * k_w;
                                    for kw in 0..k_w {
                                        dx[x_row + kw] += g * kernel[k_row + kw];
                                        dw[k_row + kw] += g * xs[x_row + kw];
                                    }
                                }
                            }
                        }
                    }
                }
                (dx, dw, db)
            })
            .collect();

        // Reduce: 累加所有 batch 样本的参数梯度
        let mut grad_input = Vec::with_capacity(batch_size * in_sample);
        let mut grad_kernel = vec![0.0f32; kernel_size];
        let mut grad_bias = vec![0.0f32; out_c];
        for (dx, dw, db) in batch_results {
            grad_input.extend(dx);
            grad_kernel.iter_mut().zip(dw).for_each(|(acc, g)| *acc += g);
            grad_bias.iter_mut().zip(db).for_each(|(acc, g)| *acc += g);
        }

        self.weight
            .accumulate_grad(&Tensor::try_new(grad_kernel, &[out_c, in_c, k_h, k_w])?)?;
        self.bias
            .accumulate_grad(&Tensor::try_new(grad_bias, &[out_c])?)?;
        Ok(Tensor::try_new(grad_input, input.shape())?)
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weight, &mut self.bias]
    }
}
