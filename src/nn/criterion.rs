/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 回归损失：MSE 与 MAE 之和
 *
 *   loss = mean((p - y)^2) + mean(|p - y|)
 *   dloss/dp_i = (2 (p_i - y_i) + sign(p_i - y_i)) / n
 */

use super::ModelError;
use crate::tensor::Tensor;

/// 一次损失计算的结果
#[derive(Debug, Clone)]
pub struct LossOutput {
    /// mse + mae
    pub value: f32,
    pub mse: f32,
    pub mae: f32,
    /// 对预测值的梯度，形状与预测值一致
    pub grad: Tensor,
}

/// MSE + MAE 组合损失
///
/// # 使用示例
/// ```ignore
/// let out = MseMaeLoss::new().forward(&pred, &target)?;
/// let cost = model.add_all_losses_with_weight(&[out.value, l2], &[wl, wr])?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MseMaeLoss;

impl MseMaeLoss {
    pub fn new() -> Self {
        Self
    }

    /// 计算损失，`pred`与`target`的元素个数必须一致（形状可不同，如[n]与[n, 1]）
    pub fn forward(&self, pred: &Tensor, target: &Tensor) -> Result<LossOutput, ModelError> {
        if pred.size() != target.size() || pred.size() == 0 {
            return Err(ModelError::ShapeMismatch {
                expected: target.shape().to_vec(),
                got: pred.shape().to_vec(),
                message: "预测值与真值的元素个数须一致且不为0".to_string(),
            });
        }
        let n = pred.size() as f32;
        let diff: Vec<f32> = pred
            .to_vec()
            .into_iter()
            .zip(target.to_vec())
            .map(|(p, y)| p - y)
            .collect();

        let mse = diff.iter().map(|d| d * d).sum::<f32>() / n;
        let mae = diff.iter().map(|d| d.abs()).sum::<f32>() / n;
        // sign(0) 取 0，与次梯度约定一致
        let grad_data = diff
            .iter()
            .map(|&d| {
                let sign = if d > 0. {
                    1.
                } else if d < 0. {
                    -1.
                } else {
                    0.
                };
                (2. * d + sign) / n
            })
            .collect();

        Ok(LossOutput {
            value: mse + mae,
            mse,
            mae,
            grad: Tensor::try_new(grad_data, pred.shape())?,
        })
    }
}
