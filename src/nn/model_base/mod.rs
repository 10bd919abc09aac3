/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : 模型基类：按名字分组管理各层，负责形状推导、参数统计、
 *                 L2 正则、损失加权、按层组生成更新规则以及参数的保存/加载
 */

mod config;

pub use config::{ModelBaseConfig, OptScheme};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::layer::{Layer, TraitLayer};
use super::optimizer::{Optimizer, Updates};
use super::{ModelError, Parameter};
use crate::tensor::Tensor;

/// 模型基类
///
/// # 使用示例
/// ```ignore
/// let mut base = ModelBase::new(ModelBaseConfig::default())?;
/// base.add_group("feat");
/// let conv = Conv2d::new(base.input_shape(), 64, (5, 5), "feat/conv1", Activation::Relu, base.rng_mut())?;
/// base.push_layer("feat", conv)?;
/// let out_shape = base.out_shape("feat")?;
/// ```
#[derive(Debug)]
pub struct ModelBase {
    config: ModelBaseConfig,
    input_shape: Vec<usize>,
    /// 按声明顺序排列的 (组名, 层列表)
    groups: Vec<(String, Vec<Layer>)>,
    optimizer: Box<dyn Optimizer>,
    rng: StdRng,
}

impl ModelBase {
    pub fn new(config: ModelBaseConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            input_shape: config.input_shape(),
            optimizer: config.build_optimizer(),
            config,
            groups: Vec::new(),
            rng,
        })
    }

    pub fn config(&self) -> &ModelBaseConfig {
        &self.config
    }

    /// 参数初始化用的随机数生成器
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 为需要独立随机源的层（如 dropout）派生种子
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// 单个 patch 的输入形状 [C, H, W]
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓层组管理↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 新增一个空层组；同名组已存在时清空它
    pub fn add_group(&mut self, key: &str) {
        match self.groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, layers)) => layers.clear(),
            None => self.groups.push((key.to_string(), Vec::new())),
        }
    }

    /// 在层组末尾追加一层，其输入形状须与组内上一层的输出形状一致
    pub fn push_layer(&mut self, key: &str, layer: impl Into<Layer>) -> Result<(), ModelError> {
        let layer = layer.into();
        let layers = self.group_mut(key)?;
        if let Some(last) = layers.last() {
            if last.output_shape() != layer.input_shape() {
                return Err(ModelError::ShapeMismatch {
                    expected: last.output_shape().to_vec(),
                    got: layer.input_shape().to_vec(),
                    message: format!(
                        "层`{}`的输入形状与上一层`{}`的输出形状不符",
                        layer.name(),
                        last.name()
                    ),
                });
            }
        }
        layers.push(layer);
        Ok(())
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn has_group(&self, key: &str) -> bool {
        self.groups.iter().any(|(k, _)| k == key)
    }

    pub fn layers(&self, key: &str) -> Result<&[Layer], ModelError> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, layers)| layers.as_slice())
            .ok_or_else(|| ModelError::UnknownLayerGroup(key.to_string()))
    }

    fn group_mut(&mut self, key: &str) -> Result<&mut Vec<Layer>, ModelError> {
        self.groups
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, layers)| layers)
            .ok_or_else(|| ModelError::UnknownLayerGroup(key.to_string()))
    }

    /// 层组的单样本输出形状，即组内最后一层的输出形状
    pub fn out_shape(&self, key: &str) -> Result<Vec<usize>, ModelError> {
        self.layers(key)?
            .last()
            .map(|l| l.output_shape().to_vec())
            .ok_or_else(|| ModelError::InvalidOperation(format!("层组`{key}`中还没有任何层")))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑层组管理↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓前向/反向↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 依次经过层组内所有层
    pub fn forward_group(&mut self, x: &Tensor, key: &str) -> Result<Tensor, ModelError> {
        let mut out = x.clone();
        for layer in self.group_mut(key)?.iter_mut() {
            out = layer.forward(&out)?;
        }
        Ok(out)
    }

    /// 逆序经过层组内所有层的反向传播，返回对该组输入的梯度
    pub fn backward_group(&mut self, upstream_grad: &Tensor, key: &str) -> Result<Tensor, ModelError> {
        let mut grad = upstream_grad.clone();
        for layer in self.group_mut(key)?.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }
        Ok(grad)
    }

    /// 清空所有参数的梯度
    pub fn zero_grad(&mut self) {
        for (_, layers) in self.groups.iter_mut() {
            for layer in layers.iter_mut() {
                layer.parameters_mut().into_iter().for_each(Parameter::zero_grad);
            }
        }
    }

    /// 切换所有 dropout 层的训练/推理行为
    pub fn set_dropout_on(&mut self, training: bool) {
        for (_, layers) in self.groups.iter_mut() {
            for layer in layers.iter_mut() {
                layer.set_training(training);
            }
        }
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑前向/反向↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓参数↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 指定层组内的所有参数（按声明顺序）
    pub fn params<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<&Parameter>, ModelError> {
        let mut params = Vec::new();
        for key in keys {
            for layer in self.layers(key.as_ref())? {
                params.extend(layer.parameters());
            }
        }
        Ok(params)
    }

    pub fn param_names<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<String>, ModelError> {
        Ok(self
            .params(keys)?
            .into_iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    fn all_params(&self) -> impl Iterator<Item = &Parameter> {
        self.groups
            .iter()
            .flat_map(|(_, layers)| layers.iter())
            .flat_map(|layer| layer.parameters())
    }

    fn all_params_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.groups
            .iter_mut()
            .flat_map(|(_, layers)| layers.iter_mut())
            .flat_map(|layer| layer.parameters_mut())
    }

    /// 模型参数总数
    pub fn num_params(&self) -> usize {
        self.all_params().map(Parameter::size).sum()
    }

    /// 按层组记录参数数量
    pub fn show_num_params(&self) {
        for (key, layers) in &self.groups {
            let n: usize = layers
                .iter()
                .flat_map(|l| l.parameters())
                .map(Parameter::size)
                .sum();
            log::info!(" - 层组`{key}`: {} 层, {n} 个参数", layers.len());
        }
        log::info!(" - 参数总数: {}", self.num_params());
    }

    /// 指定层组内所有权重的平方和（偏置不参与）
    pub fn l2_regularization<S: AsRef<str>>(&self, keys: &[S]) -> Result<f32, ModelError> {
        Ok(self
            .params(keys)?
            .into_iter()
            .filter(|p| p.is_weight())
            .map(|p| p.value().sum_squares())
            .sum())
    }

    /// 把 `weight * Σ‖W‖²` 的梯度 `2 * weight * W` 累加到指定层组的权重上
    pub fn add_l2_grad<S: AsRef<str>>(&mut self, keys: &[S], weight: f32) -> Result<(), ModelError> {
        for key in keys {
            for layer in self.group_mut(key.as_ref())?.iter_mut() {
                for param in layer.parameters_mut() {
                    if param.is_weight() {
                        let grad = param.value() * (2. * weight);
                        param.accumulate_grad(&grad)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// 各项损失按权重求和
    pub fn add_all_losses_with_weight(losses: &[f32], weights: &[f32]) -> Result<f32, ModelError> {
        if losses.len() != weights.len() {
            return Err(ModelError::InvalidOperation(format!(
                "损失项个数({})与权重个数({})不一致",
                losses.len(),
                weights.len()
            )));
        }
        Ok(losses.iter().zip(weights).map(|(l, w)| l * w).sum())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑参数↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓优化器↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    pub fn optimizer_mut(&mut self) -> &mut dyn Optimizer {
        self.optimizer.as_mut()
    }

    /// 仅针对指定层组的参数，用其当前梯度生成更新规则。重复的层组只计一次
    pub fn get_updates<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<Updates, ModelError> {
        let mut params = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for key in keys {
            if seen.contains(&key.as_ref()) {
                continue;
            }
            seen.push(key.as_ref());
            let layers = self
                .groups
                .iter()
                .find(|(k, _)| k == key.as_ref())
                .map(|(_, layers)| layers)
                .ok_or_else(|| ModelError::UnknownLayerGroup(key.as_ref().to_string()))?;
            params.extend(layers.iter().flat_map(|l| l.parameters()));
        }
        Ok(self.optimizer.updates(&params))
    }

    /// 把更新规则写回参数。更新中的每个参数名都必须存在
    pub fn apply_updates(&mut self, updates: &Updates) -> Result<(), ModelError> {
        for (name, value) in updates.iter() {
            let param = self
                .all_params_mut()
                .find(|p| p.name() == name)
                .ok_or_else(|| ModelError::InvalidOperation(format!("模型中没有参数`{name}`")))?;
            param.set_value(value)?;
        }
        Ok(())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑优化器↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 把展平的 patch 批次 [N, C*H*W] 变形为 [N, C, H, W]；已是4维的输入校验后原样返回
    pub fn image_vec_to_tensor(&self, x: &Tensor) -> Result<Tensor, ModelError> {
        let shape = x.shape();
        let per_patch: usize = self.input_shape.iter().product();
        match shape.len() {
            2 if shape[1] == per_patch => {
                let mut full = vec![shape[0]];
                full.extend_from_slice(&self.input_shape);
                Ok(x.reshape(&full)?)
            }
            4 if &shape[1..] == self.input_shape.as_slice() => Ok(x.clone()),
            _ => {
                let mut expected = vec![0];
                expected.extend_from_slice(&self.input_shape);
                Err(ModelError::ShapeMismatch {
                    expected,
                    got: shape.to_vec(),
                    message: format!("patch 批次须为 [N, {per_patch}] 或 [N, C, H, W]"),
                })
            }
        }
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓保存/加载↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 以 (参数名, 值) 列表的形式写入二进制文件
    pub fn save_params(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let snapshot: Vec<(String, Tensor)> = self
            .all_params()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect();
        let writer = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(writer, &snapshot)?;
        log::info!("已保存 {} 个参数到 {}", snapshot.len(), path.as_ref().display());
        Ok(())
    }

    /// 从`save_params`写出的文件加载参数。文件中的参数名与形状必须与模型完全一致
    pub fn load_params(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let snapshot: Vec<(String, Tensor)> = bincode::deserialize_from(reader)?;
        let expected = self.all_params().count();
        if snapshot.len() != expected {
            return Err(ModelError::InvalidOperation(format!(
                "参数文件含 {} 个参数，模型需要 {expected} 个",
                snapshot.len()
            )));
        }
        for (name, value) in &snapshot {
            let param = self
                .all_params_mut()
                .find(|p| p.name() == name)
                .ok_or_else(|| ModelError::InvalidOperation(format!("模型中没有参数`{name}`")))?;
            param.set_value(value)?;
        }
        log::info!("已从 {} 加载 {expected} 个参数", path.as_ref().display());
        Ok(())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑保存/加载↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}
