/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : BIECON 无参考图像质量评价模型
 *
 * 网络结构（以 32x32 单通道 patch 为例）：
 * ```text
 * feat:    conv1 (1→64, 5x5) → ReLU → [64, 28, 28] → max_pool 2x2 → [64, 14, 14]
 *          conv2 (64→64, 5x5) → ReLU → [64, 10, 10] → max_pool 2x2 → [64, 5, 5]
 *          flatten → [1600]
 * feat_fc: fc1 1024 → fc2 512 → fc3 256 → fc4 128（均 ReLU，前三层后可接 dropout）
 * reg_loc: (dropout) → fc1 128 ReLU → fc2 1（偏置初始 0.5）      每个 patch 一个局部分数
 * reg_mos: (dropout) → fc1 128 ReLU → fc2 1（偏置初始 0.5）      每幅图像一个 MOS
 * ```
 * 两个目标共享 feat/feat_fc，局部分数回归以 patch 为单位，
 * MOS 回归先把同一图像所有 patch 的特征取平均再回归
 */

mod config;

pub use config::BieconConfig;

use crate::data::PatchIndexSet;
use crate::nn::{
    Activation, ColorAxis, Conv2d, Dropout, Flatten, Init, Linear, LossOutput, MaxPool2d,
    ModelBase, ModelError, MseMaeLoss, Record, Updates,
};
use crate::tensor::Tensor;

/// 卷积特征提取层组
pub const FEAT: &str = "feat";
/// 共享全连接层组
pub const FEAT_FC: &str = "feat_fc";
/// 局部分数回归头
pub const REG_LOC: &str = "reg_loc";
/// MOS 回归头
pub const REG_MOS: &str = "reg_mos";

const DROPOUT_P: f32 = 0.5;
const SCORE_TILE: usize = 10;

/// 一次局部分数回归的前向结果
struct LocPass {
    cost: f32,
    loss: LossOutput,
    record: Record,
}

/// 一次 MOS 回归的前向结果
struct MosPass {
    cost: f32,
    loss: LossOutput,
    record: Record,
    n_img: usize,
}

/// BIECON 模型
///
/// # 使用示例
/// ```ignore
/// let mut model = Biecon::new(BieconConfig::default())?;
/// model.set_training_mode(true);
/// let (cost, updates, record) = model.cost_updates_reg_loc(&patches, &met_s, None, None)?;
/// model.apply_updates(&updates)?;
/// log::info!("{}", record.summary());
/// ```
#[derive(Debug)]
pub struct Biecon {
    base: ModelBase,
    config: BieconConfig,
    criterion: MseMaeLoss,
}

impl Biecon {
    pub fn new(config: BieconConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let base = ModelBase::new(config.base.clone())?;
        let mut model = Self {
            base,
            config,
            criterion: MseMaeLoss::new(),
        };
        log::info!("BIECON base model");
        model.init_model()?;
        Ok(model)
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        let use_dropout = self.config.use_dropout;
        let base = &mut self.base;

        log::info!(" - Feature conv layers");
        base.add_group(FEAT);
        let input_shape = base.input_shape().to_vec();
        let conv1 = Conv2d::new(&input_shape, 64, (5, 5), "feat/conv1", Activation::Relu, base.rng_mut())?;
        base.push_layer(FEAT, conv1)?;
        base.push_layer(FEAT, MaxPool2d::new(&base.out_shape(FEAT)?, (2, 2), "feat/pool1")?)?;
        let conv2 = Conv2d::new(
            &base.out_shape(FEAT)?,
            64,
            (5, 5),
            "feat/conv2",
            Activation::Relu,
            base.rng_mut(),
        )?;
        base.push_layer(FEAT, conv2)?;
        base.push_layer(FEAT, MaxPool2d::new(&base.out_shape(FEAT)?, (2, 2), "feat/pool2")?)?;
        base.push_layer(FEAT, Flatten::new(&base.out_shape(FEAT)?, "feat/flatten"))?;

        base.add_group(FEAT_FC);
        let mut n_in = base.out_shape(FEAT)?[0];
        for (i, n_out) in [1024, 512, 256, 128].into_iter().enumerate() {
            let name = format!("{FEAT_FC}/fc{}", i + 1);
            let fc = Linear::new(n_in, n_out, &name, Activation::Relu, base.rng_mut())?;
            base.push_layer(FEAT_FC, fc)?;
            // 最后一层之后不接 dropout，两个回归头各自决定
            if use_dropout && i < 3 {
                let seed = base.next_seed();
                let name = format!("{FEAT_FC}/dropout{}", i + 1);
                base.push_layer(FEAT_FC, Dropout::new(&[n_out], DROPOUT_P, &name, seed)?)?;
            }
            n_in = n_out;
        }

        log::info!(" - Regression metric layers");
        Self::build_regression_head(base, REG_LOC, use_dropout)?;
        log::info!(" - Regression mos layers");
        Self::build_regression_head(base, REG_MOS, use_dropout)?;

        base.show_num_params();
        Ok(())
    }

    /// (dropout) → fc1 128 ReLU → fc2 1（线性，偏置初始 0.5）
    fn build_regression_head(base: &mut ModelBase, key: &str, use_dropout: bool) -> Result<(), ModelError> {
        base.add_group(key);
        let feat_shape = base.out_shape(FEAT_FC)?;
        if use_dropout {
            let seed = base.next_seed();
            base.push_layer(key, Dropout::new(&feat_shape, DROPOUT_P, &format!("{key}/dropout"), seed)?)?;
        }
        let fc1 = Linear::new(feat_shape[0], 128, &format!("{key}/fc1"), Activation::Relu, base.rng_mut())?;
        base.push_layer(key, fc1)?;
        let rng = base.rng_mut();
        let fc2 = Linear::new(128, 1, &format!("{key}/fc2"), Activation::Linear, rng)?
            .with_bias_init(Init::Constant(0.5), rng);
        base.push_layer(key, fc2)
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓子网络↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 同一图像的 patch 特征取平均：[n_patch, D] -> [1, D]
    ///
    /// 另一种做法是再拼接上标准差得到 [1, 2D]，目前未启用
    pub fn aggregation_fn(feat_vec: &Tensor) -> Result<Tensor, ModelError> {
        feat_vec
            .mean_axis0_keepdims()
            .ok_or_else(|| ModelError::InvalidOperation("不能对0个 patch 的特征求平均".to_string()))
    }

    /// patch -> 特征向量 [N, 128]
    pub fn feat_fn(&mut self, x: &Tensor) -> Result<Tensor, ModelError> {
        let out = self.base.forward_group(x, FEAT)?;
        self.base.forward_group(&out, FEAT_FC)
    }

    pub fn regress_loc_fn(&mut self, feat_vec: &Tensor) -> Result<Tensor, ModelError> {
        self.base.forward_group(feat_vec, REG_LOC)
    }

    pub fn regress_mos_fn(&mut self, feat_vec: &Tensor) -> Result<Tensor, ModelError> {
        self.base.forward_group(feat_vec, REG_MOS)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑子网络↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓局部分数回归↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 代价：patch 的预测分数回归到局部指标图的空间均值
    ///
    /// # 参数
    /// - `x_c`: patch 批次，[N, C, H, W] 或 [N, C*H*W]
    /// - `met_s`: 与 patch 一一对应的局部指标图 [N, ...]
    /// - `n_img`, `bat2img_idx_set`: 给出索引集时，只取前`n_img`幅图像的 patch
    ///   （`n_img`缺省为索引集中的图像数）
    pub fn cost_reg_loc(
        &mut self,
        x_c: &Tensor,
        met_s: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<(f32, Record), ModelError> {
        let pass = self.reg_loc_pass(x_c, met_s, n_img, bat2img_idx_set)?;
        Ok((pass.cost, pass.record))
    }

    /// 在`cost_reg_loc`的基础上反向传播，并只为`update_wrt_loc`中的层组生成更新规则
    pub fn cost_updates_reg_loc(
        &mut self,
        x_c: &Tensor,
        met_s: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<(f32, Updates, Record), ModelError> {
        let pass = self.reg_loc_pass(x_c, met_s, n_img, bat2img_idx_set)?;
        let update_wrt = self.config.update_wrt_loc.clone();

        self.base.zero_grad();
        if !update_wrt.is_empty() {
            let n = pass.loss.grad.size();
            let grad_pred = (&pass.loss.grad * self.config.wl_loc).reshape(&[n, 1])?;
            let grad_feat = self.base.backward_group(&grad_pred, REG_LOC)?;
            self.backward_trunk(&grad_feat, &update_wrt)?;
            self.add_l2_grad(&[FEAT, FEAT_FC, REG_LOC], &update_wrt)?;
        }
        let updates = self.base.get_updates(&update_wrt)?;
        Ok((pass.cost, updates, pass.record))
    }

    fn reg_loc_pass(
        &mut self,
        x_c: &Tensor,
        met_s: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<LocPass, ModelError> {
        let mut record = Record::new();
        // 给出索引集时，输入可能是定长的占位批次，只取实际 patch 数
        let (x_c_set, met_s_set) = match bat2img_idx_set {
            Some(idx_set) => {
                let n_patches = idx_set.n_patches_for(n_img.unwrap_or(idx_set.len()))?;
                (x_c.slice_axis0(0, n_patches)?, met_s.slice_axis0(0, n_patches)?)
            }
            None => (x_c.clone(), met_s.clone()),
        };

        let x_c_im = self.base.image_vec_to_tensor(&x_c_set)?;
        let n = x_c_im.shape()[0];
        if met_s_set.shape().first() != Some(&n) {
            return Err(ModelError::ShapeMismatch {
                expected: vec![n],
                got: met_s_set.shape().to_vec(),
                message: "局部指标图须与 patch 一一对应".to_string(),
            });
        }

        let feat_vec = self.feat_fn(&x_c_im)?;
        let met_s_p = self.regress_loc_fn(&feat_vec)?.reshape(&[n])?;
        let met_s_mean = met_s_set.mean_per_sample()?;
        let loss = self.criterion.forward(&met_s_p, &met_s_mean)?;

        let l2_reg = self.base.l2_regularization(&[FEAT, FEAT_FC, REG_LOC])?;
        let cost = ModelBase::add_all_losses_with_weight(
            &[loss.value, l2_reg],
            &[self.config.wl_loc, self.config.wr_l2],
        )?;

        record.add_data("loc_mse", self.config.wl_loc * loss.value);
        record.add_data("l2_reg", self.config.wr_l2 * l2_reg);
        record.add_imgs("x_c", &x_c_im, ColorAxis::Range(-0.25, 0.25));
        if bat2img_idx_set.is_some() {
            record.add_imgs("met_s", &met_s_mean.scores_to_tiles(SCORE_TILE), ColorAxis::Auto);
            record.add_imgs("met_s_p", &met_s_p.scores_to_tiles(SCORE_TILE), ColorAxis::Auto);
        }
        log::debug!("cost_reg_loc: {cost:.6} ({})", record.summary());

        Ok(LocPass { cost, loss, record })
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑局部分数回归↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓MOS 回归↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 代价：同一图像的 patch 特征取平均后回归到该图像的 MOS
    ///
    /// # 参数
    /// - `x_c`: patch 批次，[N, C, H, W] 或 [N, C*H*W]
    /// - `mos`: 每幅图像一个 MOS，至少`n_img`个
    /// - `n_img`, `bat2img_idx_set`: 索引集必须给出，单图像批次模式尚未实现
    pub fn cost_nr_iqa(
        &mut self,
        x_c: &Tensor,
        mos: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<(f32, Record), ModelError> {
        let pass = self.nr_iqa_pass(x_c, mos, n_img, bat2img_idx_set)?;
        Ok((pass.cost, pass.record))
    }

    /// 在`cost_nr_iqa`的基础上反向传播，并只为`update_wrt_iqa`中的层组生成更新规则
    pub fn cost_updates_nr_iqa(
        &mut self,
        x_c: &Tensor,
        mos: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<(f32, Updates, Record), ModelError> {
        let pass = self.nr_iqa_pass(x_c, mos, n_img, bat2img_idx_set)?;
        let update_wrt = self.config.update_wrt_iqa.clone();

        self.base.zero_grad();
        if !update_wrt.is_empty() {
            // 索引集在 nr_iqa_pass 中已校验存在
            let idx_set = bat2img_idx_set.ok_or_else(Self::single_image_mode_error)?;
            let grad_pred = (&pass.loss.grad * self.config.wl_mos).reshape(&[pass.n_img, 1])?;
            let grad_aggr = self.base.backward_group(&grad_pred, REG_MOS)?;
            let grad_feat = Self::spread_aggregation_grad(&grad_aggr, idx_set, pass.n_img)?;
            self.backward_trunk(&grad_feat, &update_wrt)?;
            self.add_l2_grad(&[FEAT, FEAT_FC, REG_MOS], &update_wrt)?;
        }
        let updates = self.base.get_updates(&update_wrt)?;
        Ok((pass.cost, updates, pass.record))
    }

    fn nr_iqa_pass(
        &mut self,
        x_c: &Tensor,
        mos: &Tensor,
        n_img: Option<usize>,
        bat2img_idx_set: Option<&PatchIndexSet>,
    ) -> Result<MosPass, ModelError> {
        let mut record = Record::new();
        let idx_set = bat2img_idx_set.ok_or_else(Self::single_image_mode_error)?;
        let n_img = n_img.unwrap_or(idx_set.len());
        let n_patches = idx_set.n_patches_for(n_img)?;

        let x_c_im = self.base.image_vec_to_tensor(&x_c.slice_axis0(0, n_patches)?)?;
        let mos_all = mos.to_vec();
        if mos_all.len() < n_img {
            return Err(ModelError::ShapeMismatch {
                expected: vec![n_img],
                got: mos.shape().to_vec(),
                message: "每幅图像须有一个 MOS".to_string(),
            });
        }
        let mos_gt = Tensor::new(&mos_all[..n_img], &[n_img]);

        let feat_vec = self.feat_fn(&x_c_im)?;
        let aggr_feat = Self::aggregate_per_image(&feat_vec, idx_set, n_img)?;
        let mos_p = self.regress_mos_fn(&aggr_feat)?.reshape(&[n_img])?;
        let loss = self.criterion.forward(&mos_p, &mos_gt)?;

        let l2_reg = self.base.l2_regularization(&[FEAT, FEAT_FC, REG_MOS])?;
        let cost = ModelBase::add_all_losses_with_weight(
            &[loss.value, l2_reg],
            &[self.config.wl_mos, self.config.wr_l2],
        )?;

        record.add_data("subj", self.config.wl_mos * loss.value);
        record.add_data("l2_reg", self.config.wr_l2 * l2_reg);
        record.add_im_data("mos_p", &mos_p);
        record.add_im_data("mos_gt", &mos_gt);
        record.add_imgs("x_c", &x_c_im, ColorAxis::Range(-0.25, 0.25));
        log::debug!("cost_nr_iqa: {cost:.6} ({})", record.summary());

        Ok(MosPass {
            cost,
            loss,
            record,
            n_img,
        })
    }

    fn single_image_mode_error() -> ModelError {
        ModelError::NotImplemented("MOS 回归需要 patch-图像索引集，不支持单图像批次模式".to_string())
    }

    /// 逐图像聚合 patch 特征：[n_patches, D] -> [n_img, D]
    fn aggregate_per_image(
        feat_vec: &Tensor,
        idx_set: &PatchIndexSet,
        n_img: usize,
    ) -> Result<Tensor, ModelError> {
        let aggr = idx_set.ranges()[..n_img]
            .iter()
            .map(|&(from, to)| Self::aggregation_fn(&feat_vec.slice_axis0(from, to)?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tensor::concat_axis0(&aggr)?)
    }

    /// 平均聚合的反向：每个 patch 分得所属图像梯度的 1/n
    fn spread_aggregation_grad(
        grad_aggr: &Tensor,
        idx_set: &PatchIndexSet,
        n_img: usize,
    ) -> Result<Tensor, ModelError> {
        let dim = grad_aggr.shape()[1];
        let n_patches = idx_set.n_patches_for(n_img)?;
        let grad = grad_aggr.to_vec();
        let mut spread = Vec::with_capacity(n_patches * dim);
        for (img, &(from, to)) in idx_set.ranges()[..n_img].iter().enumerate() {
            let row = &grad[img * dim..(img + 1) * dim];
            let scale = 1. / (to - from) as f32;
            for _ in from..to {
                spread.extend(row.iter().map(|g| g * scale));
            }
        }
        Ok(Tensor::try_new(spread, &[n_patches, dim])?)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑MOS 回归↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 由特征向量的梯度继续反向传播到 feat_fc、feat；更新集合不需要时提前停止
    fn backward_trunk(&mut self, grad_feat: &Tensor, update_wrt: &[String]) -> Result<(), ModelError> {
        let needs = |key: &str| update_wrt.iter().any(|g| g == key);
        if !needs(FEAT_FC) && !needs(FEAT) {
            return Ok(());
        }
        let grad = self.base.backward_group(grad_feat, FEAT_FC)?;
        if needs(FEAT) {
            self.base.backward_group(&grad, FEAT)?;
        }
        Ok(())
    }

    /// 只给同时出现在正则项与更新集合中的层组累加 L2 梯度
    fn add_l2_grad(&mut self, l2_keys: &[&str], update_wrt: &[String]) -> Result<(), ModelError> {
        let keys: Vec<&str> = l2_keys
            .iter()
            .copied()
            .filter(|k| update_wrt.iter().any(|g| g == k))
            .collect();
        self.base.add_l2_grad(&keys, self.config.wr_l2)
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓推理↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 每个 patch 的局部分数 [N]
    pub fn predict_loc(&mut self, x_c: &Tensor) -> Result<Tensor, ModelError> {
        let x_c_im = self.base.image_vec_to_tensor(x_c)?;
        let n = x_c_im.shape()[0];
        let feat_vec = self.feat_fn(&x_c_im)?;
        Ok(self.regress_loc_fn(&feat_vec)?.reshape(&[n])?)
    }

    /// 每幅图像的 MOS [n_img]
    pub fn predict_mos(&mut self, x_c: &Tensor, bat2img_idx_set: &PatchIndexSet) -> Result<Tensor, ModelError> {
        let n_img = bat2img_idx_set.len();
        let n_patches = bat2img_idx_set.total_patches();
        let x_c_im = self.base.image_vec_to_tensor(&x_c.slice_axis0(0, n_patches)?)?;
        let feat_vec = self.feat_fn(&x_c_im)?;
        let aggr_feat = Self::aggregate_per_image(&feat_vec, bat2img_idx_set, n_img)?;
        Ok(self.regress_mos_fn(&aggr_feat)?.reshape(&[n_img])?)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑推理↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 决定训练期间的模型行为，目前只影响 dropout
    pub fn set_training_mode(&mut self, training: bool) {
        self.base.set_dropout_on(training);
    }

    pub fn apply_updates(&mut self, updates: &Updates) -> Result<(), ModelError> {
        self.base.apply_updates(updates)
    }

    pub fn config(&self) -> &BieconConfig {
        &self.config
    }

    pub fn base(&self) -> &ModelBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }
}
