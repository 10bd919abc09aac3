/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 在合成数据上两阶段训练 BIECON 并导出诊断记录
 *
 * 运行：cargo run --example train_synthetic
 * 输出写到系统临时目录下的 biecon_demo/
 */

use biecon::data::{PatchBatch, PatchIndexSet};
use biecon::models::{Biecon, BieconConfig, FEAT_FC, REG_MOS};
use biecon::nn::{ModelBaseConfig, ModelError};
use biecon::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::filter::LevelFilter;

const IMG: usize = 64;
const PATCH: usize = 32;
const STEPS_LOC: usize = 50;
const STEPS_MOS: usize = 50;

/// 质量越低，叠加的噪声越强
fn synthetic_images(qualities: &[f32], rng: &mut StdRng) -> Result<Vec<Tensor>, ModelError> {
    qualities
        .iter()
        .map(|q| {
            let data = (0..IMG * IMG)
                .map(|i| {
                    let (y, x) = (i / IMG, i % IMG);
                    let clean = ((x as f32 / 6.).sin() + (y as f32 / 9.).cos()) * 0.1;
                    clean + (1. - q) * 0.5 * (rng.r#gen::<f32>() - 0.5)
                })
                .collect();
            Ok(Tensor::try_new(data, &[1, IMG, IMG])?)
        })
        .collect()
}

/// 局部指标图：每个 patch 一张 8x8 的图，取值为所属图像的质量加少许扰动
fn local_metric_maps(idx_set: &PatchIndexSet, qualities: &[f32], rng: &mut StdRng) -> Result<Tensor, ModelError> {
    let mut data = Vec::new();
    for (img, &(from, to)) in idx_set.ranges().iter().enumerate() {
        for _ in from..to {
            data.extend((0..8 * 8).map(|_| qualities[img] + 0.05 * (rng.r#gen::<f32>() - 0.5)));
        }
    }
    Ok(Tensor::try_new(data, &[idx_set.total_patches(), 1, 8, 8])?)
}

fn main() -> Result<(), ModelError> {
    tracing_subscriber::fmt().with_max_level(LevelFilter::INFO).init();

    let config = BieconConfig {
        use_dropout: true,
        // 第二阶段只微调全连接部分与 MOS 回归头
        update_wrt_iqa: vec![FEAT_FC.to_string(), REG_MOS.to_string()],
        base: ModelBaseConfig {
            input_size: [PATCH, PATCH],
            lr: 1e-3,
            seed: Some(42),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut model = Biecon::new(config)?;

    let mut rng = StdRng::seed_from_u64(42);
    let qualities = [0.95, 0.7, 0.45, 0.2];
    let images = synthetic_images(&qualities, &mut rng)?;
    let batch = PatchBatch::from_images(&images, (PATCH, PATCH), (PATCH / 2, PATCH / 2))?;
    let met_s = local_metric_maps(&batch.index_set, &qualities, &mut rng)?;
    let mos = Tensor::new(&qualities, &[qualities.len()]);
    log::info!("{}幅图像，共{}个 patch", batch.n_img(), batch.index_set.total_patches());

    model.set_training_mode(true);
    for step in 1..=STEPS_LOC {
        let (cost, updates, record) =
            model.cost_updates_reg_loc(&batch.patches, &met_s, None, Some(&batch.index_set))?;
        model.apply_updates(&updates)?;
        if step % 10 == 0 {
            log::info!("[局部回归 {step:>3}] cost: {cost:.4} ({})", record.summary());
        }
    }
    for step in 1..=STEPS_MOS {
        let (cost, updates, record) =
            model.cost_updates_nr_iqa(&batch.patches, &mos, None, Some(&batch.index_set))?;
        model.apply_updates(&updates)?;
        if step % 10 == 0 {
            log::info!("[MOS 回归 {step:>3}] cost: {cost:.4} ({})", record.summary());
        }
    }

    model.set_training_mode(false);
    let predicted = model.predict_mos(&batch.patches, &batch.index_set)?;
    for (gt, p) in qualities.iter().zip(predicted.to_vec()) {
        log::info!("MOS 真值 {gt:.2}，预测 {p:.3}");
    }

    let out_dir = std::env::temp_dir().join("biecon_demo");
    let (_, record) = model.cost_reg_loc(&batch.patches, &met_s, None, Some(&batch.index_set))?;
    record.save_imgs(&out_dir)?;
    let (_, record) = model.cost_nr_iqa(&batch.patches, &mos, None, Some(&batch.index_set))?;
    record.save_im_data(&out_dir)?;
    model.base().save_params(out_dir.join("biecon.bin"))?;
    log::info!("诊断图像、逐图像预测与参数已写入{}", out_dir.display());
    Ok(())
}
