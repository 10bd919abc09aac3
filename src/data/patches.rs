/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : 图像读取与 patch 切分
 */

use std::path::Path;

use ndarray::{Axis, Slice};

use super::PatchIndexSet;
use crate::nn::ModelError;
use crate::tensor::Tensor;

/// 读入图像并转为灰度，像素归一化到[0, 1]，形状为[1, H, W]
pub fn load_gray_image(path: impl AsRef<Path>) -> Result<Tensor, ModelError> {
    let img = image::open(path.as_ref())?.to_luma8();
    let (w, h) = img.dimensions();
    let data = img.as_raw().iter().map(|&p| p as f32 / 255.).collect();
    Ok(Tensor::try_new(data, &[1, h as usize, w as usize])?)
}

/// 以`stride`为步长从[C, H, W]图像中裁出所有完整的`patch_size`大小的 patch，
/// 按行优先顺序堆叠为[n, C, pH, pW]
pub fn extract_patches(
    image: &Tensor,
    patch_size: (usize, usize),
    stride: (usize, usize),
) -> Result<Tensor, ModelError> {
    let shape = image.shape();
    if shape.len() != 3 {
        return Err(ModelError::ShapeMismatch {
            expected: vec![0, 0, 0],
            got: shape.to_vec(),
            message: "图像须为 [C, H, W]".to_string(),
        });
    }
    let (h, w) = (shape[1], shape[2]);
    let (p_h, p_w) = patch_size;
    let (s_h, s_w) = stride;
    if p_h == 0 || p_w == 0 || s_h == 0 || s_w == 0 || p_h > h || p_w > w {
        return Err(ModelError::InvalidOperation(format!(
            "无法从 {h}x{w} 的图像中以步长 {stride:?} 裁出 {p_h}x{p_w} 的 patch"
        )));
    }

    let mut patches = Vec::new();
    for top in (0..=h - p_h).step_by(s_h) {
        for left in (0..=w - p_w).step_by(s_w) {
            let patch = image
                .as_array()
                .slice_axis(Axis(1), Slice::from(top..top + p_h))
                .slice_axis(Axis(2), Slice::from(left..left + p_w))
                .to_owned()
                .insert_axis(Axis(0));
            patches.push(Tensor::from_array(patch));
        }
    }
    Ok(Tensor::concat_axis0(&patches)?)
}

/// 多幅图像的 patch 批次
#[derive(Debug, Clone)]
pub struct PatchBatch {
    /// [N, C, pH, pW]
    pub patches: Tensor,
    pub index_set: PatchIndexSet,
}

impl PatchBatch {
    /// 逐幅切分后按顺序拼接，并生成对应的索引集
    pub fn from_images(
        images: &[Tensor],
        patch_size: (usize, usize),
        stride: (usize, usize),
    ) -> Result<Self, ModelError> {
        let per_image = images
            .iter()
            .map(|img| extract_patches(img, patch_size, stride))
            .collect::<Result<Vec<_>, _>>()?;
        let counts: Vec<usize> = per_image.iter().map(|p| p.shape()[0]).collect();
        Ok(Self {
            patches: Tensor::concat_axis0(&per_image)?,
            index_set: PatchIndexSet::from_counts(&counts)?,
        })
    }

    pub fn n_img(&self) -> usize {
        self.index_set.len()
    }
}
