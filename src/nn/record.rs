/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 一次代价计算产生的诊断记录（标量损失、逐图像数值、可视化图像），
 *                 供外部日志/可视化工具消费后丢弃
 */

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use super::ModelError;
use crate::tensor::Tensor;

/// 可视化图像的取值范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorAxis {
    /// 取该批图像的最小/最大值
    Auto,
    /// 固定范围 [lo, hi]
    Range(f32, f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// 标量（如加权后的损失）
    Scalar(f32),
    /// 逐图像数值（如每张图像的 MOS 预测值）
    ImData(Tensor),
    /// 一批图像 [N, C, H, W]
    Images { imgs: Tensor, caxis: ColorAxis },
}

/// 诊断记录，按插入顺序保存
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, RecordValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&mut self, name: &str, value: f32) {
        self.insert(name, RecordValue::Scalar(value));
    }

    pub fn add_im_data(&mut self, name: &str, data: &Tensor) {
        self.insert(name, RecordValue::ImData(data.clone()));
    }

    pub fn add_imgs(&mut self, name: &str, imgs: &Tensor, caxis: ColorAxis) {
        self.insert(
            name,
            RecordValue::Images {
                imgs: imgs.clone(),
                caxis,
            },
        );
    }

    // 同名条目覆盖旧值，位置不变
    fn insert(&mut self, name: &str, value: RecordValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn scalar(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(RecordValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn im_data(&self, name: &str) -> Option<&Tensor> {
        match self.get(name) {
            Some(RecordValue::ImData(t)) => Some(t),
            _ => None,
        }
    }

    pub fn imgs(&self, name: &str) -> Option<(&Tensor, ColorAxis)> {
        match self.get(name) {
            Some(RecordValue::Images { imgs, caxis }) => Some((imgs, *caxis)),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有标量拼成一行，如`loc_mse: 1.2345, l2_reg: 0.0012`
    pub fn summary(&self) -> String {
        let mut line = String::new();
        for (name, value) in &self.entries {
            if let RecordValue::Scalar(v) = value {
                if !line.is_empty() {
                    line.push_str(", ");
                }
                let _ = write!(line, "{name}: {v:.4}");
            }
        }
        line
    }

    /// 把每组图像拼接成一张灰度 PNG 写入`dir/<name>.png`，返回写出的路径
    pub fn save_imgs(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ModelError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut paths = Vec::new();
        for (name, value) in &self.entries {
            if let RecordValue::Images { imgs, caxis } = value {
                let path = dir.join(format!("{}.png", name.replace('/', "_")));
                tile_images(imgs, *caxis)?.save(&path)?;
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// 把逐图像数值写成`dir/<name>.npy`，返回写出的路径
    pub fn save_im_data(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ModelError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut paths = Vec::new();
        for (name, value) in &self.entries {
            if let RecordValue::ImData(data) = value {
                let path = dir.join(format!("{}.npy", name.replace('/', "_")));
                ndarray_npy::write_npy(&path, data.as_array())?;
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// [N, C, H, W] -> 近似方形的网格，每格取第0通道，格间留1像素
fn tile_images(imgs: &Tensor, caxis: ColorAxis) -> Result<GrayImage, ModelError> {
    let shape = imgs.shape();
    if shape.len() != 4 || shape[0] == 0 {
        return Err(ModelError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: shape.to_vec(),
            message: "可视化图像必须是非空的 [N, C, H, W]".to_string(),
        });
    }
    let (n, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
    let (lo, hi) = match caxis {
        ColorAxis::Range(lo, hi) => (lo, hi),
        ColorAxis::Auto => (imgs.min_value(), imgs.max_value()),
    };
    let span = if hi > lo { hi - lo } else { 1. };

    let cols = (n as f32).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);
    let width = (cols * (w + 1) - 1) as u32;
    let height = (rows * (h + 1) - 1) as u32;
    let data = imgs.to_vec();

    let mut canvas = GrayImage::from_pixel(width, height, Luma([0u8]));
    for i in 0..n {
        let (row, col) = (i / cols, i % cols);
        let base = i * c * h * w;
        for y in 0..h {
            for x in 0..w {
                let v = ((data[base + y * w + x] - lo) / span).clamp(0., 1.);
                let px = (col * (w + 1) + x) as u32;
                let py = (row * (h + 1) + y) as u32;
                canvas.put_pixel(px, py, Luma([(v * 255.).round() as u8]));
            }
        }
    }
    Ok(canvas)
}
