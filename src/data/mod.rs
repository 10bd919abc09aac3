//! 数据模块
//!
//! 把整幅图像切成 patch 批次，并记录每个 patch 属于哪幅图像。
//!
//! # 主要组件
//!
//! - [`PatchIndexSet`]: patch-图像索引集，每幅图像对应一段连续的 patch 区间
//! - [`PatchBatch`]: 多幅图像的 patch 堆叠 + 索引集
//! - [`extract_patches`]: 按步长从 [C, H, W] 图像中裁出 patch
//! - [`load_gray_image`]: 从磁盘读入灰度图像
//!
//! # 使用示例
//!
//! ```ignore
//! use biecon::data::PatchBatch;
//!
//! let batch = PatchBatch::from_images(&[img_a, img_b], (32, 32), (32, 32))?;
//! let (cost, updates, record) =
//!     model.cost_updates_nr_iqa(&batch.patches, &mos, None, Some(&batch.index_set))?;
//! ```

mod index_set;
mod patches;

pub use index_set::PatchIndexSet;
pub use patches::{PatchBatch, extract_patches, load_gray_image};

#[cfg(test)]
mod tests;
