/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : patch-图像索引集
 */

use crate::nn::ModelError;

/// 批次内 patch 与源图像的对应关系。
///
/// 第 i 幅图像拥有 patch 区间`[from_i, to_i)`。区间从0开始、首尾相接且均非空，
/// 因此`ranges[n_img - 1].1`就是前`n_img`幅图像的 patch 总数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchIndexSet {
    ranges: Vec<(usize, usize)>,
}

impl PatchIndexSet {
    pub fn new(ranges: Vec<(usize, usize)>) -> Result<Self, ModelError> {
        if ranges.is_empty() {
            return Err(ModelError::InvalidIndexSet("索引集为空".to_string()));
        }
        let mut expected_from = 0;
        for (i, &(from, to)) in ranges.iter().enumerate() {
            if from != expected_from {
                return Err(ModelError::InvalidIndexSet(format!(
                    "第{i}幅图像的区间须从{expected_from}开始，实际为[{from}, {to})"
                )));
            }
            if to <= from {
                return Err(ModelError::InvalidIndexSet(format!(
                    "第{i}幅图像的区间[{from}, {to})为空"
                )));
            }
            expected_from = to;
        }
        Ok(Self { ranges })
    }

    /// 由每幅图像的 patch 个数构建
    pub fn from_counts(counts: &[usize]) -> Result<Self, ModelError> {
        let mut from = 0;
        let ranges = counts
            .iter()
            .map(|&n| {
                let range = (from, from + n);
                from += n;
                range
            })
            .collect();
        Self::new(ranges)
    }

    /// 图像数
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    pub fn get(&self, img: usize) -> Option<(usize, usize)> {
        self.ranges.get(img).copied()
    }

    /// 所有图像的 patch 总数
    pub fn total_patches(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.1)
    }

    /// 前`n_img`幅图像的 patch 总数
    pub fn n_patches_for(&self, n_img: usize) -> Result<usize, ModelError> {
        if n_img == 0 || n_img > self.ranges.len() {
            return Err(ModelError::InvalidIndexSet(format!(
                "n_img须在[1, {}]内，实际为{n_img}",
                self.ranges.len()
            )));
        }
        Ok(self.ranges[n_img - 1].1)
    }
}
