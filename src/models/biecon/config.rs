/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : BIECON 模型的超参数配置
 */

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FEAT, FEAT_FC, REG_LOC, REG_MOS};
use crate::nn::{ModelBaseConfig, ModelError};

/// BIECON 配置，未给出的键取缺省值
///
/// ```ignore
/// let config = BieconConfig::from_json_str(r#"{"wl_loc": 10.0, "use_dropout": true, "lr": 1e-3}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BieconConfig {
    /// 局部分数回归损失的权重
    pub wl_loc: f32,
    /// MOS 回归损失的权重
    pub wl_mos: f32,
    /// L2 正则的权重
    pub wr_l2: f32,
    pub use_dropout: bool,
    /// 局部分数回归要更新的层组
    pub update_wrt_loc: Vec<String>,
    /// MOS 回归要更新的层组
    pub update_wrt_iqa: Vec<String>,
    /// 输入尺寸、优化器等基类配置，与上述键位于同一层级
    #[serde(flatten)]
    pub base: ModelBaseConfig,
}

impl Default for BieconConfig {
    fn default() -> Self {
        Self {
            wl_loc: 1e2,
            wl_mos: 1e2,
            wr_l2: 1e-4,
            use_dropout: false,
            update_wrt_loc: vec![FEAT.into(), FEAT_FC.into(), REG_LOC.into()],
            update_wrt_iqa: vec![FEAT.into(), FEAT_FC.into(), REG_MOS.into()],
            base: ModelBaseConfig::default(),
        }
    }
}

impl BieconConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// 由任意 JSON 映射构建（未识别的键被忽略）
    pub fn from_value(value: serde_json::Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(value)?)
    }

    /// 更新列表只能包含该目标实际依赖的层组
    pub fn validate(&self) -> Result<(), ModelError> {
        check_update_groups("update_wrt_loc", &self.update_wrt_loc, &[FEAT, FEAT_FC, REG_LOC])?;
        check_update_groups("update_wrt_iqa", &self.update_wrt_iqa, &[FEAT, FEAT_FC, REG_MOS])?;
        self.base.validate()
    }
}

fn check_update_groups(key: &str, groups: &[String], allowed: &[&str]) -> Result<(), ModelError> {
    if let Some(bad) = groups.iter().find(|g| !allowed.contains(&g.as_str())) {
        return Err(ModelError::InvalidConfig(format!(
            "`{key}`中的层组`{bad}`与该目标无关，可选：{allowed:?}"
        )));
    }
    // 每个参数只能有一条更新规则
    for (i, group) in groups.iter().enumerate() {
        if groups[..i].contains(group) {
            return Err(ModelError::InvalidConfig(format!("`{key}`中的层组`{group}`重复出现")));
        }
    }
    Ok(())
}
