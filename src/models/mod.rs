/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : 建立在 nn 层库之上的具体模型
 */

pub mod biecon;

pub use biecon::{Biecon, BieconConfig, FEAT, FEAT_FC, REG_LOC, REG_MOS};

#[cfg(test)]
mod tests;
