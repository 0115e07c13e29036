//! # 插值表
//!
//! 按键排序的 `f64 → f64` 查找表，查询时在相邻两点间线性插值，
//! 超出范围时钳位到边界值。
//!
//! 典型用途：视觉距离 → 飞轮转速、摇杆输入 → 输出曲线。
//!
//! ```text
//!  value
//!    │            ●────────── 钳位到最大键的值
//!    │          ╱
//!    │    ●───╱              线性插值
//!    │  ╱
//!  ──●─────────────── key
//!    └ 钳位到最小键的值
//! ```

use crate::error::ToolsError;

/// 有序插值表
///
/// 内部按键升序保存条目，插入顺序无关。键唯一，重复插入覆盖旧值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolationTable {
    entries: Vec<(f64, f64)>,
}

impl InterpolationTable {
    /// 创建空表
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 插入或覆盖一个条目
    ///
    /// # 错误
    ///
    /// 键为 NaN 或无穷时返回 [`ToolsError::InvalidKey`]，表保持不变。
    pub fn put(&mut self, key: f64, value: f64) -> Result<(), ToolsError> {
        if !key.is_finite() {
            return Err(ToolsError::InvalidKey(key));
        }
        let key = normalize_zero(key);
        match self.entries.binary_search_by(|(k, _)| k.total_cmp(&key)) {
            Ok(index) => self.entries[index].1 = value,
            Err(index) => self.entries.insert(index, (key, value)),
        }
        Ok(())
    }

    /// 查询插值结果
    ///
    /// - 键精确匹配：返回该键的值
    /// - 低于最小键：返回最小键的值
    /// - 高于最大键：返回最大键的值
    /// - 其余：在包围该键的两点间线性插值
    ///
    /// # 错误
    ///
    /// 空表查询返回 [`ToolsError::InvalidState`]（调用方必须保证至少有一个条目）。
    pub fn get_interpolated(&self, key: f64) -> Result<f64, ToolsError> {
        let (first, last) = match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ToolsError::InvalidState("interpolation table is empty")),
        };

        if key <= first.0 {
            return Ok(first.1);
        }
        if key >= last.0 {
            return Ok(last.1);
        }

        let key = normalize_zero(key);
        match self.entries.binary_search_by(|(k, _)| k.total_cmp(&key)) {
            Ok(index) => Ok(self.entries[index].1),
            Err(index) => {
                // key 严格位于 first 与 last 之间，index ∈ [1, len - 1]
                let (k0, v0) = self.entries[index - 1];
                let (k1, v1) = self.entries[index];
                Ok(v0 + (v1 - v0) * (key - k0) / (k1 - k0))
            },
        }
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按键升序迭代条目
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().copied()
    }
}

impl TryFrom<&[(f64, f64)]> for InterpolationTable {
    type Error = ToolsError;

    fn try_from(points: &[(f64, f64)]) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for &(key, value) in points {
            table.put(key, value)?;
        }
        Ok(table)
    }
}

/// `total_cmp` 区分 -0.0 与 0.0，入表前统一为 0.0
fn normalize_zero(key: f64) -> f64 {
    if key == 0.0 { 0.0 } else { key }
}
