//! 设置存储模块
//!
//! # 设计思路
//!
//! 宿主提供的“按用户 / 按文档”键值属性存储被抽象为 `SettingsStore` trait，
//! 由调用方注入具体实现，不再使用进程级全局单例。
//!
//! 只有两个键：
//! - `latexFontSize`：显示尺寸偏好
//! - `latex`：最近一次保存的公式（仅作为旧版回退）
//!
//! # 实现思路
//!
//! - `memory`：`HashMap` 实现，测试与一次性会话使用。
//! - `sqlite`：`rusqlite` 实现，按作用域隔离，带版本化 schema。
//! - 偏好读写函数对任意实现通用；存储里的尺寸无法解析时回退默认值并记录警告。

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::formula::DisplaySize;

mod memory;
mod sqlite;

pub use memory::MemorySettingsStore;
pub use sqlite::SqliteSettingsStore;

/// 显示尺寸偏好的键。
pub const FONT_SIZE_KEY: &str = "latexFontSize";
/// 最近一次公式的键（旧版回退）。
pub const LATEST_FORMULA_KEY: &str = "latex";

/// 设置的生效范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsScope {
    #[default]
    User,
    Document,
}

impl SettingsScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Document => "document",
        }
    }
}

/// 键值设置存储。
pub trait SettingsStore {
    /// 读取键值，不存在时返回 `None`。
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// 写入键值，已存在则覆盖。
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    /// 删除键值，不存在时静默成功。
    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

/// 尺寸下拉框可选项，固定 8 个、固定顺序。
pub fn font_sizes() -> Vec<DisplaySize> {
    DisplaySize::ALL.to_vec()
}

/// 读取显示尺寸偏好。
///
/// 未设置或存储值无法识别时返回默认的 `Huge`。
pub fn latex_font_size<S: SettingsStore + ?Sized>(store: &S) -> Result<DisplaySize, AppError> {
    let Some(raw) = store.get(FONT_SIZE_KEY)? else {
        return Ok(DisplaySize::default());
    };

    match raw.parse::<DisplaySize>() {
        Ok(size) => Ok(size),
        Err(err) => {
            log::warn!("⚠️ 存储的显示尺寸无效，回退默认值: {}", err);
            Ok(DisplaySize::default())
        }
    }
}

/// 持久化显示尺寸偏好。
pub fn set_latex_font_size<S: SettingsStore + ?Sized>(
    store: &mut S,
    size: DisplaySize,
) -> Result<(), AppError> {
    store.set(FONT_SIZE_KEY, size.as_str())?;
    log::info!("⚙️ 显示尺寸偏好已更新: {}", size);
    Ok(())
}

/// 读取最近一次保存的公式。
pub fn latest_formula<S: SettingsStore + ?Sized>(store: &S) -> Result<Option<String>, AppError> {
    Ok(store.get(LATEST_FORMULA_KEY)?.filter(|formula| !formula.is_empty()))
}

/// 记录最近一次保存的公式。
pub fn set_latest_formula<S: SettingsStore + ?Sized>(
    store: &mut S,
    formula: &str,
) -> Result<(), AppError> {
    store.set(LATEST_FORMULA_KEY, formula)
}
