//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，编辑器流程、设置存储、文档操作与
//! 命令行入口共用同一个错误类型，调用侧可以按分支匹配。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `FetchError` 提供 `From` 转换，渲染失败可直接 `?` 上抛。
//! - 实现 `Serialize` 将错误序列化为字符串，宿主侧表单可直接展示。

use serde::Serialize;

use crate::renderer::FetchError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 文档中没有可用的光标（也没有选区），插入被中止
    #[error("无法在文档中找到光标")]
    NoCursor,

    /// 公式图片渲染失败（网络 / 格式 / 超时）
    #[error("{0}")]
    Render(#[from] FetchError),

    /// 设置读写失败
    #[error("设置存储错误: {0}")]
    Settings(String),

    /// 文档元素操作失败
    #[error("文档操作失败: {0}")]
    Document(String),

    /// 无法识别的显示尺寸
    #[error("未知显示尺寸: {0}")]
    InvalidSize(String),

    /// 配置文件错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 宿主表单要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
