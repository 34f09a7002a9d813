//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载渲染下载链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 公式图片下载统一错误类型。
///
/// 该类型会在编辑器层被上转为 `AppError::Render`。
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}
