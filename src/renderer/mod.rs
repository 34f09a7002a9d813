//! # 公式渲染模块（renderer）
//!
//! ## 设计思路
//!
//! 公式图片由外部 Web 渲染服务生成，本模块只负责“按图片定位串下载并校验”。
//! 下载能力抽象为 `ImageFetcher` trait，编辑器流程只依赖 trait，
//! 测试可以注入不联网的实现。
//!
//! - `fetcher`：`HttpFetcher`，基于 `reqwest` 的单次 GET
//! - `cache`：按 URL 的 LRU 渲染缓存
//! - `config/error/source`：配置、错误、渲染结果模型
//!
//! ## 调用链
//!
//! ```text
//! editor::save_formula
//!    ↓
//! ImageFetcher::fetch(image locator)
//!    ├─ cache（命中直接返回）
//!    ├─ download（状态码 / 类型 / 体积校验）
//!    └─ RenderedImage::from_bytes（签名 + 尺寸）
//!    ↓
//! Document::insert_inline_image
//! ```

use std::future::Future;

mod cache;
mod config;
mod error;
mod fetcher;
mod source;

pub use config::FetchConfig;
pub use error::FetchError;
pub use fetcher::HttpFetcher;
pub use source::RenderedImage;

#[cfg(test)]
pub(crate) use source::tests::create_png_bytes;

/// 按 URL 获取渲染好的公式图片。
///
/// 调用方负责处理失败；实现不得静默重试。
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RenderedImage, FetchError>> + Send;
}
