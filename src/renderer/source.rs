//! # 渲染结果模型
//!
//! `RenderedImage` 是下载并校验过的渲染图片：原始字节 + 类型 + 尺寸。
//! 文档插入只需要这些信息，不做像素级解码。

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;

use super::FetchError;

/// 已校验的渲染图片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// 原始图片字节（GIF / PNG 等）。
    pub bytes: Bytes,
    /// 通过文件签名识别的 MIME 类型。
    pub mime_type: &'static str,
    /// 图片宽度（像素）。
    pub width: u32,
    /// 图片高度（像素）。
    pub height: u32,
}

impl RenderedImage {
    /// 校验字节确实是图片，并读取头信息中的宽高。
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, FetchError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(FetchError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(&bytes)
            .ok_or_else(|| FetchError::InvalidFormat("无法识别图片类型".to_string()))?;
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(FetchError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        let (width, height) = image::ImageReader::new(Cursor::new(bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| FetchError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| FetchError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))?;

        Ok(Self {
            bytes,
            mime_type: kind.mime_type(),
            width,
            height,
        })
    }

    /// 转为 `data:` URL，便于宿主直接内嵌展示。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
