//! # 公式定位串（Locator）编解码
//!
//! ## 设计思路
//!
//! 插入文档的公式图片不另存公式原文，公式唯一的持久化形式就是图片上挂的
//! 链接定位串（`LINK_URL` 属性）。因此这里要保证：
//!
//! ```text
//! decode(encode(f, s).link, s) == f      （f 不含换行）
//! ```
//!
//! 同一公式产出两个定位串，转义规则完全一致，只是前缀/后缀不同：
//! - 图片定位串：`image_prefix + 尺寸指令 + 公式 + image_suffix`，用于下载渲染结果
//! - 链接定位串：`link_prefix + 尺寸指令 + 公式`，挂在图片上，用于后续找回公式
//!
//! ## 实现思路
//!
//! - 转义：UTF-8 编码后，除 `[A-Za-z0-9]` 外的字节全部百分号编码。
//! - `decode` 按“前缀 + 指定尺寸指令”的长度截掉头部再反转义。
//!   尺寸传错时截取长度不对，结果会被破坏；这是按长度截取的固有行为，保持原样。
//! - `recover` 直接从定位串里识别尺寸指令，不依赖调用方传入尺寸。

use percent_encoding::{NON_ALPHANUMERIC, percent_decode, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::formula::{self, DisplaySize, FALLBACK_FORMULA};

pub const DEFAULT_IMAGE_PREFIX: &str = "https://latex.codecogs.com/img/";
pub const DEFAULT_IMAGE_SUFFIX: &str = ".gif";
pub const DEFAULT_LINK_PREFIX: &str = "https://www.codecogs.com/eqnedit.php?latex=";

/// 外部渲染服务的地址模板。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderService {
    /// 图片定位串前缀。
    pub image_prefix: String,
    /// 图片定位串后缀（决定返回的图片格式）。
    pub image_suffix: String,
    /// 链接定位串前缀。
    pub link_prefix: String,
}

impl Default for RenderService {
    fn default() -> Self {
        Self {
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            image_suffix: DEFAULT_IMAGE_SUFFIX.to_string(),
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
        }
    }
}

/// 同一公式的一对定位串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locators {
    /// 用于下载渲染图片。
    pub image: String,
    /// 挂在插入的图片上，用于找回公式。
    pub link: String,
}

impl RenderService {
    /// 生成图片与链接两个定位串。对任意输入都成功。
    ///
    /// # 示例
    /// ```rust
    /// use latex_insert::formula::DisplaySize;
    /// use latex_insert::locator::RenderService;
    ///
    /// let service = RenderService::default();
    /// let locators = service.encode("x^2+y^2=1", DisplaySize::Huger);
    /// assert!(locators.image.ends_with("%5CHuge%5C%21x%5E2%2By%5E2%3D1.gif"));
    /// ```
    pub fn encode(&self, formula: &str, size: DisplaySize) -> Locators {
        let body = format!(
            "{}{}",
            escape(&size.directive()),
            escape(&formula::normalize_whitespace(formula))
        );

        Locators {
            image: format!("{}{}{}", self.image_prefix, body, self.image_suffix),
            link: format!("{}{}", self.link_prefix, body),
        }
    }

    /// 从链接定位串找回公式（按长度截取前缀）。
    ///
    /// - `None` 表示没有历史公式，返回示例公式。
    /// - `size` 必须与编码时一致，否则截取位置错位，结果不可信。
    /// - 定位串比前缀还短时返回空串。
    /// - 截取按字节进行，截断的多字节字符按 UTF-8 替换字符输出。
    pub fn decode(&self, link: Option<&str>, size: DisplaySize) -> String {
        let Some(link) = link else {
            return FALLBACK_FORMULA.to_string();
        };

        let head_len = self.link_head(size).len();
        match link.as_bytes().get(head_len..) {
            Some(rest) => percent_decode(rest).decode_utf8_lossy().into_owned(),
            None => {
                log::debug!("🔎 定位串短于前缀（{} < {}），按空公式处理", link.len(), head_len);
                String::new()
            }
        }
    }

    /// 从链接定位串同时找回公式与编码时使用的尺寸。
    ///
    /// 定位串不是本服务生成的（前缀或尺寸指令不匹配）时返回 `None`。
    pub fn recover(&self, link: &str) -> Option<(String, DisplaySize)> {
        DisplaySize::ALL.into_iter().find_map(|size| {
            link.strip_prefix(self.link_head(size).as_str())
                .map(|rest| (unescape(rest), size))
        })
    }

    fn link_head(&self, size: DisplaySize) -> String {
        format!("{}{}", self.link_prefix, escape(&size.directive()))
    }
}

fn escape(text: &str) -> String {
    utf8_percent_encode(text, NON_ALPHANUMERIC).to_string()
}

fn unescape(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}
