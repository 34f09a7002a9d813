//! 公式编辑表单：决定打开时文本框里预填什么。
//!
//! 优先级：选区中的公式图片 → 最近一次保存的公式 → 示例公式。

use serde::Serialize;

use super::FormulaEditor;
use crate::document::{Document, LINK_URL_ATTRIBUTE};
use crate::error::AppError;
use crate::renderer::ImageFetcher;
use crate::settings::{self, SettingsStore};

pub const DIALOG_TITLE: &str = "LaTeX editor";

/// 预填公式的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaSource {
    /// 从选中的公式图片找回。
    Selection,
    /// 最近一次保存的公式。
    Latest,
    /// 示例公式。
    Fallback,
}

/// 公式编辑表单：一个多行文本框 + 保存按钮。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaForm {
    pub title: String,
    pub formula: String,
    pub source: FormulaSource,
}

impl<S: SettingsStore, F: ImageFetcher> FormulaEditor<S, F> {
    /// 构建公式编辑表单。
    pub fn open_dialog<D: Document>(&self, doc: &D) -> Result<FormulaForm, AppError> {
        let size = settings::latex_font_size(&self.settings)?;

        for element in doc.selection() {
            let attributes = doc.attributes(element)?;
            let Some(link) = attributes.get(LINK_URL_ATTRIBUTE) else {
                continue;
            };

            let formula = match self.service.recover(link) {
                Some((formula, encoded_size)) => {
                    log::debug!("🔎 从选中图片 {} 找回公式（尺寸 {}）", element, encoded_size);
                    formula
                }
                None => {
                    log::warn!("⚠️ 选中图片 {} 的链接不是当前渲染服务生成的，按偏好尺寸截取", element);
                    self.service.decode(Some(link), size)
                }
            };
            return Ok(Self::form(formula, FormulaSource::Selection));
        }

        if let Some(latest) = settings::latest_formula(&self.settings)? {
            return Ok(Self::form(latest, FormulaSource::Latest));
        }

        Ok(Self::form(self.service.decode(None, size), FormulaSource::Fallback))
    }

    fn form(formula: String, source: FormulaSource) -> FormulaForm {
        FormulaForm {
            title: DIALOG_TITLE.to_string(),
            formula,
            source,
        }
    }
}
