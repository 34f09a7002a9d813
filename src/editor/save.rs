//! 保存公式：渲染、插入、替换选区。
//!
//! 顺序固定为：定位插入点 → 记录公式 → 下载渲染图 → 插入新图 → 移除旧选区。
//! 下载或插入失败时旧选区原样保留，文档不会出现“旧图已删、新图未插入”的中间态。

use serde::Serialize;

use super::FormulaEditor;
use crate::document::{Attributes, Document, ElementId, LINK_URL_ATTRIBUTE, Position};
use crate::error::AppError;
use crate::formula::DisplaySize;
use crate::locator::Locators;
use crate::renderer::ImageFetcher;
use crate::settings::{self, SettingsStore};

/// 一次成功插入的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertedFormula {
    pub element: ElementId,
    pub size: DisplaySize,
    pub locators: Locators,
}

impl<S: SettingsStore, F: ImageFetcher> FormulaEditor<S, F> {
    /// 渲染公式并插入文档。
    ///
    /// - 有选区：新图插在第一个选中元素的位置，随后移除全部选中元素。
    ///   重复元素与祖先已被选中的元素只移除一次；选区校验在下载前完成，
    ///   校验失败时文档与设置都不变。
    /// - 无选区：插在光标处。
    /// - 既无选区也无光标：返回 `AppError::NoCursor`，不写入任何设置。
    pub async fn save_formula<D: Document>(
        &mut self,
        doc: &mut D,
        formula: &str,
    ) -> Result<InsertedFormula, AppError> {
        let selected = removal_set(doc, doc.selection())?;
        let anchor = match selected.first() {
            Some(first) => doc.position_of(*first)?,
            None => doc.cursor().ok_or(AppError::NoCursor)?,
        };
        for old in &selected {
            if is_within(doc, anchor.element, *old)? {
                return Err(AppError::Document(format!(
                    "插入点所在的元素 {} 也在选区中",
                    anchor.element
                )));
            }
        }

        settings::set_latest_formula(&mut self.settings, formula)?;
        let size = settings::latex_font_size(&self.settings)?;
        let locators = self.service.encode(formula, size);

        let image = self.fetcher.fetch(&locators.image).await?;

        let element = doc.insert_inline_image(&anchor, &image)?;
        doc.set_attributes(
            element,
            Attributes::from([(LINK_URL_ATTRIBUTE.to_string(), locators.link.clone())]),
        )?;

        for old in &selected {
            doc.remove_element(*old)?;
        }

        let placed = doc.position_of(element)?;
        doc.set_cursor(Position {
            element: placed.element,
            offset: placed.offset + 1,
        })?;

        log::info!(
            "✅ 公式已插入 - 元素 {} 尺寸 {} 替换 {} 个选中元素",
            element,
            size,
            selected.len()
        );

        Ok(InsertedFormula {
            element,
            size,
            locators,
        })
    }
}

/// 去重并去掉祖先也被选中的元素，保留原有顺序。
fn removal_set<D: Document>(doc: &D, selected: Vec<ElementId>) -> Result<Vec<ElementId>, AppError> {
    let mut unique: Vec<ElementId> = Vec::with_capacity(selected.len());
    for element in selected {
        doc.container_of(element)?;
        if !unique.contains(&element) {
            unique.push(element);
        }
    }

    let mut kept = Vec::with_capacity(unique.len());
    'outer: for element in &unique {
        for other in &unique {
            if other != element && is_within(doc, *element, *other)? {
                continue 'outer;
            }
        }
        kept.push(*element);
    }
    Ok(kept)
}

/// `element` 是否为 `ancestor` 本身或其后代。
fn is_within<D: Document>(doc: &D, element: ElementId, ancestor: ElementId) -> Result<bool, AppError> {
    let mut current = Some(element);
    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        current = doc.container_of(id)?;
    }
    Ok(false)
}
