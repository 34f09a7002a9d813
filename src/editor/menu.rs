//! 菜单与尺寸设置表单。
//!
//! 菜单项直接携带 `EditorEvent`，宿主点击后原样交给 `FormulaEditor::handle`。

use serde::Serialize;

use super::{EditorEvent, FormulaEditor};
use crate::error::AppError;
use crate::formula::DisplaySize;
use crate::renderer::ImageFetcher;
use crate::settings::{self, SettingsStore};

pub const MENU_TITLE: &str = "LaTeX";
pub const SETTINGS_TITLE: &str = "LaTeX settings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub event: EditorEvent,
}

/// 尺寸设置表单：一个下拉框 + 保存按钮。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsForm {
    pub title: String,
    pub options: Vec<DisplaySize>,
    pub selected: DisplaySize,
}

/// 文档打开时注册到宿主的菜单项。
pub fn menu() -> Vec<MenuItem> {
    vec![
        MenuItem {
            label: "Insert LaTeX expression",
            event: EditorEvent::OpenDialog,
        },
        MenuItem {
            label: "Settings",
            event: EditorEvent::OpenSettings,
        },
    ]
}

impl<S: SettingsStore, F: ImageFetcher> FormulaEditor<S, F> {
    /// 构建尺寸设置表单，默认选中当前偏好。
    pub fn settings_form(&self) -> Result<SettingsForm, AppError> {
        Ok(SettingsForm {
            title: SETTINGS_TITLE.to_string(),
            options: settings::font_sizes(),
            selected: settings::latex_font_size(&self.settings)?,
        })
    }

    /// 保存尺寸偏好，后续插入的公式使用新尺寸。
    pub fn save_settings(&mut self, size: DisplaySize) -> Result<(), AppError> {
        settings::set_latex_font_size(&mut self.settings, size)
    }
}
