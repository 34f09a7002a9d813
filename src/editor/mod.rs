//! # 编辑器流程模块（editor）
//!
//! ## 设计思路
//!
//! `FormulaEditor` 把宿主回调（打开菜单、打开公式表单、保存公式、尺寸设置）
//! 收拢为普通方法，依赖全部通过泛型注入：
//! - `S: SettingsStore`：尺寸偏好与最近公式
//! - `F: ImageFetcher`：渲染图片下载
//! - `D: Document`：每次调用时传入的目标文档
//!
//! 宿主事件用 `EditorEvent` 枚举表示，`handle` 统一分发，不再按字符串名字查找回调。
//!
//! ## 调用链
//!
//! ```text
//! 宿主菜单 / 表单按钮
//!    ↓ EditorEvent
//! handle
//!    ├─ OpenDialog   → dialog.rs  open_dialog
//!    ├─ SaveFormula  → save.rs    save_formula（NoCursor 转为 Alert）
//!    ├─ OpenSettings → menu.rs    settings_form
//!    └─ SaveSettings → menu.rs    save_settings
//!    ↓
//! EditorResponse 返回给宿主渲染
//! ```

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::AppError;
use crate::formula::DisplaySize;
use crate::locator::RenderService;
use crate::renderer::ImageFetcher;
use crate::settings::SettingsStore;

mod dialog;
mod menu;
mod save;

pub use dialog::{DIALOG_TITLE, FormulaForm, FormulaSource};
pub use menu::{MENU_TITLE, MenuItem, SETTINGS_TITLE, SettingsForm, menu};
pub use save::InsertedFormula;

/// 宿主发来的用户操作。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    OpenDialog,
    SaveFormula { formula: String },
    OpenSettings,
    SaveSettings { size: DisplaySize },
}

/// 交给宿主展示的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorResponse {
    ShowDialog(FormulaForm),
    Inserted(InsertedFormula),
    ShowSettings(SettingsForm),
    SettingsSaved { size: DisplaySize },
    /// 需要弹窗提示用户的可恢复问题。
    Alert { message: String },
}

/// 公式插入编辑器。
pub struct FormulaEditor<S, F> {
    settings: S,
    fetcher: F,
    service: RenderService,
}

impl<S: SettingsStore, F: ImageFetcher> FormulaEditor<S, F> {
    pub fn new(settings: S, fetcher: F, service: RenderService) -> Self {
        Self {
            settings,
            fetcher,
            service,
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn service(&self) -> &RenderService {
        &self.service
    }

    /// 分发宿主事件。
    ///
    /// 没有光标时返回 `Alert` 而不是错误；渲染失败等其余错误原样返回给调用方。
    pub async fn handle<D: Document>(
        &mut self,
        doc: &mut D,
        event: EditorEvent,
    ) -> Result<EditorResponse, AppError> {
        match event {
            EditorEvent::OpenDialog => self.open_dialog(doc).map(EditorResponse::ShowDialog),
            EditorEvent::SaveFormula { formula } => match self.save_formula(doc, &formula).await {
                Ok(inserted) => Ok(EditorResponse::Inserted(inserted)),
                Err(AppError::NoCursor) => {
                    log::warn!("⚠️ 保存公式时文档中没有光标");
                    Ok(EditorResponse::Alert {
                        message: AppError::NoCursor.to_string(),
                    })
                }
                Err(err) => Err(err),
            },
            EditorEvent::OpenSettings => self.settings_form().map(EditorResponse::ShowSettings),
            EditorEvent::SaveSettings { size } => {
                self.save_settings(size)?;
                Ok(EditorResponse::SettingsSaved { size })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::document::{LINK_URL_ATTRIBUTE, MemoryDocument, Position};
    use crate::formula::FALLBACK_FORMULA;
    use crate::renderer::{FetchError, RenderedImage, create_png_bytes};
    use crate::settings::{self, MemorySettingsStore};

    /// 不联网的下载器：记录请求的 URL，按预设返回图片或网络错误。
    struct FakeFetcher {
        image: Option<RenderedImage>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn ok() -> Self {
            Self {
                image: Some(RenderedImage::from_bytes(create_png_bytes(6, 3)).expect("valid png")),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                image: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<RenderedImage, FetchError> {
            self.requests.lock().expect("requests lock").push(url.to_string());
            self.image
                .clone()
                .ok_or_else(|| FetchError::Network("无法连接渲染服务".to_string()))
        }
    }

    fn editor(fetcher: FakeFetcher) -> FormulaEditor<MemorySettingsStore, FakeFetcher> {
        FormulaEditor::new(MemorySettingsStore::new(), fetcher, RenderService::default())
    }

    /// 一个段落：文本 "a" + 光标 + 文本 "b"。
    fn doc_with_cursor() -> (MemoryDocument, crate::document::ElementId) {
        let mut doc = MemoryDocument::new();
        let paragraph = doc.append_paragraph();
        doc.append_text(paragraph, "a").expect("append a");
        doc.append_text(paragraph, "b").expect("append b");
        doc.set_cursor(Position { element: paragraph, offset: 1 }).expect("set cursor");
        (doc, paragraph)
    }

    #[test]
    fn menu_offers_dialog_and_settings() {
        let items = menu();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Insert LaTeX expression");
        assert_eq!(items[0].event, EditorEvent::OpenDialog);
        assert_eq!(items[1].event, EditorEvent::OpenSettings);
    }

    #[test]
    fn dialog_uses_fallback_without_history_or_selection() {
        let editor = editor(FakeFetcher::ok());
        let (doc, _) = doc_with_cursor();

        let form = editor.open_dialog(&doc).expect("open dialog");

        assert_eq!(form.title, DIALOG_TITLE);
        assert_eq!(form.formula, FALLBACK_FORMULA);
        assert_eq!(form.source, FormulaSource::Fallback);
    }

    #[tokio::test]
    async fn dialog_prefers_latest_formula_over_fallback() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, _) = doc_with_cursor();

        editor.save_formula(&mut doc, "a^2").await.expect("save formula");

        let form = editor.open_dialog(&doc).expect("open dialog");
        assert_eq!(form.formula, "a^2");
        assert_eq!(form.source, FormulaSource::Latest);
    }

    #[tokio::test]
    async fn save_inserts_image_with_link_attribute_at_cursor() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, paragraph) = doc_with_cursor();

        let inserted = editor.save_formula(&mut doc, "x^2+y^2=1").await.expect("save formula");

        assert_eq!(doc.children(paragraph)[1], inserted.element);
        assert_eq!(inserted.size, DisplaySize::Huger);

        let attributes = doc.attributes(inserted.element).expect("read attributes");
        assert_eq!(
            attributes.get(LINK_URL_ATTRIBUTE),
            Some(&RenderService::default().encode("x^2+y^2=1", DisplaySize::Huger).link)
        );
        assert_eq!(editor.fetcher.requests(), vec![inserted.locators.image.clone()]);
        assert_eq!(
            settings::latest_formula(editor.settings()).expect("read latest").as_deref(),
            Some("x^2+y^2=1")
        );
    }

    #[tokio::test]
    async fn save_uses_persisted_size() {
        let mut editor = editor(FakeFetcher::ok());
        editor.save_settings(DisplaySize::Small).expect("save size");
        let (mut doc, _) = doc_with_cursor();

        let inserted = editor.save_formula(&mut doc, "z").await.expect("save formula");

        assert_eq!(inserted.size, DisplaySize::Small);
        assert!(inserted.locators.image.contains("%5Csmall%5C%21z"));
    }

    #[tokio::test]
    async fn editing_selected_formula_replaces_exactly_the_selection() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, paragraph) = doc_with_cursor();
        let first = editor.save_formula(&mut doc, r"\alpha").await.expect("insert first");
        let keep = doc.append_text(paragraph, "tail").expect("append tail");

        doc.select(vec![first.element]).expect("select formula");
        let form = editor.open_dialog(&doc).expect("open dialog");
        assert_eq!(form.formula, r"\alpha");
        assert_eq!(form.source, FormulaSource::Selection);

        let second = editor.save_formula(&mut doc, r"\beta").await.expect("replace formula");

        assert!(!doc.contains(first.element));
        assert_eq!(doc.inline_images(), vec![second.element]);
        assert_eq!(doc.children(paragraph).len(), 4);
        assert!(doc.children(paragraph).contains(&keep));
        assert_eq!(doc.position_of(second.element).expect("position").offset, 1);

        let cursor = doc.cursor().expect("cursor after replace");
        assert_eq!(cursor.element, paragraph);
        assert!(doc.selection().is_empty());
    }

    #[tokio::test]
    async fn dialog_recovers_formula_encoded_with_another_size() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, _) = doc_with_cursor();
        editor.save_settings(DisplaySize::Large).expect("save size");
        let inserted = editor.save_formula(&mut doc, "x^2+y^2=1").await.expect("save formula");

        editor.save_settings(DisplaySize::Huger).expect("change size");
        doc.select(vec![inserted.element]).expect("select formula");

        let form = editor.open_dialog(&doc).expect("open dialog");
        assert_eq!(form.formula, "x^2+y^2=1");
    }

    #[tokio::test]
    async fn save_without_cursor_alerts_and_persists_nothing() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, _) = doc_with_cursor();
        doc.clear_cursor();

        let response = editor
            .handle(&mut doc, EditorEvent::SaveFormula { formula: "x".to_string() })
            .await
            .expect("handle save");

        assert_eq!(
            response,
            EditorResponse::Alert { message: AppError::NoCursor.to_string() }
        );
        assert!(editor.fetcher.requests().is_empty());
        assert_eq!(settings::latest_formula(editor.settings()).expect("read latest"), None);
        assert!(doc.inline_images().is_empty());
    }

    #[tokio::test]
    async fn failed_render_keeps_selected_formula() {
        let mut editor = editor(FakeFetcher::unreachable());
        let mut doc = MemoryDocument::new();
        let paragraph = doc.append_paragraph();
        let image = RenderedImage::from_bytes(create_png_bytes(2, 2)).expect("valid png");
        let old = doc
            .insert_inline_image(&Position { element: paragraph, offset: 0 }, &image)
            .expect("insert old image");
        doc.select(vec![old]).expect("select old image");

        let result = editor
            .handle(&mut doc, EditorEvent::SaveFormula { formula: "y".to_string() })
            .await;

        assert!(matches!(result, Err(AppError::Render(FetchError::Network(_)))));
        assert!(doc.contains(old));
        assert_eq!(doc.selection(), vec![old]);
    }

    #[tokio::test]
    async fn selecting_image_and_its_paragraph_fails_without_touching_document() {
        let mut editor = editor(FakeFetcher::ok());
        let mut doc = MemoryDocument::new();
        let paragraph = doc.append_paragraph();
        let image = RenderedImage::from_bytes(create_png_bytes(2, 2)).expect("valid png");
        let old = doc
            .insert_inline_image(&Position { element: paragraph, offset: 0 }, &image)
            .expect("insert old image");
        doc.select(vec![old, paragraph]).expect("select image and paragraph");

        let result = editor.save_formula(&mut doc, "y").await;

        assert!(matches!(result, Err(AppError::Document(_))));
        assert!(doc.contains(paragraph));
        assert!(doc.contains(old));
        assert_eq!(doc.inline_images(), vec![old]);
        assert_eq!(doc.children(doc.body()), &[paragraph]);
        assert_eq!(doc.selection(), vec![paragraph, old]);
    }

    #[tokio::test]
    async fn selecting_same_image_twice_replaces_it_once() {
        let mut editor = editor(FakeFetcher::ok());
        let (mut doc, paragraph) = doc_with_cursor();
        let first = editor.save_formula(&mut doc, "a").await.expect("insert first");
        doc.select(vec![first.element, first.element]).expect("select twice");

        let second = editor.save_formula(&mut doc, "b").await.expect("replace formula");

        assert!(!doc.contains(first.element));
        assert_eq!(doc.inline_images(), vec![second.element]);
        assert_eq!(
            doc.cursor(),
            Some(Position { element: paragraph, offset: 2 })
        );
    }

    #[tokio::test]
    async fn settings_events_roundtrip_through_handle() {
        let mut editor = editor(FakeFetcher::ok());
        let mut doc = MemoryDocument::new();

        let response = editor
            .handle(&mut doc, EditorEvent::OpenSettings)
            .await
            .expect("open settings");
        let EditorResponse::ShowSettings(form) = response else {
            panic!("expected settings form");
        };
        assert_eq!(form.options, DisplaySize::ALL.to_vec());
        assert_eq!(form.selected, DisplaySize::Huger);

        let response = editor
            .handle(&mut doc, EditorEvent::SaveSettings { size: DisplaySize::Largest })
            .await
            .expect("save settings");
        assert_eq!(response, EditorResponse::SettingsSaved { size: DisplaySize::Largest });
        assert_eq!(
            editor.settings_form().expect("settings form").selected,
            DisplaySize::Largest
        );
    }

    #[test]
    fn events_deserialize_from_host_json() {
        let event: EditorEvent =
            serde_json::from_str(r#"{"type":"save_settings","size":"LARGE"}"#).expect("parse event");
        assert_eq!(event, EditorEvent::SaveSettings { size: DisplaySize::Largest });

        let event: EditorEvent =
            serde_json::from_str(r#"{"type":"save_formula","formula":"\\pi"}"#).expect("parse event");
        assert_eq!(event, EditorEvent::SaveFormula { formula: r"\pi".to_string() });
    }
}
