//! # 文档接口模块
//!
//! ## 设计思路
//!
//! 宿主文档（光标、选区、内联图片、元素属性）是外部协作方，这里只定义编辑器
//! 流程需要的最小接口 `Document`，以及一份内存实现 `MemoryDocument`。
//!
//! 位置统一表示为“容器元素 + 子节点下标”，与宿主文档 API 的 Position 语义一致：
//! - 光标：`Position { element: 段落, offset: 插入下标 }`
//! - 元素位置：`position_of(el)` 返回 `(父元素, el 在父元素中的下标)`

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::renderer::RenderedImage;

mod memory;

pub use memory::{ElementKind, MemoryDocument};

/// 插入的公式图片上保存链接定位串的属性名。
pub const LINK_URL_ATTRIBUTE: &str = "LINK_URL";

/// 元素的自定义属性表。
pub type Attributes = BTreeMap<String, String>;

/// 文档元素句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 文档中的一个插入点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 容器元素。
    pub element: ElementId,
    /// 容器内的子节点下标。
    pub offset: usize,
}

/// 编辑器流程依赖的宿主文档接口。
pub trait Document {
    /// 当前光标；有选区或文档未聚焦时可能为空。
    fn cursor(&self) -> Option<Position>;

    /// 当前选中的元素，按文档顺序且不重复；没有选区时为空。
    fn selection(&self) -> Vec<ElementId>;

    /// 在指定位置插入内联图片，返回新元素句柄。
    ///
    /// 容器不允许插入内联内容时返回 `AppError::Document`。
    fn insert_inline_image(
        &mut self,
        position: &Position,
        image: &RenderedImage,
    ) -> Result<ElementId, AppError>;

    /// 读取元素的自定义属性。
    fn attributes(&self, element: ElementId) -> Result<Attributes, AppError>;

    /// 合并写入元素的自定义属性。
    fn set_attributes(&mut self, element: ElementId, attributes: Attributes) -> Result<(), AppError>;

    /// 从文档中移除元素（连同子节点）。
    fn remove_element(&mut self, element: ElementId) -> Result<(), AppError>;

    /// 元素的父元素；文档正文没有父元素，返回 `None`。
    fn container_of(&self, element: ElementId) -> Result<Option<ElementId>, AppError>;

    /// 元素所在的父元素与下标。
    fn position_of(&self, element: ElementId) -> Result<Position, AppError>;

    /// 移动光标，同时清空选区。
    fn set_cursor(&mut self, position: Position) -> Result<(), AppError>;
}
