//! 内存文档：正文 → 段落 → 文本 / 内联图片 的两层树。
//!
//! 光标与选区互斥：设置选区会清空光标，移动光标会清空选区。

use std::collections::HashMap;

use super::{Attributes, Document, ElementId, Position};
use crate::error::AppError;
use crate::renderer::RenderedImage;

/// 元素类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Body,
    Paragraph,
    Text(String),
    InlineImage {
        mime_type: String,
        width: u32,
        height: u32,
        byte_len: usize,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: ElementKind,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: Attributes,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: HashMap<ElementId, Node>,
    body: ElementId,
    next_id: u64,
    cursor: Option<Position>,
    selection: Vec<ElementId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// 只有空正文的文档。
    pub fn new() -> Self {
        let body = ElementId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                kind: ElementKind::Body,
                parent: None,
                children: Vec::new(),
                attributes: Attributes::new(),
            },
        );

        Self {
            nodes,
            body,
            next_id: 1,
            cursor: None,
            selection: Vec::new(),
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// 在正文末尾追加一个空段落。
    pub fn append_paragraph(&mut self) -> ElementId {
        let body = self.body;
        self.attach(ElementKind::Paragraph, body, usize::MAX)
    }

    /// 在段落末尾追加一段文本。
    pub fn append_text(&mut self, paragraph: ElementId, text: &str) -> Result<ElementId, AppError> {
        self.ensure_paragraph(paragraph)?;
        Ok(self.attach(ElementKind::Text(text.to_string()), paragraph, usize::MAX))
    }

    pub fn kind(&self, element: ElementId) -> Option<&ElementKind> {
        self.nodes.get(&element).map(|node| &node.kind)
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.nodes
            .get(&element)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|node| node.parent)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    /// 按文档顺序列出所有内联图片。
    pub fn inline_images(&self) -> Vec<ElementId> {
        self.document_order()
            .into_iter()
            .filter(|id| matches!(self.kind(*id), Some(ElementKind::InlineImage { .. })))
            .collect()
    }

    /// 选中一组元素，同时清空光标。
    ///
    /// 选区按文档顺序保存，重复元素只保留一次。
    pub fn select(&mut self, elements: Vec<ElementId>) -> Result<(), AppError> {
        if let Some(missing) = elements.iter().find(|id| !self.contains(**id)) {
            return Err(AppError::Document(format!("元素不存在: {}", missing)));
        }
        self.selection = self
            .document_order()
            .into_iter()
            .filter(|id| elements.contains(id))
            .collect();
        self.cursor = None;
        Ok(())
    }

    /// 模拟文档失去焦点：既没有光标也没有选区。
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
        self.selection.clear();
    }

    fn node(&self, element: ElementId) -> Result<&Node, AppError> {
        self.nodes
            .get(&element)
            .ok_or_else(|| AppError::Document(format!("元素不存在: {}", element)))
    }

    fn node_mut(&mut self, element: ElementId) -> Result<&mut Node, AppError> {
        self.nodes
            .get_mut(&element)
            .ok_or_else(|| AppError::Document(format!("元素不存在: {}", element)))
    }

    fn ensure_paragraph(&self, element: ElementId) -> Result<(), AppError> {
        match self.node(element)?.kind {
            ElementKind::Paragraph => Ok(()),
            _ => Err(AppError::Document(format!(
                "元素 {} 不是段落，不能插入内联内容",
                element
            ))),
        }
    }

    /// 创建节点并挂到父元素的 `offset` 处（超出范围时追加到末尾）。
    fn attach(&mut self, kind: ElementKind, parent: ElementId, offset: usize) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            Node {
                kind,
                parent: Some(parent),
                children: Vec::new(),
                attributes: Attributes::new(),
            },
        );

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = offset.min(parent_node.children.len());
            parent_node.children.insert(index, id);
        }

        id
    }

    /// 先序遍历整棵树。
    fn document_order(&self) -> Vec<ElementId> {
        let mut order = Vec::new();
        let mut stack = vec![self.body];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }

        order
    }

    fn is_within(&self, element: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

impl Document for MemoryDocument {
    fn cursor(&self) -> Option<Position> {
        self.cursor
    }

    fn selection(&self) -> Vec<ElementId> {
        self.selection.clone()
    }

    fn insert_inline_image(
        &mut self,
        position: &Position,
        image: &RenderedImage,
    ) -> Result<ElementId, AppError> {
        self.ensure_paragraph(position.element)?;

        let len = self.node(position.element)?.children.len();
        if position.offset > len {
            return Err(AppError::Document(format!(
                "插入位置越界: {} > {}",
                position.offset, len
            )));
        }

        let kind = ElementKind::InlineImage {
            mime_type: image.mime_type.to_string(),
            width: image.width,
            height: image.height,
            byte_len: image.len(),
        };
        Ok(self.attach(kind, position.element, position.offset))
    }

    fn attributes(&self, element: ElementId) -> Result<Attributes, AppError> {
        Ok(self.node(element)?.attributes.clone())
    }

    fn set_attributes(&mut self, element: ElementId, attributes: Attributes) -> Result<(), AppError> {
        self.node_mut(element)?.attributes.extend(attributes);
        Ok(())
    }

    fn remove_element(&mut self, element: ElementId) -> Result<(), AppError> {
        if element == self.body {
            return Err(AppError::Document("不能移除文档正文".to_string()));
        }

        let parent = self.node(element)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != element);
        }

        if let Some(cursor) = self.cursor {
            if self.is_within(cursor.element, element) {
                self.cursor = None;
            }
        }

        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
            }
        }
        let nodes = &self.nodes;
        self.selection.retain(|id| nodes.contains_key(id));

        Ok(())
    }

    fn container_of(&self, element: ElementId) -> Result<Option<ElementId>, AppError> {
        Ok(self.node(element)?.parent)
    }

    fn position_of(&self, element: ElementId) -> Result<Position, AppError> {
        let parent = self
            .node(element)?
            .parent
            .ok_or_else(|| AppError::Document("文档正文没有父元素".to_string()))?;

        let offset = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == element)
            .ok_or_else(|| AppError::Document(format!("元素 {} 已脱离父元素", element)))?;

        Ok(Position { element: parent, offset })
    }

    fn set_cursor(&mut self, position: Position) -> Result<(), AppError> {
        let len = self.node(position.element)?.children.len();
        if position.offset > len {
            return Err(AppError::Document(format!(
                "光标位置越界: {} > {}",
                position.offset, len
            )));
        }

        self.cursor = Some(position);
        self.selection.clear();
        Ok(())
    }
}
