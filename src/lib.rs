//! # LaTeX 公式插入工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           宿主（文档编辑器菜单 / 表单 / 命令行）          │
//! │                                                          │
//! │   菜单项 ── 公式表单 ── 尺寸设置表单                     │
//! │       │  EditorEvent                                     │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↓  Result<EditorResponse, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            核心库 (Rust)                         │
//! │                                                          │
//! │  ┌─ editor ───── FormulaEditor（流程编排）               │
//! │  │   ├─ dialog     预填公式：选区 → 最近公式 → 示例      │
//! │  │   ├─ save       渲染 → 插入 → 替换选区                │
//! │  │   └─ menu       菜单 + 尺寸设置                       │
//! │  │                                                       │
//! │  ├─ locator ──── 公式 ⇄ 定位串（百分号转义）             │
//! │  ├─ formula ──── 显示尺寸 + 示例公式 + 换行折叠          │
//! │  ├─ renderer ─── reqwest 下载 + 签名校验 + LRU 缓存      │
//! │  ├─ settings ─── 尺寸偏好 / 最近公式（SQLite / 内存）     │
//! │  ├─ document ─── 宿主文档接口 + 内存文档                 │
//! │  ├─ config ───── JSON 配置 + 数据目录                    │
//! │  └─ error ────── AppError (统一错误类型)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`formula`] | `DisplaySize` 八种尺寸、示例公式、换行规整 |
//! | [`locator`] | `RenderService` 生成 / 解析图片与链接定位串 |
//! | [`renderer`] | `ImageFetcher` 抽象与基于 reqwest 的 `HttpFetcher` |
//! | [`settings`] | `SettingsStore` 抽象、SQLite 与内存实现、偏好读写 |
//! | [`document`] | `Document` 抽象（光标、选区、内联图片、属性）与 `MemoryDocument` |
//! | [`editor`] | `FormulaEditor`：菜单、表单、保存流程、事件分发 |
//! | [`config`] | `AppConfig` 加载与设置数据库路径解析 |

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod formula;
pub mod locator;
pub mod renderer;
pub mod settings;
