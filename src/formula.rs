//! # 公式与显示尺寸
//!
//! ## 设计思路
//!
//! 公式本身是不透明文本，不做任何 LaTeX 校验；这里只负责两件事：
//! - `DisplaySize`：渲染服务可识别的 8 个固定尺寸档位（有序、大小写敏感）
//! - 空白归一化：把换行折叠为空格，保证公式可以放进单段 URL
//!
//! ## 实现思路
//!
//! - 档位字符串与 LaTeX 命令名一一对应（`large` / `Large` / `LARGE` 是三个档位）。
//! - 换行使用预编译正则统一替换，`\r\n`、`\r`、`\n` 都视为一个换行。

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 没有任何历史公式时展示的示例：一个 2×2 线性方程组。
pub const FALLBACK_FORMULA: &str =
    r"\large\left\{\begin{matrix}1x &+& 2x & =3\\ -x &+&y  & =7\end{matrix}\right.";

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid")
});

/// 渲染尺寸档位，顺序即界面下拉框顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DisplaySize {
    #[serde(rename = "tiny")]
    Tiny,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "large")]
    Large,
    /// `\Large`
    #[serde(rename = "Large")]
    Larger,
    /// `\LARGE`
    #[serde(rename = "LARGE")]
    Largest,
    #[serde(rename = "huge")]
    Huge,
    /// `\Huge`
    #[default]
    #[serde(rename = "Huge")]
    Huger,
}

impl DisplaySize {
    /// 全部档位，按固定顺序排列。
    pub const ALL: [DisplaySize; 8] = [
        DisplaySize::Tiny,
        DisplaySize::Small,
        DisplaySize::Normal,
        DisplaySize::Large,
        DisplaySize::Larger,
        DisplaySize::Largest,
        DisplaySize::Huge,
        DisplaySize::Huger,
    ];

    /// 档位对应的 LaTeX 命令名（不含反斜杠）。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Normal => "normal",
            Self::Large => "large",
            Self::Larger => "Large",
            Self::Largest => "LARGE",
            Self::Huge => "huge",
            Self::Huger => "Huge",
        }
    }

    /// 拼接到公式前面的尺寸指令，例如 `\Huge\!`。
    ///
    /// 末尾的 `\!` 是负细空格，抵消尺寸命令后面多出的间距。
    pub fn directive(self) -> String {
        format!("\\{}\\!", self.as_str())
    }
}

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplaySize {
    type Err = AppError;

    /// 解析档位名称。大小写敏感，只去掉首尾空白。
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == trimmed)
            .ok_or_else(|| {
                AppError::InvalidSize(format!(
                    "{}（可选：tiny / small / normal / large / Large / LARGE / huge / Huge）",
                    trimmed
                ))
            })
    }
}

/// 将公式中的换行折叠为单个空格，其余字符原样保留。
pub fn normalize_whitespace(formula: &str) -> String {
    LINE_BREAKS.replace_all(formula, " ").into_owned()
}
