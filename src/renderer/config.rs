//! # 下载配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `FetchConfig`，保证运行时行为可观测、可调整、可测试。
//! 配置可以从 JSON 配置文件整体或部分覆盖，缺失字段使用默认值。

use serde::{Deserialize, Serialize};

use super::FetchError;

/// 渲染图片下载配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 整个请求的超时时间（秒）。
    pub timeout_secs: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout_secs: u64,
    /// 渲染结果允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 渲染缓存条目上限，0 表示关闭缓存。
    pub cache_capacity: usize,
    /// 渲染缓存有效期（秒）。
    pub cache_ttl_secs: u64,
    /// 请求使用的 User-Agent。
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 8,
            max_file_size: 5 * 1024 * 1024,
            max_redirects: 5,
            cache_capacity: 32,
            cache_ttl_secs: 300,
            user_agent: concat!("latex-insert/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    /// 校验取值范围，非法配置在创建下载器时即失败。
    pub fn validate(&self) -> Result<(), FetchError> {
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(FetchError::InvalidFormat("timeout_secs 必须在 1~300 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(FetchError::InvalidFormat("connect_timeout_secs 必须在 1~120 秒之间".to_string()));
        }
        if self.connect_timeout_secs > self.timeout_secs {
            return Err(FetchError::InvalidFormat("connect_timeout_secs 不能大于 timeout_secs".to_string()));
        }
        if self.max_file_size < 1024 {
            return Err(FetchError::InvalidFormat("max_file_size 不能小于 1KB".to_string()));
        }
        if self.max_redirects > 20 {
            return Err(FetchError::InvalidFormat("max_redirects 不能超过 20".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(FetchError::InvalidFormat("user_agent 不能为空".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        FetchConfig::default().validate().expect("default config should be valid");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = FetchConfig::default();
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(FetchError::InvalidFormat(_))));

        let mut config = FetchConfig::default();
        config.connect_timeout_secs = 60;
        config.timeout_secs = 10;
        assert!(matches!(config.validate(), Err(FetchError::InvalidFormat(_))));

        let mut config = FetchConfig::default();
        config.max_file_size = 10;
        assert!(matches!(config.validate(), Err(FetchError::InvalidFormat(_))));

        let mut config = FetchConfig::default();
        config.user_agent = "  ".to_string();
        assert!(matches!(config.validate(), Err(FetchError::InvalidFormat(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: FetchConfig =
            serde_json::from_str(r#"{"timeout_secs": 12}"#).expect("parse partial config");

        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.connect_timeout_secs, FetchConfig::default().connect_timeout_secs);
        assert_eq!(config.cache_capacity, 32);
    }
}
