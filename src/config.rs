//! 应用配置：渲染服务地址、下载策略、设置数据库位置。
//!
//! 配置文件是可选的 JSON，缺失或损坏时整体回退到默认值并记录警告，
//! 不阻止程序启动。

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::locator::RenderService;
use crate::renderer::FetchConfig;

/// 设置数据库的默认文件名。
pub const SETTINGS_DB_FILE: &str = "settings.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: RenderService,
    pub fetch: FetchConfig,
    /// 自定义设置数据库目录，为空时使用数据目录。
    pub settings_db: Option<String>,
}

impl AppConfig {
    /// 从 JSON 文件加载配置，文件不存在或格式错误时返回默认配置。
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("配置文件不存在，使用默认配置: {}", path.display());
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("⚠️ 读取配置文件失败，使用默认配置: {} ({})", path.display(), err);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("⚠️ 配置文件格式错误，使用默认配置: {} ({})", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// 计算设置数据库路径：优先使用配置的目录（会自动创建），否则落在 `data_dir`。
    pub fn resolve_settings_db_path(&self, data_dir: &Path) -> Result<PathBuf, AppError> {
        if let Some(dir) = self.settings_db.as_deref().filter(|dir| !dir.is_empty()) {
            let dir_path = PathBuf::from(dir);
            fs::create_dir_all(&dir_path).map_err(|e| {
                AppError::Config(format!("创建设置数据库目录失败: {}", e))
            })?;
            return Ok(dir_path.join(SETTINGS_DB_FILE));
        }
        Ok(data_dir.join(SETTINGS_DB_FILE))
    }
}

/// 平台数据目录（Linux 下为 `~/.local/share/latex-insert`）。
pub fn default_data_dir() -> Result<PathBuf, AppError> {
    ProjectDirs::from("", "", "latex-insert")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| AppError::Config("无法确定用户数据目录".to_string()))
}

/// 平台配置文件路径。
pub fn default_config_path() -> Result<PathBuf, AppError> {
    ProjectDirs::from("", "", "latex-insert")
        .map(|dirs| dirs.config_dir().join("config.json"))
        .ok_or_else(|| AppError::Config("无法确定用户配置目录".to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("latex-insert-config-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let dir = unique_temp_dir();
        let config_path = dir.join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.service.image_prefix = "http://127.0.0.1:9000/img/".to_string();
        config.fetch.cache_capacity = 0;
        config.settings_db = Some("/tmp/latex-insert-db".to_string());
        config.save_to_path(&config_path).expect("save config");

        assert_eq!(AppConfig::load_from_path(&config_path), config);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_or_bad_config_falls_back_to_default() {
        let dir = unique_temp_dir();
        let config_path = dir.join("config.json");
        assert_eq!(AppConfig::load_from_path(&config_path), AppConfig::default());

        std::fs::write(&config_path, "not-json").expect("write invalid config");
        assert_eq!(AppConfig::load_from_path(&config_path), AppConfig::default());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = unique_temp_dir();
        let config_path = dir.join("config.json");
        std::fs::write(&config_path, r#"{"service":{"image_suffix":".png"}}"#)
            .expect("write partial config");

        let loaded = AppConfig::load_from_path(&config_path);
        assert_eq!(loaded.service.image_suffix, ".png");
        assert_eq!(loaded.service.image_prefix, RenderService::default().image_prefix);
        assert_eq!(loaded.fetch, FetchConfig::default());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn resolve_settings_db_prefers_configured_dir_or_data_dir() {
        let dir = unique_temp_dir();
        let data_dir = dir.join("data");

        let default_config = AppConfig::default();
        assert_eq!(
            default_config.resolve_settings_db_path(&data_dir).expect("resolve default"),
            data_dir.join(SETTINGS_DB_FILE)
        );

        let custom_dir = dir.join("custom");
        let custom_config = AppConfig {
            settings_db: Some(custom_dir.to_string_lossy().to_string()),
            ..AppConfig::default()
        };
        let resolved = custom_config.resolve_settings_db_path(&data_dir).expect("resolve custom");
        assert_eq!(resolved, custom_dir.join(SETTINGS_DB_FILE));
        assert!(custom_dir.exists());

        let empty_config = AppConfig {
            settings_db: Some(String::new()),
            ..AppConfig::default()
        };
        assert_eq!(
            empty_config.resolve_settings_db_path(&data_dir).expect("resolve empty"),
            data_dir.join(SETTINGS_DB_FILE)
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
