//! SQLite 设置存储子模块
//!
//! ## 职责
//! - 打开/创建设置数据库并初始化 schema
//! - 按作用域（user / document）隔离键值
//! - 拒绝打开更高版本写入的数据库
//!
//! ## 错误语义
//! - 打开、DDL、读写失败统一映射为 `AppError::Settings`

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::{SettingsScope, SettingsStore};
use crate::error::AppError;

const SCHEMA_VERSION: i64 = 1;

/// 以 SQLite 为后端的设置存储。
pub struct SqliteSettingsStore {
    conn: Connection,
    scope: SettingsScope,
}

impl SqliteSettingsStore {
    /// 打开（必要时创建）设置数据库文件。
    pub fn open(path: &Path, scope: SettingsScope) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Settings(format!("创建设置目录失败: {}", e))
                })?;
            }
        }
        log::info!("设置数据库路径: {}", path.display());

        let conn = Connection::open(path)
            .map_err(|e| AppError::Settings(format!("打开设置数据库失败: {}", e)))?;
        Self::with_connection(conn, scope)
    }

    /// 内存数据库，进程结束即丢弃。
    pub fn open_in_memory(scope: SettingsScope) -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Settings(format!("创建内存设置数据库失败: {}", e)))?;
        Self::with_connection(conn, scope)
    }

    fn with_connection(conn: Connection, scope: SettingsScope) -> Result<Self, AppError> {
        initialize_schema(&conn)?;
        Ok(Self { conn, scope })
    }

    pub fn scope(&self) -> SettingsScope {
        self.scope
    }

    /// 切换到同一数据库的另一个作用域。
    pub fn with_scope(self, scope: SettingsScope) -> Self {
        Self { scope, ..self }
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.conn
            .query_row(
                "SELECT value FROM properties WHERE scope = ?1 AND key = ?2",
                params![self.scope.as_str(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| AppError::Settings(format!("读取设置 '{}' 失败: {}", key, e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn
            .execute(
                "INSERT INTO properties (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![self.scope.as_str(), key, value, now],
            )
            .map_err(|e| AppError::Settings(format!("写入设置 '{}' 失败: {}", key, e)))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.conn
            .execute(
                "DELETE FROM properties WHERE scope = ?1 AND key = ?2",
                params![self.scope.as_str(), key],
            )
            .map_err(|e| AppError::Settings(format!("删除设置 '{}' 失败: {}", key, e)))?;
        Ok(())
    }
}

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Settings(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Settings(format!("写入数据库版本失败: {}", e)))
}

fn create_base_tables(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS properties (
            scope TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (scope, key)
        );"
    ).map_err(|e| AppError::Settings(format!("创建设置表失败: {}", e)))
}

fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

    create_base_tables(conn)?;

    let version = get_user_version(conn)?;
    if version == 0 {
        set_user_version(conn, SCHEMA_VERSION)?;
        return Ok(());
    }

    if version != SCHEMA_VERSION {
        return Err(AppError::Settings(format!(
            "设置数据库版本不匹配: current={}, expected={}",
            version, SCHEMA_VERSION
        )));
    }

    Ok(())
}
