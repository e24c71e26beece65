// ==========================================
// 图书馆流通管理系统 - 配置管理器
// ==========================================
// 职责: 流通规则与导入配置的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 说明: 配置读取不做缓存，引擎每次操作现读现用，
//       修改配置即刻对下一次流通操作生效
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 建表（幂等）
    fn ensure_table(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 列出 global scope 的全部配置（按键排序）
    pub fn list_global_configs(&self) -> Result<Vec<(String, String)>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    }

    /// 从 config_kv 表读取配置值，带默认值
    ///
    /// # 参数
    /// - key: 配置键
    /// - default: 默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    // ===== 流通规则配置 =====

    /// 获取借期天数
    ///
    /// # 返回
    /// - i64: 借期天数（默认 14）
    pub fn get_loan_period_days(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOAN_PERIOD_DAYS, "14")?;
        Ok(value.parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::LOAN_PERIOD_DAYS,
                raw_value = %value,
                "借期配置格式错误，使用默认值 14"
            );
            14
        }))
    }

    /// 获取逾期罚款金额
    ///
    /// # 返回
    /// - f64: 罚款金额（默认 5.00）
    pub fn get_overdue_fine_amount(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::OVERDUE_FINE_AMOUNT, "5.00")?;
        Ok(value.parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::OVERDUE_FINE_AMOUNT,
                raw_value = %value,
                "罚款金额配置格式错误，使用默认值 5.00"
            );
            5.0
        }))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_import_default_copies(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::IMPORT_DEFAULT_COPIES, "1")?;
        Ok(value.parse::<i64>().unwrap_or(1))
    }

    async fn get_import_year_min(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::IMPORT_YEAR_MIN, "1450")?;
        Ok(value.parse::<i32>().unwrap_or(1450))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 流通规则
    pub const LOAN_PERIOD_DAYS: &str = "loan_period_days";
    pub const OVERDUE_FINE_AMOUNT: &str = "overdue_fine_amount";

    // 目录导入
    pub const IMPORT_DEFAULT_COPIES: &str = "import_default_copies";
    pub const IMPORT_YEAR_MIN: &str = "import_year_min";
}
