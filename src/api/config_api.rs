// ==========================================
// 图书馆流通管理系统 - 配置管理 API
// ==========================================
// 职责: 流通配置的查询与更新（借期/罚款额/导入参数）
// 红线: 写入前做键与值校验，拒绝无法解析的规则值入库
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 配置查询（全部、单个）
/// 2. 配置更新（带键与值校验）
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有配置
    ///
    /// # 返回
    /// - Ok(Vec<ConfigItem>): 配置列表（按键名排序）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let items = self
            .config_manager
            .list_global_configs()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect();
        Ok(items)
    }

    /// 查询单个配置
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Ok(Some(ConfigItem)): 配置项
    /// - Ok(None): 该键尚未设置（引擎将使用内置默认值）
    pub fn get_config(&self, key: &str) -> ApiResult<Option<ConfigItem>> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }

        let value = self
            .config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(value.map(|value| ConfigItem {
            key: key.to_string(),
            value,
        }))
    }

    /// 更新配置
    ///
    /// 只接受已知配置键，且值必须能按该键的类型解析；
    /// 更新对后续流通操作即时生效。
    ///
    /// # 参数
    /// - key: 配置键
    /// - value: 配置值（文本形式）
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let _perf = crate::perf::PerfGuard::new("api.update_config");

        // 参数验证
        let key = key.trim();
        if key.is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(ApiError::InvalidInput("配置值不能为空".to_string()));
        }
        Self::validate_value(key, value)?;

        self.config_manager
            .set_global_config_value(key, value)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        info!(key = %key, value = %value, "配置更新");
        Ok(())
    }

    /// 按键类型校验配置值
    fn validate_value(key: &str, value: &str) -> ApiResult<()> {
        match key {
            config_keys::LOAN_PERIOD_DAYS => {
                let days: i64 = value.parse().map_err(|_| {
                    ApiError::InvalidInput(format!("借期天数必须为整数: {}", value))
                })?;
                if days < 0 {
                    return Err(ApiError::InvalidInput(format!(
                        "借期天数不能为负: {}",
                        days
                    )));
                }
            }
            config_keys::OVERDUE_FINE_AMOUNT => {
                let amount: f64 = value.parse().map_err(|_| {
                    ApiError::InvalidInput(format!("罚款金额必须为数字: {}", value))
                })?;
                if amount < 0.0 {
                    return Err(ApiError::InvalidInput(format!(
                        "罚款金额不能为负: {}",
                        amount
                    )));
                }
            }
            config_keys::IMPORT_DEFAULT_COPIES => {
                let copies: i64 = value.parse().map_err(|_| {
                    ApiError::InvalidInput(format!("默认入库册数必须为整数: {}", value))
                })?;
                if copies < 0 {
                    return Err(ApiError::InvalidInput(format!(
                        "默认入库册数不能为负: {}",
                        copies
                    )));
                }
            }
            config_keys::IMPORT_YEAR_MIN => {
                value.parse::<i32>().map_err(|_| {
                    ApiError::InvalidInput(format!("出版年下限必须为整数: {}", value))
                })?;
            }
            unknown => {
                return Err(ApiError::InvalidInput(format!(
                    "未知配置键: {}（可用键: {}, {}, {}, {}）",
                    unknown,
                    config_keys::LOAN_PERIOD_DAYS,
                    config_keys::OVERDUE_FINE_AMOUNT,
                    config_keys::IMPORT_DEFAULT_COPIES,
                    config_keys::IMPORT_YEAR_MIN,
                )));
            }
        }
        Ok(())
    }
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 配置项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    /// 配置键
    pub key: String,

    /// 配置值
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn new_api() -> ConfigApi {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        ConfigApi::new(Arc::new(ConfigManager::from_connection(conn).unwrap()))
    }

    #[test]
    fn test_update_and_get_roundtrip() {
        let api = new_api();

        assert!(api.get_config(config_keys::LOAN_PERIOD_DAYS).unwrap().is_none());

        api.update_config(config_keys::LOAN_PERIOD_DAYS, "21").unwrap();
        let item = api
            .get_config(config_keys::LOAN_PERIOD_DAYS)
            .unwrap()
            .unwrap();
        assert_eq!(item.value, "21");

        let all = api.list_configs().unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let api = new_api();
        match api.update_config("max_borrow_count", "5") {
            Err(ApiError::InvalidInput(msg)) => assert!(msg.contains("未知配置键")),
            other => panic!("未知键应被拒绝: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_values_rejected() {
        let api = new_api();

        assert!(matches!(
            api.update_config(config_keys::LOAN_PERIOD_DAYS, "两周"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.update_config(config_keys::LOAN_PERIOD_DAYS, "-3"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.update_config(config_keys::OVERDUE_FINE_AMOUNT, "-0.5"),
            Err(ApiError::InvalidInput(_))
        ));

        // 拒绝的值不得入库
        assert!(api.list_configs().unwrap().is_empty());
    }
}
