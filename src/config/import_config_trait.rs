// ==========================================
// 图书馆流通管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义目录导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 目录导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取导入时缺省的在库册数
    ///
    /// CSV 行的 copies 列为空或缺失时使用该值。
    ///
    /// # 默认值
    /// - 1
    async fn get_import_default_copies(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取出版年份下限
    ///
    /// 低于该年份的 published_year 视为数据质量警告。
    ///
    /// # 默认值
    /// - 1450
    async fn get_import_year_min(&self) -> Result<i32, Box<dyn Error>>;
}
