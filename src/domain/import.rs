// ==========================================
// 图书馆流通管理系统 - 馆藏导入领域模型
// ==========================================
// 职责: CSV 批量入库管道的中间结构与质量报告
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RawBookRecord - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（CSV 解析 → 字段映射 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBookRecord {
    // 源字段（已类型转换）
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub published_year: Option<i32>,
    pub copies: Option<i64>,

    // 元信息
    pub row_number: usize, // 原始文件行号（用于 DQ 报告）
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DqLevel {
    Error,    // 错误（阻断该行）
    Warning,  // 警告（允许入库）
    Conflict, // 冲突（ISBN 重复，跳过该行）
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,    // 原始文件行号
    pub isbn: Option<String>, // ISBN（如果可解析）
    pub level: DqLevel,       // 违规级别
    pub field: String,        // 违规字段
    pub message: String,      // 违规描述
}

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize, // 总行数
    pub imported: usize,   // 成功入库
    pub blocked: usize,    // 阻断（ERROR）
    pub warning: usize,    // 警告（WARNING）
    pub conflict: usize,   // 冲突（CONFLICT）
}

// ==========================================
// ImportReport - 导入结果报告
// ==========================================
// 用途: 导入接口返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,             // 批次 ID（UUID）
    pub file_path: String,            // 源文件路径
    pub summary: DqSummary,           // 汇总统计
    pub violations: Vec<DqViolation>, // 违规明细
    pub elapsed_ms: i64,              // 导入耗时（毫秒）
}
