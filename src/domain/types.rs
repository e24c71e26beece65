// ==========================================
// 图书馆流通管理系统 - 领域类型定义
// ==========================================
// 职责: 跨模块共享的枚举与小类型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 罚款状态 (Fine Status)
// ==========================================
// 红线: 罚款台账只追加,状态只允许 UNPAID -> PAID 单向流转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineStatus {
    Unpaid, // 未缴
    Paid,   // 已缴（由外部收款方标记）
}

impl fmt::Display for FineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FineStatus::Unpaid => write!(f, "UNPAID"),
            FineStatus::Paid => write!(f, "PAID"),
        }
    }
}

impl FineStatus {
    /// 从数据库整数标志解析（paid 列: 0=未缴, 非0=已缴）
    pub fn from_db_flag(flag: i64) -> Self {
        if flag == 0 {
            FineStatus::Unpaid
        } else {
            FineStatus::Paid
        }
    }

    /// 转换为数据库存储的整数标志
    pub fn to_db_flag(&self) -> i64 {
        match self {
            FineStatus::Unpaid => 0,
            FineStatus::Paid => 1,
        }
    }
}

// ==========================================
// 借阅事件类型 (Circulation Event)
// ==========================================
// 用途: 结构化日志与导入报告中的事件标注
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CirculationEvent {
    Borrow,     // 借出
    Return,     // 归还
    Reserve,    // 预约
    FineIssued, // 逾期罚款下发
}

impl fmt::Display for CirculationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CirculationEvent::Borrow => write!(f, "BORROW"),
            CirculationEvent::Return => write!(f, "RETURN"),
            CirculationEvent::Reserve => write!(f, "RESERVE"),
            CirculationEvent::FineIssued => write!(f, "FINE_ISSUED"),
        }
    }
}
