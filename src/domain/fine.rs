// ==========================================
// 图书馆流通管理系统 - 罚款领域模型
// ==========================================
// 职责: 罚款台账条目
// 红线: 引擎视角只追加；同一借阅记录至多一条罚款
// ==========================================

use crate::domain::types::FineStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Fine - 罚款
// ==========================================
// record_id 关联产生罚款的借阅记录（图书删除后置空保留台账）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fine {
    pub fine_id: String,          // 罚款ID (UUID)
    pub member_id: String,        // 读者ID
    pub record_id: Option<String>, // 借阅记录ID (唯一，实现"每段逾期至多一罚")
    pub amount: f64,              // 金额
    pub issue_date: NaiveDate,    // 下发日期
    pub status: FineStatus,       // 缴纳状态
}

impl Fine {
    /// 新建逾期罚款（未缴）
    pub fn for_overdue_record(
        member_id: &str,
        record_id: &str,
        amount: f64,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            fine_id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            record_id: Some(record_id.to_string()),
            amount,
            issue_date,
            status: FineStatus::Unpaid,
        }
    }

    /// 是否未缴
    pub fn is_unpaid(&self) -> bool {
        self.status == FineStatus::Unpaid
    }
}
