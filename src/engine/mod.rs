// ==========================================
// 图书馆流通管理系统 - 引擎层
// ==========================================
// 职责: 实现流通业务规则,编排仓储层原子操作
// 红线: 规则判定（逾期）与状态变更（借/还）分离,
//       逾期判定引擎不访问数据库
// ==========================================

pub mod circulation;
pub mod error;
pub mod overdue;
pub mod repositories;

// 重导出核心引擎
pub use circulation::{CirculationEngine, CirculationTuning, ReturnOutcome, SweepResult};
pub use error::{CirculationError, CirculationResult};
pub use overdue::{OverdueAssessment, OverdueEngine};
pub use repositories::CirculationRepositories;
