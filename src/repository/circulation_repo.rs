// ==========================================
// 图书馆流通管理系统 - 流通数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 可借册数的增减必须与记录写入同事务
// ==========================================

mod borrow;
mod reservation;

pub use borrow::BorrowRecordRepository;
pub use reservation::ReservationRepository;
