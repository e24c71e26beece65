// ==========================================
// 流通并发控制测试
// ==========================================
// 职责: 验证可借册数扣减与归还的并发安全
// ==========================================

mod helpers;

#[cfg(test)]
mod concurrent_borrow_test {
    use library_circulation::api::{ApiError, CirculationApi};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::helpers::api_test_helper::ApiTestEnv;

    // ==========================================
    // 测试1: 并发借出恰好借空
    // ==========================================

    #[test]
    fn test_concurrent_borrow_exhausts_copies_exactly() {
        let env = ApiTestEnv::new().expect("无法创建测试环境");
        let book = env.seed_book("三体", "978-7-5366-9293-0", 3);

        let thread_count = 8;
        let mut members = Vec::with_capacity(thread_count);
        for i in 0..thread_count {
            members.push(env.seed_member(
                &format!("读者{}", i),
                &format!("reader{}@example.com", i),
            ));
        }

        // 多线程同时借同一本书
        let mut handles = vec![];
        for member in &members {
            let api: Arc<CirculationApi> = env.circulation_api.clone();
            let member_id = member.member_id.clone();
            let book_id = book.book_id.clone();

            let handle = thread::spawn(move || -> Result<(), ApiError> {
                // 稍微延迟,增加并发冲突概率
                thread::sleep(Duration::from_millis(5));
                api.borrow_book(&member_id, &book_id).map(|_| ())
            });
            handles.push(handle);
        }

        let mut success_count = 0;
        let mut unavailable_count = 0;
        for handle in handles {
            match handle.join().expect("线程崩溃") {
                Ok(()) => success_count += 1,
                Err(ApiError::BookUnavailable(_)) => unavailable_count += 1,
                Err(other) => panic!("意外错误类型: {:?}", other),
            }
        }

        // 3册库存恰好借出3次,其余全部被原子扣减拒绝
        assert_eq!(success_count, 3, "成功借出次数应等于库存册数");
        assert_eq!(unavailable_count, thread_count - 3);

        let book = env.catalog_api.get_book(&book.book_id).expect("查询失败");
        assert_eq!(book.copies_available, 0, "借空后可借册数应为0");
        assert_eq!(
            env.borrow_repo.list_active().expect("查询失败").len(),
            3,
            "在借记录数应等于成功借出数"
        );

        println!(
            "✅ 并发借出测试通过: {}个线程中{}个成功,{}个被拒",
            thread_count, success_count, unavailable_count
        );
    }

    // ==========================================
    // 测试2: 同一记录并发归还只入账一次
    // ==========================================

    #[test]
    fn test_concurrent_return_increments_once() {
        let env = ApiTestEnv::new().expect("无法创建测试环境");
        let member = env.seed_member("张三", "zhangsan@example.com");
        let book = env.seed_book("围城", "978-7-02-009000-2", 1);
        let record = env
            .circulation_api
            .borrow_book(&member.member_id, &book.book_id)
            .expect("借出失败");

        let thread_count = 4;
        let mut handles = vec![];
        for _ in 0..thread_count {
            let api = env.circulation_api.clone();
            let record_id = record.record_id.clone();
            handles.push(thread::spawn(move || -> Result<(), ApiError> {
                api.return_book(&record_id).map(|_| ())
            }));
        }

        let mut success_count = 0;
        let mut already_returned_count = 0;
        for handle in handles {
            match handle.join().expect("线程崩溃") {
                Ok(()) => success_count += 1,
                Err(ApiError::AlreadyReturned(_)) => already_returned_count += 1,
                Err(other) => panic!("意外错误类型: {:?}", other),
            }
        }

        assert_eq!(success_count, 1, "同一记录只能归还一次");
        assert_eq!(already_returned_count, thread_count - 1);

        // 可借册数只回加一次
        let book = env.catalog_api.get_book(&book.book_id).expect("查询失败");
        assert_eq!(book.copies_available, 1, "归还只应回加一册");

        println!("✅ 并发归还测试通过: 1次入账,{}次被拒", already_returned_count);
    }

    // ==========================================
    // 测试3: 并发逾期巡检只开一笔罚款
    // ==========================================

    #[test]
    fn test_concurrent_sweep_issues_single_fine() {
        let env = ApiTestEnv::new().expect("无法创建测试环境");
        let member = env.seed_member("张三", "zhangsan@example.com");
        let book = env.seed_book("三体", "978-7-5366-9293-0", 1);
        env.seed_backdated_borrow(&member.member_id, &book.book_id, 20);

        let thread_count = 4;
        let mut handles = vec![];
        for _ in 0..thread_count {
            let api = env.circulation_api.clone();
            handles.push(thread::spawn(move || api.sweep_overdue()));
        }

        let mut total_issued = 0;
        for handle in handles {
            let result = handle.join().expect("线程崩溃").expect("巡检失败");
            total_issued += result.issued;
        }

        // 罚款按记录唯一,并发巡检合计只开一笔
        assert_eq!(total_issued, 1, "并发巡检合计只应开出一笔罚款");
        let fines = env
            .fine_repo
            .list_by_member(&member.member_id)
            .expect("查询失败");
        assert_eq!(fines.len(), 1);

        println!("✅ 并发巡检测试通过: 合计开出{}笔罚款", total_issued);
    }
}
