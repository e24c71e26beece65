// ==========================================
// 图书馆流通管理系统 - 命令行入口
// ==========================================
// 技术栈: Rust + SQLite
// 用途: 建库、逾期扫描、报表查询、馆藏导入
// ==========================================

use anyhow::{anyhow, Context, Result};

use library_circulation::app::{get_default_db_path, AppState};

fn main() -> Result<()> {
    // 初始化日志系统（RUST_LOG 控制级别）
    library_circulation::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", library_circulation::APP_NAME);
    tracing::info!("系统版本: {}", library_circulation::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if command == "help" || command == "--help" || command == "-h" {
        print_usage();
        return Ok(());
    }

    // 获取数据库路径（LIBRARY_CIRC_DB 可覆盖）
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command {
        // 建库（AppState 初始化时各仓储已建表，这里仅确认）
        "init" => {
            println!("数据库初始化完成: {}", state.get_db_path());
        }

        // 逾期扫描：为所有逾期在借记录下发罚款
        "sweep" => {
            let result = state
                .circulation_api
                .sweep_overdue()
                .context("逾期扫描失败")?;
            println!(
                "逾期扫描完成: 扫描 {} 条在借记录，新下发 {} 张罚款",
                result.scanned, result.issued
            );
        }

        // 报表查询，输出 JSON
        "report" => {
            let view = args.get(2).map(String::as_str).unwrap_or("");
            match view {
                "active" => {
                    let rows = state
                        .report_api
                        .list_active_borrows()
                        .context("在借视图查询失败")?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                "overdue" => {
                    let rows = state
                        .report_api
                        .list_overdue_books()
                        .context("逾期视图查询失败")?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                "fines" => {
                    let rows = state
                        .report_api
                        .list_member_fine_summaries()
                        .context("罚款汇总查询失败")?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                other => {
                    print_usage();
                    return Err(anyhow!("未知报表视图: {:?}（可用: active/overdue/fines）", other));
                }
            }
        }

        // 馆藏 CSV 导入
        "import" => {
            let file_path = args
                .get(2)
                .ok_or_else(|| anyhow!("用法: import <文件路径.csv>"))?;
            let response = state
                .import_api
                .import_catalog_blocking(file_path)
                .context("馆藏导入失败")?;
            println!(
                "导入完成: batch_id={}, 入库 {} 行，冲突 {} 行，耗时 {}ms",
                response.batch_id, response.imported, response.conflicts, response.elapsed_ms
            );
            if !response.violations.is_empty() {
                println!("{}", serde_json::to_string_pretty(&response.violations)?);
            }
        }

        other => {
            print_usage();
            return Err(anyhow!("未知命令: {:?}", other));
        }
    }

    Ok(())
}

fn print_usage() {
    println!("用法: library-circulation <命令> [参数]");
    println!();
    println!("命令:");
    println!("  init                     初始化数据库（建表）");
    println!("  sweep                    逾期扫描，为逾期在借记录下发罚款");
    println!("  report active            在借清单（JSON）");
    println!("  report overdue           逾期清单（JSON）");
    println!("  report fines             读者罚款汇总（JSON）");
    println!("  import <文件路径.csv>    导入馆藏目录 CSV");
    println!();
    println!("环境变量:");
    println!("  LIBRARY_CIRC_DB          数据库文件路径（默认: 用户数据目录）");
    println!("  RUST_LOG                 日志级别（默认: info）");
}
