// ==========================================
// 图书馆流通管理系统 - 馆藏数据导入器
// ==========================================
// 职责: 整合导入流程，从 CSV 文件到数据库
// 流程: 解析 → 映射 → 质检 → 冲突检测 → 落库
// 红线: 单行失败只阻断该行，不得中断整个批次
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::book::Book;
use crate::domain::import::{DqLevel, DqSummary, DqViolation, ImportReport, RawBookRecord};
use crate::importer::error::ImportError;
use crate::repository::import_repo::CatalogImportRepository;
use chrono::{Datelike, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// CSV 列名（表头匹配忽略大小写）
const COL_TITLE: &str = "title";
const COL_ISBN: &str = "isbn";
const COL_AUTHOR: &str = "author";
const COL_CATEGORY: &str = "category";
const COL_YEAR: &str = "published_year";
const COL_COPIES: &str = "copies";

// 列号布局（title/isbn 必需，其余可缺省）
struct ColumnLayout {
    title: usize,
    isbn: usize,
    author: Option<usize>,
    category: Option<usize>,
    published_year: Option<usize>,
    copies: Option<usize>,
}

// 单行处理结果
enum RowOutcome {
    Imported,
    Blocked,
    Conflict,
}

// ==========================================
// CatalogImporter - 馆藏数据导入器
// ==========================================
pub struct CatalogImporter<R, C>
where
    R: CatalogImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,
}

impl<R, C> CatalogImporter<R, C>
where
    R: CatalogImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 CatalogImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器（默认册数/出版年下限）
    pub fn new(import_repo: R, config: C) -> Self {
        Self {
            import_repo,
            config,
        }
    }

    /// 从 CSV 文件导入馆藏数据
    ///
    /// # 参数
    /// - file_path: CSV 文件路径（表头: title,isbn,author,category,published_year,copies）
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入结果（批次 ID、汇总统计、违规明细）
    /// - Err: 文件读取错误、配置读取错误等批次级失败
    ///
    /// # 导入流程
    /// 1. 文件解析与字段映射
    /// 2. 导入配置读取
    /// 3. ISBN 冲突预检（对馆藏存量）
    /// 4. 逐行质检 + 落库（行级失败不中断批次）
    /// 5. DQ 报告生成
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportReport, Box<dyn Error>> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let file_path_str = file_path.as_ref().display().to_string();

        info!(batch_id = %batch_id, file_path = %file_path_str, "开始导入馆藏数据");

        // === 步骤 1: 解析文件与字段映射 ===
        debug!("步骤 1: 解析文件");
        let rows = Self::parse_csv(file_path.as_ref())?;
        let total_rows = rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2: 读取导入配置 ===
        debug!("步骤 2: 读取导入配置");
        let default_copies = self
            .config
            .get_import_default_copies()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import_default_copies".to_string(),
                message: e.to_string(),
            })?;
        let year_min = self
            .config
            .get_import_year_min()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import_year_min".to_string(),
                message: e.to_string(),
            })?;
        // 出版年上限放宽一年，容纳预告出版物
        let year_max = Utc::now().year() + 1;

        // === 步骤 3: ISBN 冲突预检 ===
        debug!("步骤 3: ISBN 冲突预检");
        let isbns: Vec<String> = rows
            .iter()
            .filter_map(|(record, _)| record.isbn.clone())
            .collect();
        let existing: HashSet<String> = self
            .import_repo
            .batch_check_isbn_exists(isbns)
            .await
            .map_err(|e| format!("馆藏存量预检失败: {}", e))?
            .into_iter()
            .collect();

        // === 步骤 4: 逐行质检 + 落库 ===
        debug!("步骤 4: 逐行质检与落库");
        let mut summary = DqSummary {
            total_rows,
            ..Default::default()
        };
        let mut violations: Vec<DqViolation> = Vec::new();
        let mut seen_isbns: HashSet<String> = HashSet::new();

        for (record, mapping_violations) in rows {
            let mut row_violations = mapping_violations;
            let outcome = self
                .import_row(
                    record,
                    &mut row_violations,
                    &mut seen_isbns,
                    &existing,
                    default_copies,
                    year_min,
                    year_max,
                )
                .await;

            match outcome {
                RowOutcome::Imported => {
                    summary.imported += 1;
                    // warning 口径: 带警告入库的行数
                    if row_violations
                        .iter()
                        .any(|v| v.level == DqLevel::Warning)
                    {
                        summary.warning += 1;
                    }
                }
                RowOutcome::Blocked => summary.blocked += 1,
                RowOutcome::Conflict => summary.conflict += 1,
            }
            violations.extend(row_violations);
        }

        // === 步骤 5: 报告生成 ===
        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        info!(
            batch_id = %batch_id,
            imported = summary.imported,
            blocked = summary.blocked,
            conflict = summary.conflict,
            warning = summary.warning,
            elapsed_ms = elapsed_ms,
            "馆藏导入完成"
        );

        Ok(ImportReport {
            batch_id,
            file_path: file_path_str,
            summary,
            violations,
            elapsed_ms,
        })
    }

    /// 批量导入多个文件（并发执行，单个文件失败不影响其余）
    ///
    /// # 参数
    /// - file_paths: CSV 文件路径列表
    ///
    /// # 返回
    /// - Ok(Vec<Result<ImportReport, String>>): 每个文件的导入结果
    pub async fn import_many<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Result<Vec<Result<ImportReport, String>>, Box<dyn Error>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_from_csv(path).await {
                    Ok(report) => {
                        info!(
                            file = %path_str,
                            imported = report.summary.imported,
                            "文件导入成功"
                        );
                        Ok(report)
                    }
                    Err(e) => {
                        warn!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        Ok(results)
    }

    // ==========================================
    // 内部流程
    // ==========================================

    /// 解析 CSV 文件为中间记录（映射失败降级为行级违规，不中断解析）
    fn parse_csv(path: &Path) -> Result<Vec<(RawBookRecord, Vec<DqViolation>)>, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let layout = ColumnLayout {
            title: Self::header_index(&headers, COL_TITLE).ok_or_else(|| {
                ImportError::CsvParseError(format!("缺少必需列: {}", COL_TITLE))
            })?,
            isbn: Self::header_index(&headers, COL_ISBN).ok_or_else(|| {
                ImportError::CsvParseError(format!("缺少必需列: {}", COL_ISBN))
            })?,
            author: Self::header_index(&headers, COL_AUTHOR),
            category: Self::header_index(&headers, COL_CATEGORY),
            published_year: Self::header_index(&headers, COL_YEAR),
            copies: Self::header_index(&headers, COL_COPIES),
        };

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;

            // 跳过完全空白的行
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            // 首行为表头，数据行从文件第 2 行起计
            let row_number = idx + 2;
            rows.push(Self::map_row(&record, row_number, &layout));
        }

        Ok(rows)
    }

    /// 表头定位（忽略大小写与两端空白）
    fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// 单元格取值（TRIM + 空串标准化为 None）
    fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| record.get(i))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 将原始行映射为 RawBookRecord（数值解析失败降级为警告）
    fn map_row(
        record: &csv::StringRecord,
        row_number: usize,
        layout: &ColumnLayout,
    ) -> (RawBookRecord, Vec<DqViolation>) {
        let mut violations = Vec::new();

        // ISBN 统一大写（ISBN-10 校验位可能为 x）
        let isbn = Self::cell(record, Some(layout.isbn)).map(|v| v.to_ascii_uppercase());

        let published_year = match Self::cell(record, layout.published_year) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    violations.push(DqViolation {
                        row_number,
                        isbn: isbn.clone(),
                        level: DqLevel::Warning,
                        field: COL_YEAR.to_string(),
                        message: format!("出版年无法解析: {}，按缺失处理", raw),
                    });
                    None
                }
            },
            None => None,
        };

        let copies = match Self::cell(record, layout.copies) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => Some(n),
                Ok(n) => {
                    violations.push(DqViolation {
                        row_number,
                        isbn: isbn.clone(),
                        level: DqLevel::Warning,
                        field: COL_COPIES.to_string(),
                        message: format!("册数为负: {}，使用默认值", n),
                    });
                    None
                }
                Err(_) => {
                    violations.push(DqViolation {
                        row_number,
                        isbn: isbn.clone(),
                        level: DqLevel::Warning,
                        field: COL_COPIES.to_string(),
                        message: format!("册数无法解析: {}，使用默认值", raw),
                    });
                    None
                }
            },
            None => None,
        };

        let raw = RawBookRecord {
            title: Self::cell(record, Some(layout.title)),
            isbn,
            author_name: Self::cell(record, layout.author),
            category_name: Self::cell(record, layout.category),
            published_year,
            copies,
            row_number,
        };
        (raw, violations)
    }

    /// 处理单行：质检 → 冲突检测 → 落库
    #[allow(clippy::too_many_arguments)]
    async fn import_row(
        &self,
        record: RawBookRecord,
        row_violations: &mut Vec<DqViolation>,
        seen_isbns: &mut HashSet<String>,
        existing: &HashSet<String>,
        default_copies: i64,
        year_min: i32,
        year_max: i32,
    ) -> RowOutcome {
        let row_number = record.row_number;

        // 必填字段: 书名
        let title = match record.title {
            Some(title) => title,
            None => {
                row_violations.push(DqViolation {
                    row_number,
                    isbn: record.isbn.clone(),
                    level: DqLevel::Error,
                    field: COL_TITLE.to_string(),
                    message: "书名缺失，该行被阻断".to_string(),
                });
                return RowOutcome::Blocked;
            }
        };

        // 必填字段: ISBN
        let isbn = match record.isbn {
            Some(isbn) => isbn,
            None => {
                row_violations.push(DqViolation {
                    row_number,
                    isbn: None,
                    level: DqLevel::Error,
                    field: COL_ISBN.to_string(),
                    message: "ISBN 缺失，该行被阻断".to_string(),
                });
                return RowOutcome::Blocked;
            }
        };

        // 同文件内 ISBN 重复（首次出现者生效）
        if !seen_isbns.insert(isbn.clone()) {
            row_violations.push(DqViolation {
                row_number,
                isbn: Some(isbn),
                level: DqLevel::Conflict,
                field: COL_ISBN.to_string(),
                message: "同文件内 ISBN 重复，该行被跳过".to_string(),
            });
            return RowOutcome::Conflict;
        }

        // 馆藏存量 ISBN 重复
        if existing.contains(&isbn) {
            row_violations.push(DqViolation {
                row_number,
                isbn: Some(isbn),
                level: DqLevel::Conflict,
                field: COL_ISBN.to_string(),
                message: "馆藏中已存在该 ISBN，该行被跳过".to_string(),
            });
            return RowOutcome::Conflict;
        }

        // 出版年合理性（警告，不阻断）
        if let Some(year) = record.published_year {
            if year < year_min || year > year_max {
                row_violations.push(DqViolation {
                    row_number,
                    isbn: Some(isbn.clone()),
                    level: DqLevel::Warning,
                    field: COL_YEAR.to_string(),
                    message: format!("出版年 {} 超出合理范围 [{}, {}]", year, year_min, year_max),
                });
            }
        }

        // 分类: 按名复用或创建
        let category_id = match record.category_name {
            Some(ref name) => match self.import_repo.find_or_create_category(name).await {
                Ok(category) => Some(category.category_id),
                Err(e) => {
                    row_violations.push(DqViolation {
                        row_number,
                        isbn: Some(isbn),
                        level: DqLevel::Error,
                        field: COL_CATEGORY.to_string(),
                        message: format!("分类落库失败: {}", e),
                    });
                    return RowOutcome::Blocked;
                }
            },
            None => None,
        };

        // 图书落库
        let copies = record.copies.unwrap_or(default_copies);
        let mut book = Book::new(&title, &isbn, copies);
        book.category_id = category_id;
        book.published_year = record.published_year;
        let book_id = book.book_id.clone();

        if let Err(e) = self.import_repo.insert_book(book).await {
            row_violations.push(DqViolation {
                row_number,
                isbn: Some(isbn),
                level: DqLevel::Error,
                field: COL_ISBN.to_string(),
                message: format!("图书落库失败: {}", e),
            });
            return RowOutcome::Blocked;
        }

        // 作者: 按名复用或创建，再建立关联（失败仅降级为警告，图书保留）
        if let Some(ref name) = record.author_name {
            let link_result = match self.import_repo.find_or_create_author(name).await {
                Ok(author) => {
                    self.import_repo
                        .link_book_author(&book_id, &author.author_id)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = link_result {
                row_violations.push(DqViolation {
                    row_number,
                    isbn: Some(isbn),
                    level: DqLevel::Warning,
                    field: COL_AUTHOR.to_string(),
                    message: format!("作者关联失败: {}", e),
                });
            }
        }

        RowOutcome::Imported
    }
}
