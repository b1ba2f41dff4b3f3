//! 批量题目处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量题目的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：连接数据库、构建 API/页面/LLM 客户端、组装各服务
//! 2. **工作列表**：入库模式来自命令行/文件的原始引用，
//!    分类模式来自数据库（全部行或仅未分类行）
//! 3. **分批处理**：固定大小分块（默认 50），每批一个事务，
//!    批次边界提交——批次是持久化的单位，不是单个条目
//! 4. **节奏控制**：每个条目抓取之后、分类调用之前固定延迟（默认 2 秒），
//!    避免触发第三方限流；这是简单的壁钟休眠，不是自适应退避
//! 5. **条目隔离**：每个条目的写入包在保存点里，任何失败回滚到保存点、
//!    记日志并继续下一个，同批中先前成功的条目照常提交
//! 6. **全局统计**：汇总所有批次的处理结果
//!
//! 批次提交失败是唯一致命错误（说明存储端不可用，终止剩余批次）。

use anyhow::Result;
use sqlx::{Acquire, Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::clients::{CodeforcesApi, HttpPageFetcher};
use crate::config::Config;
use crate::error::{AppError, ConfigError, DbError};
use crate::models::{CatalogRecord, Evidence, WorklistRow};
use crate::services::{
    CatalogWriter, Classifier, EvidenceFetcher, LlmService, ReferenceParser, WorklistScope,
};
use crate::utils::logging;

/// 运行模式
#[derive(Debug, Clone)]
pub enum RunMode {
    /// 入库：原始题目引用 → 完整流水线 → 插入目录
    Ingest { references: Vec<String> },
    /// 分类：对存量目录行补全 type 字段
    Classify { scope: WorklistScope },
}

/// 应用主结构
pub struct App {
    config: Config,
    parser: ReferenceParser,
    fetcher: EvidenceFetcher,
    classifier: Classifier,
    writer: CatalogWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(AppError::Config(ConfigError::EnvVarNotFound {
                var_name: "DATABASE_URL".to_string(),
            })
            .into());
        }

        // 数据库连接在整个运行期间共享
        let pool = CatalogWriter::connect(&config.database_url).await?;
        let writer = CatalogWriter::new(pool);
        writer.ensure_schema().await?;

        let api = Arc::new(CodeforcesApi::new(
            &config.cf_api_base_url,
            &config.user_agent,
        )?);
        let pages = Arc::new(HttpPageFetcher::new(&config.user_agent)?);
        let fetcher = EvidenceFetcher::new(api, pages, config.statement_keywords.clone());

        let llm = Arc::new(LlmService::new(&config));
        let classifier = Classifier::new(llm, config.max_statement_len);

        let parser = ReferenceParser::new()?;

        Ok(Self::from_parts(config, parser, fetcher, classifier, writer))
    }

    /// 由已构建的各服务组装应用
    ///
    /// 测试通过这里注入确定性的假远程实现
    pub fn from_parts(
        config: Config,
        parser: ReferenceParser,
        fetcher: EvidenceFetcher,
        classifier: Classifier,
        writer: CatalogWriter,
    ) -> Self {
        Self {
            config,
            parser,
            fetcher,
            classifier,
            writer,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self, mode: RunMode) -> Result<()> {
        log_startup(&self.config);

        let stats = match mode {
            RunMode::Ingest { references } => self.ingest_all(references).await?,
            RunMode::Classify { scope } => self.classify_all(scope).await?,
        };

        print_final_stats(&stats);

        Ok(())
    }

    // ========== 入库模式 ==========

    async fn ingest_all(&self, references: Vec<String>) -> Result<ProcessingStats> {
        if references.is_empty() {
            warn!("⚠️ 没有待入库的题目引用，程序结束");
            return Ok(ProcessingStats::default());
        }

        let total = references.len();
        info!("✓ 共 {} 条待入库的题目引用", total);

        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let total_batches = total.div_ceil(batch_size);

        for (batch_idx, chunk) in references.chunks(batch_size).enumerate() {
            log_batch_start(batch_idx + 1, total_batches, chunk.len());

            let result = self.ingest_batch(chunk).await?;
            stats.absorb(&result);

            log_batch_complete(batch_idx + 1, &result);
        }

        Ok(stats)
    }

    /// 处理一个入库批次（一个事务，批末提交）
    ///
    /// 每个条目的写入包在保存点里：失败的 SQL 语句会让 Postgres 把
    /// 整个事务置为中止状态，回滚到保存点后同批的后续条目照常执行，
    /// 此前成功的条目仍随批次提交
    async fn ingest_batch(&self, chunk: &[String]) -> Result<BatchResult> {
        let mut tx = self.begin_batch().await?;
        let mut result = BatchResult::default();

        for raw in chunk {
            let mut item_tx = item_savepoint(&mut tx).await?;
            match self.ingest_one(&mut item_tx, raw).await {
                Ok(inserted) => {
                    release_savepoint(item_tx).await?;
                    if inserted {
                        result.success += 1;
                    } else {
                        result.skipped += 1;
                    }
                }
                Err(e) => {
                    rollback_savepoint(item_tx).await;
                    error!("❌ 条目处理失败 ({}): {}", logging::truncate_text(raw, 120), e);
                    result.failed += 1;
                }
            }
        }

        self.commit_batch(tx).await?;
        Ok(result)
    }

    /// 处理一条原始引用：解析 → 抓取 → 分类 → 入库
    ///
    /// 返回是否插入了新行（false = 身份已存在，静默跳过）
    async fn ingest_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        raw: &str,
    ) -> Result<bool> {
        // 解析失败在任何网络调用之前跳过该条目
        let problem = self.parser.parse(raw)?;
        info!("🔍 处理题目引用: {} → {}", raw, problem.url);

        let evidence = self.fetcher.fetch(&problem).await;
        self.pace().await;
        let category = self.classifier.classify(&evidence).await;

        let record = CatalogRecord::from_pipeline(
            &problem,
            &evidence,
            category,
            &self.config.added_by,
            &self.config.added_by_url,
        );

        let inserted = self.writer.insert_if_absent(tx, &record).await?;
        if inserted {
            info!("✓ {} → 分类为: {}", problem.problem_id, category);
        } else {
            info!("✓ {} 已存在，跳过", problem.problem_id);
        }

        Ok(inserted)
    }

    // ========== 分类模式 ==========

    async fn classify_all(&self, scope: WorklistScope) -> Result<ProcessingStats> {
        let worklist = self.writer.load_worklist(scope).await?;

        if worklist.is_empty() {
            warn!("⚠️ 没有待分类的题目，程序结束");
            return Ok(ProcessingStats::default());
        }

        let total = worklist.len();
        info!("✓ 找到 {} 道待分类的题目", total);

        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let total_batches = total.div_ceil(batch_size);

        for (batch_idx, chunk) in worklist.chunks(batch_size).enumerate() {
            log_batch_start(batch_idx + 1, total_batches, chunk.len());

            let result = self.classify_batch(chunk).await?;
            stats.absorb(&result);

            log_batch_complete(batch_idx + 1, &result);
        }

        Ok(stats)
    }

    /// 处理一个分类批次（一个事务，批末提交）
    ///
    /// 条目隔离与入库批次相同：失败回滚到条目保存点后继续
    async fn classify_batch(&self, chunk: &[WorklistRow]) -> Result<BatchResult> {
        let mut tx = self.begin_batch().await?;
        let mut result = BatchResult::default();

        for row in chunk {
            let mut item_tx = item_savepoint(&mut tx).await?;
            match self.classify_one(&mut item_tx, row).await {
                Ok(()) => {
                    release_savepoint(item_tx).await?;
                    result.success += 1;
                }
                Err(e) => {
                    rollback_savepoint(item_tx).await;
                    error!("❌ 条目处理失败 ({}): {}", row.name, e);
                    result.failed += 1;
                }
            }
        }

        self.commit_batch(tx).await?;
        Ok(result)
    }

    /// 对一行存量记录分类并回写 type
    async fn classify_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: &WorklistRow,
    ) -> Result<()> {
        info!("处理题目: {}", row.name);

        let evidence = match self.parser.parse(&row.url) {
            Ok(problem) => {
                let fetched = self.fetcher.fetch(&problem).await;
                worklist_evidence(row, Some(fetched))
            }
            Err(e) => {
                warn!("⚠️ 存量URL无法解析，仅用库内字段分类 ({}): {}", row.url, e);
                worklist_evidence(row, None)
            }
        };

        self.pace().await;
        let category = self.classifier.classify(&evidence).await;

        self.writer.set_problem_type(tx, row.id, category).await?;
        info!("  → 分类为: {}", category);

        Ok(())
    }

    // ========== 事务与节奏 ==========

    async fn begin_batch(&self) -> Result<Transaction<'_, Postgres>> {
        let tx = self
            .writer
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::db_query_failed("开启批次事务", e))?;
        Ok(tx)
    }

    /// 批次提交；失败终止整个运行
    async fn commit_batch(&self, tx: Transaction<'_, Postgres>) -> Result<()> {
        tx.commit().await.map_err(|e| {
            AppError::Db(DbError::CommitFailed {
                source: Box::new(e),
            })
        })?;
        Ok(())
    }

    /// 条目间固定延迟（抓取之后、分类之前）
    async fn pace(&self) {
        if self.config.request_delay_secs > 0.0 {
            sleep(Duration::from_secs_f64(self.config.request_delay_secs)).await;
        }
    }
}

/// 组装分类工作列表行的证据
///
/// 库内的名称/标签是权威数据，抓取只贡献题面文本和附加数值
fn worklist_evidence(row: &WorklistRow, fetched: Option<Evidence>) -> Evidence {
    let fetched = fetched.unwrap_or_default();
    Evidence {
        display_name: row.name.clone(),
        raw_tags: row.tags.clone(),
        statement_text: fetched.statement_text,
        difficulty: fetched.difficulty,
        solved_count: fetched.solved_count,
    }
}

// ========== 条目保存点（sqlx 嵌套事务） ==========

async fn item_savepoint<'t>(
    tx: &'t mut Transaction<'_, Postgres>,
) -> Result<Transaction<'t, Postgres>> {
    let sp = tx
        .begin()
        .await
        .map_err(|e| AppError::db_query_failed("创建条目保存点", e))?;
    Ok(sp)
}

async fn release_savepoint(sp: Transaction<'_, Postgres>) -> Result<()> {
    sp.commit()
        .await
        .map_err(|e| AppError::db_query_failed("释放条目保存点", e))?;
    Ok(())
}

async fn rollback_savepoint(sp: Transaction<'_, Postgres>) {
    if let Err(e) = sp.rollback().await {
        warn!("⚠️ 条目保存点回滚失败: {}", e);
    }
}

/// 处理统计
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl ProcessingStats {
    fn absorb(&mut self, batch: &BatchResult) {
        self.success += batch.success;
        self.failed += batch.failed;
        self.skipped += batch.skipped;
    }
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    skipped: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目分类流水线");
    info!("📊 批大小: {} | 条目延迟: {}秒", config.batch_size, config.request_delay_secs);
    info!("{}", "=".repeat(60));
}

fn log_batch_start(batch_num: usize, total_batches: usize, batch_len: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批 ({} 道题目)", batch_num, total_batches, batch_len);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, result: &BatchResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成并已提交: 成功 {}/{} (跳过 {})",
        batch_num,
        result.success,
        result.success + result.failed + result.skipped,
        result.skipped
    );
    info!("{}", "─".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("⏭️ 跳过(已存在): {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
}
