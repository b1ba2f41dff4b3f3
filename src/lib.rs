//! # Classify Problems
//!
//! 竞赛编程题目的身份归一化与分类流水线
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 封装远程能力，只暴露窄接口
//! - `CodeforcesApi` - contest.standings 题目列表能力
//! - `HttpPageFetcher` - 页面抓取能力（携带浏览器 User-Agent）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目
//! - `ReferenceParser` - 原始引用 → 规范化题目身份（纯函数）
//! - `EvidenceFetcher` - 按来源策略抓取分类证据，失败降级不中断
//! - `Classifier` - LLM 单标签分类，保底 misc
//! - `CatalogWriter` - 目录表读写，规范化URL为自然键
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批、事务、节奏控制、条目隔离
//!
//! ## 数据流
//!
//! ```text
//! 原始引用 → ReferenceParser → ProblemRef → EvidenceFetcher → Evidence
//!          → Classifier → Category → CatalogWriter
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ParseError};
pub use models::{CatalogRecord, Category, Evidence, ProblemRef, Source};
pub use orchestrator::{App, RunMode};
pub use services::{
    CatalogWriter, Classifier, EvidenceFetcher, LlmService, ReferenceParser, WorklistScope,
};
