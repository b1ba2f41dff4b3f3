//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<引用> / Vec<目录行>)
//!     ↓
//! services (能力层：parse / fetch / classify / write)
//!     ↓
//! clients (基础设施：Codeforces API / 页面抓取 / LLM)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源所有者**：只有编排层持有数据库连接池和各客户端
//! 2. **条目隔离**：单个条目的失败不越过编排层的边界
//! 3. **无业务逻辑**：只做调度、事务和统计，不做具体业务判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats, RunMode};
