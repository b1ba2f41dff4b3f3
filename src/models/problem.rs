//! 题目领域模型
//!
//! - `ProblemRef`: 解析后的题目身份（规范化URL是唯一的自然键）
//! - `Evidence`: 送入分类的证据三元组（名称、标签、题面）
//! - `CatalogRecord`: 入库的完整记录

use std::fmt;

use crate::models::Category;

/// 题目来源平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Codeforces：公开 API + HTML 页面
    Codeforces,
    /// Kattis：仅 HTML 页面
    Kattis,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Codeforces => f.write_str("codeforces"),
            Source::Kattis => f.write_str("kattis"),
        }
    }
}

/// 题目身份
///
/// 不变式：`url` 是 `(source, contest_id/problem_id, index)` 的纯函数；
/// 指向同一道题的不同原始引用必须规范化为相同的 `url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRef {
    pub source: Source,
    /// 平台内唯一ID：Codeforces 为 `{G?}{contestId}{index}`，Kattis 为小写 slug
    pub problem_id: String,
    /// 规范化URL，持久化的自然键
    pub url: String,
    /// 仅 Codeforces：比赛ID
    pub contest_id: Option<String>,
    /// 仅 Codeforces：题目序号（大小写敏感，如 "E1"、"G"）
    pub index: Option<String>,
}

impl ProblemRef {
    /// 是否为 Gym 题目（规范化URL位于 gym/ 路径下）
    pub fn is_gym(&self) -> bool {
        self.url.contains("/gym/")
    }
}

/// 分类证据
///
/// 只作为分类输入和入库字段，不单独持久化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    pub display_name: String,
    pub raw_tags: Vec<String>,
    /// 题面文本，可能为空（部分证据）
    pub statement_text: String,
    /// 来自 API 的难度评分（仅 Codeforces，且并非所有题目都有）
    pub difficulty: Option<u32>,
    /// 解题人数统计（仅在 API 返回统计数据时存在）
    pub solved_count: Option<u32>,
}

impl Evidence {
    /// 完全空的证据（抓取整体失败时的退化结果）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.raw_tags.is_empty() && self.statement_text.is_empty()
    }
}

/// 入库记录
///
/// `url` 是自然键；`problem_type` 在分类完成前为空
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub name: String,
    pub tags: Vec<String>,
    pub difficulty: i32,
    pub url: String,
    pub solved: i32,
    pub date_added: String,
    pub added_by: String,
    pub added_by_url: String,
    pub likes: i32,
    pub dislikes: i32,
    pub problem_type: Option<String>,
}

impl CatalogRecord {
    /// 由题目身份 + 证据 + 分类结果组装入库记录
    pub fn from_pipeline(
        problem: &ProblemRef,
        evidence: &Evidence,
        category: Category,
        added_by: &str,
        added_by_url: &str,
    ) -> Self {
        Self {
            name: evidence.display_name.clone(),
            tags: evidence.raw_tags.clone(),
            difficulty: evidence.difficulty.unwrap_or(0) as i32,
            url: problem.url.clone(),
            solved: evidence.solved_count.unwrap_or(0) as i32,
            date_added: chrono::Local::now().format("%Y-%m-%d").to_string(),
            added_by: added_by.to_string(),
            added_by_url: added_by_url.to_string(),
            likes: 0,
            dislikes: 0,
            problem_type: Some(category.as_str().to_string()),
        }
    }
}

/// 分类工作列表中的一行（从数据库读出）
#[derive(Debug, Clone)]
pub struct WorklistRow {
    pub id: i64,
    pub name: String,
    pub tags: Vec<String>,
    pub url: String,
}
