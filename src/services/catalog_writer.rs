//! 目录写入 - 业务能力层
//!
//! 只负责题目目录表的读写。规范化URL是自然键：
//! 插入使用 `ON CONFLICT (url) DO NOTHING`，在并发写入下原子、
//! 重试同一条目时幂等，重复身份静默跳过而不是报错。

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

use crate::error::AppError;
use crate::models::{CatalogRecord, Category, WorklistRow};

/// 分类工作列表的选取范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorklistScope {
    /// 全部行
    All,
    /// 仅 type 为空的行
    UnclassifiedOnly,
}

/// 目录写入服务
pub struct CatalogWriter {
    pool: PgPool,
}

impl CatalogWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立数据库连接池
    pub async fn connect(database_url: &str) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| AppError::db_query_failed("连接数据库", e))?;
        Ok(pool)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 确保目录表存在
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS problems (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                tags TEXT[] NOT NULL DEFAULT '{}',
                difficulty INTEGER NOT NULL DEFAULT 0,
                url TEXT NOT NULL UNIQUE,
                solved INTEGER NOT NULL DEFAULT 0,
                date_added TEXT NOT NULL DEFAULT '',
                added_by TEXT NOT NULL DEFAULT '',
                added_by_url TEXT NOT NULL DEFAULT '',
                likes INTEGER NOT NULL DEFAULT 0,
                dislikes INTEGER NOT NULL DEFAULT 0,
                type TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::db_query_failed("创建 problems 表", e))?;

        Ok(())
    }

    /// 读取分类工作列表
    pub async fn load_worklist(&self, scope: WorklistScope) -> Result<Vec<WorklistRow>> {
        let sql = match scope {
            WorklistScope::All => "SELECT id, name, tags, url FROM problems ORDER BY id",
            WorklistScope::UnclassifiedOnly => {
                "SELECT id, name, tags, url FROM problems WHERE type IS NULL ORDER BY id"
            }
        };

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::db_query_failed("读取工作列表", e))?;

        let worklist = rows
            .iter()
            .map(|row| WorklistRow {
                id: row.get("id"),
                name: row.get("name"),
                tags: row.try_get("tags").unwrap_or_default(),
                url: row.get("url"),
            })
            .collect();

        Ok(worklist)
    }

    /// 插入一条目录记录，自然键已存在时静默跳过
    ///
    /// 返回是否实际插入了新行
    pub async fn insert_if_absent(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &CatalogRecord,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO problems
                (name, tags, difficulty, url, solved, date_added,
                 added_by, added_by_url, likes, dislikes, type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(&record.name)
        .bind(&record.tags)
        .bind(record.difficulty)
        .bind(&record.url)
        .bind(record.solved)
        .bind(&record.date_added)
        .bind(&record.added_by)
        .bind(&record.added_by_url)
        .bind(record.likes)
        .bind(record.dislikes)
        .bind(&record.problem_type)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::db_query_failed("插入题目", e))?;

        let inserted = result.rows_affected() == 1;
        if !inserted {
            debug!("题目已存在，跳过: {}", record.url);
        }

        Ok(inserted)
    }

    /// 更新一行的分类结果
    pub async fn set_problem_type(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        category: Category,
    ) -> Result<()> {
        sqlx::query("UPDATE problems SET type = $1 WHERE id = $2")
            .bind(category.as_str())
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::db_query_failed("更新题目分类", e))?;

        Ok(())
    }
}
