//! Codeforces API 客户端
//!
//! 封装 contest.standings 调用：按比赛ID（可带 gym 标记）获取题目列表。
//! API 返回业务状态字段，非 OK 视为该次调用的硬失败。

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, AppError};

/// API 返回的单个题目
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfProblem {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub rating: Option<u32>,
}

/// API 返回的题目统计（与题目列表平行）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfProblemStatistics {
    pub index: String,
    #[serde(default)]
    pub solved_count: u32,
}

/// 比赛题目列表（contest.standings 的 result 部分）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestProblems {
    #[serde(default)]
    pub problems: Vec<CfProblem>,
    #[serde(default)]
    pub problem_statistics: Vec<CfProblemStatistics>,
}

/// API 响应信封
#[derive(Debug, Deserialize)]
struct CfResponse {
    status: String,
    comment: Option<String>,
    result: Option<ContestProblems>,
}

/// 比赛题目列表能力
#[async_trait]
pub trait ContestApi: Send + Sync {
    /// 按比赛ID获取题目列表；API 业务状态非 OK 时返回 Err
    async fn contest_problems(&self, contest_id: &str, gym: bool) -> Result<ContestProblems>;
}

/// 基于 reqwest 的真实实现
pub struct CodeforcesApi {
    client: reqwest::Client,
    base_url: String,
}

impl CodeforcesApi {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::api_request_failed(base_url, e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContestApi for CodeforcesApi {
    async fn contest_problems(&self, contest_id: &str, gym: bool) -> Result<ContestProblems> {
        // from=1&count=1 只取一行榜单，题目列表仍然是完整的
        let mut endpoint = format!(
            "{}/contest.standings?contestId={}&from=1&count=1",
            self.base_url, contest_id
        );
        if gym {
            endpoint.push_str("&gym=true");
        }

        debug!("请求 Codeforces API: {}", endpoint);

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let envelope: CfResponse = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        if envelope.status != "OK" {
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint,
                status: envelope.status,
                comment: envelope.comment,
            })
            .into());
        }

        let result = envelope.result.ok_or_else(|| {
            AppError::Api(ApiError::BadResponse {
                endpoint,
                status: "OK".to_string(),
                comment: Some("响应缺少 result 字段".to_string()),
            })
        })?;

        debug!("API 返回 {} 道题目", result.problems.len());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_contest_problems() {
        let json = r#"{
            "status": "OK",
            "result": {
                "problems": [
                    {"contestId": 1794, "index": "E", "name": "Labeling the Tree with Distances",
                     "type": "PROGRAMMING", "rating": 2600, "tags": ["dp", "hashing", "trees"]}
                ],
                "problemStatistics": [
                    {"contestId": 1794, "index": "E", "solvedCount": 1514}
                ],
                "rows": []
            }
        }"#;

        let envelope: CfResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "OK");

        let result = envelope.result.unwrap();
        assert_eq!(result.problems.len(), 1);
        assert_eq!(result.problems[0].index, "E");
        assert_eq!(result.problems[0].rating, Some(2600));
        assert_eq!(result.problem_statistics[0].solved_count, 1514);
    }

    #[test]
    fn test_deserialize_failed_status() {
        let json = r#"{"status": "FAILED", "comment": "contestId: Contest with id 999999 not found"}"#;
        let envelope: CfResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "FAILED");
        assert!(envelope.result.is_none());
        assert!(envelope.comment.unwrap().contains("not found"));
    }
}
