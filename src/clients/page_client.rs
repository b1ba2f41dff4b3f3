//! 页面抓取客户端
//!
//! 封装"抓取一个URL，返回状态码 + 原始文档"的能力。
//! 抽象成 trait 以便测试时注入确定性的假实现。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// 页面抓取结果
///
/// 非 2xx 也作为正常返回（软失败由调用方决定如何降级）
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取页面；只有网络层面的失败才返回 Err
    async fn fetch(&self, url: &str) -> Result<PageResponse>;
}

/// 基于 reqwest 的真实实现
///
/// 请求始终携带浏览器 User-Agent：
/// 缺少该请求头会被部分平台的反爬策略直接拒绝，这是正确性要求
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageResponse> {
        debug!("抓取页面: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("页面请求失败: {}", url))?;

        let status = response.status().as_u16();
        let body = response.text().await.context("读取响应内容失败")?;

        debug!("页面抓取完成: {} (HTTP {}, {} 字节)", url, status, body.len());

        Ok(PageResponse { status, body })
    }
}
