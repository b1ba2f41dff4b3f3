//! 证据抓取 - 业务能力层
//!
//! 只负责"给定题目身份，取回分类证据"，按来源使用不同策略：
//!
//! - Codeforces：先查 contest.standings API 拿名称/标签/难度，
//!   再抓题目页面提取题面文本。API 失败是硬失败（整体降级为空证据）；
//!   页面失败是软失败（保留 API 证据，题面为空）。
//!   Gym 比赛经常不在公开列表 API 中，找不到时合成最小证据兜底。
//! - Kattis：只有页面可抓。名称取页面 h1，缺失时由 slug 变换得到；
//!   平台没有官方标签，用固定词表对题面做小写子串扫描得到弱标签信号。
//!
//! `fetch` 永不失败：任何错误都降级为部分/空证据并通过日志报告。

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::{ContestApi, PageFetcher};
use crate::error::{ApiError, AppError};
use crate::models::{Evidence, ProblemRef, Source};

/// 证据抓取服务
pub struct EvidenceFetcher {
    api: Arc<dyn ContestApi>,
    pages: Arc<dyn PageFetcher>,
    /// Kattis 关键词词表（构造时注入，测试可替换）
    statement_keywords: Vec<String>,
}

impl EvidenceFetcher {
    pub fn new(
        api: Arc<dyn ContestApi>,
        pages: Arc<dyn PageFetcher>,
        statement_keywords: Vec<String>,
    ) -> Self {
        Self {
            api,
            pages,
            statement_keywords,
        }
    }

    /// 抓取一道题的分类证据
    ///
    /// 永不返回错误：失败降级为空证据，并用 warn 日志说明原因
    pub async fn fetch(&self, problem: &ProblemRef) -> Evidence {
        let result = match problem.source {
            Source::Codeforces => self.fetch_codeforces(problem).await,
            Source::Kattis => self.fetch_kattis(problem).await,
        };

        match result {
            Ok(evidence) => {
                debug!(
                    "证据抓取完成 ({}): 名称 '{}', {} 个标签, 题面 {} 字符",
                    problem.problem_id,
                    evidence.display_name,
                    evidence.raw_tags.len(),
                    evidence.statement_text.chars().count()
                );
                evidence
            }
            Err(e) => {
                warn!("⚠️ 证据抓取失败 ({}): {}", problem.problem_id, e);
                Evidence::empty()
            }
        }
    }

    /// Codeforces 策略：API + 页面抓取
    async fn fetch_codeforces(&self, problem: &ProblemRef) -> Result<Evidence> {
        let contest_id = problem
            .contest_id
            .as_deref()
            .ok_or_else(|| anyhow!("Codeforces 题目缺少比赛ID: {}", problem.problem_id))?;
        let index = problem
            .index
            .as_deref()
            .ok_or_else(|| anyhow!("Codeforces 题目缺少序号: {}", problem.problem_id))?;
        let is_gym = problem.is_gym();

        // 第一步：API 获取名称/标签（非 OK 状态在这里直接失败）
        let listing = self.api.contest_problems(contest_id, is_gym).await?;

        let mut evidence = match listing.problems.iter().find(|p| p.index == index) {
            Some(p) => {
                let solved_count = listing
                    .problem_statistics
                    .iter()
                    .find(|s| s.index == index)
                    .map(|s| s.solved_count);

                Evidence {
                    display_name: p.name.clone(),
                    raw_tags: p.tags.clone(),
                    statement_text: String::new(),
                    difficulty: p.rating,
                    solved_count,
                }
            }
            None if is_gym => {
                // Gym 比赛经常缺席公开列表 API，合成最小证据避免整类硬失败
                warn!(
                    "⚠️ Gym 比赛 {} 不在 API 列表中，使用合成证据",
                    contest_id
                );
                Evidence {
                    display_name: format!(
                        "Problem {} from Gym Contest {}",
                        index, contest_id
                    ),
                    raw_tags: vec!["gym".to_string()],
                    ..Default::default()
                }
            }
            None => {
                return Err(anyhow!(
                    "API 响应中找不到题目 {} (比赛 {})",
                    index,
                    contest_id
                ));
            }
        };

        // 第二步：页面抓取题面，软失败（保留已获得的 API 证据）
        match self.pages.fetch(&problem.url).await {
            Ok(page) if page.is_success() => {
                match extract_codeforces_statement(&page.body) {
                    Some(text) => evidence.statement_text = text,
                    None => warn!("⚠️ 页面中找不到题面区域: {}", problem.url),
                }
            }
            Ok(page) => {
                warn!(
                    "⚠️ 题面页面返回 HTTP {}，仅保留 API 证据: {}",
                    page.status, problem.url
                );
            }
            Err(e) => {
                warn!("⚠️ 题面页面抓取失败，仅保留 API 证据: {}", e);
            }
        }

        Ok(evidence)
    }

    /// Kattis 策略：仅页面抓取（没有 API）
    async fn fetch_kattis(&self, problem: &ProblemRef) -> Result<Evidence> {
        let page = self.pages.fetch(&problem.url).await?;

        if !page.is_success() {
            return Err(AppError::Api(ApiError::HttpStatus {
                url: problem.url.clone(),
                status: page.status,
            })
            .into());
        }

        let extracted = extract_kattis_page(&page.body);

        let display_name = extracted
            .heading
            .unwrap_or_else(|| title_from_slug(&problem.problem_id));
        let statement_text = extracted.body_text.unwrap_or_default();
        let raw_tags = keyword_tags(&statement_text, &self.statement_keywords);

        Ok(Evidence {
            display_name,
            raw_tags,
            statement_text,
            difficulty: None,
            solved_count: None,
        })
    }
}

// ========== HTML 提取辅助函数（同步，Html 不跨 await 持有） ==========

/// 提取 Codeforces 题面文本
///
/// 取 `div.problem-statement` 的可见文本，跳过输入/输出说明和样例三个子区域
/// （结构化表格内容只添噪声，不提供分类信号）；区域不存在时返回 None
fn extract_codeforces_statement(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("div.problem-statement").ok()?;
    let skip_classes = ["input-specification", "output-specification", "sample-tests"];

    let statement = document.select(&selector).next()?;

    let mut parts: Vec<String> = Vec::new();
    for child in statement.children().filter_map(ElementRef::wrap) {
        if child.value().classes().any(|c| skip_classes.contains(&c)) {
            continue;
        }
        parts.extend(
            child
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
    }

    Some(parts.join(" "))
}

/// Kattis 页面的提取结果
struct KattisPage {
    heading: Option<String>,
    body_text: Option<String>,
}

/// 提取 Kattis 页面的标题和题面文本
fn extract_kattis_page(body: &str) -> KattisPage {
    let document = Html::parse_document(body);

    let heading = Selector::parse("h1").ok().and_then(|sel| {
        document.select(&sel).next().and_then(|h1| {
            let text = element_text(&h1);
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
    });

    let body_text = Selector::parse("div.problembody")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(|div| element_text(&div)));

    KattisPage { heading, body_text }
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 由 slug 生成显示名称：连字符换空格，每个词首字母大写
fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 对题面做小写子串扫描，命中的词表项按词表顺序作为弱标签
fn keyword_tags(statement: &str, vocabulary: &[String]) -> Vec<String> {
    if statement.is_empty() {
        return Vec::new();
    }
    let lowered = statement.to_lowercase();
    vocabulary
        .iter()
        .filter(|keyword| lowered.contains(keyword.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::cf_api::{CfProblem, CfProblemStatistics};
    use crate::clients::{ContestProblems, PageResponse};
    use anyhow::bail;
    use async_trait::async_trait;

    /// 返回固定响应的假 API
    struct FakeApi {
        listing: Option<ContestProblems>,
    }

    #[async_trait]
    impl ContestApi for FakeApi {
        async fn contest_problems(&self, _contest_id: &str, _gym: bool) -> Result<ContestProblems> {
            match &self.listing {
                Some(listing) => Ok(listing.clone()),
                None => bail!("API 返回 FAILED"),
            }
        }
    }

    /// 返回固定页面的假抓取器
    struct FakePages {
        response: Option<PageResponse>,
    }

    #[async_trait]
    impl PageFetcher for FakePages {
        async fn fetch(&self, _url: &str) -> Result<PageResponse> {
            match &self.response {
                Some(page) => Ok(page.clone()),
                None => bail!("网络超时"),
            }
        }
    }

    fn vocab() -> Vec<String> {
        ["array", "string", "tree", "graph", "math", "geometry"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn fetcher(api: FakeApi, pages: FakePages) -> EvidenceFetcher {
        EvidenceFetcher::new(Arc::new(api), Arc::new(pages), vocab())
    }

    fn cf_listing() -> ContestProblems {
        ContestProblems {
            problems: vec![CfProblem {
                index: "E".to_string(),
                name: "Labeling the Tree with Distances".to_string(),
                tags: vec!["dp".to_string(), "trees".to_string()],
                rating: Some(2600),
            }],
            problem_statistics: vec![CfProblemStatistics {
                index: "E".to_string(),
                solved_count: 1514,
            }],
        }
    }

    fn cf_ref() -> ProblemRef {
        ProblemRef {
            source: Source::Codeforces,
            problem_id: "1794E".to_string(),
            url: "https://codeforces.com/contest/1794/problem/E".to_string(),
            contest_id: Some("1794".to_string()),
            index: Some("E".to_string()),
        }
    }

    fn gym_ref() -> ProblemRef {
        ProblemRef {
            source: Source::Codeforces,
            problem_id: "G102253C".to_string(),
            url: "https://codeforces.com/gym/102253/problem/C".to_string(),
            contest_id: Some("102253".to_string()),
            index: Some("C".to_string()),
        }
    }

    fn kattis_ref() -> ProblemRef {
        ProblemRef {
            source: Source::Kattis,
            problem_id: "hello".to_string(),
            url: "https://open.kattis.com/problems/hello".to_string(),
            contest_id: None,
            index: None,
        }
    }

    const CF_PAGE: &str = r#"
        <html><body><div class="problem-statement">
            <div class="header"><div class="title">E. Labeling</div></div>
            <div><p>You are given a tree with weighted edges.</p></div>
            <div class="input-specification"><p>The first line contains n.</p></div>
            <div class="output-specification"><p>Print one integer.</p></div>
            <div class="sample-tests"><pre>3 1 2</pre></div>
            <div class="note"><p>In the first example the answer is 2.</p></div>
        </div></body></html>"#;

    #[tokio::test]
    async fn test_codeforces_full_evidence() {
        let f = fetcher(
            FakeApi {
                listing: Some(cf_listing()),
            },
            FakePages {
                response: Some(PageResponse {
                    status: 200,
                    body: CF_PAGE.to_string(),
                }),
            },
        );

        let evidence = f.fetch(&cf_ref()).await;

        assert_eq!(evidence.display_name, "Labeling the Tree with Distances");
        assert_eq!(evidence.raw_tags, vec!["dp", "trees"]);
        assert_eq!(evidence.difficulty, Some(2600));
        assert_eq!(evidence.solved_count, Some(1514));
        assert!(evidence.statement_text.contains("weighted edges"));
        // 输入/输出说明和样例不应进入题面
        assert!(!evidence.statement_text.contains("first line contains"));
        assert!(!evidence.statement_text.contains("Print one integer"));
        assert!(!evidence.statement_text.contains("3 1 2"));
    }

    #[tokio::test]
    async fn test_codeforces_partial_evidence_on_page_failure() {
        // API 成功、页面 403：保留名称/标签，题面为空
        let f = fetcher(
            FakeApi {
                listing: Some(cf_listing()),
            },
            FakePages {
                response: Some(PageResponse {
                    status: 403,
                    body: String::new(),
                }),
            },
        );

        let evidence = f.fetch(&cf_ref()).await;

        assert_eq!(evidence.display_name, "Labeling the Tree with Distances");
        assert!(!evidence.raw_tags.is_empty());
        assert!(evidence.statement_text.is_empty());
    }

    #[tokio::test]
    async fn test_codeforces_api_failure_degrades_to_empty() {
        let f = fetcher(
            FakeApi { listing: None },
            FakePages {
                response: Some(PageResponse {
                    status: 200,
                    body: CF_PAGE.to_string(),
                }),
            },
        );

        let evidence = f.fetch(&cf_ref()).await;
        assert!(evidence.is_empty());
    }

    #[tokio::test]
    async fn test_gym_fallback_synthesizes_evidence() {
        // API 正常返回，但列表中没有该 gym 比赛的题目
        let f = fetcher(
            FakeApi {
                listing: Some(ContestProblems {
                    problems: vec![],
                    problem_statistics: vec![],
                }),
            },
            FakePages { response: None },
        );

        let evidence = f.fetch(&gym_ref()).await;

        assert_eq!(evidence.display_name, "Problem C from Gym Contest 102253");
        assert_eq!(evidence.raw_tags, vec!["gym"]);
        assert!(evidence.statement_text.is_empty());
    }

    #[tokio::test]
    async fn test_non_gym_missing_problem_is_empty() {
        let f = fetcher(
            FakeApi {
                listing: Some(ContestProblems {
                    problems: vec![],
                    problem_statistics: vec![],
                }),
            },
            FakePages { response: None },
        );

        let evidence = f.fetch(&cf_ref()).await;
        assert!(evidence.is_empty());
    }

    #[tokio::test]
    async fn test_kattis_evidence_with_keyword_tags() {
        let page = r#"
            <html><body>
                <h1>Hello World!</h1>
                <div class="problembody">
                    <p>Print a greeting. This is a classic string problem
                    involving no graph theory at all.</p>
                </div>
            </body></html>"#;

        let f = fetcher(
            FakeApi { listing: None },
            FakePages {
                response: Some(PageResponse {
                    status: 200,
                    body: page.to_string(),
                }),
            },
        );

        let evidence = f.fetch(&kattis_ref()).await;

        assert_eq!(evidence.display_name, "Hello World!");
        // 词表顺序：string 在 graph 之前
        assert_eq!(evidence.raw_tags, vec!["string", "graph"]);
        assert!(evidence.statement_text.contains("Print a greeting"));
        assert_eq!(evidence.difficulty, None);
    }

    #[tokio::test]
    async fn test_kattis_name_falls_back_to_slug() {
        let page = "<html><body><div class=\"problembody\"><p>No heading here.</p></div></body></html>";

        let f = fetcher(
            FakeApi { listing: None },
            FakePages {
                response: Some(PageResponse {
                    status: 200,
                    body: page.to_string(),
                }),
            },
        );

        let problem = ProblemRef {
            problem_id: "hello-world".to_string(),
            ..kattis_ref()
        };
        let evidence = f.fetch(&problem).await;

        assert_eq!(evidence.display_name, "Hello World");
    }

    #[tokio::test]
    async fn test_kattis_http_error_is_empty() {
        let f = fetcher(
            FakeApi { listing: None },
            FakePages {
                response: Some(PageResponse {
                    status: 404,
                    body: String::new(),
                }),
            },
        );

        let evidence = f.fetch(&kattis_ref()).await;
        assert!(evidence.is_empty());
    }

    #[test]
    fn test_extract_statement_missing_region() {
        assert_eq!(
            extract_codeforces_statement("<html><body><p>nothing</p></body></html>"),
            None
        );
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("hello"), "Hello");
        assert_eq!(title_from_slug("abc123"), "Abc123");
        assert_eq!(title_from_slug("two-sum"), "Two Sum");
    }

    #[test]
    fn test_keyword_tags_empty_statement() {
        assert!(keyword_tags("", &vocab()).is_empty());
    }
}
