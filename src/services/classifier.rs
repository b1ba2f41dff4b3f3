//! 题目分类 - 业务能力层
//!
//! 只负责"给定证据，返回一个类别标签"，每道题一次远程调用。
//!
//! 分类是全函数：无论证据多残缺、远程调用怎样失败，
//! 都会返回类别集合中的某个成员，保底为 `misc`。

use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{Category, Evidence};
use crate::services::llm_service::ChatApi;

/// 题目分类服务
pub struct Classifier {
    llm: Arc<dyn ChatApi>,
    /// 题面送入提示词前的最大长度（字符数），超长会触发远程上下文限制
    max_statement_len: usize,
}

impl Classifier {
    pub fn new(llm: Arc<dyn ChatApi>, max_statement_len: usize) -> Self {
        Self {
            llm,
            max_statement_len,
        }
    }

    /// 对一道题分类
    ///
    /// 远程调用失败或返回集合外标签时回退到 `misc` 并记录 warn，
    /// 失败永不向上传播
    pub async fn classify(&self, evidence: &Evidence) -> Category {
        let (user_message, system_message) = self.build_classify_messages(evidence);

        let response = match self.llm.chat(&user_message, Some(&system_message)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "⚠️ 分类调用失败 (题目 '{}')，回退到 misc: {}",
                    evidence.display_name, e
                );
                return Category::Misc;
            }
        };

        // 约定只看回复的第一行：大小写折叠、去除首尾空白后作为标签
        let label = response.lines().next().unwrap_or("").trim().to_lowercase();

        match Category::from_label(&label) {
            Some(category) => {
                debug!("题目 '{}' 分类为 {}", evidence.display_name, category);
                category
            }
            None => {
                warn!(
                    "⚠️ 无效的分类标签 '{}' (题目 '{}')，回退到 misc",
                    label, evidence.display_name
                );
                Category::Misc
            }
        }
    }

    /// 构建分类提示词
    ///
    /// 返回 (user_message, system_message)。
    /// 类别列表按优先级排列，并显式要求平局时取列表中靠前者——
    /// 这是必须传达给远程能力的策略，不能指望它自发涌现
    fn build_classify_messages(&self, evidence: &Evidence) -> (String, String) {
        let system_message = "你是一个竞赛编程题目分类助手。\
                              你只返回给定类别列表中的一个类别名，不返回任何其他内容。"
            .to_string();

        let tags_line = if evidence.raw_tags.is_empty() {
            "None".to_string()
        } else {
            evidence.raw_tags.join(", ")
        };

        let statement = self.truncate_statement(&evidence.statement_text);
        let statement_block = if statement.is_empty() {
            "Not available".to_string()
        } else {
            statement
        };

        let user_message = format!(
            r#"Given the following competitive programming problem, classify it into ONE of these types:
{}

Problem name: {}
Problem tags: {}

Problem statement:
{}

IMPORTANT: Choose the FIRST category in the list that applies to this problem.
For example, if a problem could be both "geometry" and "math", choose "geometry"
since it appears first in the list.

Return only the type name, nothing else."#,
            Category::joined_labels(),
            evidence.display_name,
            tags_line,
            statement_block
        );

        (user_message, system_message)
    }

    /// 截断超长题面（按字符计数，不会切断 UTF-8 序列）
    fn truncate_statement(&self, statement: &str) -> String {
        if statement.chars().count() > self.max_statement_len {
            statement
                .chars()
                .take(self.max_statement_len)
                .collect::<String>()
                + "..."
        } else {
            statement.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 返回固定回复的假 LLM，同时记录收到的提示词
    struct FakeChat {
        reply: Option<String>,
        last_prompt: Mutex<String>,
    }

    impl FakeChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                last_prompt: Mutex::new(String::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl ChatApi for FakeChat {
        async fn chat(&self, user_message: &str, _system_message: Option<&str>) -> Result<String> {
            *self.last_prompt.lock().unwrap() = user_message.to_string();
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => bail!("上游 503"),
            }
        }
    }

    fn evidence() -> Evidence {
        Evidence {
            display_name: "Convex Hull".to_string(),
            raw_tags: vec!["geometry".to_string(), "math".to_string()],
            statement_text: "Compute the convex hull of n points.".to_string(),
            difficulty: None,
            solved_count: None,
        }
    }

    #[tokio::test]
    async fn test_classify_valid_label() {
        let classifier = Classifier::new(Arc::new(FakeChat::replying("geometry")), 10_000);
        assert_eq!(classifier.classify(&evidence()).await, Category::Geometry);
    }

    #[tokio::test]
    async fn test_classify_normalizes_label() {
        // 大小写折叠 + 只取第一行
        let classifier = Classifier::new(
            Arc::new(FakeChat::replying("  Geometry \n因为题目涉及凸包")),
            10_000,
        );
        assert_eq!(classifier.classify(&evidence()).await, Category::Geometry);
    }

    #[tokio::test]
    async fn test_classify_invalid_label_falls_back_to_misc() {
        let classifier = Classifier::new(
            Arc::new(FakeChat::replying("computational geometry")),
            10_000,
        );
        assert_eq!(classifier.classify(&evidence()).await, Category::Misc);
    }

    #[tokio::test]
    async fn test_classify_api_failure_falls_back_to_misc() {
        let classifier = Classifier::new(Arc::new(FakeChat::failing()), 10_000);
        assert_eq!(classifier.classify(&evidence()).await, Category::Misc);
    }

    #[tokio::test]
    async fn test_classify_total_on_empty_evidence() {
        // 空证据也必须得到集合内的结果
        let classifier = Classifier::new(Arc::new(FakeChat::replying("misc")), 10_000);
        let result = classifier.classify(&Evidence::empty()).await;
        assert!(Category::ALL.contains(&result));
    }

    #[tokio::test]
    async fn test_prompt_contains_tie_break_and_sentinels() {
        let chat = Arc::new(FakeChat::replying("misc"));
        let classifier = Classifier::new(chat.clone(), 10_000);

        classifier.classify(&Evidence::empty()).await;

        let prompt = chat.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("Choose the FIRST category"));
        assert!(prompt.contains("Problem tags: None"));
        assert!(prompt.contains("Not available"));
        assert!(prompt.contains(&Category::joined_labels()));
    }

    #[tokio::test]
    async fn test_prompt_truncates_long_statement() {
        let chat = Arc::new(FakeChat::replying("misc"));
        let classifier = Classifier::new(chat.clone(), 100);

        let mut long_evidence = evidence();
        long_evidence.statement_text = "很".repeat(500);
        classifier.classify(&long_evidence).await;

        let prompt = chat.last_prompt.lock().unwrap().clone();
        // 被截断的题面：100 个字符 + "..."
        assert!(prompt.contains(&("很".repeat(100) + "...")));
        assert!(!prompt.contains(&"很".repeat(101)));
    }
}
