//! 题目引用解析 - 业务能力层
//!
//! 只负责"把原始字符串解析成规范的题目身份"，纯函数、无 I/O。
//!
//! 识别的形式（按优先级）：
//! 1. Codeforces 简写 `CF 1794E`（不区分大小写）
//! 2. Gym 简写 `GYM 102253C`
//! 3. Codeforces 完整URL（contest / problemset / gym 三种路径，容忍 mirror 子域名）
//! 4. Kattis 完整URL（可带 open. 子域名）
//! 5. 裸 Kattis slug（纯小写字母数字）
//!
//! 规范化规则：
//! - contest 与 problemset 两种URL统一规范化为 contest 形式
//! - gym 题目保持 gym 路径（与同编号的普通比赛题目区分开）
//! - 对规范化URL再次解析会得到完全相同的结果（幂等）

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::ParseError;
use crate::models::{ProblemRef, Source};

/// 题目引用解析器
///
/// 所有正则在构造时编译一次
pub struct ReferenceParser {
    cf_short: Regex,
    gym_short: Regex,
    url_prefix: Regex,
    cf_contest: Regex,
    cf_problemset: Regex,
    cf_gym: Regex,
    kattis_url: Regex,
    kattis_slug: Regex,
}

impl ReferenceParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cf_short: Regex::new(r"(?i)^CF\s*(\d+)([A-Z\d]+)$").context("编译 CF 简写正则失败")?,
            gym_short: Regex::new(r"(?i)^GYM\s*(\d+)([A-Z\d]+)$")
                .context("编译 GYM 简写正则失败")?,
            url_prefix: Regex::new(r"^(?:https?://)?(?:www\.)?").context("编译URL前缀正则失败")?,
            cf_contest: Regex::new(r"(?:mirror\.)?codeforces\.com/contest/(\d+)/problem/([A-Z\d]+)")
                .context("编译 contest URL 正则失败")?,
            cf_problemset: Regex::new(
                r"(?:mirror\.)?codeforces\.com/problemset/problem/(\d+)/([A-Z\d]+)",
            )
            .context("编译 problemset URL 正则失败")?,
            cf_gym: Regex::new(r"(?:mirror\.)?codeforces\.com/gym/(\d+)/problem/([A-Z\d]+)")
                .context("编译 gym URL 正则失败")?,
            kattis_url: Regex::new(r"(?:open\.)?kattis\.com/problems/([a-z0-9]+)")
                .context("编译 Kattis URL 正则失败")?,
            kattis_slug: Regex::new(r"^[a-z0-9]+$").context("编译 Kattis slug 正则失败")?,
        })
    }

    /// 解析一条原始题目引用
    ///
    /// 来源判定只依赖各平台域名中唯一的标记子串；
    /// 简写形式和裸 slug 没有域名，按各自的形状判定
    pub fn parse(&self, raw: &str) -> Result<ProblemRef, ParseError> {
        let raw = raw.trim();

        // 简写形式优先于URL匹配
        if let Some(caps) = self.cf_short.captures(raw) {
            return Ok(Self::contest_ref(&caps[1], &caps[2].to_uppercase()));
        }
        if let Some(caps) = self.gym_short.captures(raw) {
            return Ok(Self::gym_ref(&caps[1], &caps[2].to_uppercase()));
        }

        if raw.contains("kattis.com") {
            return self.parse_kattis_url(raw);
        }
        if raw.contains("codeforces.com") {
            return self.parse_codeforces_url(raw);
        }

        // 裸的小写字母数字串视为 Kattis slug
        if self.kattis_slug.is_match(raw) {
            return Ok(Self::kattis_ref(raw));
        }

        Err(ParseError::Unrecognized {
            raw: raw.to_string(),
        })
    }

    /// 解析 Codeforces 完整URL
    ///
    /// contest / problemset / gym 三种路径按序尝试；
    /// problemset 形式规范化为 contest 形式
    fn parse_codeforces_url(&self, raw: &str) -> Result<ProblemRef, ParseError> {
        let clean = self.url_prefix.replace(raw, "");

        if let Some(caps) = self.cf_contest.captures(&clean) {
            return Ok(Self::contest_ref(&caps[1], &caps[2]));
        }
        if let Some(caps) = self.cf_problemset.captures(&clean) {
            return Ok(Self::contest_ref(&caps[1], &caps[2]));
        }
        if let Some(caps) = self.cf_gym.captures(&clean) {
            return Ok(Self::gym_ref(&caps[1], &caps[2]));
        }

        Err(ParseError::UnrecognizedCodeforces {
            raw: raw.to_string(),
        })
    }

    /// 解析 Kattis 完整URL
    fn parse_kattis_url(&self, raw: &str) -> Result<ProblemRef, ParseError> {
        let clean = self.url_prefix.replace(raw, "");

        if let Some(caps) = self.kattis_url.captures(&clean) {
            return Ok(Self::kattis_ref(&caps[1]));
        }

        Err(ParseError::UnrecognizedKattis {
            raw: raw.to_string(),
        })
    }

    // ========== 规范化构造 ==========

    fn contest_ref(contest_id: &str, index: &str) -> ProblemRef {
        ProblemRef {
            source: Source::Codeforces,
            problem_id: format!("{}{}", contest_id, index),
            url: format!(
                "https://codeforces.com/contest/{}/problem/{}",
                contest_id, index
            ),
            contest_id: Some(contest_id.to_string()),
            index: Some(index.to_string()),
        }
    }

    /// Gym 题目的 problem_id 带 `G` 前缀，URL保持 gym 路径，
    /// 与同编号的普通比赛题目区分开
    fn gym_ref(contest_id: &str, index: &str) -> ProblemRef {
        ProblemRef {
            source: Source::Codeforces,
            problem_id: format!("G{}{}", contest_id, index),
            url: format!(
                "https://codeforces.com/gym/{}/problem/{}",
                contest_id, index
            ),
            contest_id: Some(contest_id.to_string()),
            index: Some(index.to_string()),
        }
    }

    fn kattis_ref(slug: &str) -> ProblemRef {
        ProblemRef {
            source: Source::Kattis,
            problem_id: slug.to_string(),
            url: format!("https://open.kattis.com/problems/{}", slug),
            contest_id: None,
            index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ReferenceParser {
        ReferenceParser::new().expect("解析器构造失败")
    }

    #[test]
    fn test_cf_shorthand() {
        let p = parser();
        let r = p.parse("CF 1794E").unwrap();

        assert_eq!(r.source, Source::Codeforces);
        assert_eq!(r.problem_id, "1794E");
        assert_eq!(r.url, "https://codeforces.com/contest/1794/problem/E");
        assert_eq!(r.contest_id.as_deref(), Some("1794"));
        assert_eq!(r.index.as_deref(), Some("E"));
    }

    #[test]
    fn test_cf_shorthand_case_insensitive() {
        let p = parser();
        // 前缀大小写、空格有无都接受，序号统一为大写
        assert_eq!(p.parse("cf 1794e").unwrap(), p.parse("CF1794E").unwrap());
    }

    #[test]
    fn test_all_cf_forms_share_canonical_url() {
        let p = parser();
        let expected = "https://codeforces.com/contest/1794/problem/E";

        for raw in [
            "CF 1794E",
            "https://codeforces.com/contest/1794/problem/E",
            "http://www.codeforces.com/contest/1794/problem/E",
            "codeforces.com/problemset/problem/1794/E",
            "https://mirror.codeforces.com/contest/1794/problem/E",
        ] {
            let r = p.parse(raw).unwrap();
            assert_eq!(r.url, expected, "raw={}", raw);
            assert_eq!(r.problem_id, "1794E", "raw={}", raw);
        }
    }

    #[test]
    fn test_gym_shorthand() {
        let p = parser();
        let r = p.parse("GYM 102253C").unwrap();

        assert_eq!(r.problem_id, "G102253C");
        assert_eq!(r.url, "https://codeforces.com/gym/102253/problem/C");
        assert!(r.is_gym());
    }

    #[test]
    fn test_gym_distinct_from_contest() {
        let p = parser();
        let gym = p.parse("GYM 1794E").unwrap();
        let contest = p.parse("CF 1794E").unwrap();

        // 同编号的 gym 题和比赛题是两个不同的身份
        assert_ne!(gym.url, contest.url);
        assert_ne!(gym.problem_id, contest.problem_id);
    }

    #[test]
    fn test_gym_url() {
        let p = parser();
        let r = p
            .parse("https://codeforces.com/gym/102253/problem/C")
            .unwrap();
        assert_eq!(r.problem_id, "G102253C");
        assert_eq!(r.url, "https://codeforces.com/gym/102253/problem/C");
    }

    #[test]
    fn test_multi_char_index() {
        let p = parser();
        let r = p
            .parse("https://codeforces.com/contest/1793/problem/E1")
            .unwrap();
        assert_eq!(r.index.as_deref(), Some("E1"));
        assert_eq!(r.problem_id, "1793E1");
    }

    #[test]
    fn test_kattis_bare_slug() {
        let p = parser();
        let r = p.parse("abc123").unwrap();

        assert_eq!(r.source, Source::Kattis);
        assert_eq!(r.problem_id, "abc123");
        assert_eq!(r.url, "https://open.kattis.com/problems/abc123");
        assert_eq!(r.contest_id, None);
        assert_eq!(r.index, None);
    }

    #[test]
    fn test_kattis_url_forms() {
        let p = parser();
        let expected = "https://open.kattis.com/problems/hello";

        for raw in [
            "https://open.kattis.com/problems/hello",
            "kattis.com/problems/hello",
            "http://www.kattis.com/problems/hello",
            "hello",
        ] {
            let r = p.parse(raw).unwrap();
            assert_eq!(r.url, expected, "raw={}", raw);
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let p = parser();
        for raw in ["CF 1794E", "GYM 102253C", "abc123", "codeforces.com/problemset/problem/342/E"] {
            let first = p.parse(raw).unwrap();
            let second = p.parse(&first.url).unwrap();
            assert_eq!(first, second, "raw={}", raw);
        }
    }

    #[test]
    fn test_unrecognized_reference() {
        let p = parser();

        assert!(matches!(
            p.parse("not-a-url"),
            Err(ParseError::Unrecognized { .. })
        ));
        assert!(matches!(
            p.parse("https://codeforces.com/blog/entry/123"),
            Err(ParseError::UnrecognizedCodeforces { .. })
        ));
        assert!(matches!(
            p.parse("https://open.kattis.com/contests/abc"),
            Err(ParseError::UnrecognizedKattis { .. })
        ));
        assert!(p.parse("").is_err());
    }
}
