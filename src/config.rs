/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// PostgreSQL 连接串（必须通过环境变量提供）
    pub database_url: String,
    /// Codeforces API 基础URL
    pub cf_api_base_url: String,
    /// 页面抓取使用的浏览器 User-Agent
    /// 缺少该请求头会被部分平台的反爬策略直接拒绝
    pub user_agent: String,
    /// 每批处理的题目数量
    pub batch_size: usize,
    /// 每道题抓取与分类之间的固定延迟（秒）
    pub request_delay_secs: f64,
    /// 题面送入分类前的最大长度（字符数）
    pub max_statement_len: usize,
    /// Kattis 题面关键词词表（作为弱标签信号）
    pub statement_keywords: Vec<String>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 入库归属信息 ---
    pub added_by: String,
    pub added_by_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            cf_api_base_url: "https://codeforces.com/api".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            batch_size: 50,
            request_delay_secs: 2.0,
            max_statement_len: 10_000,
            statement_keywords: ["array", "string", "tree", "graph", "math", "geometry"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            llm_model_name: "gemini-2.0-flash-lite".to_string(),
            added_by: "lrvideckis".to_string(),
            added_by_url: "https://codeforces.com/profile/lrvideckis".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(default.database_url),
            cf_api_base_url: std::env::var("CF_API_BASE_URL").unwrap_or(default.cf_api_base_url),
            user_agent: std::env::var("SCRAPE_USER_AGENT").unwrap_or(default.user_agent),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            request_delay_secs: std::env::var("REQUEST_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_delay_secs),
            max_statement_len: std::env::var("MAX_STATEMENT_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_statement_len),
            statement_keywords: default.statement_keywords,
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            added_by: std::env::var("ADDED_BY").unwrap_or(default.added_by),
            added_by_url: std::env::var("ADDED_BY_URL").unwrap_or(default.added_by_url),
        }
    }
}
