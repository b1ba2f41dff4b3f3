//! 题目类型（分类标签）
//!
//! 固定的 8 个类别，声明顺序即优先级：
//! 当一道题同时符合多个类别时，取列表中靠前的那个。
//! `Misc` 是保底类别，分类永远不会失败。

use std::fmt;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Geometry,
    String,
    Tree,
    Math,
    Graph,
    Queries,
    Array,
    Misc,
}

impl Category {
    /// 全部类别，按优先级排列（靠前者优先）
    pub const ALL: [Category; 8] = [
        Category::Geometry,
        Category::String,
        Category::Tree,
        Category::Math,
        Category::Graph,
        Category::Queries,
        Category::Array,
        Category::Misc,
    ];

    /// 数据库/提示词中使用的小写标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Geometry => "geometry",
            Category::String => "string",
            Category::Tree => "tree",
            Category::Math => "math",
            Category::Graph => "graph",
            Category::Queries => "queries",
            Category::Array => "array",
            Category::Misc => "misc",
        }
    }

    /// 解析 LLM 返回的标签
    ///
    /// 输入已不区分大小写、两端空白会被忽略；
    /// 不在类别集合内的标签返回 None（由调用方回退到 Misc）
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim().to_lowercase();
        Category::ALL.iter().copied().find(|c| c.as_str() == label)
    }

    /// 按优先级排列的标签列表，逗号分隔（用于构建提示词）
    pub fn joined_labels() -> String {
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_all_members() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_from_label_normalizes_case_and_whitespace() {
        assert_eq!(Category::from_label("  Geometry \n"), Some(Category::Geometry));
        assert_eq!(Category::from_label("MATH"), Some(Category::Math));
    }

    #[test]
    fn test_from_label_rejects_unknown() {
        assert_eq!(Category::from_label("dynamic programming"), None);
        assert_eq!(Category::from_label(""), None);
    }

    #[test]
    fn test_priority_order() {
        // geometry 必须排在 math 之前，平局时先到先得
        let geometry_pos = Category::ALL.iter().position(|c| *c == Category::Geometry);
        let math_pos = Category::ALL.iter().position(|c| *c == Category::Math);
        assert!(geometry_pos < math_pos);
        // misc 永远垫底
        assert_eq!(Category::ALL.last(), Some(&Category::Misc));
    }

    #[test]
    fn test_joined_labels() {
        assert_eq!(
            Category::joined_labels(),
            "geometry, string, tree, math, graph, queries, array, misc"
        );
    }
}
