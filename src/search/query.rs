//! Free-form input → FTS5 MATCH expression / 用户输入转换为 FTS5 查询
//!
//! - Input with whitespace: exact phrase, `"error occurred"`
//! - Input without whitespace: prefix, `"192.168.1.1"*`
//!
//! Multi-word input is matched as a contiguous phrase, not as "all words in
//! any order". The term is always emitted inside an FTS5 string so `.`, `@`,
//! `-`, `:` and keywords like `OR` stay literal; `"` is escaped by doubling.

use serde::Serialize;

/// How the input is matched / 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryMode {
    /// Whole input as one contiguous phrase / 精确短语
    Phrase,
    /// Tokens starting with the input / 前缀匹配
    Prefix,
}

/// Translated query, consumed unmodified by `MATCH ?` / 转换后的查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtsQuery {
    pub mode: QueryMode,
    pub expr: String,
    searchable: bool,
}

impl FtsQuery {
    /// No token characters at all: can never match / 不含可索引字符
    pub fn is_empty(&self) -> bool {
        !self.searchable
    }
}

/// Escape FTS5 string syntax by doubling quotes / 转义双引号
pub fn escape_fts5(text: &str) -> String {
    text.replace('"', "\"\"")
}

/// Translate trimmed user input / 转换用户输入
pub fn translate(input: &str) -> FtsQuery {
    let escaped = escape_fts5(input);
    // unicode61 only emits tokens made of letters and digits
    let searchable = input.chars().any(char::is_alphanumeric);

    if escaped.chars().any(char::is_whitespace) {
        FtsQuery {
            mode: QueryMode::Phrase,
            expr: format!("\"{}\"", escaped),
            searchable,
        }
    } else {
        FtsQuery {
            mode: QueryMode::Prefix,
            expr: format!("\"{}\"*", escaped),
            searchable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_becomes_prefix_query() {
        let q = translate("192.168.1.1");
        assert_eq!(q.mode, QueryMode::Prefix);
        assert_eq!(q.expr, "\"192.168.1.1\"*");
    }

    #[test]
    fn test_words_become_phrase_query() {
        let q = translate("error occurred");
        assert_eq!(q.mode, QueryMode::Phrase);
        assert_eq!(q.expr, "\"error occurred\"");
    }

    #[test]
    fn test_any_whitespace_selects_phrase() {
        assert_eq!(translate("error\toccurred").mode, QueryMode::Phrase);
    }

    #[test]
    fn test_quotes_cannot_close_the_string() {
        let q = translate("say\"hi");
        assert_eq!(q.expr, "\"say\"\"hi\"*");

        let q = translate("a\" OR \"b");
        assert_eq!(q.mode, QueryMode::Phrase);
        assert_eq!(q.expr, "\"a\"\" OR \"\"b\"");

        // strip the outer quotes: every remaining quote is doubled
        let inner = &q.expr[1..q.expr.len() - 1];
        assert!(!inner.replace("\"\"", "").contains('"'));
    }

    #[test]
    fn test_operators_stay_literal() {
        assert_eq!(translate("NEAR(a").expr, "\"NEAR(a\"*");
        assert_eq!(translate("user@example.com").expr, "\"user@example.com\"*");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert!(translate("!!").is_empty());
        assert!(translate("\"\"").is_empty());
        assert!(!translate("42").is_empty());
    }
}
