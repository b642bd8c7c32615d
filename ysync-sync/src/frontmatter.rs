//! Minimal front-matter reader and Markdown length heuristics.
//!
//! Only flat `key: value` lines are understood. A value wrapped in `[...]`
//! becomes a list; everything else is a quote-stripped scalar. Nested YAML is
//! not supported and does not need to be: the sync tool only emits flat keys.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`>~_|!\[\]()\-]").expect("valid regex"));
static HAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").expect("valid regex"));
static LATIN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("valid regex"));

/// A front-matter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The scalar, or `None` for lists and blank scalars.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Lists as-is; a non-blank scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Scalar(s) if !s.is_empty() => vec![s.clone()],
            FieldValue::Scalar(_) => Vec::new(),
        }
    }
}

/// Parsed front-matter fields, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub fields: BTreeMap<String, FieldValue>,
}

impl FrontMatter {
    /// First non-blank scalar among `keys`, in order.
    pub fn scalar(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.fields.get(*key).and_then(FieldValue::as_scalar))
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.fields
            .get(key)
            .map(FieldValue::to_list)
            .unwrap_or_default()
    }
}

/// Split `content` into its front-matter and the remaining body.
///
/// Content without a leading `---` line, or without a closing one, has no
/// front-matter and is returned whole as the body.
pub fn split(content: &str) -> (FrontMatter, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some((first, rest)) = split_line(content) else {
        return (FrontMatter::default(), content);
    };
    if first.trim_end() != "---" {
        return (FrontMatter::default(), content);
    }

    let mut fields = BTreeMap::new();
    let mut remaining = rest;
    while let Some((line, next)) = split_line(remaining) {
        if line.trim_end() == "---" {
            return (FrontMatter { fields }, next);
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                fields.insert(key.to_string(), parse_value(value));
            }
        }
        remaining = next;
    }

    (FrontMatter::default(), content)
}

/// Text of the first `# ` heading in `body`.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Heuristic length: every Han character counts as one word, and so does
/// every maximal run of Latin letters. Front-matter and Markdown punctuation
/// are removed first.
pub fn word_count(content: &str) -> usize {
    let (_, body) = split(content);
    let stripped = MARKDOWN_PUNCTUATION.replace_all(body, "");
    HAN.find_iter(&stripped).count() + LATIN_RUN.find_iter(&stripped).count()
}

fn parse_value(raw: &str) -> FieldValue {
    let value = raw.trim();
    if value.len() >= 2 && value.starts_with('[') && value.ends_with(']') {
        let items = value[1..value.len() - 1]
            .split(',')
            .map(strip_quotes)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        return FieldValue::List(items);
    }
    FieldValue::Scalar(strip_quotes(value).to_string())
}

fn strip_quotes(raw: &str) -> &str {
    let s = raw.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Next line (without its terminator) and the rest after it.
fn split_line(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    match s.find('\n') {
        Some(i) => Some((s[..i].trim_end_matches('\r'), &s[i + 1..])),
        None => Some((s.trim_end_matches('\r'), "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_scalars_and_lists() {
        let content = "---\ntitle: \"Hello\"\ntags: [rust, 'cli', \"sync\"]\nslug: hello-world\n---\nbody\n";
        let (fm, body) = split(content);
        assert_eq!(fm.scalar(&["title"]), Some("Hello"));
        assert_eq!(fm.scalar(&["slug"]), Some("hello-world"));
        assert_eq!(fm.list("tags"), vec!["rust", "cli", "sync"]);
        assert_eq!(body, "body\n");
    }

    #[test]
    fn value_may_contain_colons() {
        let (fm, _) = split("---\ndate: 2024-01-01 10:20:30\n---\n");
        assert_eq!(fm.scalar(&["date"]), Some("2024-01-01 10:20:30"));
    }

    #[test]
    fn crlf_front_matter() {
        let (fm, body) = split("---\r\ntitle: Win\r\n---\r\ntext");
        assert_eq!(fm.scalar(&["title"]), Some("Win"));
        assert_eq!(body, "text");
    }

    #[test]
    fn unterminated_front_matter_is_body() {
        let content = "---\ntitle: Nope\n# Heading";
        let (fm, body) = split(content);
        assert!(fm.fields.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn no_front_matter() {
        let (fm, body) = split("# World\n\ntext");
        assert!(fm.fields.is_empty());
        assert_eq!(first_heading(body).as_deref(), Some("World"));
    }

    #[test]
    fn scalar_tag_becomes_list_and_empty_list_is_empty() {
        let (fm, _) = split("---\ntags: solo\ncategories: []\n---\n");
        assert_eq!(fm.list("tags"), vec!["solo"]);
        assert!(fm.list("categories").is_empty());
        assert!(fm.list("missing").is_empty());
    }

    #[test]
    fn scalar_lookup_skips_blank_values() {
        let (fm, _) = split("---\nupdated:\nupdatedAt: 2024-02-02\n---\n");
        assert_eq!(fm.scalar(&["updated", "updatedAt"]), Some("2024-02-02"));
    }

    #[test]
    fn second_level_heading_is_not_a_title() {
        assert_eq!(first_heading("## Sub\n# Top"), Some("Top".to_string()));
        assert_eq!(first_heading("no headings"), None);
    }

    #[rstest]
    #[case("abc测试def", 4)]
    #[case("你好世界", 4)]
    #[case("hello world", 2)]
    #[case("**Rust** 是一门语言", 6)]
    #[case("v1.2 and 42", 2)]
    #[case("", 0)]
    fn word_count_heuristic(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(word_count(text), expected);
    }

    #[test]
    fn word_count_ignores_front_matter() {
        let content = "---\ntitle: Many English Words Here\n---\n中文 text";
        assert_eq!(word_count(content), 3);
    }
}
