//! Deterministic, rule-based enrichment.
//!
//! Used when the external model is disabled or fails. Output is a pure
//! function of the input text.
//!
//! Keyword matching: ASCII keywords must equal a whole lower-cased
//! alphanumeric run of the input (`"记录的APP"` contains the run `app`, but
//! `"apple"` does not match `app`). CJK keywords match as substrings because
//! CJK text has no word separators.

use std::collections::HashSet;

use crate::models::EnhancedContent;
use crate::text::{contains_cjk, truncate_with_ellipsis, word_count};

pub const DEFAULT_CATEGORY: &str = "一般想法";

/// Scanned in order; the first category with a keyword hit wins.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "技术创新",
        &[
            "技术", "软件", "应用", "开发", "编程", "代码", "app", "tech", "code", "software",
        ],
    ),
    (
        "工作改进",
        &[
            "工作", "项目", "团队", "管理", "效率", "work", "project", "team", "efficiency",
        ],
    ),
    (
        "生活想法",
        &["生活", "日常", "健康", "家庭", "life", "daily", "health", "family"],
    ),
    (
        "创意设计",
        &["设计", "创意", "艺术", "美术", "design", "creative", "art"],
    ),
    (
        "学习成长",
        &[
            "学习", "教育", "知识", "技能", "learn", "education", "knowledge", "skill",
        ],
    ),
    (
        "商业想法",
        &[
            "商业", "创业", "产品", "市场", "business", "startup", "product", "market",
        ],
    ),
];

const BASE_TAGS: [&str; 2] = ["想法", "灵感"];

/// `(tag, keywords)`: the tag is added when any keyword hits.
const KEYWORD_TAGS: &[(&str, &[&str])] = &[
    ("应用开发", &["app", "应用"]),
    ("设计", &["design", "设计"]),
    ("商业", &["business", "商业"]),
];

const SHORT_IDEA_TAG: &str = "简短想法";
const DETAILED_IDEA_TAG: &str = "详细想法";
const SHORT_IDEA_MAX_WORDS: usize = 10;
const DETAILED_IDEA_MIN_WORDS: usize = 50;
/// Cap on the whole fallback tag list, base tags included.
const MAX_FALLBACK_TAGS: usize = 4;

const SUMMARY_CHARS: usize = 80;
const FALLBACK_SUGGESTIONS: usize = 3;

const SUGGESTIONS_ZH: [&str; 4] = [
    "深入研究相关领域",
    "寻找类似的成功案例",
    "制定详细的行动计划",
    "与他人讨论获得反馈",
];

const SUGGESTIONS_EN: [&str; 4] = [
    "Research the relevant field in depth",
    "Look for similar success stories",
    "Create a detailed action plan",
    "Discuss with others for feedback",
];

/// Lower-cased view of the input used for keyword lookups.
struct KeywordIndex {
    lower: String,
    latin_tokens: HashSet<String>,
}

impl KeywordIndex {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let latin_tokens = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            lower,
            latin_tokens,
        }
    }

    fn hits(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            self.latin_tokens.contains(keyword)
        } else {
            self.lower.contains(keyword)
        }
    }

    fn hits_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.hits(k))
    }
}

/// Classify `text` into one of the fixed categories.
pub fn classify(text: &str) -> &'static str {
    let index = KeywordIndex::new(text);
    CATEGORIES
        .iter()
        .find(|(_, keywords)| index.hits_any(keywords))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Base tags followed by content-derived tags, at most four in total.
pub fn derive_tags(text: &str) -> Vec<String> {
    let index = KeywordIndex::new(text);
    let words = word_count(text);

    let mut content_tags: Vec<&str> = KEYWORD_TAGS
        .iter()
        .filter(|(_, keywords)| index.hits_any(keywords))
        .map(|(tag, _)| *tag)
        .collect();
    if words < SHORT_IDEA_MAX_WORDS {
        content_tags.push(SHORT_IDEA_TAG);
    }
    if words > DETAILED_IDEA_MIN_WORDS {
        content_tags.push(DETAILED_IDEA_TAG);
    }

    BASE_TAGS
        .iter()
        .chain(content_tags.iter())
        .take(MAX_FALLBACK_TAGS)
        .map(|t| t.to_string())
        .collect()
}

/// Full fallback enrichment for `text`.
pub fn fallback_analysis(text: &str) -> EnhancedContent {
    let chinese = contains_cjk(text);
    let detailed = word_count(text) > 20;

    let details = if chinese {
        format!(
            "这是一个{}想法。建议进一步思考具体的实施步骤，考虑可能遇到的挑战和所需的资源。可以尝试将想法分解为更小的可执行任务。",
            if detailed { "详细的" } else { "简洁的" }
        )
    } else {
        format!(
            "This is a {} idea. Consider thinking further about specific implementation steps, potential challenges, and required resources. Try breaking the idea down into smaller, actionable tasks.",
            if detailed { "detailed" } else { "concise" }
        )
    };

    let suggestions: &[&str] = if chinese {
        &SUGGESTIONS_ZH
    } else {
        &SUGGESTIONS_EN
    };

    EnhancedContent {
        summary: truncate_with_ellipsis(text, SUMMARY_CHARS),
        details,
        suggestions: suggestions
            .iter()
            .take(FALLBACK_SUGGESTIONS)
            .map(|s| s.to_string())
            .collect(),
        tags: derive_tags(text),
        category: classify(text).to_string(),
    }
}
