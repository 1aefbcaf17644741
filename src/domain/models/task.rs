#[cfg(test)]
#[path = "task_test.rs"]
mod tests;

use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

use super::Locale;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum TaskType {
    /// Diagnostic SEO analysis of an article.
    #[default]
    Analyze,
    /// Five headline suggestions for an article or keyword list.
    Title,
    /// Crawler-friendly paraphrase of a passage.
    Rewrite,
}

impl TaskType {
    /// Wraps `content` in this task's fixed instruction template. Pure and
    /// deterministic: the same arguments always produce the same prompt.
    pub fn prompt(&self, content: &str) -> String {
        let content = content.trim();
        match self {
            TaskType::Analyze => {
                return format!(
                    "Act as an SEO expert. Analyze the following content for search engine optimization (focus on Bing/Google/Sogou).
Identify:
1. Main keywords detected.
2. Content sentiment.
3. Readability score estimate.
4. Three specific improvements to increase indexing rate (Spider-Pool context).

Content:
{content}"
                );
            }
            TaskType::Title => {
                return format!(
                    "Act as an SEO copywriter. Generate 5 high-CTR, SEO-friendly titles for the following content.
Target Audience: Website owners looking for traffic.
Tone: Professional, Attractive, Urgent.

Content/Keywords:
{content}"
                );
            }
            TaskType::Rewrite => {
                return format!(
                    "Act as a content spinner/rewriter. Rewrite the following text to be unique (pseudo-original) while maintaining the original meaning.
Goal: Bypass duplicate content filters in search engines.
Optimize for: Spider crawling (clear structure, keyword rich).

Content:
{content}"
                );
            }
        }
    }

    /// Tab label shown next to results.
    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (TaskType::Analyze, Locale::ZhCn) => return "SEO 诊断",
            (TaskType::Title, Locale::ZhCn) => return "标题生成",
            (TaskType::Rewrite, Locale::ZhCn) => return "伪原创改写",
            (TaskType::Analyze, Locale::En) => return "SEO analysis",
            (TaskType::Title, Locale::En) => return "Title ideas",
            (TaskType::Rewrite, Locale::En) => return "Rewrite",
        }
    }
}

/// State of the single current one-shot request. A new generation replaces
/// it wholesale; nothing is kept as history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskRequest {
    pub task_type: TaskType,
    pub content: String,
    pub result: String,
    pub pending: bool,
}

impl TaskRequest {
    /// Starts a new request unless one is in flight. Returns whether the
    /// request was accepted.
    pub fn begin(&mut self, task_type: TaskType, content: &str) -> bool {
        if self.pending {
            return false;
        }

        *self = TaskRequest {
            task_type,
            content: content.to_string(),
            result: "".to_string(),
            pending: true,
        };

        return true;
    }

    pub fn finish(&mut self) {
        self.pending = false;
    }
}
