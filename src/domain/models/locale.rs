#[cfg(test)]
#[path = "locale_test.rs"]
mod tests;

use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

/// The pre-resolved display language. Only the handful of strings the
/// controllers show on their own live here.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumString, EnumVariantNames, strum::Display,
)]
pub enum Locale {
    #[default]
    #[strum(to_string = "zh-CN")]
    ZhCn,
    #[strum(to_string = "en")]
    En,
}

impl Locale {
    /// Opening line of a fresh conversation.
    pub fn greeting(&self) -> &'static str {
        match self {
            Locale::ZhCn => {
                return "你好！我是 Shigy-SEO 的智能顾问。关于蜘蛛池套餐或 SEO 收录问题，随时问我！"
            }
            Locale::En => {
                return "Hi! I'm the Shigy-SEO AI consultant. Ask me anything about Spider-Pool plans or SEO indexing."
            }
        }
    }

    /// Replaces a streamed reply when the gateway fails.
    pub fn chat_fallback(&self) -> &'static str {
        match self {
            Locale::ZhCn => return "抱歉，连接超时，请稍后再试。",
            Locale::En => return "Sorry, the connection timed out. Please try again later.",
        }
    }

    /// Replaces a one-shot result when the gateway fails.
    pub fn task_fallback(&self) -> &'static str {
        match self {
            Locale::ZhCn => return "生成失败，请稍后重试。",
            Locale::En => return "Generation failed. Please try again later.",
        }
    }
}
