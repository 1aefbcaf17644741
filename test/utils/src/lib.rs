use serde_json::json;

/// Builds a `streamGenerateContent?alt=sse` response body where every
/// fragment arrives as its own `data:` event.
pub fn gemini_sse_fixture(fragments: &[&str]) -> String {
    return fragments
        .iter()
        .map(|fragment| {
            let event = json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": fragment }]
                    }
                }]
            });
            return format!("data: {event}\r\n\r\n");
        })
        .collect::<Vec<String>>()
        .join("");
}

/// Builds a `generateContent` response body holding a single completion.
pub fn gemini_completion_fixture(text: &str) -> String {
    return json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
    .to_string();
}

pub fn article_fixture() -> &'static str {
    return r#"
Spider pools keep search engine crawlers busy on your pages. A site that is
crawled every hour gets new articles indexed within a day, while a site that
waits for organic crawls can wait weeks.

Our basic plan sends 50k to 100k spiders a day across Bing, Google, Sogou and
360, which is enough for most company blogs and shops.
"#
    .trim();
}
