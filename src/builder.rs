//! Page-builder content handling.
//!
//! Posts authored with a visual builder keep their real text inside a JSON
//! document stored as post metadata, while the stored content column holds
//! only shortcode scaffolding. Payloads and excerpts are built from the
//! flattened builder text when it is present.

use ::log::warn;
use ::serde_json::Value;

pub const META_BUILDER_DATA: &str = "_builder_data";

/// Flattens a builder document to plain text. The document is a tree of
/// elements; text is carried in the `editor`, `text`, `title` and `html`
/// settings, and children nest under `elements`. Accepts either the decoded
/// tree or a JSON-encoded string of it.
pub fn extract_text(data: &Value) -> String {
    let decoded: Option<Value> = match data {
        Value::String(raw) => ::serde_json::from_str(raw).ok(),
        other => Some(other.clone()),
    };

    match decoded {
        Some(Value::Array(elements)) => collect_text(&elements),
        _ => String::new(),
    }
}

fn collect_text(elements: &[Value]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for element in elements {
        let object = match element.as_object() {
            Some(object) => object,
            None => continue,
        };

        if let Some(settings) = object.get("settings").and_then(Value::as_object) {
            for field in ["editor", "text", "title", "html"] {
                if let Some(text) = settings.get(field).and_then(Value::as_str) {
                    parts.push(crate::text::strip_tags(text));
                }
            }
        }

        if let Some(children) = object.get("elements").and_then(Value::as_array) {
            let child_text = collect_text(children);
            if !child_text.is_empty() {
                parts.push(child_text);
            }
        }
    }

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<String>>()
        .join(" ")
}

/// The post's effective text content: flattened builder data when present and
/// non-empty, the raw stored content otherwise. Metadata lookup failures fall
/// back to the raw content as well.
pub async fn post_content(
    content: &dyn crate::content::ContentStore,
    post: &crate::model::Post,
) -> String {
    match content.get_meta(post.id, META_BUILDER_DATA).await {
        Ok(Some(data)) => {
            let text = extract_text(&data);
            if text.is_empty() {
                post.content.clone()
            } else {
                text
            }
        }
        Ok(None) => post.content.clone(),
        Err(err) => {
            warn!("builder data lookup failed for post {}: {}", post.id, err);
            post.content.clone()
        }
    }
}
