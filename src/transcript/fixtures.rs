//! Entry builders shared by the unit tests of every module.

use super::{ContentItem, Entry, Role};
use serde_json::json;

pub fn user(content: Vec<ContentItem>) -> Entry {
    Entry {
        uuid: None,
        role: Role::User,
        content,
        timestamp: None,
        usage: None,
        is_sidechain: false,
        model: None,
    }
}

pub fn assistant(content: Vec<ContentItem>) -> Entry {
    Entry {
        role: Role::Assistant,
        ..user(content)
    }
}

pub fn user_text(text: &str) -> Entry {
    user(vec![text_item(text)])
}

pub fn at(mut entry: Entry, timestamp: &str) -> Entry {
    entry.timestamp = Some(timestamp.to_string());
    entry
}

pub fn sidechain(mut entry: Entry) -> Entry {
    entry.is_sidechain = true;
    entry
}

pub fn text_item(text: &str) -> ContentItem {
    ContentItem::text(text)
}

pub fn thinking(text: &str) -> ContentItem {
    ContentItem::Thinking {
        thinking: text.to_string(),
    }
}

pub fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ContentItem {
    ContentItem::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input,
    }
}

pub fn bash(id: &str, command: &str) -> ContentItem {
    tool_use(id, "Bash", json!({ "command": command }))
}

pub fn tool_result(id: &str, output: &str) -> ContentItem {
    ContentItem::ToolResult {
        tool_use_id: id.to_string(),
        content: json!(output),
        is_error: false,
    }
}

pub fn image() -> ContentItem {
    ContentItem::Image {
        media_type: "image/png".to_string(),
        data: "iVBORw0KGgo=".to_string(),
    }
}

pub fn results(ids: &[&str]) -> Entry {
    user(ids.iter().map(|id| tool_result(id, "ok")).collect())
}
