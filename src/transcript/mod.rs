use serde::{Deserialize, Serialize};
use tracing::debug;

// ===================================================================
// Entry model — one conversation turn, immutable once decoded
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One piece of an entry's payload. Order within an entry is processing
/// order and is preserved by every consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text {
        text: String,
    },
    /// Assistant-internal reasoning.
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Correlated to a `ToolUse` by `tool_use_id`.
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
        is_error: bool,
    },
    Image {
        media_type: String,
        data: String,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// Flatten a tool result's content to display text.
    ///
    /// Result content is either a plain string or an array of blocks;
    /// text blocks are joined with newlines and images become a
    /// placeholder. Returns `None` for non-result items.
    pub fn result_text(&self) -> Option<String> {
        let ContentItem::ToolResult { content, .. } = self else {
            return None;
        };
        Some(match content {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(blocks) => blocks
                .iter()
                .map(|b| match b["type"].as_str() {
                    Some("text") => b["text"].as_str().unwrap_or_default().to_string(),
                    Some("image") => "[image]".to_string(),
                    _ => b.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Token counts reported on assistant messages. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

impl Usage {
    /// Counts come from the log file, so clamp instead of overflowing.
    fn add(&mut self, other: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.cache_creation_input_tokens = self
            .cache_creation_input_tokens
            .saturating_add(other.cache_creation_input_tokens);
        self.cache_read_input_tokens = self
            .cache_read_input_tokens
            .saturating_add(other.cache_read_input_tokens);
    }
}

/// One decoded conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub uuid: Option<String>,
    pub role: Role,
    /// Never empty: the decoder substitutes a single empty text item.
    pub content: Vec<ContentItem>,
    pub timestamp: Option<String>,
    pub usage: Option<Usage>,
    /// Belongs to a delegated sub-agent conversation.
    pub is_sidechain: bool,
    pub model: Option<String>,
}

impl Entry {
    pub fn timestamp_or_empty(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

// ===================================================================
// Wire format — what a JSONL line actually looks like
// ===================================================================

/// `message.content` can be a plain string (user text) or an array of
/// content blocks (assistant responses, tool results).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    #[serde(rename = "redacted_thinking")]
    RedactedThinking,
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(rename = "image")]
    Image { source: ImageSource },
    /// Block types this decoder doesn't know yet.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ImageSource {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    role: Role,
    content: MessageContent,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// A `user` / `assistant` line in the current transcript format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationRecord {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    is_sidechain: bool,
    #[serde(default)]
    timestamp: Option<String>,
    message: Message,
}

/// Older exports: the message object itself, with no envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    is_sidechain: bool,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(flatten)]
    message: Message,
}

/// Bookkeeping line types that carry nothing to display.
const SKIPPED_TYPES: &[&str] = &[
    "system",
    "progress",
    "file-history-snapshot",
    "queue-operation",
];

enum Record {
    Entry(Entry),
    Title(String),
    Skip,
}

fn convert_block(block: ContentBlock) -> Option<ContentItem> {
    match block {
        ContentBlock::Text { text } => Some(ContentItem::Text { text }),
        ContentBlock::Thinking { thinking } => Some(ContentItem::Thinking { thinking }),
        ContentBlock::RedactedThinking => Some(ContentItem::Thinking {
            thinking: "[redacted]".to_string(),
        }),
        ContentBlock::ToolUse { id, name, input } => Some(ContentItem::ToolUse { id, name, input }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Some(ContentItem::ToolResult {
            tool_use_id,
            content,
            is_error: is_error.unwrap_or(false),
        }),
        ContentBlock::Image { source } => Some(ContentItem::Image {
            media_type: source.media_type.unwrap_or_default(),
            data: source.data.or(source.url).unwrap_or_default(),
        }),
        ContentBlock::Unknown => {
            debug!("dropping content block of unknown type");
            None
        }
    }
}

fn build_entry(
    uuid: Option<String>,
    is_sidechain: bool,
    timestamp: Option<String>,
    message: Message,
) -> Entry {
    let mut content: Vec<ContentItem> = match message.content {
        MessageContent::Text(text) => vec![ContentItem::Text { text }],
        MessageContent::Blocks(blocks) => blocks.into_iter().filter_map(convert_block).collect(),
    };
    if content.is_empty() {
        content.push(ContentItem::text(""));
    }
    Entry {
        uuid,
        role: message.role,
        content,
        timestamp,
        usage: message.usage,
        is_sidechain,
        model: message.model,
    }
}

fn decode_value(val: serde_json::Value) -> Result<Record, String> {
    let record_type = val.get("type").and_then(|t| t.as_str()).map(str::to_owned);
    match record_type.as_deref() {
        Some("user") | Some("assistant") => {
            let r: ConversationRecord = serde_json::from_value(val).map_err(|e| e.to_string())?;
            Ok(Record::Entry(build_entry(
                r.uuid,
                r.is_sidechain,
                r.timestamp,
                r.message,
            )))
        }
        Some("summary") => Ok(match val["summary"].as_str() {
            Some(s) => Record::Title(s.to_string()),
            None => Record::Skip,
        }),
        Some(t) if SKIPPED_TYPES.contains(&t) => Ok(Record::Skip),
        Some(t) => {
            debug!(record_type = t, "skipping unrecognised record type");
            Ok(Record::Skip)
        }
        None if val.get("role").is_some() => {
            let r: LegacyRecord = serde_json::from_value(val).map_err(|e| e.to_string())?;
            Ok(Record::Entry(build_entry(
                r.uuid,
                r.is_sidechain,
                r.timestamp,
                r.message,
            )))
        }
        None => Err("record has neither a `type` nor a `role` field".to_string()),
    }
}

// ===================================================================
// Transcript — the ordered entry sequence handed to the segmenter
// ===================================================================

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    title: Option<String>,
}

impl Transcript {
    /// An empty transcript (no entries).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a transcript. Returns the transcript and any records that
    /// failed to decode (with 1-based line number and error).
    ///
    /// Input is JSONL; a document starting with `[` is treated as a
    /// legacy single JSON array, in which case the reported "line" is
    /// the 1-based array index.
    pub fn parse(contents: &str) -> (Self, Vec<(usize, String)>) {
        let mut transcript = Self::empty();
        let mut errors = Vec::new();

        if contents.trim_start().starts_with('[') {
            match serde_json::from_str::<Vec<serde_json::Value>>(contents) {
                Ok(values) => {
                    for (i, val) in values.into_iter().enumerate() {
                        transcript.push_value(i + 1, val, &mut errors);
                    }
                }
                Err(e) => errors.push((1, format!("{e}"))),
            }
            return (transcript, errors);
        }

        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(val) => transcript.push_value(i + 1, val, &mut errors),
                Err(e) => errors.push((i + 1, format!("{e}"))),
            }
        }

        (transcript, errors)
    }

    fn push_value(&mut self, line: usize, val: serde_json::Value, errors: &mut Vec<(usize, String)>) {
        match decode_value(val) {
            Ok(Record::Entry(entry)) => self.entries.push(entry),
            Ok(Record::Title(title)) => self.title = Some(title),
            Ok(Record::Skip) => {}
            Err(e) => errors.push((line, e)),
        }
    }

    /// Concatenate several transcripts in order. The first title found wins.
    pub fn merge(parts: impl IntoIterator<Item = Transcript>) -> Self {
        let mut merged = Self::empty();
        for part in parts {
            if merged.title.is_none() {
                merged.title = part.title;
            }
            merged.entries.extend(part.entries);
        }
        merged
    }

    #[cfg(test)]
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            title: None,
        }
    }

    /// All entries in input order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Title from the last `summary` record, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sum of token usage over every entry that reported it.
    pub fn usage_totals(&self) -> Usage {
        let mut total = Usage::default();
        for usage in self.entries.iter().filter_map(|e| e.usage.as_ref()) {
            total.add(usage);
        }
        total
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
