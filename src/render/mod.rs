use crate::segment::{Group, ProcessingWorkflow, ShellWorkflow};
use crate::transcript::{ContentItem, Entry, Role, Transcript, Usage};
use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use serde::Serialize;
use std::fmt::Write;

const HTML_TEMPLATE: &str = include_str!("transcript.html");

/// TOC preview length in characters.
const PREVIEW_CHARS: usize = 80;

// ===================================================================
// Options and errors
// ===================================================================

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub show_thinking: bool,
    /// Tool output longer than this is cut and marked. `None` keeps all.
    pub max_output_chars: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Conversation".to_string(),
            show_thinking: true,
            max_output_chars: Some(4000),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("parsing template")]
    Template(#[source] minijinja::Error),
    #[error("rendering template")]
    Render(#[source] minijinja::Error),
}

/// Everything a renderer reads. Groups are segmented once by the caller
/// and shared by the table of contents and the body.
pub struct RenderInput<'a> {
    pub transcript: &'a Transcript,
    pub groups: &'a [Group<'a>],
    pub options: &'a RenderOptions,
}

// ===================================================================
// View model — plain serializable data for both output formats
// ===================================================================

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub kind: &'static str,
    pub label: String,
    pub body: String,
    pub is_error: bool,
    /// Links a tool call to its result in the HTML output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupBody {
    Message {
        role: &'static str,
        sidechain: bool,
        items: Vec<ItemView>,
    },
    Workflow {
        summary: String,
        steps: Vec<ItemView>,
        results: Vec<ItemView>,
        answer: Vec<ItemView>,
    },
    Shell {
        command: String,
        description: Option<String>,
        /// Whatever else the invoking assistant turn contained.
        notes: Vec<ItemView>,
        output: Vec<ItemView>,
        comment: Vec<ItemView>,
    },
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub anchor: String,
    /// Id of the group's first entry, when the log recorded one.
    pub uuid: Option<String>,
    pub model: Option<String>,
    pub timestamp: String,
    pub preview: String,
    #[serde(flatten)]
    pub body: GroupBody,
}

/// Truncate a string to `max` chars, appending "..." if truncated.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC when the value is RFC 3339, verbatim otherwise.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn role_label(entry: &Entry) -> &'static str {
    match (entry.is_sidechain, entry.role) {
        (true, _) => "sub-agent",
        (false, Role::User) => "user",
        (false, Role::Assistant) => "assistant",
    }
}

fn item_view(item: &ContentItem, options: &RenderOptions) -> Option<ItemView> {
    let view = match item {
        ContentItem::Text { text } => ItemView {
            kind: "text",
            label: String::new(),
            body: text.clone(),
            is_error: false,
            tool_id: None,
            image_src: None,
        },
        ContentItem::Thinking { thinking } => {
            if !options.show_thinking {
                return None;
            }
            ItemView {
                kind: "thinking",
                label: "thinking".to_string(),
                body: thinking.clone(),
                is_error: false,
                tool_id: None,
                image_src: None,
            }
        }
        ContentItem::ToolUse { id, name, input } => ItemView {
            kind: "tool_use",
            label: name.clone(),
            body: serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string()),
            is_error: false,
            tool_id: Some(id.clone()),
            image_src: None,
        },
        ContentItem::ToolResult {
            tool_use_id,
            is_error,
            ..
        } => {
            let text = item.result_text().unwrap_or_default();
            ItemView {
                kind: "tool_result",
                label: (if *is_error { "error" } else { "result" }).to_string(),
                body: match options.max_output_chars {
                    Some(max) => truncate(&text, max),
                    None => text,
                },
                is_error: *is_error,
                tool_id: Some(tool_use_id.clone()),
                image_src: None,
            }
        }
        ContentItem::Image { media_type, data } => {
            let src = if data.starts_with("http://") || data.starts_with("https://") {
                data.clone()
            } else {
                format!("data:{media_type};base64,{data}")
            };
            ItemView {
                kind: "image",
                label: media_type.clone(),
                body: String::new(),
                is_error: false,
                tool_id: None,
                image_src: Some(src),
            }
        }
    };
    Some(view)
}

fn item_views<'a>(
    items: impl IntoIterator<Item = &'a ContentItem>,
    options: &RenderOptions,
) -> Vec<ItemView> {
    items
        .into_iter()
        .filter_map(|item| item_view(item, options))
        .collect()
}

fn first_line(items: &[ItemView]) -> Option<String> {
    items
        .iter()
        .filter(|v| v.kind == "text")
        .find_map(|v| v.body.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|line| truncate(line, PREVIEW_CHARS))
}

fn message_body(entry: &Entry, options: &RenderOptions) -> GroupBody {
    GroupBody::Message {
        role: role_label(entry),
        sidechain: entry.is_sidechain,
        items: item_views(&entry.content, options),
    }
}

fn workflow_body(w: &ProcessingWorkflow<'_>, options: &RenderOptions) -> GroupBody {
    GroupBody::Workflow {
        summary: w.summary.clone(),
        steps: item_views(w.internal_processing.iter().copied(), options),
        results: item_views(w.tool_results.iter().flat_map(|e| &e.content), options),
        answer: item_views(w.final_response.iter().copied(), options),
    }
}

fn shell_body(w: &ShellWorkflow<'_>, options: &RenderOptions) -> GroupBody {
    GroupBody::Shell {
        command: w.command().unwrap_or("(unknown)").to_string(),
        description: w.description().map(str::to_owned),
        notes: item_views(
            w.invocation_entry
                .content
                .iter()
                .filter(|item| !std::ptr::eq(*item, w.shell_invocation)),
            options,
        ),
        output: item_views(&w.shell_output_entry.content, options),
        comment: w
            .user_comment
            .map(|e| item_views(&e.content, options))
            .unwrap_or_default(),
    }
}

/// Build the display model for every group, in order.
pub fn group_views(groups: &[Group<'_>], options: &RenderOptions) -> Vec<GroupView> {
    groups
        .iter()
        .enumerate()
        .map(|(n, group)| {
            let body = match group {
                Group::Regular { entry } => message_body(entry, options),
                Group::ProcessingWorkflow(w) => workflow_body(w, options),
                Group::ShellWorkflow(w) => shell_body(w, options),
            };
            let preview = match &body {
                GroupBody::Message { role, items, .. } => {
                    first_line(items).unwrap_or_else(|| format!("({role} message)"))
                }
                GroupBody::Workflow {
                    answer, summary, ..
                } => first_line(answer).unwrap_or_else(|| summary.clone()),
                GroupBody::Shell { command, .. } => format!("$ {}", truncate(command, PREVIEW_CHARS)),
            };
            let members = group.entries();
            GroupView {
                anchor: format!("g{}", n + 1),
                uuid: members.first().and_then(|e| e.uuid.clone()),
                model: members.iter().find_map(|e| e.model.clone()),
                timestamp: format_timestamp(group.timestamp()),
                preview,
                body,
            }
        })
        .collect()
}

// ===================================================================
// Console text
// ===================================================================

fn push_items(out: &mut String, items: &[ItemView], indent: &str) {
    for item in items {
        if !item.label.is_empty() {
            let _ = writeln!(out, "{indent}[{}]", item.label);
        }
        if let Some(src) = &item.image_src {
            let _ = writeln!(out, "{indent}<image {}>", truncate(src, 40));
        }
        for line in item.body.lines() {
            let _ = writeln!(out, "{indent}{line}");
        }
    }
}

fn usage_line(usage: &Usage) -> String {
    format!(
        "tokens: {} in, {} out, {} cache write, {} cache read",
        usage.input_tokens,
        usage.output_tokens,
        usage.cache_creation_input_tokens,
        usage.cache_read_input_tokens
    )
}

pub fn render_text(input: &RenderInput<'_>) -> String {
    let views = group_views(input.groups, input.options);
    let mut out = String::new();

    let _ = writeln!(out, "# {}", input.transcript.title().unwrap_or(&input.options.title));
    let _ = writeln!(
        out,
        "{} entries, {} groups, {}",
        input.transcript.entries().len(),
        views.len(),
        usage_line(&input.transcript.usage_totals())
    );

    for view in &views {
        out.push('\n');
        let stamp = if view.timestamp.is_empty() {
            String::new()
        } else {
            format!("[{}] ", view.timestamp)
        };
        match &view.body {
            GroupBody::Message { role, items, .. } => {
                let _ = writeln!(out, "{stamp}{}", role.to_uppercase());
                push_items(&mut out, items, "  ");
            }
            GroupBody::Workflow {
                summary,
                steps,
                results,
                answer,
            } => {
                let _ = writeln!(out, "{stamp}ASSISTANT ({summary})");
                push_items(&mut out, steps, "  | ");
                push_items(&mut out, results, "  | ");
                push_items(&mut out, answer, "  ");
            }
            GroupBody::Shell {
                command,
                description,
                notes,
                output,
                comment,
            } => {
                if !notes.is_empty() {
                    let _ = writeln!(out, "{stamp}ASSISTANT");
                    push_items(&mut out, notes, "  | ");
                }
                match description {
                    Some(d) => {
                        let _ = writeln!(out, "{stamp}$ {command}  # {d}");
                    }
                    None => {
                        let _ = writeln!(out, "{stamp}$ {command}");
                    }
                }
                push_items(&mut out, output, "  ");
                if !comment.is_empty() {
                    let _ = writeln!(out, "USER");
                    push_items(&mut out, comment, "  ");
                }
            }
        }
    }
    out
}

// ===================================================================
// HTML document
// ===================================================================

pub fn render_html(input: &RenderInput<'_>) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.add_template("transcript.html", HTML_TEMPLATE)
        .map_err(RenderError::Template)?;
    let tmpl = env
        .get_template("transcript.html")
        .map_err(RenderError::Template)?;

    let groups = group_views(input.groups, input.options);
    let title = input.transcript.title().unwrap_or(&input.options.title);
    let usage = input.transcript.usage_totals();
    let entry_count = input.transcript.entries().len();

    tmpl.render(context! { title, groups, usage, entry_count })
        .map_err(RenderError::Render)
}
