use crate::transcript::{ContentItem, Entry, Role};

/// Tool name whose invocation/result pair forms a shell workflow.
pub const SHELL_TOOL: &str = "Bash";

/// A user entry made up of tool results and nothing else.
pub fn is_tool_result_only(entry: &Entry) -> bool {
    entry.role == Role::User
        && entry
            .content
            .iter()
            .all(|item| matches!(item, ContentItem::ToolResult { .. }))
}

pub fn has_tool_invocation(entry: &Entry) -> bool {
    entry.role == Role::Assistant
        && entry
            .content
            .iter()
            .any(|item| matches!(item, ContentItem::ToolUse { .. }))
}

/// Exact, case-sensitive match on the tool name.
pub fn is_shell_invocation(item: &ContentItem, shell_tool: &str) -> bool {
    matches!(item, ContentItem::ToolUse { name, .. } if name == shell_tool)
}

/// Any tool-result-only entry qualifies. The `tool_use_id` is not checked
/// against the preceding invocation; the segmenter relies on adjacency.
pub fn is_shell_result(entry: &Entry) -> bool {
    is_tool_result_only(entry)
        && entry
            .content
            .iter()
            .any(|item| matches!(item, ContentItem::ToolResult { .. }))
}

/// First shell invocation in an assistant entry, if any.
pub fn shell_invocation<'a>(entry: &'a Entry, shell_tool: &str) -> Option<&'a ContentItem> {
    if entry.role != Role::Assistant {
        return None;
    }
    entry
        .content
        .iter()
        .find(|item| is_shell_invocation(item, shell_tool))
}
