use crate::transcript::{ContentItem, Entry};

/// Distinct tool names listed before collapsing into "+N more".
const MAX_NAMED_TOOLS: usize = 3;

const SEPARATOR: &str = " · ";
const FALLBACK: &str = "Processing steps";

// ===================================================================
// Counts — everything the summary string is derived from
// ===================================================================

/// Tallies over a workflow's internal processing. Built from content
/// items by [`SummaryCounts::from_items`], or directly in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub assistant_entries: usize,
    pub thinking: usize,
    pub texts: usize,
    pub tool_results: usize,
    /// Tool name and invocation count, in first-seen order.
    pub tools: Vec<(String, usize)>,
}

impl SummaryCounts {
    pub fn from_items<'a>(
        internal: impl IntoIterator<Item = &'a ContentItem>,
        tool_results: usize,
        assistant_entries: usize,
    ) -> Self {
        let mut counts = SummaryCounts {
            assistant_entries,
            tool_results,
            ..Default::default()
        };
        for item in internal {
            match item {
                ContentItem::Thinking { .. } => counts.thinking += 1,
                ContentItem::Text { .. } => counts.texts += 1,
                ContentItem::ToolUse { name, .. } => counts.record_tool(name),
                ContentItem::ToolResult { .. } | ContentItem::Image { .. } => {}
            }
        }
        counts
    }

    fn record_tool(&mut self, name: &str) {
        match self.tools.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += 1,
            None => self.tools.push((name.to_string(), 1)),
        }
    }

    pub fn tool_calls(&self) -> usize {
        self.tools.iter().map(|(_, n)| n).sum()
    }

    /// "Read(2), Bash, Grep +2 more"
    fn tool_names(&self) -> String {
        let shown: Vec<String> = self
            .tools
            .iter()
            .take(MAX_NAMED_TOOLS)
            .map(|(name, count)| {
                if *count > 1 {
                    format!("{name}({count})")
                } else {
                    name.clone()
                }
            })
            .collect();
        let mut names = shown.join(", ");
        if self.tools.len() > MAX_NAMED_TOOLS {
            names.push_str(&format!(" +{} more", self.tools.len() - MAX_NAMED_TOOLS));
        }
        names
    }

    pub fn render(&self) -> String {
        let mut clauses: Vec<String> = Vec::new();

        if self.assistant_entries > 1 {
            clauses.push(format!("{} assistant messages", self.assistant_entries));
        }
        if self.thinking > 0 {
            clauses.push(plural(self.thinking, "thinking step", "thinking steps"));
        }
        let calls = self.tool_calls();
        if calls > 0 {
            clauses.push(format!(
                "{}: {}",
                plural(calls, "tool call", "tool calls"),
                self.tool_names()
            ));
        }
        if self.texts > 0 {
            clauses.push(plural(self.texts, "intermediate message", "intermediate messages"));
        }
        if self.tool_results > 0 {
            clauses.push(plural(self.tool_results, "tool result", "tool results"));
        }

        if clauses.is_empty() {
            FALLBACK.to_string()
        } else {
            clauses.join(SEPARATOR)
        }
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Short description of a processing workflow for display.
pub fn processing_summary(
    internal: &[&ContentItem],
    tool_results: &[&Entry],
    assistant_entries: usize,
) -> String {
    SummaryCounts::from_items(internal.iter().copied(), tool_results.len(), assistant_entries)
        .render()
}
