use crate::classify::{SHELL_TOOL, is_shell_result, is_tool_result_only, shell_invocation};
use crate::summary::processing_summary;
use crate::transcript::{ContentItem, Entry, Role};

// ===================================================================
// Groups — the segmenter's output, borrowing from the entry slice
// ===================================================================

/// One or more assistant turns (with their tool-result turns) collapsed
/// into "worked for a while, then answered".
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingWorkflow<'a> {
    /// Every collected entry in input order (assistant and tool results).
    pub run: Vec<&'a Entry>,
    pub assistant_entries: Vec<&'a Entry>,
    pub internal_processing: Vec<&'a ContentItem>,
    pub final_response: Vec<&'a ContentItem>,
    pub tool_results: Vec<&'a Entry>,
    pub summary: String,
    /// First assistant entry's timestamp, or empty.
    pub timestamp: &'a str,
}

/// A shell tool call, its output, and an optional user remark.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellWorkflow<'a> {
    pub invocation_entry: &'a Entry,
    pub shell_invocation: &'a ContentItem,
    pub shell_output_entry: &'a Entry,
    pub user_comment: Option<&'a Entry>,
    pub timestamp: &'a str,
}

impl ShellWorkflow<'_> {
    /// The `command` input of the shell invocation.
    pub fn command(&self) -> Option<&str> {
        match self.shell_invocation {
            ContentItem::ToolUse { input, .. } => input["command"].as_str(),
            _ => None,
        }
    }

    /// The `description` input, when the assistant supplied one.
    pub fn description(&self) -> Option<&str> {
        match self.shell_invocation {
            ContentItem::ToolUse { input, .. } => input["description"].as_str(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Group<'a> {
    Regular { entry: &'a Entry },
    ProcessingWorkflow(ProcessingWorkflow<'a>),
    ShellWorkflow(ShellWorkflow<'a>),
}

impl<'a> Group<'a> {
    /// Referenced entries in input order.
    pub fn entries(&self) -> Vec<&'a Entry> {
        match self {
            Group::Regular { entry } => vec![*entry],
            Group::ProcessingWorkflow(w) => w.run.clone(),
            Group::ShellWorkflow(w) => {
                let mut entries = vec![w.invocation_entry, w.shell_output_entry];
                entries.extend(w.user_comment);
                entries
            }
        }
    }

    pub fn timestamp(&self) -> &'a str {
        match self {
            Group::Regular { entry } => entry.timestamp_or_empty(),
            Group::ProcessingWorkflow(w) => w.timestamp,
            Group::ShellWorkflow(w) => w.timestamp,
        }
    }
}

// ===================================================================
// Segmenter
// ===================================================================

/// Partitions an entry sequence into groups in one forward pass.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'s> {
    shell_tool: &'s str,
}

impl Default for Segmenter<'static> {
    fn default() -> Self {
        Self {
            shell_tool: SHELL_TOOL,
        }
    }
}

/// Segment with the default shell tool name.
pub fn segment(entries: &[Entry]) -> Vec<Group<'_>> {
    Segmenter::default().segment(entries)
}

fn is_primary_assistant(entry: &Entry) -> bool {
    entry.role == Role::Assistant && !entry.is_sidechain
}

impl<'s> Segmenter<'s> {
    pub fn new(shell_tool: &'s str) -> Self {
        Self { shell_tool }
    }

    pub fn segment<'a>(&self, entries: &'a [Entry]) -> Vec<Group<'a>> {
        let mut groups = Vec::new();
        let mut cursor = 0;
        while cursor < entries.len() {
            let (group, next) = self.step(entries, cursor);
            debug_assert!(next > cursor, "segmenter did not advance at {cursor}");
            groups.push(group);
            cursor = next;
        }
        debug_assert_eq!(
            groups.iter().map(|g| g.entries().len()).sum::<usize>(),
            entries.len(),
            "groups must partition the input"
        );
        groups
    }

    /// Emit the group starting at `cursor` and the cursor just past it.
    /// Exactly one branch fires; the returned cursor is always greater.
    pub fn step<'a>(&self, entries: &'a [Entry], cursor: usize) -> (Group<'a>, usize) {
        let entry = &entries[cursor];
        if !is_primary_assistant(entry) {
            return (Group::Regular { entry }, cursor + 1);
        }
        if let Some(found) = self.shell_workflow(entries, cursor) {
            return found;
        }
        collect_processing(entries, cursor)
    }

    fn shell_workflow<'a>(&self, entries: &'a [Entry], cursor: usize) -> Option<(Group<'a>, usize)> {
        let entry = &entries[cursor];
        let invocation = shell_invocation(entry, self.shell_tool)?;
        let output = entries.get(cursor + 1).filter(|e| is_shell_result(e))?;

        let user_comment = entries.get(cursor + 2).filter(|e| {
            e.role == Role::User && !is_tool_result_only(e) && !e.is_sidechain
        });
        let next = cursor + 2 + usize::from(user_comment.is_some());

        let workflow = ShellWorkflow {
            invocation_entry: entry,
            shell_invocation: invocation,
            shell_output_entry: output,
            user_comment,
            timestamp: entry.timestamp_or_empty(),
        };
        Some((Group::ShellWorkflow(workflow), next))
    }
}

/// Split one assistant entry's content into (internal, final).
///
/// The last text item is the final-text candidate. Thinking, tool calls,
/// and every other text item are internal; anything else stays final.
fn split_entry(entry: &Entry) -> (Vec<&ContentItem>, Vec<&ContentItem>) {
    let last_text = entry
        .content
        .iter()
        .rposition(|item| matches!(item, ContentItem::Text { .. }));

    let mut internal = Vec::new();
    let mut final_items = Vec::new();
    for (i, item) in entry.content.iter().enumerate() {
        match item {
            ContentItem::Thinking { .. } | ContentItem::ToolUse { .. } => internal.push(item),
            ContentItem::Text { .. } if Some(i) != last_text => internal.push(item),
            _ => final_items.push(item),
        }
    }
    (internal, final_items)
}

fn collect_processing(entries: &[Entry], start: usize) -> (Group<'_>, usize) {
    let mut run = Vec::new();
    let mut assistant_entries = Vec::new();
    let mut tool_results = Vec::new();

    let mut end = start;
    for entry in &entries[start..] {
        if is_primary_assistant(entry) {
            assistant_entries.push(entry);
        } else if is_tool_result_only(entry) && !entry.is_sidechain {
            tool_results.push(entry);
        } else {
            break;
        }
        run.push(entry);
        end += 1;
    }

    let mut internal_processing = Vec::new();
    let mut carried = Vec::new();
    let mut final_response = Vec::new();
    let last = assistant_entries.len() - 1;
    for (n, &entry) in assistant_entries.iter().enumerate() {
        let (internal, final_items) = split_entry(entry);
        if n == last {
            internal_processing.extend(internal);
            final_response = final_items;
            continue;
        }
        // Earlier entries' answers become steps; only non-text survives.
        for item in &entry.content {
            match item {
                ContentItem::Thinking { .. }
                | ContentItem::ToolUse { .. }
                | ContentItem::Text { .. } => internal_processing.push(item),
                _ => carried.push(item),
            }
        }
    }
    carried.extend(final_response);
    let final_response = carried;

    if internal_processing.is_empty() && assistant_entries.len() == 1 {
        // Lone answer: any tool results that followed it are left to the
        // next steps so nothing is dropped.
        return (
            Group::Regular {
                entry: &entries[start],
            },
            start + 1,
        );
    }

    let summary = processing_summary(&internal_processing, &tool_results, assistant_entries.len());
    let workflow = ProcessingWorkflow {
        timestamp: assistant_entries[0].timestamp_or_empty(),
        run,
        assistant_entries,
        internal_processing,
        final_response,
        tool_results,
        summary,
    };
    (Group::ProcessingWorkflow(workflow), end)
}
