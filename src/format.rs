//! Event classification and Telegram MarkdownV2 message templates.
//!
//! Everything here is a pure function of the event; the handler decides what
//! to do with the produced string.

use crate::event::{MergeRequestAction, MergeRequestEvent, NoteEvent, PipelineEvent, WebhookEvent};

/// Characters Telegram MarkdownV2 treats as markup.
const RESERVED: &[char] = &['-', '_', '.', '*', '[', ']', '(', ')', '`', '~'];

/// Prefix every reserved MarkdownV2 character with a backslash.
///
/// Every user-supplied field must go through here before interpolation,
/// otherwise a branch named `*important*` would render as bold instead of
/// text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Select a template for the event and build the message.
///
/// Returns an empty string for events that should not be relayed (comments on
/// anything other than a merge request). Never fails: events without a
/// template produce a `[DEBUG]` diagnostic so coverage gaps show up in the
/// chat itself.
pub fn format_event(event: &WebhookEvent) -> String {
    match event {
        WebhookEvent::MergeRequest(mr) => match &mr.object_attributes.action {
            MergeRequestAction::Approved => format_merge_request_approved(mr),
            MergeRequestAction::Open => format_merge_request_created(mr),
            MergeRequestAction::Close => format_merge_request_closed(mr),
            MergeRequestAction::Merge => format_merge_request_merged(mr),
            MergeRequestAction::Other(action) => {
                format!("[DEBUG] Unhandled merge request action: {action}")
            }
        },
        WebhookEvent::Pipeline(pipeline) => format_pipeline(pipeline),
        WebhookEvent::Note(note) => format_note(note),
        WebhookEvent::Unknown { kind } => format!("[DEBUG] Unhandled event kind: {kind}"),
    }
}

fn format_merge_request_created(event: &MergeRequestEvent) -> String {
    let attrs = &event.object_attributes;
    let user = escape_markdown(&event.user.name);
    let title = escape_markdown(&attrs.title);
    let link = escape_markdown(&attrs.url);
    let source = escape_markdown(&attrs.source_branch);
    let target = escape_markdown(&attrs.target_branch);
    format!(
        "🟢 New merge request [{title}]({link}) by *{user}*\n    \
         Source branch: *{source}*\n    \
         Target branch: *{target}*"
    )
}

fn format_merge_request_approved(event: &MergeRequestEvent) -> String {
    let attrs = &event.object_attributes;
    let user = escape_markdown(&event.user.name);
    let title = escape_markdown(&attrs.title);
    let link = escape_markdown(&attrs.url);
    let source = escape_markdown(&attrs.source_branch);
    let target = escape_markdown(&attrs.target_branch);
    format!(
        "🟡 Merge request [{title}]({link}) approved by *{user}*\n    \
         Source branch: *{source}*\n    \
         Target branch: *{target}*"
    )
}

fn format_merge_request_closed(event: &MergeRequestEvent) -> String {
    let attrs = &event.object_attributes;
    let user = escape_markdown(&event.user.name);
    let title = escape_markdown(&attrs.title);
    let link = escape_markdown(&attrs.url);
    format!("🔴 Merge request [{title}]({link}) closed by *{user}*")
}

fn format_merge_request_merged(event: &MergeRequestEvent) -> String {
    let attrs = &event.object_attributes;
    // Merge completion is attributed to the last commit's author; the
    // top-level user is whoever pressed the button.
    let author = attrs
        .last_commit
        .as_ref()
        .and_then(|commit| commit.author.as_ref())
        .map(|author| author.name.as_str())
        .unwrap_or(&event.user.name);
    let author = escape_markdown(author);
    let title = escape_markdown(&attrs.title);
    let link = escape_markdown(&attrs.url);
    let source = escape_markdown(&attrs.source_branch);
    let target = escape_markdown(&attrs.target_branch);
    format!(
        "🟣 Merge request [{title}]({link}) merged by *{author}*\n    \
         Source branch: *{source}*\n    \
         Target branch: *{target}*"
    )
}

fn format_pipeline(event: &PipelineEvent) -> String {
    let attrs = &event.object_attributes;
    // Display name priority: explicit pipeline name, then the triggering
    // commit's title, then nothing.
    let name = attrs
        .name
        .as_deref()
        .or_else(|| event.commit.as_ref().and_then(|c| c.title.as_deref()))
        .unwrap_or("");
    let name = escape_markdown(name);
    let status = escape_markdown(&attrs.status);
    format!("🔧 Pipeline *{name}*, status: *{status}*")
}

fn format_note(event: &NoteEvent) -> String {
    if event.object_attributes.noteable_type != "MergeRequest" {
        return String::new();
    }
    // Defensively optional: a note claiming to be on a merge request but
    // carrying no merge_request record has nothing to link to.
    let Some(mr) = &event.merge_request else {
        return String::new();
    };
    let user = escape_markdown(&event.user.name);
    let title = escape_markdown(&mr.title);
    let link = escape_markdown(&mr.url);
    let comment = escape_markdown(&event.object_attributes.note);
    format!(
        "💬 Comment on merge request [{title}]({link}) by *{user}*:\n    \
         `{comment}`"
    )
}
