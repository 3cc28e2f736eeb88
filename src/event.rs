use anyhow::{Context, Result};
use serde::Deserialize;

/// A GitLab webhook payload, narrowed to the event kinds this service relays.
///
/// Validated at the parse boundary: a known `object_kind` whose payload does
/// not match its shape is an error, while an unrecognized kind becomes
/// [`WebhookEvent::Unknown`] so coverage gaps surface as chat diagnostics
/// instead of failed requests.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    MergeRequest(MergeRequestEvent),
    Pipeline(PipelineEvent),
    Note(NoteEvent),
    Unknown { kind: String },
}

impl WebhookEvent {
    pub fn from_json(body: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(body).context("Body is not valid JSON")?;
        let kind = value
            .get("object_kind")
            .and_then(|k| k.as_str())
            .context("Missing object_kind field")?
            .to_string();

        let event = match kind.as_str() {
            "merge_request" => Self::MergeRequest(
                serde_json::from_value(value).context("Malformed merge_request payload")?,
            ),
            "pipeline" => Self::Pipeline(
                serde_json::from_value(value).context("Malformed pipeline payload")?,
            ),
            "note" => {
                Self::Note(serde_json::from_value(value).context("Malformed note payload")?)
            }
            _ => Self::Unknown { kind },
        };
        Ok(event)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestEvent {
    pub user: User,
    pub object_attributes: MergeRequestAttrs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestAttrs {
    pub action: MergeRequestAction,
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    pub url: String,
    #[serde(default)]
    pub last_commit: Option<Commit>,
}

/// The `action` sub-discriminant of a merge request event.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestAction {
    Approved,
    Open,
    Close,
    Merge,
    /// Any action without a template; carries the raw value for diagnostics.
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEvent {
    pub object_attributes: PipelineAttrs,
    #[serde(default)]
    pub commit: Option<Commit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineAttrs {
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteEvent {
    pub user: User,
    pub object_attributes: NoteAttrs,
    /// Present only when the note is attached to a merge request.
    #[serde(default)]
    pub merge_request: Option<MergeRequestRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteAttrs {
    pub note: String,
    pub noteable_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestRef {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub name: String,
}
