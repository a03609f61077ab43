use serde::Deserialize;
use serde_json::{Map, Value};

/// The issue being cloned, as returned by the tracker's issue endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTicket {
    pub key: String,
    #[serde(default)]
    pub fields: SourceFields,
}

/// Known fields get typed slots; everything else lands in `custom` and is
/// only ever consulted by the custom-field passthrough.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFields {
    pub summary: Option<String>,
    pub description: Option<Value>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<IssueType>,
    pub assignee: Option<Account>,
    pub reporter: Option<Account>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<Component>,
    #[serde(rename = "attachment", default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueType {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Priority {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    /// Download location of the attachment bytes.
    pub content: String,
    #[serde(default)]
    pub size: u64,
}

impl Attachment {
    /// Lowercased extension after the last dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
