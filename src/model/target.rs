use serde::Deserialize;

/// Link type used when a target does not name one.
pub const DEFAULT_LINK_TYPE: &str = "Cloners";

/// One destination a source ticket is cloned into.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    pub project: String,
    #[serde(default)]
    pub naming: NamingPolicy,
    pub client: Option<ClientTag>,
    pub labels: Option<Vec<String>>,
    pub components: Option<Vec<String>>,
    /// Affects/fix version names, written to whichever version field the
    /// destination exposes.
    pub versions: Option<Vec<String>>,
    pub link_type: Option<String>,
}

impl TargetSpec {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            naming: NamingPolicy::default(),
            client: None,
            labels: None,
            components: None,
            versions: None,
            link_type: None,
        }
    }

    pub fn client_tag(&self) -> Option<&str> {
        self.client.as_ref().and_then(ClientTag::first)
    }

    pub fn link_type(&self) -> &str {
        self.link_type
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_LINK_TYPE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Drop every `[...]` group from the title.
    Strip,
    /// Drop the leading `[...]` group and prefix the client tag.
    #[default]
    Prefix,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClientTag {
    One(String),
    Many(Vec<String>),
}

impl ClientTag {
    pub fn first(&self) -> Option<&str> {
        let tag = match self {
            ClientTag::One(tag) => Some(tag.as_str()),
            ClientTag::Many(tags) => tags.first().map(String::as_str),
        };
        tag.map(str::trim).filter(|t| !t.is_empty())
    }
}
