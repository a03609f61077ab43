use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field payload sent to issue create/update, keyed by field id.
pub type FieldSet = Map<String, Value>;

/// What the destination create screen accepts for one project/issue type.
#[derive(Debug, Clone, Default)]
pub struct FieldAvailability {
    fields: HashMap<String, FieldDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl FieldAvailability {
    pub fn accepts(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().filter(|f| f.required)
    }
}

impl FromIterator<FieldDescriptor> for FieldAvailability {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|f| (f.field_id.clone(), f))
                .collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for FieldAvailability {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter()
            .map(|key| FieldDescriptor {
                field_id: key.to_string(),
                name: None,
                required: false,
            })
            .collect()
    }
}

/// Key of a freshly created issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClonedIssueRef {
    pub key: String,
}
