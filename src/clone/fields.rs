use serde_json::{json, Value};

use crate::model::fields::{FieldAvailability, FieldSet};
use crate::model::target::TargetSpec;
use crate::model::ticket::SourceTicket;
use crate::providers::Tracker;
use crate::util::summary::transform_summary;

/// Source keys the custom-field passthrough never copies.
const RESERVED_FIELDS: &[&str] = &[
    "summary",
    "issuetype",
    "project",
    "assignee",
    "labels",
    "components",
    "versions",
    "fixVersions",
    "description",
];

type Preserve = fn(&SourceTicket) -> Option<Value>;

/// Fields copied from the source when the destination accepts them.
const PRESERVED_FIELDS: [(&str, Preserve); 5] = [
    ("assignee", preserve_assignee),
    ("labels", preserve_labels),
    ("components", preserve_components),
    ("priority", preserve_priority),
    ("reporter", preserve_reporter),
];

fn preserve_assignee(source: &SourceTicket) -> Option<Value> {
    let account = source.fields.assignee.as_ref()?;
    Some(json!({ "accountId": account.account_id }))
}

fn preserve_reporter(source: &SourceTicket) -> Option<Value> {
    let account = source.fields.reporter.as_ref()?;
    Some(json!({ "accountId": account.account_id }))
}

fn preserve_labels(source: &SourceTicket) -> Option<Value> {
    let labels = &source.fields.labels;
    (!labels.is_empty()).then(|| json!(labels))
}

fn preserve_components(source: &SourceTicket) -> Option<Value> {
    let names: Vec<&str> = source
        .fields
        .components
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    (!names.is_empty()).then(|| name_refs(&names))
}

fn preserve_priority(source: &SourceTicket) -> Option<Value> {
    let priority = source.fields.priority.as_ref()?;
    Some(json!({ "id": priority.id }))
}

/// Look up what `target` accepts and build its create payload.
///
/// A failed metadata lookup degrades to an empty availability map: only the
/// mandatory fields are sent.
pub async fn resolve_fields(
    tracker: &dyn Tracker,
    source: &SourceTicket,
    target: &TargetSpec,
) -> FieldSet {
    let availability = match &source.fields.issue_type {
        Some(issue_type) => match tracker.create_fields(&target.project, &issue_type.id).await {
            Ok(availability) => {
                tracing::debug!(project = %target.project, accepted = availability.len(), "create fields");
                availability
            }
            Err(e) => {
                tracing::warn!(project = %target.project, "{e}; copying mandatory fields only");
                FieldAvailability::default()
            }
        },
        None => {
            tracing::warn!(issue = %source.key, "source has no issue type; copying mandatory fields only");
            FieldAvailability::default()
        }
    };

    let fields = merge_fields(source, target, &availability);
    for missing in availability
        .required()
        .filter(|f| !fields.contains_key(&f.field_id) && f.field_id != "description")
    {
        tracing::warn!(
            project = %target.project,
            field = %missing.field_id,
            name = missing.name.as_deref().unwrap_or(""),
            "destination requires a field the clone does not set"
        );
    }
    fields
}

/// Merge mandatory, preserved, target-forced and passthrough fields.
pub fn merge_fields(
    source: &SourceTicket,
    target: &TargetSpec,
    availability: &FieldAvailability,
) -> FieldSet {
    let mut fields = FieldSet::new();

    let summary = source
        .fields
        .summary
        .as_deref()
        .map(|title| transform_summary(target, title))
        .unwrap_or_default();
    fields.insert("summary".into(), Value::String(summary));
    if let Some(issue_type) = &source.fields.issue_type {
        fields.insert("issuetype".into(), json!({ "id": issue_type.id }));
    }
    fields.insert("project".into(), json!({ "key": target.project }));

    for (key, preserve) in PRESERVED_FIELDS {
        if !availability.accepts(key) {
            continue;
        }
        if let Some(value) = preserve(source) {
            fields.insert(key.to_string(), value);
        }
    }

    if let Some(versions) = non_empty(&target.versions) {
        match ["versions", "fixVersions"]
            .into_iter()
            .find(|key| availability.accepts(key))
        {
            Some(key) => {
                fields.insert(key.into(), name_refs(versions));
            }
            None => tracing::debug!(
                project = %target.project,
                "destination exposes no version field; skipping forced versions"
            ),
        }
    }
    if let Some(labels) = non_empty(&target.labels) {
        if availability.accepts("labels") {
            fields.insert("labels".into(), json!(labels));
        }
    }
    if let Some(components) = non_empty(&target.components) {
        if availability.accepts("components") {
            fields.insert("components".into(), name_refs(components));
        }
    }

    for (key, value) in &source.fields.custom {
        if RESERVED_FIELDS.contains(&key.as_str()) || fields.contains_key(key) {
            continue;
        }
        if availability.accepts(key) && is_passthrough_value(value) {
            fields.insert(key.clone(), value.clone());
        }
    }

    fields
}

fn non_empty(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}

fn name_refs<S: AsRef<str>>(names: &[S]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|name| json!({ "name": name.as_ref() }))
            .collect(),
    )
}

/// Scalars and non-empty string lists round-trip safely; objects do not.
fn is_passthrough_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
        Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tests::{Call, MockTracker};

    fn source() -> SourceTicket {
        serde_json::from_value(json!({
            "key": "SRC-7",
            "fields": {
                "summary": "[QA] Fix login bug",
                "issuetype": { "id": "10004" },
                "assignee": { "accountId": "acc-1" },
                "reporter": { "accountId": "acc-2" },
                "priority": { "id": "2", "name": "High" },
                "labels": ["backend", "auth"],
                "components": [{ "id": "5", "name": "Login" }],
                "description": { "type": "doc", "version": 1, "content": [] },
                "customfield_1": "sprint goal",
                "customfield_2": 3.5,
                "customfield_3": ["a", "b"],
                "customfield_4": { "value": "Option A" },
                "customfield_5": null,
                "customfield_6": "",
                "customfield_7": [],
                "customfield_8": [{ "value": "x" }],
                "customfield_9": false,
                "fixVersions": [{ "name": "1.0" }],
                "status": { "name": "Open" }
            }
        }))
        .unwrap()
    }

    fn accepts(keys: &[&str]) -> FieldAvailability {
        keys.iter().copied().collect()
    }

    #[test]
    fn mandatory_fields_ignore_availability() {
        let fields = merge_fields(&source(), &TargetSpec::new("DST"), &FieldAvailability::default());
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["summary"], "Fix login bug");
        assert_eq!(fields["issuetype"], json!({ "id": "10004" }));
        assert_eq!(fields["project"], json!({ "key": "DST" }));
    }

    #[test]
    fn preserves_accepted_source_fields() {
        let availability = accepts(&["assignee", "labels", "components", "priority", "reporter"]);
        let fields = merge_fields(&source(), &TargetSpec::new("DST"), &availability);
        assert_eq!(fields["assignee"], json!({ "accountId": "acc-1" }));
        assert_eq!(fields["reporter"], json!({ "accountId": "acc-2" }));
        assert_eq!(fields["priority"], json!({ "id": "2" }));
        assert_eq!(fields["labels"], json!(["backend", "auth"]));
        assert_eq!(fields["components"], json!([{ "name": "Login" }]));
    }

    #[test]
    fn rejected_labels_are_not_sent() {
        let availability = accepts(&["assignee", "priority"]);
        let fields = merge_fields(&source(), &TargetSpec::new("DST"), &availability);
        assert!(!fields.contains_key("labels"));
        assert!(fields.contains_key("assignee"));
    }

    #[test]
    fn empty_source_values_are_skipped() {
        let mut ticket = source();
        ticket.fields.labels.clear();
        ticket.fields.components.clear();
        ticket.fields.assignee = None;
        let availability = accepts(&["assignee", "labels", "components"]);
        let fields = merge_fields(&ticket, &TargetSpec::new("DST"), &availability);
        assert!(!fields.contains_key("labels"));
        assert!(!fields.contains_key("components"));
        assert!(!fields.contains_key("assignee"));
    }

    #[test]
    fn forced_versions_prefer_versions_key() {
        let target = TargetSpec {
            versions: Some(vec!["2.1".into()]),
            ..TargetSpec::new("DST")
        };
        let both = merge_fields(&source(), &target, &accepts(&["versions", "fixVersions"]));
        assert_eq!(both["versions"], json!([{ "name": "2.1" }]));
        assert!(!both.contains_key("fixVersions"));

        let fix_only = merge_fields(&source(), &target, &accepts(&["fixVersions"]));
        assert_eq!(fix_only["fixVersions"], json!([{ "name": "2.1" }]));
        assert!(!fix_only.contains_key("versions"));

        let neither = merge_fields(&source(), &target, &accepts(&[]));
        assert!(!neither.contains_key("versions"));
        assert!(!neither.contains_key("fixVersions"));
    }

    #[test]
    fn forced_labels_and_components_override_preserved() {
        let target = TargetSpec {
            labels: Some(vec!["cloned".into()]),
            components: Some(vec!["Frontend".into(), "API".into()]),
            ..TargetSpec::new("DST")
        };
        let fields = merge_fields(&source(), &target, &accepts(&["labels", "components"]));
        assert_eq!(fields["labels"], json!(["cloned"]));
        assert_eq!(fields["components"], json!([{ "name": "Frontend" }, { "name": "API" }]));
    }

    #[test]
    fn forced_values_need_acceptance_and_content() {
        let target = TargetSpec {
            labels: Some(vec!["cloned".into()]),
            components: Some(vec![]),
            ..TargetSpec::new("DST")
        };
        let fields = merge_fields(&source(), &target, &accepts(&["components"]));
        assert!(!fields.contains_key("labels"));
        assert_eq!(fields["components"], json!([{ "name": "Login" }]));
    }

    #[test]
    fn passthrough_copies_only_simple_accepted_values() {
        let availability = accepts(&[
            "customfield_1",
            "customfield_2",
            "customfield_3",
            "customfield_4",
            "customfield_5",
            "customfield_6",
            "customfield_7",
            "customfield_8",
            "customfield_9",
            "fixVersions",
            "description",
            "status",
        ]);
        let fields = merge_fields(&source(), &TargetSpec::new("DST"), &availability);
        assert_eq!(fields["customfield_1"], "sprint goal");
        assert_eq!(fields["customfield_2"], json!(3.5));
        assert_eq!(fields["customfield_3"], json!(["a", "b"]));
        assert_eq!(fields["customfield_9"], json!(false));
        for rejected in [
            "customfield_4",
            "customfield_5",
            "customfield_6",
            "customfield_7",
            "customfield_8",
            "fixVersions",
            "description",
            "status",
        ] {
            assert!(!fields.contains_key(rejected), "{rejected} was copied");
        }
    }

    #[test]
    fn passthrough_needs_acceptance() {
        let fields = merge_fields(&source(), &TargetSpec::new("DST"), &accepts(&["customfield_2"]));
        assert!(fields.contains_key("customfield_2"));
        assert!(!fields.contains_key("customfield_1"));
    }

    #[tokio::test]
    async fn failed_lookup_degrades_to_mandatory_fields() {
        let tracker = MockTracker::new();
        let fields = resolve_fields(&tracker, &source(), &TargetSpec::new("DST")).await;
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["issuetype", "project", "summary"]
        );
        assert_eq!(
            tracker.recorded(),
            vec![Call::CreateFields("DST".into(), "10004".into())]
        );
    }

    #[tokio::test]
    async fn lookup_uses_target_project_and_source_issue_type() {
        let tracker = MockTracker::new().with_fields("DST", &["labels"]);
        let fields = resolve_fields(&tracker, &source(), &TargetSpec::new("DST")).await;
        assert_eq!(fields["labels"], json!(["backend", "auth"]));
    }
}
