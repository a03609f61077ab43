use serde_json::{json, Map, Value};

/// Node types the destination cannot render. Removed with their subtree.
const UNSUPPORTED_NODES: &[&str] = &["inlineCard", "blockCard", "embedCard", "mention"];

/// Wrapper that only exists to hold media references.
const MEDIA_GROUP: &str = "mediaGroup";

/// Strip unsupported nodes from an Atlassian Document Format tree.
///
/// Anything that is not a `doc` root comes back as an empty document. Media
/// nodes are kept; a `mediaGroup` left with no children is dropped. Sibling
/// order and nesting of the surviving nodes is unchanged.
pub fn sanitize_document(doc: Option<&Value>) -> Value {
    let Some(root) = doc.and_then(Value::as_object) else {
        return empty_document();
    };
    if root.get("type").and_then(Value::as_str) != Some("doc") {
        return empty_document();
    }

    let mut cleaned = root.clone();
    let content = root
        .get("content")
        .and_then(Value::as_array)
        .map(|nodes| clean_nodes(nodes))
        .unwrap_or_default();
    cleaned.insert("content".into(), Value::Array(content));
    cleaned.entry("version").or_insert_with(|| Value::from(1));
    Value::Object(cleaned)
}

pub fn empty_document() -> Value {
    json!({ "type": "doc", "version": 1, "content": [] })
}

fn clean_nodes(nodes: &[Value]) -> Vec<Value> {
    nodes.iter().filter_map(clean_node).collect()
}

fn clean_node(node: &Value) -> Option<Value> {
    let Some(obj) = node.as_object() else {
        return Some(node.clone());
    };
    let kind = obj.get("type").and_then(Value::as_str);
    if kind.is_some_and(|k| UNSUPPORTED_NODES.contains(&k)) {
        return None;
    }

    let children = obj
        .get("content")
        .and_then(Value::as_array)
        .map(|nodes| clean_nodes(nodes));

    if kind == Some(MEDIA_GROUP) && children.as_ref().map_or(true, Vec::is_empty) {
        return None;
    }

    let mut out: Map<String, Value> = obj.clone();
    if let Some(children) = children {
        out.insert("content".into(), Value::Array(children));
    }
    Some(Value::Object(out))
}

/// First `max_chars` characters of the document's text nodes, joined by
/// single spaces. `None` when the tree holds no text.
pub fn preview_text(doc: &Value, max_chars: usize) -> Option<String> {
    let mut texts = Vec::new();
    collect_text(doc, &mut texts);
    if texts.is_empty() {
        return None;
    }
    Some(texts.join(" ").chars().take(max_chars).collect())
}

fn collect_text<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
    if node.get("type").and_then(Value::as_str) == Some("text") {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            out.push(text);
        }
        return;
    }
    for child in node.get("content").and_then(Value::as_array).into_iter().flatten() {
        collect_text(child, out);
    }
}
