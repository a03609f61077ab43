use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::target::{NamingPolicy, TargetSpec};

/// A run of adjacent bracket groups with the whitespace around them.
static BRACKET_GROUP_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\[[^\]]*\]\s*)+").expect("static regex"));
static LEADING_BRACKET_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").expect("static regex"));

/// Compute the clone's title for `target` from the source title.
pub fn transform_summary(target: &TargetSpec, title: &str) -> String {
    match target.naming {
        NamingPolicy::Strip => {
            let stripped = BRACKET_GROUP_RUN.replace_all(title, |caps: &Captures| {
                let m = caps.get(0).map_or(0..0, |m| m.range());
                // A group between two words leaves one separating space.
                if m.start == 0 || m.end == title.len() {
                    ""
                } else {
                    " "
                }
            });
            stripped.trim().to_string()
        }
        NamingPolicy::Prefix => {
            let rest = LEADING_BRACKET_GROUP.replace(title, "");
            match target.client_tag() {
                Some(tag) => format!("[{tag}] {rest}").trim().to_string(),
                None => rest.into_owned(),
            }
        }
    }
}
