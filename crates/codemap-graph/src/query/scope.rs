//! Tenant scoping for caller-supplied read queries.
//!
//! Splices a `BELONGS_TO` path to the tenant's Project node in front of the
//! first anchor pattern of a MATCH clause. The rewrite is textual and
//! best-effort: only the first qualifying anchor is scoped, and a query with
//! no recognised anchor runs unscoped.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// Parameter name the scoped text binds the tenant id to.
pub const PROJECT_PARAM: &str = "projectId";

const PROJECT_PATH: &str = "(p:Project {id: $projectId})<-[:BELONGS_TO]-";

static ANONYMOUS_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?i:MATCH)\s*)\(n\)").expect("valid anonymous anchor pattern"));

static LABELED_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?i:MATCH)\s*)\(n:").expect("valid labeled anchor pattern"));

static LABELED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?i:MATCH)\s*)\((\w+):(\w+)\)").expect("valid labeled pattern"));

/// Which anchor, if any, was scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "anchor", content = "variable", rename_all = "snake_case")]
pub enum ScopeOutcome {
    /// `(n)`
    AnonymousAnchor,
    /// `(n:Label)`
    LabeledAnchor,
    /// `(var:Label)` with `var` other than `n`.
    LabeledVariable(String),
    /// No anchor found; the text is unchanged.
    NotApplied,
}

impl ScopeOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ScopeOutcome::NotApplied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedQuery {
    pub text: String,
    pub outcome: ScopeOutcome,
}

/// Scope `text` to a tenant. An empty tenant leaves the text untouched.
pub fn scope(text: &str, tenant_id: &str) -> String {
    if tenant_id.is_empty() {
        return text.to_string();
    }
    scope_query(text).text
}

/// Rewrite the first anchor of `text`, reporting which rule applied.
pub fn scope_query(text: &str) -> ScopedQuery {
    if let Some(caps) = ANONYMOUS_ANCHOR.captures(text) {
        return splice(text, &caps, "(n)", ScopeOutcome::AnonymousAnchor);
    }

    if let Some(caps) = LABELED_ANCHOR.captures(text) {
        return splice(text, &caps, "(n:", ScopeOutcome::LabeledAnchor);
    }

    let labeled = LABELED_PATTERN
        .captures_iter(text)
        .find(|caps| &caps[2] != "n");
    if let Some(caps) = labeled {
        let anchor = format!("({}:{})", &caps[2], &caps[3]);
        let variable = caps[2].to_string();
        return splice(text, &caps, &anchor, ScopeOutcome::LabeledVariable(variable));
    }

    ScopedQuery { text: text.to_string(), outcome: ScopeOutcome::NotApplied }
}

/// Replace the whole match with `<MATCH keyword><project path><anchor>`.
fn splice(text: &str, caps: &Captures<'_>, anchor: &str, outcome: ScopeOutcome) -> ScopedQuery {
    let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
        return ScopedQuery { text: text.to_string(), outcome: ScopeOutcome::NotApplied };
    };

    let mut rewritten = String::with_capacity(text.len() + PROJECT_PATH.len());
    rewritten.push_str(&text[..whole.start()]);
    rewritten.push_str(keyword.as_str());
    rewritten.push_str(PROJECT_PATH);
    rewritten.push_str(anchor);
    rewritten.push_str(&text[whole.end()..]);

    ScopedQuery { text: rewritten, outcome }
}
