//! Rules for the names a branch may take.
//!
//! A name is rejected when it is empty, holds whitespace, control characters
//! or any of `~ ^ : ? * [ \`, contains `..`, `@{` or `//`, begins or ends
//! with `.` or `/`, ends in `.lock`, or has a `/`-separated part that begins
//! with a dot.

use crate::error::{RefError, RefResult};

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Check `name` against the branch naming rules.
///
/// ```
/// use grove_refs::validate_branch_name;
///
/// assert!(validate_branch_name("release/1.2").is_ok());
/// assert!(validate_branch_name("wip..x").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(name, format!("contains whitespace or control character: {ch:?}")));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    if name.contains("//") {
        return Err(invalid(name, "must not contain consecutive slashes '//'"));
    }

    if let Some(component) = name.split('/').find(|c| c.starts_with('.')) {
        return Err(invalid(
            name,
            format!("component must not start with '.': {component:?}"),
        ));
    }

    Ok(())
}
