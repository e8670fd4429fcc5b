use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// `name=value` where the value is either double-quoted or runs to the next
/// whitespace. Spaces around `=` are allowed.
static ASSIGNMENT: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?:"([^"]*)"|(\S*))"#)
});

/// Error returned when a line is not a list of `name=value` assignments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAssignmentError {
    #[error("expected name=value, found '{0}'")]
    Unexpected(String),

    #[error("assignment pattern failed to compile: {0}")]
    Pattern(String),
}

/// One `name=value` pair as typed. The value is kept raw; numeric parsing
/// (thousands separators included) happens when the form is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

/// Splits `line` into assignments, e.g.
/// `principal=300,000 annual_rate = 6.5 state="NY"`.
///
/// Anything between assignments other than whitespace is an error, so a
/// typo never silently drops a field.
pub fn parse_assignments(line: &str) -> Result<Vec<Assignment>, ParseAssignmentError> {
    let pattern = ASSIGNMENT
        .as_ref()
        .map_err(|e| ParseAssignmentError::Pattern(e.to_string()))?;

    let mut assignments = Vec::new();
    let mut consumed = 0;
    for caps in pattern.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        check_gap(&line[consumed..whole.start()])?;
        consumed = whole.end();

        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        assignments.push(Assignment {
            name: caps[1].to_string(),
            value: value.to_string(),
        });
    }
    check_gap(&line[consumed..])?;

    if assignments.is_empty() {
        tracing::warn!(input = %line, "no assignments found");
    }
    Ok(assignments)
}

fn check_gap(gap: &str) -> Result<(), ParseAssignmentError> {
    let gap = gap.trim();
    if gap.is_empty() {
        Ok(())
    } else {
        tracing::warn!(input = %gap, "unparsable assignment text");
        Err(ParseAssignmentError::Unexpected(gap.to_string()))
    }
}
