use std::fmt;

use serde::{Deserialize, Serialize};

const FORBIDDEN: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}'];

/// Normalized account name under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    pub fn new(raw: &str) -> Result<Self, SubjectError> {
        let collapsed = raw
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if collapsed.is_empty() {
            return Err(SubjectError::Empty);
        }
        if let Some(found) = collapsed.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(SubjectError::ForbiddenCharacter(found));
        }

        let mut chars = collapsed.chars();
        let normalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return Err(SubjectError::Empty),
        };

        Ok(Self(normalized))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Subject {
    type Error = SubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubjectError {
    #[error("username must not be empty")]
    Empty,
    #[error("username contains forbidden character '{0}'")]
    ForbiddenCharacter(char),
}
