//! Task-definition ARN handling.

use std::fmt;

/// The stable name portion of a task-definition ARN, shared by all revisions.
///
/// `arn:aws:ecs:eu-west-1:123456789012:task-definition/web:42` → `web`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskDefinitionFamily(String);

impl TaskDefinitionFamily {
    /// Extract the family from a task-definition ARN.
    ///
    /// Returns `None` when the ARN does not end in `/<family>:<revision>`
    /// with a numeric revision.
    pub fn from_arn(arn: &str) -> Option<Self> {
        let (prefix, tail) = arn.rsplit_once('/')?;
        if prefix.is_empty() {
            return None;
        }
        let (family, revision) = tail.rsplit_once(':')?;
        if family.is_empty()
            || revision.is_empty()
            || !revision.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self(family.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `arn` belongs to this family.
    pub fn matches(&self, arn: &str) -> bool {
        Self::from_arn(arn).as_ref() == Some(self)
    }
}

impl fmt::Display for TaskDefinitionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
