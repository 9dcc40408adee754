use std::fmt;

/// A `resource:operation` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKey {
    pub resource: &'static str,
    pub operation: &'static str,
}

impl OperationKey {
    pub const fn new(resource: &'static str, operation: &'static str) -> Self {
        Self {
            resource,
            operation,
        }
    }

    /// Split a `"resource:operation"` string into its two parts
    pub fn split(key: &str) -> Option<(&str, &str)> {
        let (resource, operation) = key.split_once(':')?;
        if resource.is_empty() || operation.is_empty() {
            return None;
        }
        Some((resource, operation))
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.operation)
    }
}
