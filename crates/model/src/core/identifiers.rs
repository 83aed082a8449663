use std::{fmt, sync::Arc};

/// Opaque identifier of one remote query execution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecutionHandle(Arc<str>);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExecutionHandle {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ExecutionHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
