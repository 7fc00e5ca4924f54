use std::fmt::{Display, Formatter};

/// A graph anomaly that generation absorbed instead of failing on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MissingBlock {
        target: String,
        block_id: String,
    },
    MissingBroadcast {
        target: String,
        broadcast_id: String,
        fallback: String,
    },
    CircularReference {
        target: String,
        block_id: String,
    },
    DepthLimit {
        target: String,
        block_id: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingBlock { target, block_id } => {
                write!(f, "{}: reference to missing block '{}'", target, block_id)
            }
            Diagnostic::MissingBroadcast {
                target,
                broadcast_id,
                fallback,
            } => write!(
                f,
                "{}: unknown broadcast '{}', showing '{}'",
                target, broadcast_id, fallback
            ),
            Diagnostic::CircularReference { target, block_id } => {
                write!(f, "{}: circular input reference through block '{}'", target, block_id)
            }
            Diagnostic::DepthLimit { target, block_id } => {
                write!(f, "{}: traversal depth limit reached at block '{}'", target, block_id)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::debug!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
