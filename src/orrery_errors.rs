use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrreryError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Coefficient table not found at: {0}")]
    TableNotFound(Utf8PathBuf),

    #[error("Malformed coefficient table {table} at line {line}: {reason}")]
    TableFormat {
        table: String,
        line: usize,
        reason: String,
    },

    #[error("Coefficient table {0} contains no rows")]
    EmptyTable(String),

    #[error("Invalid planetary variable index {0} (expected 1..=6)")]
    InvalidVariableIndex(i64),

    #[error("Unable to parse the system configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Unknown body: {0}")]
    UnknownBody(String),

    #[error("Body declared twice: {0}")]
    DuplicateBody(String),

    #[error("Node id {0} does not belong to this body tree")]
    InvalidNodeId(usize),

    #[error("Node {0} is already attached to a parent system")]
    NodeAlreadyAttached(usize),

    #[error("Node {0} is a single body, not a body system")]
    NotASystem(usize),

    #[error("Attaching node {child} under node {parent} would create a cycle")]
    CyclicAttachment { parent: usize, child: usize },

    #[error("Invalid epoch string: {0}")]
    InvalidEpoch(String),
}

impl PartialEq for OrreryError {
    fn eq(&self, other: &Self) -> bool {
        use OrreryError::*;
        match (self, other) {
            // Not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            (ConfigParse(_), ConfigParse(_)) => true,

            (TableNotFound(a), TableNotFound(b)) => a == b,
            (
                TableFormat {
                    table: t1,
                    line: l1,
                    reason: r1,
                },
                TableFormat {
                    table: t2,
                    line: l2,
                    reason: r2,
                },
            ) => t1 == t2 && l1 == l2 && r1 == r2,
            (EmptyTable(a), EmptyTable(b)) => a == b,
            (InvalidVariableIndex(a), InvalidVariableIndex(b)) => a == b,
            (UnknownBody(a), UnknownBody(b)) => a == b,
            (DuplicateBody(a), DuplicateBody(b)) => a == b,
            (InvalidNodeId(a), InvalidNodeId(b)) => a == b,
            (NodeAlreadyAttached(a), NodeAlreadyAttached(b)) => a == b,
            (NotASystem(a), NotASystem(b)) => a == b,
            (
                CyclicAttachment {
                    parent: p1,
                    child: c1,
                },
                CyclicAttachment {
                    parent: p2,
                    child: c2,
                },
            ) => p1 == p2 && c1 == c2,
            (InvalidEpoch(a), InvalidEpoch(b)) => a == b,

            _ => false,
        }
    }
}
