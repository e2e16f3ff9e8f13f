//! Error types for graph construction and lookup.

use std::error::Error;
use std::fmt;

use crate::model::{NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    NodeMissing(NodeId),

    NegativeWeight {
        source: NodeId,
        target: NodeId,
        weight: f64,
    },

    KindMismatch {
        source: NodeId,
        source_kind: NodeKind,
        target: NodeId,
        target_kind: NodeKind,
    },
}

// Hand-written rather than derived with thiserror: the `source` fields here
// are graph edge endpoints, and a field with that name is unconditionally
// treated as the error's source() by the derive, which requires
// `NodeId: std::error::Error`.
impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NodeMissing(id) => write!(f, "node not found: {id}"),
            GraphError::NegativeWeight {
                source,
                target,
                weight,
            } => write!(
                f,
                "negative edge weight {weight} between {source} and {target}"
            ),
            GraphError::KindMismatch {
                source,
                source_kind,
                target,
                target_kind,
            } => write!(
                f,
                "allocation edge must connect an institution and a goal, got {source_kind:?} ({source}) to {target_kind:?} ({target})"
            ),
        }
    }
}

impl Error for GraphError {}
