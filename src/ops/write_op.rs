//! Physical write operations emitted by the nested-write translator.
//!
//! A `WriteOp` is an operation *description*: a fully bound sea-query
//! statement plus the bookkeeping the caller needs to execute it in order and
//! report what happened. Nothing here touches a database.

use sea_query::{InsertStatement, UpdateStatement, Value};

/// The (A, B) identifier pairing a join-representation write establishes.
///
/// Values are stored in the relation's canonical column order (`A` before
/// `B`, or `fk_a` before `fk_b`), independent of which side initiated the
/// write, so a constraint violation can be reported unambiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPairing {
    /// Identifier stored in the side-A column
    pub a: Value,
    /// Identifier stored in the side-B column
    pub b: Value,
}

/// The physical shape of one emitted write.
#[derive(Debug, Clone)]
pub enum WriteOpKind {
    /// Create the related entity row. Emitted before the join write of the
    /// same nested operation; carries `RETURNING *` so executors can hand the
    /// stored row back.
    CreateRelated {
        entity: String,
        table: String,
        stmt: InsertStatement,
    },
    /// Create the join-representation row (explicit join-entity row or
    /// implicit join-table row).
    CreateJoinRow {
        table: String,
        stmt: InsertStatement,
        pairing: JoinPairing,
    },
    /// Point an existing child row's foreign key at the root (one-to-many
    /// connect).
    SetForeignKey {
        entity: String,
        table: String,
        stmt: UpdateStatement,
    },
}

/// One emitted physical write, tagged with the nested operation it serves.
#[derive(Debug, Clone)]
pub struct WriteOp {
    /// Index of the nested operation in the request this write belongs to
    pub operation_index: usize,
    pub kind: WriteOpKind,
}

impl WriteOp {
    /// Whether this write establishes a join pairing (and can therefore
    /// violate the relation's uniqueness constraint).
    pub fn is_join_write(&self) -> bool {
        matches!(self.kind, WriteOpKind::CreateJoinRow { .. })
    }

    /// The pairing this write establishes, if it is a join write.
    pub fn pairing(&self) -> Option<&JoinPairing> {
        match &self.kind {
            WriteOpKind::CreateJoinRow { pairing, .. } => Some(pairing),
            _ => None,
        }
    }

    /// The physical table this write targets.
    pub fn table(&self) -> &str {
        match &self.kind {
            WriteOpKind::CreateRelated { table, .. }
            | WriteOpKind::CreateJoinRow { table, .. }
            | WriteOpKind::SetForeignKey { table, .. } => table,
        }
    }
}
