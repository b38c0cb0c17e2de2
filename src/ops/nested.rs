//! The logical nested-write tree.
//!
//! A nested write is a single logical request that links records across more
//! than one entity: it is rooted at one existing row and carries a list of
//! `create`/`connect` operations against one relation field. The translator
//! rewrites it into physical operations; this module only models the input.

use sea_query::Value;

/// One nested operation under a relation field.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedOperation {
    /// Create the related row, then link it.
    ///
    /// `values` are the related entity's column values (the identifier column
    /// included). `join_values` are extra join-entity attributes and are only
    /// meaningful for explicit relations; implicit relations expose one fewer
    /// level of nesting because no join-entity payload exists.
    Create {
        values: Vec<(String, Value)>,
        join_values: Vec<(String, Value)>,
    },
    /// Link an existing related row by its identifier.
    Connect {
        id: Value,
        join_values: Vec<(String, Value)>,
    },
}

impl NestedOperation {
    /// A plain nested create.
    pub fn create<I, S, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Self::Create {
            values: values
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
            join_values: Vec::new(),
        }
    }

    /// A nested create carrying join-entity attributes (explicit relations).
    pub fn create_with_join<I, J, S, V>(values: I, join_values: J) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        J: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Self::Create {
            values: values
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
            join_values: join_values
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }

    /// A plain nested connect.
    pub fn connect(id: impl Into<Value>) -> Self {
        Self::Connect {
            id: id.into(),
            join_values: Vec::new(),
        }
    }

    /// A nested connect carrying join-entity attributes (explicit relations).
    pub fn connect_with_join<J, S, V>(id: impl Into<Value>, join_values: J) -> Self
    where
        J: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Self::Connect {
            id: id.into(),
            join_values: join_values
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }

    /// The join-entity attributes attached to this operation.
    pub fn join_values(&self) -> &[(String, Value)] {
        match self {
            Self::Create { join_values, .. } | Self::Connect { join_values, .. } => join_values,
        }
    }
}

/// A nested write request rooted at one durably existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedWrite {
    /// Entity the write is rooted at
    pub root_entity: String,
    /// Identifier value of the root row
    pub root_id: Value,
    /// Relation field on the root entity the operations attach to
    pub relation_field: String,
    /// Nested operations, translated and emitted in this order
    pub operations: Vec<NestedOperation>,
}

impl NestedWrite {
    pub fn new(
        root_entity: impl Into<String>,
        root_id: impl Into<Value>,
        relation_field: impl Into<String>,
    ) -> Self {
        Self {
            root_entity: root_entity.into(),
            root_id: root_id.into(),
            relation_field: relation_field.into(),
            operations: Vec::new(),
        }
    }

    /// Append a nested operation.
    pub fn operation(mut self, op: NestedOperation) -> Self {
        self.operations.push(op);
        self
    }
}
