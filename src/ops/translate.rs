//! Nested-operation translation.
//!
//! Rewrites a nested write expressed against the logical entity graph into an
//! ordered sequence of physical operations against the join representation.
//! The net effect is the same for every relation kind; what differs is the
//! physical shape, dispatched once per request on the descriptor's kind.
//!
//! Emission order is the contract: for each nested operation, the related
//! entity write precedes the join write that references it, so every join
//! pairing is written only after its related row is durably created. No
//! existence pre-check is performed anywhere; duplicate pairings are left to
//! the join table's unique index and surface through outcome attribution.

use crate::ops::error::WriteError;
use crate::ops::nested::{NestedOperation, NestedWrite};
use crate::ops::write_op::{JoinPairing, WriteOp, WriteOpKind};
use crate::relation::def::{RelationDescriptor, RelationKind, RelationSide};
use crate::relation::join_table::JoinTableSpec;
use sea_query::{Asterisk, DynIden, Expr, ExprTrait, InsertStatement, Query, Value};

/// Translate a nested write into ordered physical operations.
///
/// # Errors
///
/// Fails without emitting anything when the request does not fit the
/// descriptor: wrong root entity or relation field, a to-one direction,
/// join attributes on a relation without a join entity, or a nested create
/// missing the related identifier value.
pub fn translate_nested_write(
    descriptor: &RelationDescriptor,
    write: &NestedWrite,
) -> Result<Vec<WriteOp>, WriteError> {
    let (source, target) =
        descriptor
            .sides_from(&write.root_entity)
            .ok_or_else(|| WriteError::UnknownRelationField {
                entity: write.root_entity.clone(),
                field: write.relation_field.clone(),
            })?;
    if source.field != write.relation_field {
        return Err(WriteError::UnknownRelationField {
            entity: write.root_entity.clone(),
            field: write.relation_field.clone(),
        });
    }
    if !descriptor.is_to_many_from(&write.root_entity) {
        return Err(WriteError::UnsupportedDirection {
            entity: write.root_entity.clone(),
            relation: descriptor.name.clone(),
        });
    }

    let mut ops = Vec::new();
    for (index, operation) in write.operations.iter().enumerate() {
        match &descriptor.kind {
            RelationKind::OneToMany { foreign_keys } => {
                let [fk] = foreign_keys.as_slice() else {
                    return Err(WriteError::CompositeForeignKeyUnsupported {
                        entity: target.entity.clone(),
                        relation: descriptor.name.clone(),
                    });
                };
                if !operation.join_values().is_empty() {
                    return Err(WriteError::JoinAttributesUnsupported {
                        relation: descriptor.name.clone(),
                    });
                }
                ops.push(translate_one_to_many(
                    index,
                    operation,
                    target,
                    &fk.foreign_key,
                    &write.root_id,
                ));
            }
            RelationKind::ManyToManyExplicit {
                join_table,
                fk_a,
                fk_b,
                ..
            } => {
                translate_explicit(
                    &mut ops,
                    index,
                    operation,
                    descriptor,
                    source,
                    target,
                    join_table,
                    fk_a,
                    fk_b,
                    &write.root_id,
                )?;
            }
            RelationKind::ManyToManyImplicit { join_table } => {
                if !operation.join_values().is_empty() {
                    return Err(WriteError::JoinAttributesUnsupported {
                        relation: descriptor.name.clone(),
                    });
                }
                translate_implicit(
                    &mut ops,
                    index,
                    operation,
                    descriptor,
                    source,
                    target,
                    join_table,
                    &write.root_id,
                )?;
            }
        }
    }
    Ok(ops)
}

/// One-to-many: the foreign key on the child row *is* the join
/// representation, so each nested operation is a single write.
fn translate_one_to_many(
    index: usize,
    operation: &NestedOperation,
    child: &RelationSide,
    fk_column: &str,
    root_id: &Value,
) -> WriteOp {
    match operation {
        NestedOperation::Create { values, .. } => {
            let mut columns = values.clone();
            columns.push((fk_column.to_string(), root_id.clone()));
            WriteOp {
                operation_index: index,
                kind: WriteOpKind::CreateRelated {
                    entity: child.entity.clone(),
                    table: child.table.clone(),
                    stmt: insert_statement(&child.table, &columns, true),
                },
            }
        }
        NestedOperation::Connect { id, .. } => {
            let mut stmt = Query::update();
            stmt.table(DynIden::from(child.table.clone()))
                .value(DynIden::from(fk_column.to_string()), Expr::val(root_id.clone()))
                .and_where(
                    Expr::col(DynIden::from(child.id_column.clone())).eq(Expr::val(id.clone())),
                );
            WriteOp {
                operation_index: index,
                kind: WriteOpKind::SetForeignKey {
                    entity: child.entity.clone(),
                    table: child.table.clone(),
                    stmt,
                },
            }
        }
    }
}

/// Explicit: a nested create becomes a related-entity write plus a join-entity
/// write carrying the two foreign keys and any extra join attributes; a
/// connect skips the related write and uses the supplied identifier.
#[allow(clippy::too_many_arguments)]
fn translate_explicit(
    ops: &mut Vec<WriteOp>,
    index: usize,
    operation: &NestedOperation,
    descriptor: &RelationDescriptor,
    source: &RelationSide,
    target: &RelationSide,
    join_table: &str,
    fk_a: &str,
    fk_b: &str,
    root_id: &Value,
) -> Result<(), WriteError> {
    let target_id = related_identifier(ops, index, operation, target)?;

    // Foreign keys are assigned by canonical side, not by initiating side.
    let root_is_a = descriptor.side_a.entity == source.entity;
    let (a_value, b_value) = if root_is_a {
        (root_id.clone(), target_id)
    } else {
        (target_id, root_id.clone())
    };

    let mut columns = vec![
        (fk_a.to_string(), a_value.clone()),
        (fk_b.to_string(), b_value.clone()),
    ];
    columns.extend(operation.join_values().iter().cloned());

    ops.push(WriteOp {
        operation_index: index,
        kind: WriteOpKind::CreateJoinRow {
            table: join_table.to_string(),
            stmt: insert_statement(join_table, &columns, false),
            pairing: JoinPairing {
                a: a_value,
                b: b_value,
            },
        },
    });
    Ok(())
}

/// Implicit: the single join-table insert populates `A`/`B` per the canonical
/// ordering, regardless of which side initiated the write.
fn translate_implicit(
    ops: &mut Vec<WriteOp>,
    index: usize,
    operation: &NestedOperation,
    descriptor: &RelationDescriptor,
    source: &RelationSide,
    target: &RelationSide,
    join_table: &JoinTableSpec,
    root_id: &Value,
) -> Result<(), WriteError> {
    let target_id = related_identifier(ops, index, operation, target)?;

    let root_is_a = descriptor.side_a.entity == source.entity;
    let (a_value, b_value) = if root_is_a {
        (root_id.clone(), target_id)
    } else {
        (target_id, root_id.clone())
    };

    let columns = vec![
        (join_table.column_a.name.clone(), a_value.clone()),
        (join_table.column_b.name.clone(), b_value.clone()),
    ];
    ops.push(WriteOp {
        operation_index: index,
        kind: WriteOpKind::CreateJoinRow {
            table: join_table.table_name.clone(),
            stmt: insert_statement(&join_table.table_name, &columns, false),
            pairing: JoinPairing {
                a: a_value,
                b: b_value,
            },
        },
    });
    Ok(())
}

/// Resolve the related row's identifier, emitting the related-entity create
/// first when the operation is a `Create`.
fn related_identifier(
    ops: &mut Vec<WriteOp>,
    index: usize,
    operation: &NestedOperation,
    target: &RelationSide,
) -> Result<Value, WriteError> {
    match operation {
        NestedOperation::Create { values, .. } => {
            let id = values
                .iter()
                .find(|(column, _)| column == &target.id_column)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| WriteError::MissingIdentifier {
                    entity: target.entity.clone(),
                    column: target.id_column.clone(),
                })?;
            ops.push(WriteOp {
                operation_index: index,
                kind: WriteOpKind::CreateRelated {
                    entity: target.entity.clone(),
                    table: target.table.clone(),
                    stmt: insert_statement(&target.table, values, true),
                },
            });
            Ok(id)
        }
        NestedOperation::Connect { id, .. } => Ok(id.clone()),
    }
}

fn insert_statement(
    table: &str,
    columns: &[(String, Value)],
    returning: bool,
) -> InsertStatement {
    let mut stmt = Query::insert();
    stmt.into_table(DynIden::from(table.to_string()));
    let mut idens = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());
    for (column, value) in columns {
        idens.push(DynIden::from(column.clone()));
        values.push(Expr::val(value.clone()));
    }
    stmt.columns(idens);
    stmt.values_panic(values);
    if returning {
        stmt.returning_col(Asterisk);
    }
    stmt
}
