//! Write outcome attribution.
//!
//! The engine emits operation descriptions and never executes them; the
//! caller runs the sequence against its store (inside a transaction or not,
//! its choice) and reports what happened to each step. Attribution turns
//! those per-step results into the request-scoped error taxonomy: a unique
//! violation on a join write is a duplicate pairing, and any failure after at
//! least one nested operation completed is a partial nested write naming the
//! operations that succeeded.

use crate::ops::error::WriteError;
use crate::ops::write_op::{WriteOp, WriteOpKind};
use crate::relation::def::RelationDescriptor;
use std::collections::BTreeSet;

/// What the caller observed for one emitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The statement was applied.
    Applied,
    /// The store rejected the statement with a unique-constraint violation.
    UniqueViolation,
    /// The statement failed for any other reason.
    Failed(String),
    /// Execution stopped before this statement was attempted.
    NotAttempted,
}

/// Map caller-reported step results onto the emitted operation sequence.
///
/// Returns `Ok(())` when every step was applied. Otherwise:
/// - a unique violation on a join write becomes
///   [`WriteError::DuplicateRelation`] carrying the rejected pairing;
/// - when at least one nested operation fully completed before the failure,
///   the error is wrapped in [`WriteError::PartialNestedWrite`] identifying
///   the completed operation indices, so the caller can compensate or retry
///   the remainder.
///
/// # Errors
///
/// [`WriteError::ResultLengthMismatch`] when `results` does not line up with
/// `ops` one to one.
pub fn attribute_outcome(
    descriptor: &RelationDescriptor,
    ops: &[WriteOp],
    results: &[StepResult],
) -> Result<(), WriteError> {
    if ops.len() != results.len() {
        return Err(WriteError::ResultLengthMismatch {
            expected: ops.len(),
            got: results.len(),
        });
    }

    let Some(failed_step) = results.iter().position(|r| *r != StepResult::Applied) else {
        return Ok(());
    };

    // A unique violation on the join representation is the duplicate-pairing
    // case; everything else is described by a plain message.
    let duplicate = match (&results[failed_step], &ops[failed_step].kind) {
        (StepResult::UniqueViolation, WriteOpKind::CreateJoinRow { table, pairing, .. }) => {
            Some(WriteError::DuplicateRelation {
                relation: descriptor.name.clone(),
                table: table.clone(),
                a: pairing.a.clone(),
                b: pairing.b.clone(),
            })
        }
        _ => None,
    };
    let message = match &results[failed_step] {
        StepResult::UniqueViolation => match &duplicate {
            Some(err) => err.to_string(),
            None => "unique-constraint violation outside the join representation".to_string(),
        },
        StepResult::Failed(message) => message.clone(),
        StepResult::NotAttempted => "execution aborted before the statement ran".to_string(),
        StepResult::Applied => unreachable!("position() found a non-applied step"),
    };

    // Which nested operations had every one of their writes applied?
    let mut completed: BTreeSet<usize> = ops.iter().map(|op| op.operation_index).collect();
    for (op, result) in ops.iter().zip(results) {
        if *result != StepResult::Applied {
            completed.remove(&op.operation_index);
        }
    }

    if completed.is_empty() {
        return Err(duplicate.unwrap_or(WriteError::PartialNestedWrite {
            relation: descriptor.name.clone(),
            succeeded: Vec::new(),
            failed: ops[failed_step].operation_index,
            total: operation_count(ops),
            cause: message,
        }));
    }
    Err(WriteError::PartialNestedWrite {
        relation: descriptor.name.clone(),
        succeeded: completed.into_iter().collect(),
        failed: ops[failed_step].operation_index,
        total: operation_count(ops),
        cause: message,
    })
}

fn operation_count(ops: &[WriteOp]) -> usize {
    ops.iter()
        .map(|op| op.operation_index + 1)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::nested::{NestedOperation, NestedWrite};
    use crate::ops::translate::translate_nested_write;
    use crate::tests_cfg::sample_registry;
    use sea_query::Value;

    #[test]
    fn test_all_applied_is_ok() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let write = NestedWrite::new("Post", 7i32, "categories")
            .operation(NestedOperation::connect(3i32));
        let ops = translate_nested_write(descriptor, &write).unwrap();

        let results = vec![StepResult::Applied];
        attribute_outcome(descriptor, &ops, &results).unwrap();
    }

    #[test]
    fn test_unique_violation_on_join_write_is_duplicate_relation() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let write = NestedWrite::new("Post", 7i32, "categories")
            .operation(NestedOperation::connect(3i32));
        let ops = translate_nested_write(descriptor, &write).unwrap();

        let err = attribute_outcome(descriptor, &ops, &[StepResult::UniqueViolation]).unwrap_err();
        match err {
            WriteError::DuplicateRelation {
                relation,
                table,
                a,
                b,
            } => {
                assert_eq!(relation, "CategoryToPost");
                assert_eq!(table, "_CategoryToPost");
                assert_eq!(a, Value::from(3i32));
                assert_eq!(b, Value::from(7i32));
            }
            other => panic!("expected DuplicateRelation, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_failure_names_completed_operations() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let write = NestedWrite::new("Post", 7i32, "categories")
            .operation(NestedOperation::connect(1i32))
            .operation(NestedOperation::connect(2i32))
            .operation(NestedOperation::connect(3i32));
        let ops = translate_nested_write(descriptor, &write).unwrap();
        assert_eq!(ops.len(), 3);

        let results = vec![
            StepResult::Applied,
            StepResult::Failed("connection reset".to_string()),
            StepResult::NotAttempted,
        ];
        let err = attribute_outcome(descriptor, &ops, &results).unwrap_err();
        match err {
            WriteError::PartialNestedWrite {
                succeeded,
                failed,
                total,
                cause,
                ..
            } => {
                assert_eq!(succeeded, vec![0]);
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
                assert!(cause.contains("connection reset"));
            }
            other => panic!("expected PartialNestedWrite, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_after_success_is_partial_with_duplicate_cause() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let write = NestedWrite::new("Post", 7i32, "categories")
            .operation(NestedOperation::connect(1i32))
            .operation(NestedOperation::connect(2i32));
        let ops = translate_nested_write(descriptor, &write).unwrap();

        let results = vec![StepResult::Applied, StepResult::UniqueViolation];
        let err = attribute_outcome(descriptor, &ops, &results).unwrap_err();
        match err {
            WriteError::PartialNestedWrite {
                succeeded, cause, ..
            } => {
                assert_eq!(succeeded, vec![0]);
                assert!(cause.contains("already links"));
            }
            other => panic!("expected PartialNestedWrite, got {:?}", other),
        }
    }

    #[test]
    fn test_result_length_mismatch() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let write = NestedWrite::new("Post", 7i32, "categories")
            .operation(NestedOperation::connect(3i32));
        let ops = translate_nested_write(descriptor, &write).unwrap();

        let err = attribute_outcome(descriptor, &ops, &[]).unwrap_err();
        assert!(matches!(
            err,
            WriteError::ResultLengthMismatch {
                expected: 1,
                got: 0
            }
        ));
    }
}
