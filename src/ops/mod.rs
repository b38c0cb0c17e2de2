//! Nested-write translation: logical operation trees to physical writes.
//!
//! - **Nested**: the logical input (`NestedWrite`, `NestedOperation`)
//! - **Write op**: the emitted physical operations (`WriteOp`, `WriteOpKind`)
//! - **Translate**: the rewrite itself (`translate_nested_write`)
//! - **Outcome**: attribution of caller-reported step results
//!   (`attribute_outcome`, `StepResult`)
//! - **Error**: request-scoped write errors (`WriteError`)
//!
//! The translator only produces operation descriptions; execution, transaction
//! boundaries and cancellation belong to the calling system.

pub mod error;
pub mod nested;
pub mod outcome;
pub mod translate;
pub mod write_op;

#[doc(inline)]
pub use error::WriteError;
#[doc(inline)]
pub use nested::{NestedOperation, NestedWrite};
#[doc(inline)]
pub use outcome::{attribute_outcome, StepResult};
#[doc(inline)]
pub use translate::translate_nested_write;
#[doc(inline)]
pub use write_op::{JoinPairing, WriteOp, WriteOpKind};
