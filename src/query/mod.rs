//! Relation filter translation: quantified predicates over relation fields.
//!
//! - **Filter**: the logical input (`RelationFilter`, `Quantifier`)
//! - **Translate**: the rewrite into correlated `EXISTS` conditions
//!   (`translate_filter`)
//! - **Error**: request-scoped filter errors (`FilterError`)

pub mod error;
pub mod filter;
pub mod translate;

#[doc(inline)]
pub use error::FilterError;
#[doc(inline)]
pub use filter::{Quantifier, RelationFilter};
#[doc(inline)]
pub use translate::translate_filter;
