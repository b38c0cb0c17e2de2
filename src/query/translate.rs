//! Relation filter translation.
//!
//! Rewrites a quantified predicate over a relation field into a correlated
//! `EXISTS` condition over the physical representation. The caller embeds the
//! returned condition in the WHERE clause of its own query over the source
//! entity's table; the correlated references use the unaliased source table
//! name.
//!
//! Quantifier semantics:
//! - `some`:  `EXISTS (related rows matching)`
//! - `none`:  `NOT EXISTS (related rows matching)`
//! - `every`: `NOT EXISTS (related rows failing the predicate)`, which makes
//!   `every` vacuously true when zero related rows exist.

use crate::query::error::FilterError;
use crate::query::filter::{Quantifier, RelationFilter};
use crate::relation::def::{RelationDescriptor, RelationKind, RelationSide};
use sea_query::{Condition, DynIden, Expr, ExprTrait, Query, SelectStatement};

/// Translate a relation filter into a physical predicate for queries rooted
/// at `source_entity`.
pub fn translate_filter(
    descriptor: &RelationDescriptor,
    source_entity: &str,
    filter: &RelationFilter,
) -> Result<Condition, FilterError> {
    let (source, target) =
        descriptor
            .sides_from(source_entity)
            .ok_or_else(|| FilterError::UnknownSide {
                entity: source_entity.to_string(),
                relation: descriptor.name.clone(),
            })?;
    if !descriptor.is_to_many_from(source_entity) {
        return Err(FilterError::NotToMany {
            entity: source_entity.to_string(),
            relation: descriptor.name.clone(),
        });
    }

    // The match predicate: everything the quantifier quantifies over. For
    // explicit relations the join-attribute and related-entity conditions
    // must hold on the same join row, so they are folded together before the
    // quantifier is applied.
    let mut matched = Condition::all().add(filter.related.clone());
    if let Some(join_attrs) = &filter.join_attrs {
        if !matches!(descriptor.kind, RelationKind::ManyToManyExplicit { .. }) {
            return Err(FilterError::JoinConditionUnsupported {
                relation: descriptor.name.clone(),
            });
        }
        matched = matched.add(join_attrs.clone());
    }
    let quantified = match filter.quantifier {
        Quantifier::Some | Quantifier::None => matched,
        Quantifier::Every => Condition::all().add(matched.not()),
    };

    let subquery = match &descriptor.kind {
        RelationKind::OneToMany { foreign_keys } => {
            // Direct correlated subquery over the child table.
            let mut correlation = Condition::all();
            for pair in foreign_keys {
                correlation = correlation.add(
                    Expr::col((
                        DynIden::from(target.table.clone()),
                        DynIden::from(pair.foreign_key.clone()),
                    ))
                    .equals((
                        DynIden::from(source.table.clone()),
                        DynIden::from(pair.references.clone()),
                    )),
                );
            }
            let mut sub = Query::select();
            sub.expr(Expr::val(1))
                .from(DynIden::from(target.table.clone()))
                .cond_where(correlation.add(quantified));
            sub
        }
        RelationKind::ManyToManyExplicit {
            join_table,
            fk_a,
            fk_b,
            ..
        } => {
            let source_is_a = descriptor.side_a.entity == source.entity;
            let (source_fk, target_fk) = if source_is_a {
                (fk_a, fk_b)
            } else {
                (fk_b, fk_a)
            };
            join_subquery(
                join_table,
                source_fk,
                target_fk,
                source,
                target,
                quantified,
            )
        }
        RelationKind::ManyToManyImplicit { join_table } => {
            let (own, other) = join_table
                .columns_for(&source.entity)
                .expect("descriptor sides reference the join table entities");
            join_subquery(
                &join_table.table_name,
                &own.name,
                &other.name,
                source,
                target,
                quantified,
            )
        }
    };

    let exists = Expr::exists(subquery);
    let condition = match filter.quantifier {
        Quantifier::Some => Condition::all().add(exists),
        Quantifier::Every | Quantifier::None => Condition::all().add(exists.not()),
    };
    Ok(condition)
}

/// `SELECT 1 FROM <join table> INNER JOIN <related> ON related.id =
/// jt.<target column> WHERE jt.<source column> = source.id AND <quantified>`.
fn join_subquery(
    join_table: &str,
    source_column: &str,
    target_column: &str,
    source: &RelationSide,
    target: &RelationSide,
    quantified: Condition,
) -> SelectStatement {
    let join_on = Expr::col((
        DynIden::from(target.table.clone()),
        DynIden::from(target.id_column.clone()),
    ))
    .equals((
        DynIden::from(join_table.to_string()),
        DynIden::from(target_column.to_string()),
    ));
    let correlation = Expr::col((
        DynIden::from(join_table.to_string()),
        DynIden::from(source_column.to_string()),
    ))
    .equals((
        DynIden::from(source.table.clone()),
        DynIden::from(source.id_column.clone()),
    ));

    let mut sub = Query::select();
    sub.expr(Expr::val(1))
        .from(DynIden::from(join_table.to_string()))
        .inner_join(DynIden::from(target.table.clone()), join_on)
        .cond_where(Condition::all().add(correlation).add(quantified));
    sub
}
