//! Split coalescing.
//!
//! Groups joined in sequence correlate their split keys to the split keys
//! already placed rather than to the base table, so an entity gets one row
//! per split value without a cross product. Each requested dimension is
//! output once, coalesced across the groups that carry it.

use super::grouper::TableGroup;
use crate::registry::SplitDimension;
use crate::sql::{coalesce, lit_int, table_col, Expr, ExprExt};

/// A placed group's split column for one dimension.
#[derive(Debug, Clone)]
struct SplitRef {
    alias: String,
    column: &'static str,
    /// Non-zero for groups lagging the correlated rows (`year_offset`).
    offset: i64,
}

impl SplitRef {
    /// Value of the dimension on the correlated rows.
    fn resolved(&self, dim: SplitDimension) -> Expr {
        let column = table_col(&self.alias, self.column);
        match dim {
            SplitDimension::Year if self.offset != 0 => column.add(lit_int(self.offset)),
            _ => column,
        }
    }
}

/// Split columns of the groups joined so far, in join order.
#[derive(Debug, Default)]
pub struct SplitChain {
    placed: Vec<(SplitDimension, SplitRef)>,
}

impl SplitChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlation predicates for joining `group`, which is then placed.
    ///
    /// Each split key must equal the value already placed for its dimension,
    /// or any value when no placed group has a row for the entity.
    pub fn correlate(&mut self, group: &TableGroup) -> Vec<Expr> {
        let offset = group.year_offset();
        let mut predicates = Vec::new();

        for dim in &group.splits {
            let Some(column) = group.split_column(*dim) else {
                continue;
            };
            let own = table_col(&group.alias, column);
            let mut terms: Vec<Expr> = self
                .reference(*dim)
                .into_iter()
                .map(|r| match dim {
                    SplitDimension::Year if offset != 0 => r.sub(lit_int(offset)),
                    _ => r,
                })
                .collect();
            if !terms.is_empty() {
                terms.push(own.clone());
                predicates.push(own.eq(coalesce(terms)));
            }
            self.placed.push((
                *dim,
                SplitRef {
                    alias: group.alias.clone(),
                    column,
                    offset,
                },
            ));
        }

        predicates
    }

    /// Coalesced output expression of `dim`, if any placed group carries it.
    pub fn output(&self, dim: SplitDimension) -> Option<Expr> {
        let mut anchored: Vec<Expr> = self
            .carrying(dim)
            .filter(|r| r.offset == 0)
            .map(|r| r.resolved(dim))
            .collect();
        if anchored.is_empty() {
            anchored = self.carrying(dim).map(|r| r.resolved(dim)).collect();
        }
        combine(anchored)
    }

    /// Resolved values of `dim` on the rows placed so far, most recent first.
    ///
    /// Groups without an offset are preferred; relative groups are used only
    /// when nothing else carries the dimension yet.
    fn reference(&self, dim: SplitDimension) -> Vec<Expr> {
        let anchored: Vec<Expr> = self
            .carrying(dim)
            .rev()
            .filter(|r| r.offset == 0)
            .map(|r| r.resolved(dim))
            .collect();
        if !anchored.is_empty() {
            return anchored;
        }
        self.carrying(dim).rev().map(|r| r.resolved(dim)).collect()
    }

    fn carrying(&self, dim: SplitDimension) -> impl DoubleEndedIterator<Item = &SplitRef> {
        self.placed
            .iter()
            .filter(move |(d, _)| *d == dim)
            .map(|(_, r)| r)
    }
}

fn combine(mut exprs: Vec<Expr>) -> Option<Expr> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(coalesce(exprs)),
    }
}

/// Correlation of a denominator to the numerator it normalizes.
pub fn correlate_to(denominator: &TableGroup, numerator: &TableGroup) -> Vec<Expr> {
    denominator
        .splits
        .iter()
        .filter_map(|dim| {
            let own = denominator.split_column(*dim)?;
            let other = numerator.split_column(*dim)?;
            Some(table_col(&denominator.alias, own).eq(table_col(&numerator.alias, other)))
        })
        .collect()
}
