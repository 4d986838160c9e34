use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

use super::dimension::{Dimension, SurrogateKey};
use super::{Dimensions, PromotionJoin};
use crate::error::SchemaBuildError;
use crate::types::{Discount, RawTransaction};

/// Row of `fact_sales`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSalesRow {
    pub transaction_id: i64,
    pub date_id: SurrogateKey,
    pub customer_id: SurrogateKey,
    pub store_id: SurrogateKey,
    pub product_id: SurrogateKey,
    pub payment_method_id: SurrogateKey,
    pub total_items: i64,
    pub total_cost: f64,
    pub discount_applied: Discount,
}

fn resolve<K>(
    dim: &Dimension<K>,
    key: &K,
    tx: &RawTransaction,
) -> Result<SurrogateKey, SchemaBuildError>
where
    K: Eq + Hash + Clone + Debug,
{
    dim.key_of(key).ok_or_else(|| SchemaBuildError::UnresolvedKey {
        dimension: dim.name(),
        key: format!("{key:?}"),
        transaction_id: tx.transaction_id,
    })
}

/// Joins each transaction against every dimension, preserving input order.
///
/// Date, season, product, customer, payment method and store are inner joins:
/// a missing natural key is an error. The promotion join follows `join`.
/// Returns the fact rows and the number of transactions dropped.
pub fn join_facts(
    rows: &[RawTransaction],
    dims: &Dimensions,
    join: PromotionJoin,
) -> Result<(Vec<FactSalesRow>, usize), SchemaBuildError> {
    let mut facts = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for tx in rows {
        let date_id = resolve(&dims.date, &tx.timestamp, tx)?;
        resolve(&dims.season, &tx.season, tx)?;
        let product_id = resolve(&dims.product, &tx.product, tx)?;
        let customer_id = resolve(
            &dims.customer,
            &(tx.customer_name.clone(), tx.customer_category.clone()),
            tx,
        )?;
        let payment_method_id = resolve(&dims.payment_method, &tx.payment_method, tx)?;

        match (&tx.promotion, join) {
            (Some(promotion), _) => {
                resolve(&dims.promotion, promotion, tx)?;
            }
            (None, PromotionJoin::Left) => {}
            (None, PromotionJoin::Inner) => {
                debug!(transaction_id = tx.transaction_id, "Dropping transaction without promotion");
                dropped += 1;
                continue;
            }
        }

        let store_id = resolve(&dims.store, &(tx.store_type.clone(), tx.city.clone()), tx)?;

        facts.push(FactSalesRow {
            transaction_id: tx.transaction_id,
            date_id,
            customer_id,
            store_id,
            product_id,
            payment_method_id,
            total_items: tx.total_items,
            total_cost: tx.total_cost,
            discount_applied: tx.discount_applied,
        });
    }

    Ok((facts, dropped))
}
