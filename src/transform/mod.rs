//! Star-Schema Builder: seven dimensions plus the sales fact table.

pub mod date;
pub mod dimension;
pub mod fact;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::config::TransformConfig;
use crate::error::SchemaBuildError;
use crate::load::TableBatch;
use crate::types::RawTransaction;

pub use date::DateRow;
pub use dimension::{Dimension, SurrogateKey};
pub use fact::FactSalesRow;

/// How transactions without a promotion are joined against `dim_promotion`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionJoin {
    /// Every transaction reaches the fact table.
    #[default]
    Left,
    /// Transactions with a null promotion are dropped.
    Inner,
}

impl FromStr for PromotionJoin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(PromotionJoin::Left),
            "inner" => Ok(PromotionJoin::Inner),
            other => Err(format!("unknown promotion join '{other}', expected left or inner")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub customer_id: SurrogateKey,
    pub customer_name: String,
    pub customer_category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub product_id: SurrogateKey,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRow {
    pub store_id: SurrogateKey,
    pub store_type: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonRow {
    pub season_id: SurrogateKey,
    pub season: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionRow {
    pub promotion_id: SurrogateKey,
    pub promotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodRow {
    pub payment_method_id: SurrogateKey,
    pub payment_method: String,
}

/// Natural-key indexes for every dimension of one build.
#[derive(Debug, Clone)]
pub struct Dimensions {
    pub date: Dimension<NaiveDateTime>,
    pub customer: Dimension<(String, String)>,
    pub season: Dimension<String>,
    pub store: Dimension<(String, String)>,
    pub payment_method: Dimension<String>,
    pub promotion: Dimension<String>,
    pub product: Dimension<String>,
}

impl Dimensions {
    pub fn from_transactions(rows: &[RawTransaction]) -> Self {
        Self {
            date: Dimension::from_keys("date", rows.iter().map(|r| r.timestamp)),
            customer: Dimension::from_keys(
                "customer",
                rows.iter()
                    .map(|r| (r.customer_name.clone(), r.customer_category.clone())),
            ),
            season: Dimension::from_keys("season", rows.iter().map(|r| r.season.clone())),
            store: Dimension::from_keys(
                "store",
                rows.iter().map(|r| (r.store_type.clone(), r.city.clone())),
            ),
            payment_method: Dimension::from_keys(
                "payment_method",
                rows.iter().map(|r| r.payment_method.clone()),
            ),
            // Null promotions never get a key.
            promotion: Dimension::from_keys(
                "promotion",
                rows.iter().filter_map(|r| r.promotion.clone()),
            ),
            product: Dimension::from_keys("product", rows.iter().map(|r| r.product.clone())),
        }
    }
}

/// Output of one build, ready for the warehouse.
#[derive(Debug, Clone, Serialize)]
pub struct StarSchema {
    pub customers: Vec<CustomerRow>,
    pub products: Vec<ProductRow>,
    pub dates: Vec<DateRow>,
    pub stores: Vec<StoreRow>,
    pub seasons: Vec<SeasonRow>,
    pub promotions: Vec<PromotionRow>,
    pub payment_methods: Vec<PaymentMethodRow>,
    pub facts: Vec<FactSalesRow>,
    /// Transactions excluded by [`PromotionJoin::Inner`].
    pub dropped_transactions: usize,
}

impl StarSchema {
    /// All eight tables in load order: dimensions first, fact last.
    pub fn tables(&self) -> Vec<TableBatch> {
        vec![
            TableBatch::from_rows(&self.customers),
            TableBatch::from_rows(&self.products),
            TableBatch::from_rows(&self.dates),
            TableBatch::from_rows(&self.stores),
            TableBatch::from_rows(&self.seasons),
            TableBatch::from_rows(&self.promotions),
            TableBatch::from_rows(&self.payment_methods),
            TableBatch::from_rows(&self.facts),
        ]
    }
}

pub struct StarSchemaBuilder {
    config: TransformConfig,
}

impl StarSchemaBuilder {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, rows), fields(rows = rows.len(), promotion_join = ?self.config.promotion_join))]
    pub fn build(&self, rows: &[RawTransaction]) -> Result<StarSchema, SchemaBuildError> {
        info!("Transforming data: creating dimension tables");
        let dims = Dimensions::from_transactions(rows);
        debug!(
            dates = dims.date.len(),
            customers = dims.customer.len(),
            seasons = dims.season.len(),
            stores = dims.store.len(),
            payment_methods = dims.payment_method.len(),
            promotions = dims.promotion.len(),
            products = dims.product.len(),
            "Dimensions built"
        );

        let (facts, dropped_transactions) =
            fact::join_facts(rows, &dims, self.config.promotion_join)?;
        info!(
            "Fact table built with {} rows ({} dropped)",
            facts.len(),
            dropped_transactions
        );

        Ok(StarSchema {
            customers: dims
                .customer
                .iter()
                .map(|(customer_id, (name, category))| CustomerRow {
                    customer_id,
                    customer_name: name.clone(),
                    customer_category: category.clone(),
                })
                .collect(),
            products: dims
                .product
                .iter()
                .map(|(product_id, product)| ProductRow {
                    product_id,
                    product: product.clone(),
                })
                .collect(),
            dates: dims
                .date
                .iter()
                .map(|(date_id, timestamp)| DateRow::derive(date_id, *timestamp))
                .collect(),
            stores: dims
                .store
                .iter()
                .map(|(store_id, (store_type, city))| StoreRow {
                    store_id,
                    store_type: store_type.clone(),
                    city: city.clone(),
                })
                .collect(),
            seasons: dims
                .season
                .iter()
                .map(|(season_id, season)| SeasonRow {
                    season_id,
                    season: season.clone(),
                })
                .collect(),
            promotions: dims
                .promotion
                .iter()
                .map(|(promotion_id, promotion)| PromotionRow {
                    promotion_id,
                    promotion: promotion.clone(),
                })
                .collect(),
            payment_methods: dims
                .payment_method
                .iter()
                .map(|(payment_method_id, payment_method)| PaymentMethodRow {
                    payment_method_id,
                    payment_method: payment_method.clone(),
                })
                .collect(),
            facts,
            dropped_transactions,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{parse_timestamp, Discount, RawTransaction};

    pub fn tx(id: i64, date: &str, customer: (&str, &str), promotion: Option<&str>) -> RawTransaction {
        RawTransaction {
            transaction_id: id,
            timestamp: parse_timestamp(date).unwrap(),
            customer_name: customer.0.to_string(),
            customer_category: customer.1.to_string(),
            season: "Spring".to_string(),
            store_type: "Pharmacy".to_string(),
            city: "Boston".to_string(),
            payment_method: "Cash".to_string(),
            promotion: promotion.map(str::to_string),
            product: "['Milk']".to_string(),
            total_items: 1,
            total_cost: 9.99,
            discount_applied: Discount::Flag(false),
        }
    }
}
