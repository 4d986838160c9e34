use std::collections::HashSet;

use retail_dw::config::TransformConfig;
use retail_dw::extract::parse_transactions;
use retail_dw::transform::{Dimension, Dimensions};
use retail_dw::types::RawTransaction;
use retail_dw::{PromotionJoin, StarSchema, StarSchemaBuilder};

fn fixture() -> Vec<RawTransaction> {
    parse_transactions(include_bytes!("resources/retail_transactions.csv")).unwrap()
}

fn build(rows: &[RawTransaction], promotion_join: PromotionJoin) -> StarSchema {
    StarSchemaBuilder::new(TransformConfig { promotion_join })
        .build(rows)
        .unwrap()
}

fn assert_dense(keys: impl Iterator<Item = i64>) {
    let keys: Vec<i64> = keys.collect();
    let expected: Vec<i64> = (1..=keys.len() as i64).collect();
    assert_eq!(keys, expected);
}

#[test]
fn dimensions_hold_exactly_the_distinct_combinations() {
    let rows = fixture();
    let schema = build(&rows, PromotionJoin::Left);

    let customers: HashSet<_> = rows
        .iter()
        .map(|r| (r.customer_name.clone(), r.customer_category.clone()))
        .collect();
    let built: HashSet<_> = schema
        .customers
        .iter()
        .map(|c| (c.customer_name.clone(), c.customer_category.clone()))
        .collect();
    assert_eq!(built, customers);
    assert_eq!(schema.customers.len(), customers.len());

    let stores: HashSet<_> = rows
        .iter()
        .map(|r| (r.store_type.clone(), r.city.clone()))
        .collect();
    assert_eq!(schema.stores.len(), stores.len());

    let timestamps: HashSet<_> = rows.iter().map(|r| r.timestamp).collect();
    let dates: HashSet<_> = schema.dates.iter().map(|d| d.date).collect();
    assert_eq!(dates, timestamps);

    assert_eq!(schema.dates.len(), 8);
    assert_eq!(schema.customers.len(), 7);
    assert_eq!(schema.seasons.len(), 3);
    assert_eq!(schema.stores.len(), 6);
    assert_eq!(schema.payment_methods.len(), 4);
    assert_eq!(schema.promotions.len(), 2);
    assert_eq!(schema.products.len(), 6);
}

#[test]
fn surrogate_keys_are_dense_from_one() {
    let schema = build(&fixture(), PromotionJoin::Left);

    assert_dense(schema.customers.iter().map(|r| r.customer_id));
    assert_dense(schema.products.iter().map(|r| r.product_id));
    assert_dense(schema.dates.iter().map(|r| r.date_id));
    assert_dense(schema.stores.iter().map(|r| r.store_id));
    assert_dense(schema.seasons.iter().map(|r| r.season_id));
    assert_dense(schema.promotions.iter().map(|r| r.promotion_id));
    assert_dense(schema.payment_methods.iter().map(|r| r.payment_method_id));
}

#[test]
fn promotion_dimension_excludes_nulls() {
    let schema = build(&fixture(), PromotionJoin::Left);
    let names: Vec<&str> = schema.promotions.iter().map(|p| p.promotion.as_str()).collect();
    assert_eq!(names, vec!["BOGO (Buy One Get One)", "Discount on Selected Items"]);
}

#[test]
fn dedup_is_idempotent() {
    let dims = Dimensions::from_transactions(&fixture());
    let once: Vec<_> = dims.customer.iter().collect();
    let twice = dims.customer.rebuild();
    assert_eq!(once, twice.iter().collect::<Vec<_>>());

    let seasons = Dimension::from_keys("season", dims.season.iter().map(|(_, s)| s.clone()));
    assert_eq!(seasons.len(), dims.season.len());
}

#[test]
fn left_join_retains_every_transaction() {
    let rows = fixture();
    let schema = build(&rows, PromotionJoin::Left);
    assert_eq!(schema.facts.len(), rows.len());
    assert_eq!(schema.dropped_transactions, 0);
}

#[test]
fn inner_join_drops_transactions_without_promotion() {
    let rows = fixture();
    let schema = build(&rows, PromotionJoin::Inner);
    assert_eq!(schema.facts.len(), 5);
    assert_eq!(schema.dropped_transactions, 3);
    assert!(schema
        .facts
        .iter()
        .all(|f| rows.iter().any(|r| r.transaction_id == f.transaction_id && r.promotion.is_some())));
}

#[test]
fn without_null_promotions_both_joins_agree() {
    let rows: Vec<_> = fixture().into_iter().filter(|r| r.promotion.is_some()).collect();
    assert_eq!(build(&rows, PromotionJoin::Left).facts.len(), rows.len());
    assert_eq!(build(&rows, PromotionJoin::Inner).facts.len(), rows.len());
}

#[test]
fn same_customer_name_in_two_categories_gets_two_keys() {
    let rows = fixture();
    let schema = build(&rows, PromotionJoin::Left);
    let lisa: Vec<_> = schema
        .customers
        .iter()
        .filter(|c| c.customer_name == "Lisa Graves")
        .collect();
    assert_eq!(lisa.len(), 2);

    let fact_keys: HashSet<_> = schema
        .facts
        .iter()
        .filter(|f| f.transaction_id == 1000000002 || f.transaction_id == 1000000006)
        .map(|f| f.customer_id)
        .collect();
    assert_eq!(fact_keys.len(), 2);
}

#[test]
fn every_fact_key_exists_in_its_dimension() {
    let schema = build(&fixture(), PromotionJoin::Left);
    let ids = |keys: Vec<i64>| keys.into_iter().collect::<HashSet<_>>();

    let dates = ids(schema.dates.iter().map(|r| r.date_id).collect());
    let customers = ids(schema.customers.iter().map(|r| r.customer_id).collect());
    let stores = ids(schema.stores.iter().map(|r| r.store_id).collect());
    let products = ids(schema.products.iter().map(|r| r.product_id).collect());
    let payments = ids(schema.payment_methods.iter().map(|r| r.payment_method_id).collect());

    for fact in &schema.facts {
        assert!(dates.contains(&fact.date_id));
        assert!(customers.contains(&fact.customer_id));
        assert!(stores.contains(&fact.store_id));
        assert!(products.contains(&fact.product_id));
        assert!(payments.contains(&fact.payment_method_id));
    }
}

#[test]
fn fact_rows_resolve_to_their_own_attributes() {
    let rows = fixture();
    let schema = build(&rows, PromotionJoin::Left);

    for (raw, fact) in rows.iter().zip(&schema.facts) {
        assert_eq!(raw.transaction_id, fact.transaction_id);
        let customer = &schema.customers[(fact.customer_id - 1) as usize];
        assert_eq!(customer.customer_name, raw.customer_name);
        assert_eq!(customer.customer_category, raw.customer_category);
        let store = &schema.stores[(fact.store_id - 1) as usize];
        assert_eq!((store.store_type.as_str(), store.city.as_str()), (raw.store_type.as_str(), raw.city.as_str()));
        assert_eq!(schema.dates[(fact.date_id - 1) as usize].date, raw.timestamp);
        assert_eq!(fact.total_items, raw.total_items);
        assert_eq!(fact.discount_applied, raw.discount_applied);
    }
}

#[test]
fn two_timestamps_on_one_day_get_distinct_date_keys() {
    let schema = build(&fixture(), PromotionJoin::Left);
    let march_15: Vec<_> = schema
        .facts
        .iter()
        .filter(|f| f.transaction_id == 1000000006 || f.transaction_id == 1000000007)
        .map(|f| f.date_id)
        .collect();
    assert_eq!(march_15.len(), 2);
    assert_ne!(march_15[0], march_15[1]);

    let times: Vec<String> = march_15
        .iter()
        .map(|id| schema.dates[(id - 1) as usize].date.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    assert_eq!(times, vec!["2023-03-15 08:00:00", "2023-03-15 19:45:12"]);

    for id in march_15 {
        let row = &schema.dates[(id - 1) as usize];
        assert_eq!((row.year, row.quarter, row.month, row.day), (2023, 1, 3, 15));
        assert_eq!(row.month_name, "March");
        assert_eq!(row.day_name, "Wednesday");
        assert_eq!(row.week_day, 2);
    }
}

#[test]
fn repeated_timestamp_shares_one_date_key() {
    let mut rows = fixture();
    let mut repeat = rows[6].clone();
    repeat.transaction_id = 1000000008;
    rows.push(repeat);

    let schema = build(&rows, PromotionJoin::Left);
    assert_eq!(schema.dates.len(), 8);
    assert_eq!(schema.facts[6].date_id, schema.facts[8].date_id);
}
