use serde::Serialize;

use crate::transform::{
    CustomerRow, DateRow, FactSalesRow, PaymentMethodRow, ProductRow, PromotionRow, SeasonRow,
    StoreRow,
};
use crate::types::Discount;

pub const DIM_CUSTOMER: &str = "dim_customer";
pub const DIM_PRODUCT: &str = "dim_product";
pub const DIM_DATE: &str = "dim_date";
pub const DIM_STORE: &str = "dim_store";
pub const DIM_SEASON: &str = "dim_season";
pub const DIM_PROMOTION: &str = "dim_promotion";
pub const DIM_PAYMENT_METHOD: &str = "dim_payment_method";
pub const FACT_SALES: &str = "fact_sales";

/// Warehouse table names in load order.
pub const LOAD_ORDER: [&str; 8] = [
    DIM_CUSTOMER,
    DIM_PRODUCT,
    DIM_DATE,
    DIM_STORE,
    DIM_SEASON,
    DIM_PROMOTION,
    DIM_PAYMENT_METHOD,
    FACT_SALES,
];

/// A backend-neutral SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Integer(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Integer(v as i64)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Integer(v as i64)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Real(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<&String> for Cell {
    fn from(v: &String) -> Self {
        Cell::Text(v.clone())
    }
}

impl From<Discount> for Cell {
    fn from(v: Discount) -> Self {
        match v {
            Discount::Flag(flag) => Cell::Integer(flag as i64),
            Discount::Amount(amount) => Cell::Real(amount),
        }
    }
}

/// A row type that maps onto one warehouse table.
pub trait WarehouseRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// Rows of one table, flattened for insertion.
#[derive(Debug, Clone, Serialize)]
pub struct TableBatch {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl TableBatch {
    pub fn from_rows<R: WarehouseRow>(rows: &[R]) -> Self {
        Self {
            name: R::TABLE,
            columns: R::COLUMNS,
            rows: rows.iter().map(|row| row.cells()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `INSERT INTO <name> (<columns>) VALUES (?1, ..)`.
    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.columns.join(", "),
            placeholders.join(", ")
        )
    }
}

impl WarehouseRow for CustomerRow {
    const TABLE: &'static str = DIM_CUSTOMER;
    const COLUMNS: &'static [&'static str] = &["customer_id", "customer_name", "customer_category"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.customer_id.into(),
            (&self.customer_name).into(),
            (&self.customer_category).into(),
        ]
    }
}

impl WarehouseRow for ProductRow {
    const TABLE: &'static str = DIM_PRODUCT;
    const COLUMNS: &'static [&'static str] = &["product_id", "product"];

    fn cells(&self) -> Vec<Cell> {
        vec![self.product_id.into(), (&self.product).into()]
    }
}

impl WarehouseRow for DateRow {
    const TABLE: &'static str = DIM_DATE;
    const COLUMNS: &'static [&'static str] = &[
        "date_id",
        "date",
        "year",
        "quarter",
        "month",
        "month_name",
        "day",
        "day_name",
        "week_day",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date_id.into(),
            Cell::Text(self.date.format("%Y-%m-%d %H:%M:%S").to_string()),
            self.year.into(),
            self.quarter.into(),
            self.month.into(),
            (&self.month_name).into(),
            self.day.into(),
            (&self.day_name).into(),
            self.week_day.into(),
        ]
    }
}

impl WarehouseRow for StoreRow {
    const TABLE: &'static str = DIM_STORE;
    const COLUMNS: &'static [&'static str] = &["store_id", "store_type", "city"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.store_id.into(),
            (&self.store_type).into(),
            (&self.city).into(),
        ]
    }
}

impl WarehouseRow for SeasonRow {
    const TABLE: &'static str = DIM_SEASON;
    const COLUMNS: &'static [&'static str] = &["season_id", "season"];

    fn cells(&self) -> Vec<Cell> {
        vec![self.season_id.into(), (&self.season).into()]
    }
}

impl WarehouseRow for PromotionRow {
    const TABLE: &'static str = DIM_PROMOTION;
    const COLUMNS: &'static [&'static str] = &["promotion_id", "promotion"];

    fn cells(&self) -> Vec<Cell> {
        vec![self.promotion_id.into(), (&self.promotion).into()]
    }
}

impl WarehouseRow for PaymentMethodRow {
    const TABLE: &'static str = DIM_PAYMENT_METHOD;
    const COLUMNS: &'static [&'static str] = &["payment_method_id", "payment_method"];

    fn cells(&self) -> Vec<Cell> {
        vec![self.payment_method_id.into(), (&self.payment_method).into()]
    }
}

impl WarehouseRow for FactSalesRow {
    const TABLE: &'static str = FACT_SALES;
    const COLUMNS: &'static [&'static str] = &[
        "transaction_id",
        "date_id",
        "customer_id",
        "store_id",
        "product_id",
        "payment_method_id",
        "total_items",
        "total_cost",
        "discount_applied",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.transaction_id.into(),
            self.date_id.into(),
            self.customer_id.into(),
            self.store_id.into(),
            self.product_id.into(),
            self.payment_method_id.into(),
            self.total_items.into(),
            self.total_cost.into(),
            self.discount_applied.into(),
        ]
    }
}
