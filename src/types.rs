use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Logical type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Decimal,
    Timestamp,
    /// Required, non-empty.
    Text,
    NullableText,
    FlagOrDecimal,
}

/// A source field parsed according to its [`FieldType`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Timestamp(NaiveDateTime),
    Text(String),
    Null,
    Discount(Discount),
}

impl FieldType {
    /// Parses one trimmed field; the error is the reason it was rejected.
    pub fn parse(self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldType::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| e.to_string()),
            FieldType::Decimal => raw
                .parse::<f64>()
                .map(FieldValue::Decimal)
                .map_err(|e| e.to_string()),
            FieldType::Timestamp => parse_timestamp(raw).map(FieldValue::Timestamp),
            FieldType::Text if raw.is_empty() => Err("value is required".to_string()),
            FieldType::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldType::NullableText => Ok(parse_nullable(raw).map_or(FieldValue::Null, FieldValue::Text)),
            FieldType::FlagOrDecimal => Discount::parse(raw).map(FieldValue::Discount),
        }
    }
}

pub const TRANSACTION_ID: &str = "Transaction_ID";
pub const DATE: &str = "Date";
pub const CUSTOMER_NAME: &str = "Customer_Name";
pub const PRODUCT: &str = "Product";
pub const TOTAL_ITEMS: &str = "Total_Items";
pub const TOTAL_COST: &str = "Total_Cost";
pub const PAYMENT_METHOD: &str = "Payment_Method";
pub const CITY: &str = "City";
pub const STORE_TYPE: &str = "Store_Type";
pub const DISCOUNT_APPLIED: &str = "Discount_Applied";
pub const CUSTOMER_CATEGORY: &str = "Customer_Category";
pub const SEASON: &str = "Season";
pub const PROMOTION: &str = "Promotion";

/// Fixed, ordered column list of the raw transaction file.
pub const RAW_SCHEMA: [(&str, FieldType); 13] = [
    (TRANSACTION_ID, FieldType::Integer),
    (DATE, FieldType::Timestamp),
    (CUSTOMER_NAME, FieldType::Text),
    (PRODUCT, FieldType::Text),
    (TOTAL_ITEMS, FieldType::Integer),
    (TOTAL_COST, FieldType::Decimal),
    (PAYMENT_METHOD, FieldType::Text),
    (CITY, FieldType::Text),
    (STORE_TYPE, FieldType::Text),
    (DISCOUNT_APPLIED, FieldType::FlagOrDecimal),
    (CUSTOMER_CATEGORY, FieldType::Text),
    (SEASON, FieldType::Text),
    (PROMOTION, FieldType::NullableText),
];

/// Tokens read as a missing value in nullable columns.
pub const NULL_TOKENS: [&str; 10] = ["", "None", "NULL", "null", "NA", "N/A", "n/a", "NaN", "nan", "#N/A"];

/// Discount column: some exports carry a flag, others the discounted amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Discount {
    Flag(bool),
    Amount(f64),
}

impl Discount {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "True" | "true" | "TRUE" | "yes" | "Yes" => Ok(Discount::Flag(true)),
            "False" | "false" | "FALSE" | "no" | "No" => Ok(Discount::Flag(false)),
            other => other
                .parse::<f64>()
                .map(Discount::Amount)
                .map_err(|e| e.to_string()),
        }
    }
}

/// One row of the source file, typed per [`RAW_SCHEMA`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub transaction_id: i64,
    pub timestamp: NaiveDateTime,
    pub customer_name: String,
    pub customer_category: String,
    pub season: String,
    pub store_type: String,
    pub city: String,
    pub payment_method: String,
    pub promotion: Option<String>,
    pub product: String,
    pub total_items: i64,
    pub total_cost: f64,
    pub discount_applied: Discount,
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .map_err(|e| e.to_string())
}

pub fn parse_nullable(raw: &str) -> Option<String> {
    if NULL_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_accepts_flags_and_amounts() {
        assert_eq!(Discount::parse("True").unwrap(), Discount::Flag(true));
        assert_eq!(Discount::parse("false").unwrap(), Discount::Flag(false));
        assert_eq!(Discount::parse("0.15").unwrap(), Discount::Amount(0.15));
        assert!(Discount::parse("maybe").is_err());
    }

    #[test]
    fn timestamps_in_all_supported_shapes() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(parse_timestamp("2023-03-15 06:27:29").unwrap().date(), expected);
        assert_eq!(parse_timestamp("2023-03-15T06:27:29").unwrap().date(), expected);
        assert_eq!(parse_timestamp("2023-03-15").unwrap().date(), expected);
        assert!(parse_timestamp("15/03/2023").is_err());
    }

    #[test]
    fn field_types_parse_their_own_shape() {
        assert_eq!(FieldType::Integer.parse("42"), Ok(FieldValue::Integer(42)));
        assert_eq!(FieldType::Decimal.parse("71.65"), Ok(FieldValue::Decimal(71.65)));
        assert_eq!(FieldType::NullableText.parse("NULL"), Ok(FieldValue::Null));
        assert_eq!(
            FieldType::FlagOrDecimal.parse("TRUE"),
            Ok(FieldValue::Discount(Discount::Flag(true)))
        );
        assert!(FieldType::Text.parse("").is_err());
        assert!(FieldType::Integer.parse("3.5").is_err());
        assert!(matches!(FieldType::Timestamp.parse("2023-03-15"), Ok(FieldValue::Timestamp(_))));
    }

    #[test]
    fn null_tokens_become_none() {
        assert_eq!(parse_nullable("None"), None);
        assert_eq!(parse_nullable(""), None);
        assert_eq!(parse_nullable("Discount10"), Some("Discount10".to_string()));
    }
}
