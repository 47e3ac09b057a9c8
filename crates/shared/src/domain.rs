use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ReceiptId);
id_newtype!(ItemId);

/// A processed receipt as returned by the backend.
///
/// The backend serializes its model structs without JSON renames, so the wire
/// keys are PascalCase (`Supermarket`, `UnitPrice`) and identifiers are `ID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    #[serde(rename = "ID")]
    pub id: ReceiptId,
    pub supermarket: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub total: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,
}

/// One line of a receipt. `id` is unique within its receipt and is what
/// front-ends key rows on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(rename = "ID")]
    pub id: ItemId,
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub price: f64,
}

/// Row of the receipt listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptSummary {
    #[serde(rename = "ID")]
    pub id: ReceiptId,
    pub supermarket: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{input}', expected YYYY-MM-DD")]
pub struct InvalidDate {
    pub input: String,
}

/// Parses a user-entered calendar date (`YYYY-MM-DD`).
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, InvalidDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| InvalidDate {
        input: input.to_string(),
    })
}

/// Accepts either a bare date or an RFC 3339 timestamp and keeps the calendar
/// date only.
fn parse_wire_date(raw: &str) -> Result<NaiveDate, InvalidDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.date_naive())
        .map_err(|_| InvalidDate {
            input: raw.to_string(),
        })
}

mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wire_date(&raw).map_err(serde::de::Error::custom)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
