//! View models the front-end renders from. They are rebuilt from controller
//! state on every render and never feed back into it.

use chrono::NaiveDate;
use shared::domain::{Item, Receipt, ReceiptId, ReceiptSummary};

use crate::{error::FailureReport, highlight::HighlightTerm};

pub const NO_ITEMS_FOUND: &str = "No items found";
pub const RECEIPT_PROCESSED: &str = "Receipt processed successfully";

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRow {
    pub id: ReceiptId,
    pub supermarket: String,
    pub date: NaiveDate,
    pub total: f64,
}

impl From<&ReceiptSummary> for ReceiptRow {
    fn from(summary: &ReceiptSummary) -> Self {
        Self {
            id: summary.id,
            supermarket: summary.supermarket.clone(),
            date: summary.date,
            total: summary.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingView {
    Loading,
    NoItemsFound,
    Rows(Vec<ReceiptRow>),
    Error(FailureReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub item: Item,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDetailView {
    pub id: ReceiptId,
    pub supermarket: String,
    pub date: NaiveDate,
    pub total: f64,
    pub currency: String,
    pub rows: Vec<ItemRow>,
}

impl ReceiptDetailView {
    pub fn new(receipt: &Receipt, highlight: &HighlightTerm) -> Self {
        Self {
            id: receipt.id,
            supermarket: receipt.supermarket.clone(),
            date: receipt.date,
            total: receipt.total,
            currency: receipt.currency.clone(),
            rows: receipt
                .items
                .iter()
                .map(|item| ItemRow {
                    item: item.clone(),
                    highlighted: highlight.matches(&item.name),
                })
                .collect(),
        }
    }

    pub fn highlighted_rows(&self) -> impl Iterator<Item = &ItemRow> {
        self.rows.iter().filter(|row| row.highlighted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionView {
    Idle,
    Processing,
    Succeeded {
        heading: &'static str,
        detail: ReceiptDetailView,
    },
    Failed(FailureReport),
}
