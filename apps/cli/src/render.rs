//! Plain-text rendering of the client view models.

use std::fmt::Write;

use client_core::{
    view::{ListingView, ReceiptDetailView, SubmissionView, NO_ITEMS_FOUND},
    FailureReport,
};

pub fn failure(report: &FailureReport) -> String {
    let mut out = format!("error: {}", report.message);
    for detail in &report.errors {
        let _ = write!(out, "\n  - {detail}");
    }
    out
}

pub fn listing(view: &ListingView) -> String {
    match view {
        ListingView::Loading => "loading...".to_string(),
        ListingView::NoItemsFound => NO_ITEMS_FOUND.to_string(),
        ListingView::Error(report) => failure(report),
        ListingView::Rows(rows) => {
            let mut out = format!("{:>6}  {:<10}  {:<24}  {:>10}", "ID", "DATE", "SUPERMARKET", "TOTAL");
            for row in rows {
                let _ = write!(
                    out,
                    "\n{:>6}  {:<10}  {:<24}  {:>10.2}",
                    row.id.0, row.date, row.supermarket, row.total
                );
            }
            out
        }
    }
}

/// Highlighted item rows are prefixed with `*`.
pub fn detail(view: &ReceiptDetailView) -> String {
    let mut out = format!(
        "Receipt #{} - {} ({})\nTotal: {:.2} {}",
        view.id.0, view.supermarket, view.date, view.total, view.currency
    );
    if view.rows.is_empty() {
        out.push_str("\n  (no items)");
    }
    for row in &view.rows {
        let marker = if row.highlighted { '*' } else { ' ' };
        let _ = write!(
            out,
            "\n{marker} {:<28} {:>6} x {:>8.2} = {:>8.2}",
            row.item.name, row.item.quantity, row.item.unit_price, row.item.price
        );
    }
    out
}

pub fn submission(view: &SubmissionView) -> String {
    match view {
        SubmissionView::Idle => String::new(),
        SubmissionView::Processing => "processing receipt...".to_string(),
        SubmissionView::Succeeded { heading, detail: receipt } => {
            format!("{heading}\n{}", detail(receipt))
        }
        SubmissionView::Failed(report) => failure(report),
    }
}
