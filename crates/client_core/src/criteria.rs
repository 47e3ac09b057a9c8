use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use shared::domain::parse_calendar_date;

use crate::error::FailureReport;

/// Server-side filter for the receipt listing. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub supermarket: Option<String>,
    pub item: Option<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl SearchCriteria {
    pub fn is_unconstrained(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters for `GET /receipts`, skipping every blank field.
    /// Dates go out as UTC-midnight ISO-8601 instants.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(supermarket) = non_blank(self.supermarket.as_deref()) {
            pairs.push(("supermarket", supermarket.to_string()));
        }
        if let Some(min_date) = self.min_date {
            pairs.push(("min_date", iso_instant(min_date)));
        }
        if let Some(max_date) = self.max_date {
            pairs.push(("max_date", iso_instant(max_date)));
        }
        if let Some(item) = self.item_term() {
            pairs.push(("item", item.to_string()));
        }
        pairs
    }

    /// The item filter as it is sent to the server, if any.
    pub fn item_term(&self) -> Option<&str> {
        non_blank(self.item.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn iso_instant(date: NaiveDate) -> String {
    date.and_time(NaiveTime::default())
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Raw text of the search form controls, converted into [`SearchCriteria`]
/// when the form is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub supermarket: String,
    pub item: String,
    pub min_date: String,
    pub max_date: String,
}

impl SearchForm {
    pub fn to_criteria(&self) -> Result<SearchCriteria, FailureReport> {
        let mut errors = Vec::new();
        let min_date = parse_optional_date(&self.min_date, &mut errors);
        let max_date = parse_optional_date(&self.max_date, &mut errors);

        if let (Some(min), Some(max)) = (min_date, max_date) {
            if min > max {
                errors.push(format!("min date {min} is after max date {max}"));
            }
        }

        if !errors.is_empty() {
            return Err(FailureReport::new(
                crate::error::VALIDATION_ERROR_MESSAGE,
                errors,
            ));
        }

        Ok(SearchCriteria {
            supermarket: non_blank(Some(self.supermarket.as_str())).map(str::to_string),
            item: non_blank(Some(self.item.as_str())).map(str::to_string),
            min_date,
            max_date,
        })
    }
}

fn parse_optional_date(raw: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    match parse_calendar_date(raw) {
        Ok(date) => Some(date),
        Err(err) => {
            errors.push(err.to_string());
            None
        }
    }
}
