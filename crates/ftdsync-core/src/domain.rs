//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Half`] | Which half of the month a report covers |
//! | [`DistributionDescriptor`] | One published archive and its derived publication date |
//! | [`RawRecord`] | One accepted report line |
//! | [`CanonicalSymbol`] | Identifier resolved for a ticker at a settlement date |
//! | [`IssuerRow`] | Row of a per-issuer history file |
//! | [`UniverseRow`] | Row of a per-publication-date universe file |

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use time::{Date, Month};

use crate::dates::{format_yyyymmdd, last_day_of_month};

/// Half-month covered by a twice-monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    First,
    Second,
}

impl Half {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'a' => Some(Self::First),
            'b' => Some(Self::Second),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
        }
    }

    /// Date the report for `(year, month, half)` becomes public.
    ///
    /// First-half reports are released on the last day of the covered month,
    /// second-half reports on the 15th of the following month.
    pub fn publication_date(self, year: i32, month: Month) -> Option<Date> {
        match self {
            Self::First => last_day_of_month(year, month),
            Self::Second => {
                let next_year = if month == Month::December {
                    year.checked_add(1)?
                } else {
                    year
                };
                Date::from_calendar_date(next_year, month.next(), 15).ok()
            }
        }
    }

    /// Settlement dates covered by the report: 1st–15th or 16th–last day.
    pub fn coverage(self, year: i32, month: Month) -> Option<(Date, Date)> {
        match self {
            Self::First => Some((
                Date::from_calendar_date(year, month, 1).ok()?,
                Date::from_calendar_date(year, month, 15).ok()?,
            )),
            Self::Second => Some((
                Date::from_calendar_date(year, month, 16).ok()?,
                last_day_of_month(year, month)?,
            )),
        }
    }
}

impl Display for Half {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archive listed in the regulator's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionDescriptor {
    pub title: String,
    pub archive_url: String,
    pub publication_date: Date,
    pub coverage_start: Date,
    pub coverage_end: Date,
}

impl DistributionDescriptor {
    /// Builds the descriptor for an archive encoding `(year, month, half)`.
    pub fn new(archive_url: impl Into<String>, year: i32, month: Month, half: Half) -> Option<Self> {
        let publication_date = half.publication_date(year, month)?;
        let (coverage_start, coverage_end) = half.coverage(year, month)?;
        Some(Self {
            title: format!("{month} {year}, {half} half"),
            archive_url: archive_url.into(),
            publication_date,
            coverage_start,
            coverage_end,
        })
    }

    pub fn publication_key(&self) -> String {
        format_yyyymmdd(self.publication_date)
    }
}

/// One accepted line of a report payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub settlement_date: Date,
    pub cusip: String,
    pub ticker: String,
    pub quantity: u64,
    pub reference_price: f64,
}

/// Identifier resolved for a ticker as of a settlement date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalSymbol {
    pub identifier: String,
    pub ticker: String,
}

impl CanonicalSymbol {
    pub fn new(identifier: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ticker: ticker.into(),
        }
    }
}

fn format_price(price: f64) -> String {
    format!("{price:.6}")
}

/// Quotes a text column when it would otherwise split the row.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `publicationDate,settlementDate,cusip,quantity,referencePrice`
#[derive(Debug, Clone, PartialEq)]
pub struct IssuerRow<'a> {
    pub publication_date: Date,
    pub record: &'a RawRecord,
}

impl IssuerRow<'_> {
    pub fn to_line(&self) -> String {
        [
            format_yyyymmdd(self.publication_date),
            format_yyyymmdd(self.record.settlement_date),
            csv_field(&self.record.cusip).into_owned(),
            self.record.quantity.to_string(),
            format_price(self.record.reference_price),
        ]
        .join(",")
    }
}

/// `identifier,ticker,cusip,quantity,settlementDate,referencePrice`
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseRow<'a> {
    pub symbol: &'a CanonicalSymbol,
    pub record: &'a RawRecord,
}

impl UniverseRow<'_> {
    pub fn to_line(&self) -> String {
        [
            csv_field(&self.symbol.identifier).into_owned(),
            csv_field(&self.symbol.ticker).into_owned(),
            csv_field(&self.record.cusip).into_owned(),
            self.record.quantity.to_string(),
            format_yyyymmdd(self.record.settlement_date),
            format_price(self.record.reference_price),
        ]
        .join(",")
    }
}
