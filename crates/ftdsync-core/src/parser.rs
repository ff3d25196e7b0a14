//! Raw line parser for `|`-delimited report payloads.
//!
//! Field layout: `settlement date | cusip | ticker | quantity | description | price`.

use crate::dates::parse_yyyymmdd;
use crate::domain::RawRecord;
use crate::error::LineReject;

const MIN_FIELDS: usize = 6;

/// Parses one payload line into a [`RawRecord`].
///
/// The price column never rejects a line: blank or malformed prices default to zero.
pub fn parse_line(line: &str) -> Result<RawRecord, LineReject> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < MIN_FIELDS {
        return Err(LineReject::TooFewFields {
            found: fields.len(),
        });
    }

    let settlement_date =
        parse_yyyymmdd(fields[0].trim()).ok_or(LineReject::InvalidSettlementDate)?;

    let ticker = fields[2].trim();
    if ticker.is_empty() {
        return Err(LineReject::EmptyTicker);
    }

    let quantity = strip_thousands(fields[3])
        .parse::<i64>()
        .ok()
        .filter(|quantity| *quantity > 0)
        .and_then(|quantity| u64::try_from(quantity).ok())
        .ok_or(LineReject::InvalidQuantity)?;

    Ok(RawRecord {
        settlement_date,
        cusip: fields[1].trim().to_owned(),
        ticker: ticker.to_owned(),
        quantity,
        reference_price: parse_price(fields[5]),
    })
}

fn strip_thousands(value: &str) -> String {
    value.trim().replace(',', "")
}

fn parse_price(value: &str) -> f64 {
    strip_thousands(value)
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let record = parse_line("20240103|36467W109|GME|1,250|GAMESTOP CORP|17.50")
            .expect("line should parse");

        assert_eq!(record.cusip, "36467W109");
        assert_eq!(record.ticker, "GME");
        assert_eq!(record.quantity, 1_250);
        assert_eq!(record.reference_price, 17.5);
    }

    #[test]
    fn rejects_short_lines() {
        assert_eq!(
            parse_line("20240103|36467W109|GME|1250|GAMESTOP"),
            Err(LineReject::TooFewFields { found: 5 })
        );
        assert_eq!(
            parse_line("Trailer record count 2"),
            Err(LineReject::TooFewFields { found: 1 })
        );
    }

    #[test]
    fn rejects_bad_dates() {
        assert_eq!(
            parse_line("2024-01-03|36467W109|GME|1250|GAMESTOP|17.50"),
            Err(LineReject::InvalidSettlementDate)
        );
        assert_eq!(
            parse_line("20240132|36467W109|GME|1250|GAMESTOP|17.50"),
            Err(LineReject::InvalidSettlementDate)
        );
    }

    #[test]
    fn rejects_empty_ticker() {
        assert_eq!(
            parse_line("20240103|36467W109|   |1250|GAMESTOP|17.50"),
            Err(LineReject::EmptyTicker)
        );
    }

    #[test]
    fn rejects_non_positive_or_garbled_quantity() {
        for quantity in ["0", "-5", "12a", "", "1.5"] {
            let line = format!("20240103|36467W109|GME|{quantity}|GAMESTOP|17.50");
            assert_eq!(
                parse_line(&line),
                Err(LineReject::InvalidQuantity),
                "quantity '{quantity}' should be rejected"
            );
        }
    }

    #[test]
    fn malformed_price_defaults_to_zero() {
        for price in ["", ".", "n/a", "-3.0"] {
            let line = format!("20240103|36467W109|GME|1250|GAMESTOP|{price}");
            let record = parse_line(&line).expect("price never rejects");
            assert_eq!(record.reference_price, 0.0, "price '{price}'");
        }
    }

    #[test]
    fn price_accepts_thousands_separators() {
        let record = parse_line("20240103|02079K107|GOOG|10|ALPHABET|1,234.5")
            .expect("line should parse");
        assert_eq!(record.reference_price, 1234.5);
    }
}
