//! Ticker cleaning and defunct-suffix recovery.

use crate::error::TickerReject;

const DEFUNCT_MARKER: &str = "defunct";

/// Normalizes a raw report ticker into its canonical cleaned form.
pub fn normalize_ticker(raw: &str) -> Result<String, TickerReject> {
    let recovered = strip_defunct(raw)?;
    clean_ticker(recovered).ok_or_else(|| TickerReject::Empty {
        ticker: raw.to_owned(),
    })
}

/// Recovers the live prefix of tickers such as `ABC-defunct` or `ABC_DEFUNCT_2019`.
///
/// A marker at position zero leaves nothing to recover and is rejected, as is a
/// marker with no `-`/`_` delimiter to truncate at.
pub fn strip_defunct(raw: &str) -> Result<&str, TickerReject> {
    let Some(position) = raw.to_ascii_lowercase().find(DEFUNCT_MARKER) else {
        return Ok(raw);
    };

    let unrecoverable = || TickerReject::UnrecoverableDefunct {
        ticker: raw.to_owned(),
    };
    if position == 0 {
        return Err(unrecoverable());
    }

    let delimiter = raw.find(['-', '_']).ok_or_else(unrecoverable)?;
    Ok(raw[..delimiter].trim())
}

/// Keeps ASCII alphanumerics (uppercased), maps `. / - _` to `.`, drops the rest
/// and trims separators from both ends.
pub fn clean_ticker(ticker: &str) -> Option<String> {
    let mapped: String = ticker
        .trim()
        .chars()
        .filter_map(|ch| match ch {
            ch if ch.is_ascii_alphanumeric() => Some(ch.to_ascii_uppercase()),
            '.' | '/' | '-' | '_' => Some('.'),
            _ => None,
        })
        .collect();

    let cleaned = mapped.trim_matches('.');
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}
