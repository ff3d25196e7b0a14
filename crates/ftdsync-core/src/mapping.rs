//! Ticker-to-identifier resolution.
//!
//! [`SymbolMapper`] is the seam to the mapping provider. [`MapFileMapper`] reads a
//! directory of map files, one per issuer, named `<identifier>.csv`. The first row
//! carries the listing date; every later row `YYYYMMDD,ticker[,exchange...]` states
//! the ticker in force after the previous row's date up to and including its own.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use time::Date;
use tracing::{debug, warn};

use crate::dates::{format_yyyymmdd, parse_yyyymmdd};
use crate::domain::CanonicalSymbol;
use crate::error::MappingError;

/// Time-aware ticker resolution provider.
pub trait SymbolMapper: Send + Sync {
    /// Whether the backing dataset is present locally.
    fn is_available(&self) -> bool;

    fn resolve(&self, ticker: &str, as_of: Date) -> Result<CanonicalSymbol, MappingError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TickerSpan {
    identifier: String,
    from: Date,
    through: Date,
}

impl TickerSpan {
    fn contains(&self, as_of: Date) -> bool {
        self.from <= as_of && as_of <= self.through
    }
}

/// Map-file backed [`SymbolMapper`].
#[derive(Debug, Clone)]
pub struct MapFileMapper {
    directory: PathBuf,
    spans: HashMap<String, Vec<TickerSpan>>,
    map_files: usize,
}

impl MapFileMapper {
    /// Loads every `*.csv` map file under `directory`.
    ///
    /// A missing directory yields an unavailable mapper rather than an error.
    pub fn load(directory: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let directory = directory.into();
        let mut mapper = Self {
            directory,
            spans: HashMap::new(),
            map_files: 0,
        };

        if !mapper.directory.is_dir() {
            warn!(path = %mapper.directory.display(), "map file directory not found");
            return Ok(mapper);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&mapper.directory)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(identifier) = identifier_for(&path) else {
                continue;
            };
            let contents = fs::read_to_string(&path)?;
            mapper.add_map_file(&identifier, &contents);
        }

        debug!(
            map_files = mapper.map_files,
            tickers = mapper.spans.len(),
            "loaded map files"
        );
        Ok(mapper)
    }

    /// Builds a mapper from in-memory map file contents keyed by identifier.
    pub fn from_map_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut mapper = Self {
            directory: PathBuf::new(),
            spans: HashMap::new(),
            map_files: 0,
        };
        for (identifier, contents) in files {
            mapper.add_map_file(&identifier.trim().to_ascii_uppercase(), contents);
        }
        mapper
    }

    pub fn map_file_count(&self) -> usize {
        self.map_files
    }

    fn add_map_file(&mut self, identifier: &str, contents: &str) {
        let mut rows: Vec<(Date, String)> = contents
            .lines()
            .filter_map(|line| {
                let mut fields = line.split(',');
                let date = parse_yyyymmdd(fields.next()?.trim())?;
                let ticker = fields.next()?.trim().to_ascii_uppercase();
                (!ticker.is_empty()).then_some((date, ticker))
            })
            .collect();
        if rows.is_empty() {
            return;
        }
        rows.sort_by_key(|(date, _)| *date);

        let mut from = rows[0].0;
        for (through, ticker) in rows {
            self.spans.entry(ticker).or_default().push(TickerSpan {
                identifier: identifier.to_owned(),
                from,
                through,
            });
            from = through.next_day().unwrap_or(through);
        }
        self.map_files += 1;
    }
}

impl SymbolMapper for MapFileMapper {
    fn is_available(&self) -> bool {
        self.map_files > 0
    }

    fn resolve(&self, ticker: &str, as_of: Date) -> Result<CanonicalSymbol, MappingError> {
        self.spans
            .get(ticker)
            .and_then(|spans| spans.iter().find(|span| span.contains(as_of)))
            .map(|span| CanonicalSymbol::new(span.identifier.clone(), ticker))
            .ok_or_else(|| MappingError::UnknownTicker {
                ticker: ticker.to_owned(),
                as_of: format_yyyymmdd(as_of),
            })
    }
}

fn identifier_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.trim();
    (!stem.is_empty()).then(|| stem.to_ascii_uppercase())
}
