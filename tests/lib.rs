//! Shared fakes for the ftdsync behaviour tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io::{Cursor, Write};
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ftdsync_core::config::{DEFAULT_ARCHIVE_MARKER, DEFAULT_CATALOG_URL};
use ftdsync_core::dates::format_yyyymmdd;
use ftdsync_core::{
    CanonicalSymbol, HttpClient, HttpError, HttpRequest, HttpResponse, MappingError, SymbolMapper,
    SyncConfig,
};
use time::{Date, Month};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CATALOG_URL: &str = DEFAULT_CATALOG_URL;
pub const ARCHIVE_MARKER: &str = DEFAULT_ARCHIVE_MARKER;
pub const REPORT_HEADER: &str = "SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY (FAILS)|DESCRIPTION|PRICE";

pub fn date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).expect("valid date")
}

/// Absolute archive URL for `cnsfails<token>.zip`.
pub fn archive_url(token: &str) -> String {
    format!("{ARCHIVE_MARKER}cnsfails{token}.zip")
}

/// Catalog page linking every archive URL.
pub fn catalog_page(urls: &[String]) -> String {
    let links: String = urls
        .iter()
        .map(|url| format!("    <li><a href=\"{url}\">{url}</a></li>\n"))
        .collect();
    format!("<html><body><ul>\n{links}</ul></body></html>")
}

/// Zip archive holding the given `(name, contents)` entries.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(contents.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Single-entry report archive: header line followed by `lines`.
pub fn report_archive(lines: &[&str]) -> Vec<u8> {
    let mut payload = String::from(REPORT_HEADER);
    for line in lines {
        payload.push('\n');
        payload.push_str(line);
    }
    payload.push('\n');
    zip_archive(&[("cnsfails.txt", payload.as_str())])
}

/// Config tuned for tests: fast throttle, no backoff sleeps.
pub fn test_config(destination: &Path) -> SyncConfig {
    SyncConfig {
        destination: destination.to_path_buf(),
        requests_per_second: 1_000,
        max_retries: 3,
        retry_step: Duration::ZERO,
        ..SyncConfig::default()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub at: Instant,
}

/// [`HttpClient`] answering from per-URL scripts.
///
/// Scripted outcomes are consumed in order and the last one repeats; an
/// unscripted URL answers 404.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    scripts: Mutex<HashMap<String, VecDeque<Result<HttpResponse, HttpError>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.push(url.into(), Ok(response));
        self
    }

    pub fn fail(self, url: impl Into<String>, error: HttpError) -> Self {
        self.push(url.into(), Err(error));
        self
    }

    fn push(&self, url: String, outcome: Result<HttpResponse, HttpError>) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(url)
            .or_default()
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url == url)
            .count()
    }

    fn next_outcome(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let mut scripts = self.scripts.lock().expect("scripts lock");
        match scripts.get_mut(url) {
            Some(script) if script.len() > 1 => script.pop_front().expect("non-empty script"),
            Some(script) => script
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new()))),
            None => Ok(HttpResponse::new(404, Vec::new())),
        }
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("requests lock")
                .push(RecordedRequest {
                    url: request.url.clone(),
                    headers: request.headers.clone().into_iter().collect(),
                    at: Instant::now(),
                });
            self.next_outcome(&request.url)
        })
    }
}

/// [`SymbolMapper`] with a fixed ticker → identifier table valid at every date.
#[derive(Debug, Clone)]
pub struct StaticMapper {
    identifiers: HashMap<String, String>,
    available: bool,
}

impl StaticMapper {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            identifiers: pairs
                .iter()
                .map(|(ticker, identifier)| ((*ticker).to_owned(), (*identifier).to_owned()))
                .collect(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            identifiers: HashMap::new(),
            available: false,
        }
    }
}

impl SymbolMapper for StaticMapper {
    fn is_available(&self) -> bool {
        self.available
    }

    fn resolve(&self, ticker: &str, as_of: Date) -> Result<CanonicalSymbol, MappingError> {
        self.identifiers
            .get(ticker)
            .map(|identifier| CanonicalSymbol::new(identifier.clone(), ticker))
            .ok_or_else(|| MappingError::UnknownTicker {
                ticker: ticker.to_owned(),
                as_of: format_yyyymmdd(as_of),
            })
    }
}

/// Non-empty lines of a file.
pub fn file_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read file")
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
