//! Archive processing: one downloaded distribution in, staged issuer lines and a
//! universe snapshot out.

use std::io::{Cursor, Read};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use zip::ZipArchive;

use crate::domain::{DistributionDescriptor, IssuerRow, UniverseRow};
use crate::error::SyncError;
use crate::mapping::SymbolMapper;
use crate::parser::parse_line;
use crate::registry::PendingLines;
use crate::store::FlatFileStore;
use crate::ticker::normalize_ticker;

/// Counters for one processed archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Payload lines after the header.
    pub lines_read: usize,
    /// Records staged for their issuer and written to the universe file.
    pub kept: usize,
    /// Lines rejected by the parser or ticker cleaning.
    pub skipped: usize,
    /// Records whose ticker had no identifier at its settlement date.
    pub unmapped: usize,
}

impl ArchiveSummary {
    pub fn processed(&self) -> bool {
        self.kept > 0
    }
}

/// Turns archive bytes into pending issuer lines and a universe file.
#[derive(Clone)]
pub struct ArchiveProcessor {
    mapper: Arc<dyn SymbolMapper>,
    store: FlatFileStore,
    pending: Arc<PendingLines>,
}

impl ArchiveProcessor {
    pub fn new(mapper: Arc<dyn SymbolMapper>, store: FlatFileStore, pending: Arc<PendingLines>) -> Self {
        Self {
            mapper,
            store,
            pending,
        }
    }

    /// Processes one archive.
    ///
    /// Rejected lines and unresolvable tickers only bump counters. The universe
    /// file is written before anything is staged, so a failed universe write
    /// leaves the distribution unprocessed for the next run.
    pub fn process(
        &self,
        distribution: &DistributionDescriptor,
        bytes: &[u8],
    ) -> Result<ArchiveSummary, SyncError> {
        let payload = read_single_entry(distribution, bytes)?;
        let mut summary = ArchiveSummary::default();
        let mut issuer_lines = Vec::new();
        let mut universe_lines = Vec::new();

        for line in payload.lines().skip(1) {
            summary.lines_read += 1;

            let Ok(record) = parse_line(line) else {
                summary.skipped += 1;
                continue;
            };
            let ticker = match normalize_ticker(&record.ticker) {
                Ok(ticker) => ticker,
                Err(reject) => {
                    debug!(reason = %reject, "ticker rejected");
                    summary.skipped += 1;
                    continue;
                }
            };
            let symbol = match self.mapper.resolve(&ticker, record.settlement_date) {
                Ok(symbol) => symbol,
                Err(error) => {
                    debug!(error = %error, "ticker unmapped");
                    summary.unmapped += 1;
                    continue;
                }
            };

            issuer_lines.push((
                symbol.identifier.clone(),
                IssuerRow {
                    publication_date: distribution.publication_date,
                    record: &record,
                }
                .to_line(),
            ));
            universe_lines.push(
                UniverseRow {
                    symbol: &symbol,
                    record: &record,
                }
                .to_line(),
            );
        }

        if !universe_lines.is_empty() {
            self.store
                .write_universe(distribution.publication_date, &universe_lines)?;
        }

        summary.kept = issuer_lines.len();
        for (issuer, line) in issuer_lines {
            self.pending.push(&issuer, line);
        }

        Ok(summary)
    }
}

/// Decodes the archive's only file entry as text, dropping bytes that are not UTF-8.
fn read_single_entry(distribution: &DistributionDescriptor, bytes: &[u8]) -> Result<String, SyncError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut files = Vec::new();
    for index in 0..archive.len() {
        if archive.by_index(index)?.is_file() {
            files.push(index);
        }
    }
    let [index] = files.as_slice() else {
        return Err(SyncError::ArchivePayloadMissing {
            title: distribution.title.clone(),
            entries: files.len(),
        });
    };

    let mut raw = Vec::new();
    archive.by_index(*index)?.read_to_end(&mut raw)?;

    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    use time::Month;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use crate::domain::Half;
    use crate::mapping::MapFileMapper;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let entries: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(name, contents)| (*name, contents.as_bytes()))
            .collect();
        archive_bytes(&entries)
    }

    fn archive_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(contents).expect("write entry");
        }
        writer.finish().expect("finish archive").into_inner()
    }

    fn distribution() -> DistributionDescriptor {
        DistributionDescriptor::new(
            "https://www.sec.gov/files/data/fails-deliver-data/cnsfails202401a.zip",
            2024,
            Month::January,
            Half::First,
        )
        .expect("valid descriptor")
    }

    fn processor(root: &std::path::Path) -> (ArchiveProcessor, FlatFileStore, Arc<PendingLines>) {
        let mapper = MapFileMapper::from_map_files([
            ("gme", "20020213,GME\n20991231,GME\n"),
            ("meta", "20120518,FB\n20220608,FB\n20991231,META\n"),
        ]);
        let store = FlatFileStore::open(root, true).expect("open store");
        let pending = Arc::new(PendingLines::new());
        (
            ArchiveProcessor::new(Arc::new(mapper), store.clone(), Arc::clone(&pending)),
            store,
            pending,
        )
    }

    const PAYLOAD: &str = "SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY (FAILS)|DESCRIPTION|PRICE\n\
        20240103|36467W109|GME|1,200|GAMESTOP CORP|17.25\n\
        20240104|30303M102|META|500|META PLATFORMS|350.10\n\
        20240105|000000000|ZZZZ|10|UNKNOWN|1.00\n\
        Trailer record count 3\n";

    #[test]
    fn stages_issuer_lines_and_writes_universe() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, store, pending) = processor(temp.path());

        let summary = processor
            .process(&distribution(), &archive(&[("cnsfails202401a.txt", PAYLOAD)]))
            .expect("process");

        assert_eq!(
            summary,
            ArchiveSummary {
                lines_read: 4,
                kept: 2,
                skipped: 1,
                unmapped: 1,
            }
        );
        assert!(summary.processed());

        let staged = pending.drain();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0].0, "GME");
        assert_eq!(
            staged[0].1,
            vec![String::from("20240131,20240103,36467W109,1200,17.250000")]
        );

        let universe = fs::read_to_string(store.universe_path(distribution().publication_date))
            .expect("universe file");
        assert_eq!(
            universe,
            "GME,GME,36467W109,1200,20240103,17.250000\n\
             META,META,30303M102,500,20240104,350.100000\n"
        );
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped_from_the_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, store, pending) = processor(temp.path());
        let payload: &[u8] = b"SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY (FAILS)|DESCRIPTION|PRICE\n\
            20240103|3646\xff7W109|GME|1,200|GAMESTOP \xc3CORP|17.25\n";

        let summary = processor
            .process(&distribution(), &archive_bytes(&[("cnsfails202401a.txt", payload)]))
            .expect("process");

        assert_eq!(summary.kept, 1);
        let staged = pending.drain();
        assert_eq!(
            staged[0].1,
            vec![String::from("20240131,20240103,36467W109,1200,17.250000")]
        );
        let universe = fs::read_to_string(store.universe_path(distribution().publication_date))
            .expect("universe file");
        assert!(!universe.contains('\u{fffd}'));
        assert_eq!(universe, "GME,GME,36467W109,1200,20240103,17.250000\n");
    }

    #[test]
    fn archive_without_payload_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, store, pending) = processor(temp.path());

        let error = processor
            .process(&distribution(), &archive(&[]))
            .expect_err("empty archive");

        assert!(matches!(
            error,
            SyncError::ArchivePayloadMissing { entries: 0, .. }
        ));
        assert!(pending.is_empty());
        assert!(!store.has_universe(distribution().publication_date));
    }

    #[test]
    fn archive_with_two_payloads_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, _, _) = processor(temp.path());

        let error = processor
            .process(
                &distribution(),
                &archive(&[("a.txt", PAYLOAD), ("b.txt", PAYLOAD)]),
            )
            .expect_err("ambiguous archive");

        assert!(matches!(
            error,
            SyncError::ArchivePayloadMissing { entries: 2, .. }
        ));
    }

    #[test]
    fn corrupt_bytes_are_an_archive_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, _, _) = processor(temp.path());

        let error = processor
            .process(&distribution(), b"not a zip")
            .expect_err("corrupt archive");

        assert!(matches!(error, SyncError::Archive(_)));
    }

    #[test]
    fn header_only_archive_keeps_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (processor, store, _) = processor(temp.path());

        let summary = processor
            .process(
                &distribution(),
                &archive(&[("x.txt", "SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY|DESCRIPTION|PRICE\n")]),
            )
            .expect("process");

        assert!(!summary.processed());
        assert!(!store.has_universe(distribution().publication_date));
    }
}
