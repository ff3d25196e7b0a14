//! Incremental flat-file stores.
//!
//! ```text
//! <root>/<issuer>.csv             per-issuer history, sorted by publication date
//! <root>/universe/<YYYYMMDD>.csv  per-publication snapshot, sorted by identifier
//! <root>/tmp/                     scratch files, renamed over their destination
//! ```

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use time::Date;
use tracing::{debug, error};

use crate::dates::{format_yyyymmdd, parse_yyyymmdd};
use crate::registry::PendingLines;

const EXTENSION: &str = "csv";

/// Which store a file belongs to; decides its sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Issuer,
    Universe,
}

impl StoreKind {
    /// Issuer rows sort by their leading publication date, unparsable dates first;
    /// universe rows sort by their leading identifier.
    fn sort(self, lines: &mut [String]) {
        match self {
            Self::Issuer => lines.sort_by_key(|line| {
                parse_yyyymmdd(leading_field(line)).unwrap_or(Date::MIN)
            }),
            Self::Universe => lines.sort_by(|left, right| leading_field(left).cmp(leading_field(right))),
        }
    }
}

fn leading_field(line: &str) -> &str {
    line.split(',').next().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Lines appended to an existing file without read-back.
    Appended,
    /// Existing and new lines merged, deduplicated, sorted and atomically replaced.
    Merged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub mode: WriteMode,
    /// Rows appended, or total rows of the merged file.
    pub rows: usize,
}

/// Result of flushing the pending-line registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub issuers_written: usize,
    pub failures: Vec<(String, String)>,
}

/// Owner of the per-issuer and per-date universe files.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    root: PathBuf,
    universe_dir: PathBuf,
    tmp_dir: PathBuf,
    skip_processed: bool,
}

impl FlatFileStore {
    /// Opens (creating if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, skip_processed: bool) -> io::Result<Self> {
        let root = root.into();
        let store = Self {
            universe_dir: root.join("universe"),
            tmp_dir: root.join("tmp"),
            root,
            skip_processed,
        };
        fs::create_dir_all(&store.root)?;
        fs::create_dir_all(&store.universe_dir)?;
        fs::create_dir_all(&store.tmp_dir)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn issuer_path(&self, issuer: &str) -> PathBuf {
        self.root
            .join(format!("{}.{EXTENSION}", issuer.to_ascii_lowercase()))
    }

    pub fn universe_path(&self, publication_date: Date) -> PathBuf {
        self.universe_dir
            .join(format!("{}.{EXTENSION}", format_yyyymmdd(publication_date)))
    }

    /// A universe file marks its distribution as processed.
    pub fn has_universe(&self, publication_date: Date) -> bool {
        self.universe_path(publication_date).is_file()
    }

    pub fn write_universe(&self, publication_date: Date, lines: &[String]) -> io::Result<WriteOutcome> {
        let path = self.universe_path(publication_date);
        merge_into(&path, &self.tmp_dir, StoreKind::Universe, lines)
    }

    /// Appends when skipping processed distributions and the file exists,
    /// otherwise merges.
    pub fn write_issuer(&self, issuer: &str, lines: &[String]) -> io::Result<WriteOutcome> {
        let path = self.issuer_path(issuer);
        if self.skip_processed && path.is_file() {
            append_to(&path, StoreKind::Issuer, lines)
        } else {
            merge_into(&path, &self.tmp_dir, StoreKind::Issuer, lines)
        }
    }

    /// Writes every staged issuer exactly once and leaves the registry empty.
    pub fn flush(&self, pending: &PendingLines) -> FlushReport {
        let mut report = FlushReport::default();
        for (issuer, lines) in pending.drain() {
            match self.write_issuer(&issuer, &lines) {
                Ok(outcome) => {
                    debug!(issuer, rows = outcome.rows, mode = ?outcome.mode, "issuer flushed");
                    report.issuers_written += 1;
                }
                Err(err) => {
                    error!(issuer, error = %err, "issuer flush failed");
                    report.failures.push((issuer, err.to_string()));
                }
            }
        }
        report
    }
}

fn unique_lines<'a>(lines: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    lines
        .into_iter()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Full merge: existing ∪ new, exact-duplicate suppression, sort, atomic replace.
fn merge_into(path: &Path, tmp_dir: &Path, kind: StoreKind, lines: &[String]) -> io::Result<WriteOutcome> {
    let mut merged = unique_lines(lines);
    if merged.is_empty() {
        return Ok(WriteOutcome {
            mode: WriteMode::Merged,
            rows: 0,
        });
    }

    match File::open(path) {
        Ok(file) => {
            for line in BufReader::new(file).lines() {
                let line = line?;
                let line = line.trim_end_matches('\r');
                if !line.is_empty() {
                    merged.insert(line.to_owned());
                }
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let mut ordered: Vec<String> = merged.into_iter().collect();
    kind.sort(&mut ordered);

    let scratch = NamedTempFile::new_in(tmp_dir)?;
    {
        let mut writer = BufWriter::new(scratch.as_file());
        for line in &ordered {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    scratch.as_file().sync_all()?;
    scratch.persist(path).map_err(|err| err.error)?;

    Ok(WriteOutcome {
        mode: WriteMode::Merged,
        rows: ordered.len(),
    })
}

/// Append fast path; the batch itself is deduplicated and sorted.
fn append_to(path: &Path, kind: StoreKind, lines: &[String]) -> io::Result<WriteOutcome> {
    let mut batch: Vec<String> = unique_lines(lines).into_iter().collect();
    kind.sort(&mut batch);
    if batch.is_empty() {
        return Ok(WriteOutcome {
            mode: WriteMode::Appended,
            rows: 0,
        });
    }

    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    let needs_newline = file.metadata()?.len() > 0 && !ends_with_newline(&mut file)?;

    let mut writer = BufWriter::new(&file);
    if needs_newline {
        writer.write_all(b"\n")?;
    }
    for line in &batch {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(WriteOutcome {
        mode: WriteMode::Appended,
        rows: batch.len(),
    })
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
