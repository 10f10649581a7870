use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::GuidelineRecord;

/// Append-only output: one JSON record per line plus a ledger of saved names.
pub struct JsonlSink {
    records_path: PathBuf,
    ledger_path: PathBuf,
}

impl JsonlSink {
    /// Create parent directories; files are created on first append.
    pub fn open(records_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Result<Self> {
        let sink = Self {
            records_path: records_path.into(),
            ledger_path: ledger_path.into(),
        };
        for path in [&sink.records_path, &sink.ledger_path] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(sink)
    }

    /// Record and ledger entry, in that order. Both files are opened and the
    /// record serialized before either line is written.
    pub fn save(&self, record: &GuidelineRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut records = open_append(&self.records_path)?;
        let mut ledger = open_append(&self.ledger_path)?;
        writeln!(records, "{}", line)?;
        writeln!(ledger, "{}", record.name)?;
        Ok(())
    }

    #[cfg(test)]
    fn records_path(&self) -> &Path {
        &self.records_path
    }

    #[cfg(test)]
    fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Read every record back; a missing file reads as empty.
#[cfg(test)]
pub fn read_records(path: &Path) -> Result<Vec<GuidelineRecord>> {
    let Some(file) = open_if_exists(path)? else {
        return Ok(Vec::new());
    };
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

// ── Stats ──
//
// A write error between the record and ledger lines can still leave them one
// apart; `get_stats` reports that mismatch.

pub struct Stats {
    pub records: usize,
    pub malformed: usize,
    pub sections: usize,
    pub subsections: usize,
    pub ledger: usize,
}

pub fn get_stats(records_path: &Path, ledger_path: &Path) -> Result<Stats> {
    let mut stats = Stats {
        records: 0,
        malformed: 0,
        sections: 0,
        subsections: 0,
        ledger: 0,
    };

    if let Some(file) = open_if_exists(records_path)? {
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GuidelineRecord>(&line) {
                Ok(record) => {
                    stats.records += 1;
                    stats.sections += record.content.len();
                    stats.subsections += record.content.values().map(|s| s.len()).sum::<usize>();
                }
                Err(_) => stats.malformed += 1,
            }
        }
    }

    if let Some(file) = open_if_exists(ledger_path)? {
        stats.ledger = BufReader::new(file)
            .lines()
            .filter(|l| l.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .count();
    }

    Ok(stats)
}

fn open_if_exists(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
