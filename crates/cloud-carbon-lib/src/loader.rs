use crate::data_structures::UsageEntry;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Reads and appends the JSON-lines usage ledger.
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<UsageEntry>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            match self.parse_line(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    debug!(line = line_num + 1, error = %e, "skipping ledger line");
                }
            }
        }

        Ok(entries)
    }

    pub fn load_from_directory<P: AsRef<Path>>(&self, dir_path: P) -> Result<Vec<UsageEntry>> {
        let mut all_entries = Vec::new();
        self.load_from_directory_recursive(dir_path.as_ref(), &mut all_entries)?;
        all_entries.sort_by(|a, b| a.timestamp().cmp(&b.timestamp()));
        Ok(all_entries)
    }

    fn load_from_directory_recursive(
        &self,
        dir_path: &Path,
        entries: &mut Vec<UsageEntry>,
    ) -> Result<()> {
        let dir = fs::read_dir(dir_path)
            .with_context(|| format!("Failed to read directory: {}", dir_path.display()))?;

        for entry in dir {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if path.extension().is_some_and(|extension| extension == "jsonl") {
                    match self.load_from_file(&path) {
                        Ok(mut file_entries) => entries.append(&mut file_entries),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to load ledger file");
                        }
                    }
                }
            } else if path.is_dir() {
                if let Err(e) = self.load_from_directory_recursive(&path, entries) {
                    warn!(path = %path.display(), error = %e, "failed to load ledger directory");
                }
            }
        }

        Ok(())
    }

    pub fn append_entry<P: AsRef<Path>>(&self, path: P, entry: &UsageEntry) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open ledger: {}", path.display()))?;

        let line = serde_json::to_string(entry).context("Failed to serialize usage entry")?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to ledger: {}", path.display()))?;

        Ok(())
    }

    fn parse_line(&self, line: &str) -> Result<UsageEntry> {
        serde_json::from_str(line).context("Failed to parse usage entry")
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{CloudProvider, ServiceCategory};
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_valid_line() {
        let loader = DataLoader::new();
        let line = r#"{"timestamp": "2024-01-15T12:00:00Z", "organization": "Acme", "provider": "aws", "service_category": "compute", "monthly_spend": 5000.0, "region": "us-west-2"}"#;

        let entry = loader.parse_line(line).unwrap();
        assert_eq!(entry.organization(), "Acme");
        assert_eq!(entry.provider(), CloudProvider::Aws);
        assert_eq!(entry.service_category(), &ServiceCategory::Compute);
        assert_eq!(entry.monthly_spend(), 5000.0);
        assert_eq!(entry.region(), "us-west-2");
    }

    #[test]
    fn test_parse_line_defaults_region_and_keeps_unknown_category() {
        let loader = DataLoader::new();
        let line = r#"{"timestamp": "2024-01-15T12:00:00Z", "organization": "Acme", "provider": "gcp", "service_category": "quantum", "monthly_spend": 10}"#;

        let entry = loader.parse_line(line).unwrap();
        assert_eq!(entry.region(), "us-east-1");
        assert_eq!(entry.service_category(), &ServiceCategory::parse("quantum"));
    }

    #[test]
    fn test_load_from_file_skips_bad_lines() {
        let loader = DataLoader::new();
        let mut temp_file = NamedTempFile::new().unwrap();

        let content = r#"{"timestamp": "2024-01-15T12:00:00Z", "organization": "Acme", "provider": "aws", "service_category": "compute", "monthly_spend": 100.0, "region": "us-east-1"}

{"timestamp": "2024-01-16T12:00:00Z", "organization": "Acme", "provider": "oracle", "service_category": "compute", "monthly_spend": 100.0}
not json at all
{"timestamp": "2024-01-17T12:00:00Z", "organization": "Globex", "provider": "azure", "service_category": "storage", "monthly_spend": 250.0, "region": "eu-west-1"}"#;

        temp_file.write_all(content.as_bytes()).unwrap();

        let entries = loader.load_from_file(temp_file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].organization(), "Acme");
        assert_eq!(entries[1].organization(), "Globex");
    }

    #[test]
    fn test_append_then_load() {
        let loader = DataLoader::new();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger").join("entries.jsonl");
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();

        let first = UsageEntry::new(
            timestamp,
            "Acme",
            CloudProvider::Aws,
            ServiceCategory::Database,
            42.5,
            "eu-central-1",
        );
        let second = UsageEntry::new(
            timestamp,
            "Initech",
            CloudProvider::Gcp,
            ServiceCategory::Serverless,
            7.0,
            "us-east-1",
        );

        loader.append_entry(&path, &first).unwrap();
        loader.append_entry(&path, &second).unwrap();

        let entries = loader.load_from_file(&path).unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[test]
    fn test_load_from_directory_sorts_by_timestamp() {
        let loader = DataLoader::new();
        let dir = TempDir::new().unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let nested = dir.path().join("team-b");
        loader
            .append_entry(
                dir.path().join("a.jsonl"),
                &UsageEntry::new(
                    late,
                    "A",
                    CloudProvider::Aws,
                    ServiceCategory::Compute,
                    1.0,
                    "us-east-1",
                ),
            )
            .unwrap();
        loader
            .append_entry(
                nested.join("b.jsonl"),
                &UsageEntry::new(
                    early,
                    "B",
                    CloudProvider::Azure,
                    ServiceCategory::Storage,
                    2.0,
                    "us-east-1",
                ),
            )
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = loader.load_from_directory(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].organization(), "B");
        assert_eq!(entries[1].organization(), "A");
    }

    #[test]
    fn test_invalid_json_line() {
        let loader = DataLoader::new();
        assert!(loader.parse_line(r#"{"invalid": "json"#).is_err());
    }

    #[test]
    fn test_missing_required_fields() {
        let loader = DataLoader::new();
        assert!(loader.parse_line(r#"{"timestamp": "2024-01-01T12:00:00Z"}"#).is_err());
    }
}
