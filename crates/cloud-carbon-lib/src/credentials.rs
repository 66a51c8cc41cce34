use crate::error::CredentialError;
use crate::regions::DEFAULT_REGION;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default = "default_region")]
    region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Both key fields must be non-blank. Their values are never inspected further.
    pub fn is_configured(&self) -> bool {
        !self.access_key_id.trim().is_empty() && !self.secret_access_key.trim().is_empty()
    }

    pub fn masked_access_key_id(&self) -> String {
        let visible: String = self.access_key_id.chars().take(4).collect();
        format!("{}****", visible)
    }
}

/// The part of the stored credentials the estimation engine is allowed to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    present: bool,
    region: Option<String>,
}

impl CredentialState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_credentials(credentials: Option<&AwsCredentials>) -> Self {
        match credentials {
            Some(credentials) if credentials.is_configured() => Self {
                present: true,
                region: Some(credentials.region().to_string()),
            },
            _ => Self::none(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn region_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.region.as_deref().unwrap_or(fallback)
    }
}

/// Storage for the single default credential record.
pub trait CredentialStore {
    fn load_default(&self) -> Result<Option<AwsCredentials>>;

    /// Replaces whatever record is currently the default.
    fn save_default(&mut self, credentials: &AwsCredentials) -> Result<()>;

    fn clear_default(&mut self) -> Result<()>;

    fn state(&self) -> Result<CredentialState> {
        Ok(CredentialState::from_credentials(self.load_default()?.as_ref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(flatten)]
    credentials: AwsCredentials,
    is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialRecords {
    #[serde(default)]
    records: Vec<StoredCredential>,
}

impl CredentialRecords {
    fn default_credentials(&self) -> Option<&AwsCredentials> {
        self.records
            .iter()
            .find(|record| record.is_default)
            .map(|record| &record.credentials)
    }

    fn set_default(&mut self, credentials: &AwsCredentials) -> Result<()> {
        if !credentials.is_configured() {
            return Err(CredentialError::MissingFields.into());
        }

        for record in &mut self.records {
            record.is_default = false;
        }

        match self
            .records
            .iter_mut()
            .find(|record| record.credentials.access_key_id == credentials.access_key_id)
        {
            Some(existing) => {
                existing.credentials = credentials.clone();
                existing.is_default = true;
            }
            None => self.records.push(StoredCredential {
                credentials: credentials.clone(),
                is_default: true,
            }),
        }

        Ok(())
    }

    fn clear_default(&mut self) -> bool {
        let before = self.records.len();
        self.records.retain(|record| !record.is_default);
        before != self.records.len()
    }
}

/// Keeps credential records in a JSON document on disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_records(&self) -> Result<CredentialRecords> {
        if !self.path.exists() {
            return Ok(CredentialRecords::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(CredentialRecords::default());
        }

        let records = serde_json::from_str(&content).map_err(|e| CredentialError::Malformed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(records)
    }

    fn write_records(&self, records: &CredentialRecords) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(records)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open credentials: {}", self.path.display()))?;

        // mode() only applies when the file is created
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!("Failed to restrict permissions: {}", self.path.display())
                })?;
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write credentials: {}", self.path.display()))?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_default(&self) -> Result<Option<AwsCredentials>> {
        let records = self.read_records()?;
        Ok(records.default_credentials().cloned())
    }

    fn save_default(&mut self, credentials: &AwsCredentials) -> Result<()> {
        let mut records = self.read_records()?;
        records.set_default(credentials)?;
        self.write_records(&records)?;
        info!(region = credentials.region(), "saved default credentials");
        Ok(())
    }

    fn clear_default(&mut self) -> Result<()> {
        let mut records = self.read_records()?;
        if records.clear_default() {
            self.write_records(&records)?;
            info!("cleared default credentials");
        } else {
            debug!("no default credentials to clear");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: CredentialRecords,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load_default(&self) -> Result<Option<AwsCredentials>> {
        Ok(self.records.default_credentials().cloned())
    }

    fn save_default(&mut self, credentials: &AwsCredentials) -> Result<()> {
        self.records.set_default(credentials)
    }

    fn clear_default(&mut self) -> Result<()> {
        self.records.clear_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> AwsCredentials {
        AwsCredentials::new("AKIAEXAMPLE", "secret", "eu-west-1")
    }

    #[test]
    fn test_state_requires_both_keys() {
        let partial = AwsCredentials::new("AKIAEXAMPLE", "  ", "eu-west-1");
        assert!(!CredentialState::from_credentials(Some(&partial)).is_present());
        assert!(!CredentialState::from_credentials(None).is_present());

        let state = CredentialState::from_credentials(Some(&sample()));
        assert!(state.is_present());
        assert_eq!(state.region(), Some("eu-west-1"));
        assert_eq!(state.region_or("us-east-1"), "eu-west-1");
        assert_eq!(CredentialState::none().region_or("us-east-1"), "us-east-1");
    }

    #[test]
    fn test_in_memory_round_trip() {
        let mut store = InMemoryCredentialStore::new();
        assert!(store.load_default().unwrap().is_none());

        store.save_default(&sample()).unwrap();
        assert_eq!(store.load_default().unwrap(), Some(sample()));
        assert!(store.state().unwrap().is_present());

        store.clear_default().unwrap();
        assert!(store.load_default().unwrap().is_none());
        assert!(!store.state().unwrap().is_present());
    }

    #[test]
    fn test_save_rejects_missing_fields() {
        let mut store = InMemoryCredentialStore::new();
        let err = store
            .save_default(&AwsCredentials::new("", "secret", "us-east-1"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CredentialError>(),
            Some(CredentialError::MissingFields)
        ));
    }

    #[test]
    fn test_saving_new_default_demotes_old_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let mut store = FileCredentialStore::new(&path);

        store.save_default(&sample()).unwrap();
        let replacement = AwsCredentials::new("AKIAOTHER", "other-secret", "ap-south-1");
        store.save_default(&replacement).unwrap();

        assert_eq!(store.load_default().unwrap(), Some(replacement));

        let records: CredentialRecords =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.records.len(), 2);
        assert_eq!(records.records.iter().filter(|r| r.is_default).count(), 1);
    }

    #[test]
    fn test_saving_same_key_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save_default(&sample()).unwrap();
        let moved = AwsCredentials::new("AKIAEXAMPLE", "secret", "ca-central-1");
        store.save_default(&moved).unwrap();

        let records = store.read_records().unwrap();
        assert_eq!(records.records.len(), 1);
        assert_eq!(store.load_default().unwrap().unwrap().region(), "ca-central-1");
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let mut store = FileCredentialStore::new(&path);

        assert!(store.load_default().unwrap().is_none());
        store.clear_default().unwrap();

        store.save_default(&sample()).unwrap();
        assert!(path.exists());
        store.clear_default().unwrap();
        assert!(store.load_default().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let mut store = FileCredentialStore::new(&path);

        store.save_default(&sample()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        store
            .save_default(&AwsCredentials::new("AKIAOTHER", "other-secret", "us-west-2"))
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load_default().unwrap().unwrap().access_key_id(), "AKIAOTHER");
    }

    #[test]
    fn test_file_store_malformed_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileCredentialStore::new(&path);
        let err = store.load_default().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CredentialError>(),
            Some(CredentialError::Malformed { .. })
        ));
    }

    #[test]
    fn test_masked_access_key() {
        assert_eq!(sample().masked_access_key_id(), "AKIA****");
    }
}
