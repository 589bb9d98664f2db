//! Snapshot persistence as one pretty-printed JSON array per record kind.
use crate::error::DirectoryError;
use crate::record::DirectorySnapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

pub const STAFF_FILE: &str = "osfr.json";
pub const CLIENT_SERVICE_FILE: &str = "ks.json";

/// Reads and writes snapshots in one data directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn staff_path(&self) -> PathBuf {
        self.dir.join(STAFF_FILE)
    }

    pub fn client_service_path(&self) -> PathBuf {
        self.dir.join(CLIENT_SERVICE_FILE)
    }

    /// Writes both lists. Each file is first written beside its destination
    /// and then renamed over it, so readers never see a partial file.
    ///
    /// Nothing is renamed until both lists are staged. When the second rename
    /// fails the previous staff list is put back and the error names the
    /// client service file. Staged files never outlive a failed save.
    pub fn save(&self, snapshot: &DirectorySnapshot) -> Result<(), DirectoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| storage_error(&self.dir, source))?;
        let staff = to_pretty_json(&snapshot.staff)?;
        let client_service = to_pretty_json(&snapshot.client_service)?;
        let staff_path = self.staff_path();
        let client_service_path = self.client_service_path();

        let staged_staff = stage(&staff_path, &staff)?;
        let staged_client_service = stage(&client_service_path, &client_service).map_err(|error| {
            discard(&[&staged_staff]);
            error
        })?;

        let backup = with_suffix(&staff_path, ".bak");
        let has_previous = match std::fs::copy(&staff_path, &backup) {
            Ok(_) => true,
            Err(error) if error.kind() == ErrorKind::NotFound => false,
            Err(source) => {
                discard(&[&staged_staff, &staged_client_service, &backup]);
                return Err(storage_error(&backup, source));
            }
        };
        if let Err(source) = std::fs::rename(&staged_staff, &staff_path) {
            discard(&[&staged_staff, &staged_client_service, &backup]);
            return Err(storage_error(&staff_path, source));
        }
        if let Err(source) = std::fs::rename(&staged_client_service, &client_service_path) {
            discard(&[&staged_client_service]);
            let restored = if has_previous {
                std::fs::rename(&backup, &staff_path)
            } else {
                std::fs::remove_file(&staff_path)
            };
            if let Err(error) = restored {
                log::error!(
                    "'{}' keeps the new staff list but '{}' was not replaced: {error}",
                    staff_path.display(),
                    client_service_path.display()
                );
            }
            discard(&[&backup]);
            return Err(storage_error(&client_service_path, source));
        }
        discard(&[&backup]);
        log::info!(
            "Saved {} staff and {} client service records to '{}'",
            snapshot.staff.len(),
            snapshot.client_service.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Reads both lists; a missing file reads as an empty list.
    pub fn load(&self) -> Result<DirectorySnapshot, DirectoryError> {
        Ok(DirectorySnapshot {
            staff: read_list(&self.staff_path())?,
            client_service: read_list(&self.client_service_path())?,
        })
    }
}

fn storage_error(path: &Path, source: std::io::Error) -> DirectoryError {
    DirectoryError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, DirectoryError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn stage(target: &Path, contents: &[u8]) -> Result<PathBuf, DirectoryError> {
    let staging = with_suffix(target, ".tmp");
    if let Err(source) = std::fs::write(&staging, contents) {
        discard(&[&staging]);
        return Err(storage_error(&staging, source));
    }
    Ok(staging)
}

/// Best-effort removal of leftover files.
fn discard<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path: &Path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => log::warn!("Cannot remove '{}': {error}", path.display()),
        }
    }
}

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DirectoryError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::debug!("'{}' does not exist, reading an empty list", path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(storage_error(path, source)),
    }
}
