use crate::error::DirectoryError;
use crate::schema::Schema;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Directory layout and schemas, loaded from TOML.
///
/// Every key is optional; a schema table, when given, must be complete.
///
/// ```toml
/// data_dir = "JSON"
///
/// [client_service]
/// name = "client_service"
/// target_sheets = ["Клиентские службы", "КС"]
/// required_column = "Unnamed: 6"
/// phone_columns = ["Unnamed: 1"]
/// section_field = "отдел"
/// sections = { mode = "running_label", column = "Unnamed: 0", marker = "Клиентская служба" }
/// columns = [
///     { label = "Unnamed: 0", field = "кспд" },
///     { label = "Unnamed: 1", field = "город" },
/// ]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where snapshots are persisted
    pub data_dir: PathBuf,
    pub staff: Schema,
    pub client_service: Schema,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("JSON"),
            staff: Schema::staff(),
            client_service: Schema::client_service(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, DirectoryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DirectoryError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|error: toml::de::Error| DirectoryError::Config {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        log::debug!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }
}
