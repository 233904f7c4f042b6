mod error;

pub use error::Error;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const FORECAST_ID_MAX_LEN: usize = 8;
pub const OBSERVATION_ID_MAX_LEN: usize = 16;
pub const API_KEY_MAX_LEN: usize = 40;

const CONFIG_FILE_NAME: &str = "config.json";

/// The three persisted settings: Met Office forecast site, observation site,
/// and Datapoint API key. Oversized values are truncated on the way in so the
/// stored form always fits the declared bounds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    forecast_id: String,
    observation_id: String,
    api_key: String,
}

impl Config {
    pub fn forecast_id(&self) -> &str {
        &self.forecast_id
    }

    pub fn observation_id(&self) -> &str {
        &self.observation_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn set_forecast_id(&mut self, value: &str) {
        self.forecast_id = truncate_chars(value, FORECAST_ID_MAX_LEN);
    }

    pub fn set_observation_id(&mut self, value: &str) {
        self.observation_id = truncate_chars(value, OBSERVATION_ID_MAX_LEN);
    }

    pub fn set_api_key(&mut self, value: &str) {
        self.api_key = truncate_chars(value, API_KEY_MAX_LEN);
    }

    fn clamp_fields(&mut self) {
        self.forecast_id = truncate_chars(&self.forecast_id, FORECAST_ID_MAX_LEN);
        self.observation_id = truncate_chars(&self.observation_id, OBSERVATION_ID_MAX_LEN);
        self.api_key = truncate_chars(&self.api_key, API_KEY_MAX_LEN);
    }
}

/// File-backed store for the [`Config`], one flat JSON object per device.
#[derive(Debug)]
pub struct Store {
    config_path: PathBuf,
}

impl Store {
    /// Opens the store rooted at `dir`. The directory is the flash-backed
    /// mount point and must already exist.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Store, Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::mount(dir.to_path_buf()));
        }

        Ok(Store {
            config_path: dir.join(CONFIG_FILE_NAME),
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the persisted config. A missing file is `Ok(None)`; a file that
    /// exists but does not parse is an error.
    pub fn load(&self) -> Result<Option<Config>, Error> {
        let raw = match fs::read_to_string(&self.config_path) {
            Ok(raw) => raw,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::read(e)),
        };

        let mut config: Config = serde_json::from_str(&raw)?;
        config.clamp_fields();

        Ok(Some(config))
    }

    /// Serializes `config` over the previous file contents, if any.
    pub fn save(&self, config: &Config) -> Result<(), Error> {
        let raw = serde_json::to_string(config)?;

        fs::write(&self.config_path, raw).map_err(Error::write)
    }
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_owned(),
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::error::ErrorKind;
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("", 8), "");
        assert_eq!(truncate_chars("abc", 8), "abc");
        assert_eq!(truncate_chars("abcdefgh", 8), "abcdefgh");
        assert_eq!(truncate_chars("abcdefghi", 8), "abcdefgh");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_open_missing_dir_is_mount_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-there");

        let err = Store::open(&missing).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Mount(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"forecast_id":"310069","observation_id":"3772","api_key":"01234567-89ab-cdef-0123-456789abcdef"}"#,
        )
        .unwrap();

        let store = Store::open(dir.path()).unwrap();
        let config = store.load().unwrap().unwrap();

        assert_eq!(config.forecast_id(), "310069");
        assert_eq!(config.observation_id(), "3772");
        assert_eq!(config.api_key(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn test_load_truncates_oversized_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"forecast_id":"123456789","observation_id":"x","api_key":"y"}"#,
        )
        .unwrap();

        let store = Store::open(dir.path()).unwrap();
        let config = store.load().unwrap().unwrap();

        assert_eq!(config.forecast_id(), "12345678");
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{not json").unwrap();

        let store = Store::open(dir.path()).unwrap();
        let err = store.load().unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Parse(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut config = Config::default();
        config.set_forecast_id("353773");
        config.set_api_key("secret-key");
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), config);
    }

    #[test]
    fn test_setters_truncate() {
        let mut config = Config::default();
        config.set_observation_id("0123456789abcdef-overflow");

        assert_eq!(config.observation_id(), "0123456789abcdef");
    }
}
