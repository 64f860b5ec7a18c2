//! CLI configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/filechat/config.toml`
//! - Windows: `%APPDATA%/filechat/config.toml`

use std::path::{Path, PathBuf};

use filechat_protocol::ChunkEncoding;
use filechat_protocol::constants::DEFAULT_MIME_TYPE;
use filechat_transfer::{BASE_CHUNK_SIZE, ChunkSizePolicy, MIN_CHUNK_SIZE};
use filechat_uploader::UploaderConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Chunk size for a single-file batch, in bytes.
    #[serde(default = "default_base_chunk_size")]
    pub base_chunk_size: u64,

    /// Lower bound on the chunk size however many files are sent.
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: u64,

    #[serde(default)]
    pub encoding: ChunkEncoding,

    /// MIME type for files whose extension is not recognised.
    #[serde(default = "default_mime")]
    pub default_mime: String,

    /// Add `fileId` to chunk events.
    #[serde(default)]
    pub tag_file_ids: bool,
}

fn default_base_chunk_size() -> u64 {
    BASE_CHUNK_SIZE
}

fn default_min_chunk_size() -> u64 {
    MIN_CHUNK_SIZE
}

fn default_mime() -> String {
    DEFAULT_MIME_TYPE.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_chunk_size: default_base_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            encoding: ChunkEncoding::default(),
            default_mime: default_mime(),
            tag_file_ids: false,
        }
    }
}

impl Config {
    /// Loads `path`, or the per-user config file when `path` is `None`.
    ///
    /// A missing explicit file yields defaults. A missing per-user file is
    /// created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) if path.exists() => Self::read(path),
            Some(_) => Ok(Self::default()),
            None => {
                let path = config_path()?;
                if path.exists() {
                    Self::read(&path)
                } else {
                    let config = Self::default();
                    config.save(&path)?;
                    Ok(config)
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Validates the chunk sizes and builds the dispatcher settings.
    pub fn uploader_config(&self) -> anyhow::Result<UploaderConfig> {
        Ok(UploaderConfig {
            policy: ChunkSizePolicy::new(self.base_chunk_size, self.min_chunk_size)?,
            encoding: self.encoding.clone(),
            tag_file_ids: self.tag_file_ids,
        })
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("filechat").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("filechat")
            .join("config.toml"))
    }
}
