use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const TOKEN_FILE: &str = "auth_token";

/// Persists the API auth token in the user's home directory.
///
/// The token lives in `~/.sportisode/auth_token` with 0600 permissions so
/// only the owner can read it.
#[derive(Debug, Clone)]
pub struct TokenStore {
    file_path: PathBuf,
}

impl TokenStore {
    /// Creates a store at the default path `~/.sportisode/auth_token`.
    ///
    /// Fails if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::at(home_dir.join(".sportisode").join(TOKEN_FILE)))
    }

    /// Creates a store backed by an explicit file
    pub fn at(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Loads the token.
    ///
    /// - `Ok(Some(token))` if the file exists and holds a plausible token
    /// - `Ok(None)` if the file is missing, empty, or corrupted
    /// - `Err(_)` if the file exists but cannot be read
    pub fn load(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path).context("Failed to read token file")?;
        let token = content.trim();

        if token.is_empty() {
            log::warn!("Token file is empty, treating as logged out");
            return Ok(None);
        }

        // DRF tokens are 40 hex chars; allow other formats within reason
        if token.len() < 8 || token.len() > 256 {
            log::warn!("Stored token has invalid length: {}, treating as corrupted", token.len());
            return Ok(None);
        }

        if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
            log::warn!("Token file contains whitespace or control characters, treating as corrupted");
            return Ok(None);
        }

        log::debug!("Loaded auth token from {}", self.file_path.display());
        Ok(Some(token.to_string()))
    }

    /// Saves the token atomically with 0600 permissions, creating the parent
    /// directory if needed.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create token directory")?;
        }

        let temp_path = self.file_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).context("Failed to create temporary token file")?;
        file.write_all(token.trim().as_bytes())
            .context("Failed to write auth token")?;
        file.sync_all().context("Failed to sync token file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .context("Failed to set token file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path).context("Failed to rename temporary token file")?;

        log::info!("Saved auth token to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the token file. Succeeds when there is nothing to delete.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete token file")?;
            log::info!("Deleted auth token at {}", self.file_path.display());
        } else {
            log::debug!("Token file does not exist, nothing to delete");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}
