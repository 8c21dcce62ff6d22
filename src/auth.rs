//! Bearer token persistence
//!
//! The backend expects `Authorization: Bearer <token>` on every request. The
//! token is kept in a single file in the platform data directory
//! (`~/.local/share/wsapi/token` on Linux) and is re-read for each request,
//! so a login or logout takes effect without rebuilding the client.

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::PathBuf;

/// File name of the stored token inside the data directory
const TOKEN_FILE: &str = "token";

/// Reads and writes the bearer token on disk
#[derive(Debug, Clone)]
pub struct TokenStore {
    /// Directory holding the token file
    dir: PathBuf,
}

impl TokenStore {
    /// Creates a TokenStore using the XDG-compliant data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "wsapi")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a TokenStore rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Returns the stored token, or `None` if nobody is logged in
    ///
    /// A missing or blank token file both count as logged out.
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(self.token_path()) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persists `token`, creating the data directory if needed
    pub fn save(&self, token: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.token_path(), token.trim())
    }

    /// Removes the stored token; clearing an absent token is not an error
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(self.token_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
