use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct Config {
    pub data_dir: PathBuf,
    pub token_path: PathBuf,
    pub api_url: String,
}

impl Config {
    pub fn load(api_url: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nutrilog").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        Self::in_dir(data_dir, api_url)
    }

    pub fn in_dir(data_dir: PathBuf, api_url: &str) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let token_path = data_dir.join("token");

        Ok(Config {
            data_dir,
            token_path,
            api_url: api_url.to_string(),
        })
    }

    /// The stored bearer token, if a previous `login` saved one.
    pub fn load_token(&self) -> Result<Option<String>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let token = std::fs::read_to_string(&self.token_path).context("Failed to read token file")?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        write_private(&self.token_path, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        if self.token_path.exists() {
            std::fs::remove_file(&self.token_path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

fn write_private(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).context("Failed to write token file")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("Failed to set token file permissions")?;
    }
    Ok(())
}
