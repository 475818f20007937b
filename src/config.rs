use crate::{HueError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z0-9_]+))").expect("env var pattern is valid")
});

/// Address of the bridge and the application key used to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Network address of the bridge, `host[:port]`.
    pub server: String,
    /// API user token, as handed out by the bridge when pairing.
    pub user: String,
}

impl Config {
    pub fn new(server: impl Into<String>, user: impl Into<String>) -> Self {
        Config {
            server: server.into(),
            user: user.into(),
        }
    }

    /// Reads the config at `path`, after expanding `~` and environment variables and
    /// resolving it to an absolute path.
    ///
    /// A missing or unreadable file yields [`HueError::ConfigNotFound`]; contents that are
    /// not a JSON object with `server` and `user` yield [`HueError::ConfigMalformed`].
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = resolve_path(path.as_ref())?;
        let contents =
            std::fs::read_to_string(&path).map_err(|source| HueError::ConfigNotFound {
                path: path.clone(),
                source,
            })?;
        let config = serde_json::from_str(&contents)
            .map_err(|source| HueError::ConfigMalformed { path: path.clone(), source })?;
        log::debug!("loaded bridge config from {}", path.display());
        Ok(config)
    }

    /// Writes the config to `path` as 4-space indented JSON with sorted keys.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = expand_path(path.as_ref());
        // serde_json::Value keeps object keys sorted
        let value = serde_json::to_value(self).map_err(|source| HueError::ConfigMalformed {
            path: path.clone(),
            source,
        })?;
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        value
            .serialize(&mut ser)
            .map_err(|source| HueError::ConfigMalformed { path: path.clone(), source })?;
        std::fs::write(&path, out).map_err(|source| HueError::ConfigUnwritable { path, source })
    }

    /// Root of every bridge request: `http://{server}/api/{user}/`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/{}/", self.server, self.user)
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    let expanded = expand_path(path);
    std::fs::canonicalize(&expanded).map_err(|source| HueError::ConfigNotFound {
        path: expanded,
        source,
    })
}

/// Expands a leading `~` to the home directory, then `$VAR` and `${VAR}` references.
/// Unset variables are kept as written.
pub(crate) fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let with_home = expand_user(&raw);
    PathBuf::from(expand_vars(&with_home))
}

fn expand_user(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}

fn expand_vars(path: &str) -> String {
    ENV_VAR
        .replace_all(path, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
