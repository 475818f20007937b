use crate::bridge::{Bridge, REQUEST_TIMEOUT};
use crate::cache::Cache;
use crate::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const BRIDGE_KEY: &str = "hue";

#[derive(Debug, Clone)]
enum ConfigSource {
    Path(PathBuf),
    Loaded(Config),
}

/// A session against one bridge.
///
/// Nothing is read or fetched when the session is created. The config, the [`Bridge`] and
/// every collection are built on first use and then kept in the session [`Cache`] until the
/// session is dropped.
#[derive(Debug)]
pub struct Hue {
    source: ConfigSource,
    timeout: Duration,
    cache: Cache,
}

impl Hue {
    /// A session whose config is read from `config_path` on first use.
    pub fn new(config_path: impl Into<PathBuf>) -> Hue {
        Hue {
            source: ConfigSource::Path(config_path.into()),
            timeout: REQUEST_TIMEOUT,
            cache: Cache::new(),
        }
    }

    pub fn from_config(config: Config) -> Hue {
        Hue {
            source: ConfigSource::Loaded(config),
            timeout: REQUEST_TIMEOUT,
            cache: Cache::new(),
        }
    }

    /// Sets the timeout applied to every bridge request of this session.
    pub fn with_timeout(self, timeout: Duration) -> Hue {
        Hue { timeout, ..self }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Returns the bridge of this session, loading the config the first time.
    pub async fn bridge(&self) -> crate::Result<Arc<Bridge>> {
        self.cache
            .get_or_create(BRIDGE_KEY, || self.connect())
            .await
    }

    async fn connect(&self) -> crate::Result<Bridge> {
        let config = match &self.source {
            ConfigSource::Path(path) => Config::load(path)?,
            ConfigSource::Loaded(config) => config.clone(),
        };
        log::info!("using bridge at {}", config.server);
        Ok(Bridge::new(&config)?.with_timeout(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HueError;
    use std::io::Write;

    #[tokio::test]
    async fn bridge_is_built_once() {
        let hue = Hue::from_config(Config::new("10.0.0.2", "abc"));
        let first = hue.bridge().await.unwrap();
        let second = hue.bridge().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.base_url(), "http://10.0.0.2/api/abc/");
        assert!(hue.cache().contains(BRIDGE_KEY));
    }

    #[tokio::test]
    async fn bridge_uses_session_timeout() {
        let hue = Hue::from_config(Config::new("10.0.0.2", "abc"))
            .with_timeout(Duration::from_secs(9));
        assert_eq!(hue.bridge().await.unwrap().timeout(), Duration::from_secs(9));
    }

    #[tokio::test]
    async fn config_is_read_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let hue = Hue::new(file.path());
        write!(file, r#"{{"server": "bridge.local", "user": "u"}}"#).unwrap();
        let bridge = hue.bridge().await.unwrap();
        assert_eq!(bridge.base_url(), "http://bridge.local/api/u/");
    }

    #[tokio::test]
    async fn missing_config_surfaces_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let hue = Hue::new(dir.path().join("config.js"));
        let err = hue.bridge().await.unwrap_err();
        assert!(matches!(err, HueError::ConfigNotFound { .. }), "{err:?}");
        assert!(!hue.cache().contains(BRIDGE_KEY));
    }
}
