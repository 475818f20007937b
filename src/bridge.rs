use crate::config::Config;
use crate::HueError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Timeout applied to bridge requests unless configured otherwise.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// The bridge is the central access point of the lamps in a Hue setup. It issues plain
/// requests against paths relative to `http://{server}/api/{user}/`.
#[derive(Debug)]
pub struct Bridge {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

fn create_reqwest_client() -> crate::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connection_verbose(true)
        .tcp_keepalive(Some(Duration::from_secs(5)))
        .build()?)
}

impl Bridge {
    /// Creates a bridge for this config. Note that this function does not validate whether a
    /// bridge is really present at the configured address.
    /// ### Example
    /// ```no_run
    /// let config = hue_scenes::Config::new("192.168.0.4", "rVV05G0i52vQMMLn6BK3dpr0F3uDiqtDjPLPK2uj");
    /// let bridge = hue_scenes::Bridge::new(&config).unwrap();
    /// ```
    pub fn new(config: &Config) -> crate::Result<Bridge> {
        Ok(Bridge {
            base_url: config.base_url(),
            timeout: REQUEST_TIMEOUT,
            client: create_reqwest_client()?,
        })
    }

    /// Consumes the bridge and returns one that gives up on every request after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Bridge {
        Bridge { timeout, ..self }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches `path` and decodes the answer into `T`.
    /// ### Example
    /// ```no_run
    /// # tokio_test::block_on(async {
    /// let config = hue_scenes::Config::new("192.168.0.4", "rVV05G0i52vQMMLn6BK3dpr0F3uDiqtDjPLPK2uj");
    /// let bridge = hue_scenes::Bridge::new(&config).unwrap();
    /// let lights: serde_json::Value = bridge.get("lights").await.unwrap();
    /// println!("{}", lights);
    /// # })
    /// ```
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let value = self.send(self.client.get(self.url(path)), "GET", path).await?;
        serde_json::from_value(value).map_err(|e| {
            HueError::protocol_err(format!("unexpected answer for GET {path}: {e}"))
        })
    }

    /// Sends `body` as JSON to `path` and returns the bridge answer as is.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> crate::Result<Value> {
        self.send(self.client.put(self.url(path)).json(body), "PUT", path)
            .await
    }

    /// Deletes the resource at `path` and returns the bridge answer as is.
    pub async fn delete(&self, path: &str) -> crate::Result<Value> {
        self.send(self.client.delete(self.url(path)), "DELETE", path)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, verb: &str, path: &str) -> crate::Result<Value> {
        log::debug!("{verb} {path}");
        let resp = request.timeout(self.timeout).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(HueError::BridgeStatus {
                status: status.as_u16(),
                body,
            });
        }
        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                HueError::protocol_err(format!("invalid json from {verb} {path}: {e}"))
            })?
        };
        check_errors(value)
    }
}

/// Turns an error envelope, `[{"error": {...}}, ...]`, into a [`HueError::BridgeError`]
/// carrying the first error. Any other answer is passed through.
fn check_errors(value: Value) -> crate::Result<Value> {
    let first_error = value
        .as_array()
        .and_then(|items| items.iter().find(|item| item.get("error").is_some()))
        .cloned();
    match first_error {
        Some(item) => {
            let BridgeError { error } = serde_json::from_value(item)
                .map_err(|e| HueError::protocol_err(format!("malformed bridge error: {e}")))?;
            log::warn!("bridge error at {}: {}", error.address, error.description);
            Err(HueError::BridgeError {
                code: error.r#type,
                msg: error.description,
            })
        }
        None => Ok(value),
    }
}

#[derive(Debug, serde::Deserialize)]
struct BridgeError {
    error: BridgeErrorInner,
}

#[derive(Debug, serde::Deserialize)]
struct BridgeErrorInner {
    #[serde(default)]
    address: String,
    description: String,
    r#type: usize,
}
