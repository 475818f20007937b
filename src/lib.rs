//! # hue_scenes
//!
//! A small client for the REST surface of a Philips Hue bridge, focused on scenes.
//!
//! Lights, groups and scenes are fetched once per [`Hue`] session and kept in its
//! [`Cache`], so repeated queries are pure in-memory lookups.
//!
//! ```no_run
//! # tokio_test::block_on(async {
//! use hue_scenes::{Hue, Scene, SceneFilter};
//!
//! let hue = Hue::new("~/.hue/config.js");
//! let scenes = Scene::fetch_by(&hue, &SceneFilter::new().with_on(true)).await.unwrap();
//! for scene in Scene::sort_by_update_time(scenes) {
//!     println!("{}", scene);
//! }
//! # })
//! ```

use std::path::PathBuf;

mod bridge;
mod cache;
mod config;
#[cfg(test)]
mod fixtures;
mod group;
mod hue;
mod light;
pub mod report;
mod resource;
mod scene;

pub use bridge::{Bridge, REQUEST_TIMEOUT};
pub use cache::Cache;
pub use config::Config;
pub use group::{Group, Groups};
pub use hue::Hue;
pub use light::{Light, Lights};
pub use resource::{GroupAttributes, LightAttributes, LightState, SceneAttributes};
pub use scene::{Scene, SceneFilter, Scenes};

#[derive(Debug, thiserror::Error)]
pub enum HueError {
    /// The config file could not be resolved or read.
    #[error("config file {} not found: {source}", .path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON or lacks `server`/`user`.
    #[error("config file {} is malformed: {source}", .path.display())]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The config file could not be written.
    #[error("config file {} could not be written: {source}", .path.display())]
    ConfigUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    /// The bridge answered with an error envelope.
    #[error("bridge error {code}: {msg}")]
    BridgeError { code: usize, msg: String },
    /// The bridge answered with a non-success HTTP status. Together with
    /// [`HueError::BridgeError`] this covers every failure reported by the bridge itself.
    #[error("bridge answered with HTTP status {status}: {body}")]
    BridgeStatus { status: u16, body: String },
    #[error("protocol error: {msg}")]
    ProtocolError { msg: String },
    #[error("no {kind} with id {id}")]
    KeyNotFound { kind: &'static str, id: String },
    #[error("invalid operation: {msg}")]
    InvalidOperation { msg: String },
}

impl HueError {
    pub(crate) fn protocol_err(msg: impl Into<String>) -> Self {
        HueError::ProtocolError { msg: msg.into() }
    }

    pub(crate) fn key_not_found(kind: &'static str, id: &str) -> Self {
        HueError::KeyNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        HueError::InvalidOperation { msg: msg.into() }
    }
}

pub type Result<T> = std::result::Result<T, HueError>;
