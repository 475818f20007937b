use crate::light::{self, Lights};
use crate::resource::{decode, SceneAttributes};
use crate::{Hue, HueError};
use chrono::{NaiveDateTime, TimeZone};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

const SCENES_KEY: &str = "scenes";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Setting the action of the all-lights group to a scene id recalls that scene.
const ACTIVATE_PATH: &str = "groups/0/action";

pub type Scenes = BTreeMap<String, Arc<Scene>>;

/// A named, timestamped snapshot of light states that the bridge can recall as a unit.
#[derive(Debug)]
pub struct Scene {
    id: Option<String>,
    attributes: SceneAttributes,
    last_updated: Option<NaiveDateTime>,
    raw: Value,
    lights: OnceCell<Lights>,
}

impl Scene {
    /// Builds a scene from a bridge record. `lastupdated` must be absent, `null` or
    /// `YYYY-MM-DDTHH:MM:SS`.
    pub fn from_raw(id: Option<String>, raw: Value) -> crate::Result<Scene> {
        let label = id.as_deref().unwrap_or("without id");
        let attributes: SceneAttributes = decode("scene", label, &raw)?;
        let last_updated = attributes
            .lastupdated
            .as_deref()
            .map(|ts| {
                NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).map_err(|e| {
                    HueError::protocol_err(format!("scene {label} has bad lastupdated {ts:?}: {e}"))
                })
            })
            .transpose()?;
        Ok(Scene {
            id,
            attributes,
            last_updated,
            raw,
            lights: OnceCell::new(),
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn light_ids(&self) -> &[String] {
        &self.attributes.lights
    }

    pub fn attributes(&self) -> &SceneAttributes {
        &self.attributes
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    /// Seconds since the epoch of the last update, reading the timestamp as local time.
    /// A scene that was never updated yields `0`.
    pub fn last_updated_epoch(&self) -> i64 {
        self.last_updated.map_or(0, local_epoch)
    }

    /// The lights of this scene, resolved once against the light snapshot of the session.
    pub async fn get_lights(&self, hue: &Hue) -> crate::Result<&Lights> {
        self.lights
            .get_or_try_init(|| light::resolve(hue, self.light_ids()))
            .await
    }

    /// True when every light of the scene is on, and for a scene without lights.
    pub async fn is_on(&self, hue: &Hue) -> crate::Result<bool> {
        Ok(self.get_lights(hue).await?.values().all(|light| light.is_on()))
    }

    /// Recalls this scene on all lights. The bridge answer is returned as is.
    /// ### Example
    /// ```no_run
    /// # tokio_test::block_on(async {
    /// let hue = hue_scenes::Hue::new("./config.js");
    /// let scene = hue_scenes::Scene::fetch_one(&hue, "98fa71508-on-0").await.unwrap();
    /// println!("{}", scene.activate(&hue).await.unwrap());
    /// # })
    /// ```
    pub async fn activate(&self, hue: &Hue) -> crate::Result<Value> {
        let id = self.require_id("activate")?;
        log::info!("activating scene {id}");
        hue.bridge()
            .await?
            .put(ACTIVATE_PATH, &json!({ "scene": id }))
            .await
    }

    /// Deletes this scene from the bridge. The session snapshot is not updated.
    pub async fn delete(&self, hue: &Hue) -> crate::Result<Value> {
        let id = self.require_id("delete")?;
        log::info!("deleting scene {id}");
        hue.bridge().await?.delete(&format!("scenes/{id}")).await
    }

    fn require_id(&self, action: &str) -> crate::Result<&str> {
        match self.id() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(HueError::invalid_operation(format!(
                "cannot {action} scene {:?} without an id",
                self.name()
            ))),
        }
    }

    /// Returns all scenes of the bridge. The collection is fetched once per session.
    pub async fn fetch_all(hue: &Hue) -> crate::Result<Arc<Scenes>> {
        hue.cache()
            .get_or_create(SCENES_KEY, || fetch_scenes(hue))
            .await
    }

    /// Returns the scenes matching every criterion of `filter`, in id order.
    /// ### Example
    /// ```no_run
    /// # tokio_test::block_on(async {
    /// use hue_scenes::{Hue, Scene, SceneFilter};
    ///
    /// let hue = Hue::new("./config.js");
    /// let filter = SceneFilter::new().with_name("Party").with_on(true);
    /// for scene in Scene::fetch_by(&hue, &filter).await.unwrap() {
    ///     println!("{}", scene);
    /// }
    /// # })
    /// ```
    pub async fn fetch_by(hue: &Hue, filter: &SceneFilter) -> crate::Result<Vec<Arc<Scene>>> {
        let mut selected = Vec::new();
        for scene in Scene::fetch_all(hue).await?.values() {
            if filter.matches(scene, hue).await? {
                selected.push(scene.clone());
            }
        }
        Ok(selected)
    }

    /// Looks `id` up in the scene snapshot of the session.
    pub async fn fetch_one(hue: &Hue, id: &str) -> crate::Result<Arc<Scene>> {
        Scene::fetch_all(hue)
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| HueError::key_not_found("scene", id))
    }

    /// Asks the bridge for the current state of scene `id`, bypassing the session snapshot.
    pub async fn fetch_remote(hue: &Hue, id: &str) -> crate::Result<Scene> {
        let raw: Value = hue.bridge().await?.get(&format!("scenes/{id}")).await?;
        Scene::from_raw(Some(id.to_string()), raw)
    }

    /// Stable ascending sort on [`Scene::last_updated_epoch`].
    pub fn sort_by_update_time(mut scenes: Vec<Arc<Scene>>) -> Vec<Arc<Scene>> {
        scenes.sort_by_key(|scene| scene.last_updated_epoch());
        scenes
    }
}

async fn fetch_scenes(hue: &Hue) -> crate::Result<Scenes> {
    let raw: BTreeMap<String, Value> = hue.bridge().await?.get("scenes").await?;
    log::info!("fetched {} scenes", raw.len());
    let mut scenes = Scenes::new();
    for (id, raw) in raw {
        scenes.insert(id.clone(), Arc::new(Scene::from_raw(Some(id), raw)?));
    }
    Ok(scenes)
}

fn local_epoch(ts: NaiveDateTime) -> i64 {
    chrono::Local
        .from_local_datetime(&ts)
        .earliest()
        .map_or_else(|| ts.and_utc().timestamp(), |dt| dt.timestamp())
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.attributes.lastupdated.as_deref().unwrap_or("never");
        write!(f, "{} [last: {}]", self.name(), last)
    }
}

/// Criteria for [`Scene::fetch_by`]. Unset criteria match every scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneFilter {
    /// Substring of the scene name.
    pub name: Option<String>,
    /// When set, only scenes whose [`Scene::is_on`] holds are kept. The value itself is not
    /// consulted, so `Some(false)` selects the same scenes as `Some(true)`.
    pub on: Option<bool>,
    /// Exclusive upper bound on [`Scene::last_updated_epoch`].
    pub updated_before: Option<i64>,
    /// Exclusive lower bound on [`Scene::last_updated_epoch`].
    pub updated_after: Option<i64>,
}

impl SceneFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_on(self, on: bool) -> Self {
        Self {
            on: Some(on),
            ..self
        }
    }

    pub fn updated_before(self, epoch: i64) -> Self {
        Self {
            updated_before: Some(epoch),
            ..self
        }
    }

    pub fn updated_after(self, epoch: i64) -> Self {
        Self {
            updated_after: Some(epoch),
            ..self
        }
    }

    async fn matches(&self, scene: &Scene, hue: &Hue) -> crate::Result<bool> {
        if let Some(name) = &self.name {
            if !scene.name().contains(name.as_str()) {
                return Ok(false);
            }
        }
        if self.on.is_some() && !scene.is_on(hue).await? {
            return Ok(false);
        }
        let epoch = scene.last_updated_epoch();
        if self.updated_before.is_some_and(|before| epoch >= before) {
            return Ok(false);
        }
        if self.updated_after.is_some_and(|after| epoch <= after) {
            return Ok(false);
        }
        Ok(true)
    }
}
