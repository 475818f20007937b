use crate::light::{self, Lights};
use crate::resource::{decode, GroupAttributes};
use crate::{Hue, HueError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

const GROUPS_KEY: &str = "groups";

pub type Groups = BTreeMap<String, Arc<Group>>;

/// A named set of lights. Group `"0"` is the implicit group of all lights.
#[derive(Debug)]
pub struct Group {
    id: String,
    attributes: GroupAttributes,
    raw: Value,
    lights: OnceCell<Lights>,
}

impl Group {
    pub(crate) fn from_raw(id: String, raw: Value) -> crate::Result<Group> {
        let attributes = decode("group", &id, &raw)?;
        Ok(Group {
            id,
            attributes,
            raw,
            lights: OnceCell::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn light_ids(&self) -> &[String] {
        &self.attributes.lights
    }

    pub fn attributes(&self) -> &GroupAttributes {
        &self.attributes
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The lights of this group, resolved against the light snapshot of the session.
    ///
    /// Resolution happens once per group; an id missing from the snapshot is a
    /// [`HueError::KeyNotFound`].
    pub async fn get_lights(&self, hue: &Hue) -> crate::Result<&Lights> {
        self.lights
            .get_or_try_init(|| light::resolve(hue, self.light_ids()))
            .await
    }

    /// Returns all groups of the bridge. The collection is fetched once per session.
    pub async fn fetch_all(hue: &Hue) -> crate::Result<Arc<Groups>> {
        hue.cache()
            .get_or_create(GROUPS_KEY, || fetch_groups(hue))
            .await
    }

    pub async fn fetch_one(hue: &Hue, id: &str) -> crate::Result<Arc<Group>> {
        Group::fetch_all(hue)
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| HueError::key_not_found("group", id))
    }
}

async fn fetch_groups(hue: &Hue) -> crate::Result<Groups> {
    let raw: BTreeMap<String, Value> = hue.bridge().await?.get("groups").await?;
    log::info!("fetched {} groups", raw.len());
    let mut groups = Groups::new();
    for (id, raw) in raw {
        groups.insert(id.clone(), Arc::new(Group::from_raw(id, raw)?));
    }
    Ok(groups)
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
