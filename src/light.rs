use crate::resource::{decode, LightAttributes};
use crate::{Hue, HueError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const LIGHTS_KEY: &str = "lights";

/// Every light of the bridge, by id.
pub type Lights = BTreeMap<String, Arc<Light>>;

/// A snapshot of one light, as the bridge reported it when the collection was fetched.
#[derive(Debug, Clone)]
pub struct Light {
    id: String,
    attributes: LightAttributes,
    raw: Value,
}

impl Light {
    pub(crate) fn from_raw(id: String, raw: Value) -> crate::Result<Light> {
        let attributes = decode("light", &id, &raw)?;
        Ok(Light { id, attributes, raw })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn is_on(&self) -> bool {
        self.attributes.state.on
    }

    /// `"yes"` or `"no"`.
    pub fn on_label(&self) -> &'static str {
        if self.is_on() {
            "yes"
        } else {
            "no"
        }
    }

    pub fn attributes(&self) -> &LightAttributes {
        &self.attributes
    }

    /// The record exactly as the bridge sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns all lights of the bridge. The collection is fetched once per session.
    /// ### Example
    /// ```no_run
    /// # tokio_test::block_on(async {
    /// let hue = hue_scenes::Hue::new("./config.js");
    /// for (id, light) in hue_scenes::Light::fetch_all(&hue).await.unwrap().iter() {
    ///     println!("{}) {}", id, light);
    /// }
    /// # })
    /// ```
    pub async fn fetch_all(hue: &Hue) -> crate::Result<Arc<Lights>> {
        hue.cache()
            .get_or_create(LIGHTS_KEY, || fetch_lights(hue))
            .await
    }

    pub async fn fetch_one(hue: &Hue, id: &str) -> crate::Result<Arc<Light>> {
        Light::fetch_all(hue)
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| HueError::key_not_found("light", id))
    }
}

async fn fetch_lights(hue: &Hue) -> crate::Result<Lights> {
    let raw: BTreeMap<String, Value> = hue.bridge().await?.get("lights").await?;
    log::info!("fetched {} lights", raw.len());
    let mut lights = Lights::new();
    for (id, raw) in raw {
        lights.insert(id.clone(), Arc::new(Light::from_raw(id, raw)?));
    }
    Ok(lights)
}

/// Looks up every id of `ids` in the light snapshot of the session.
pub(crate) async fn resolve(hue: &Hue, ids: &[String]) -> crate::Result<Lights> {
    let lights = Light::fetch_all(hue).await?;
    ids.iter()
        .map(|id| match lights.get(id) {
            Some(light) => Ok((id.clone(), light.clone())),
            None => Err(HueError::key_not_found("light", id)),
        })
        .collect()
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [on: {}]", self.name(), self.on_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    #[test]
    fn renders_name_and_state() {
        let light = Light::from_raw("1".into(), json!({"name": "Desk", "state": {"on": false}}))
            .unwrap();
        assert_eq!(light.to_string(), "Desk [on: no]");
        assert_eq!(light.raw()["state"]["on"], false);
    }

    #[test]
    fn malformed_light_is_protocol_error() {
        let err = Light::from_raw("1".into(), json!({"name": "Desk"})).unwrap_err();
        assert!(matches!(err, HueError::ProtocolError { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn fetches_lights_once() {
        let server = fixtures::bridge().await;
        let hue = fixtures::session(&server);

        let lights = Light::fetch_all(&hue).await.unwrap();
        assert_eq!(lights.keys().collect::<Vec<_>>(), vec!["1", "2", "3"]);
        assert!(lights["1"].is_on());
        assert!(!lights["3"].is_on());

        let again = Light::fetch_all(&hue).await.unwrap();
        assert!(Arc::ptr_eq(&lights, &again));
        assert_eq!(Light::fetch_one(&hue, "2").await.unwrap().name(), "Sofa");
    }

    #[tokio::test]
    async fn unknown_light_is_key_not_found() {
        let server = fixtures::bridge().await;
        let hue = fixtures::session(&server);
        let err = Light::fetch_one(&hue, "42").await.unwrap_err();
        assert!(matches!(err, HueError::KeyNotFound { kind: "light", .. }), "{err:?}");
    }
}
