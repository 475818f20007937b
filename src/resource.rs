use crate::HueError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decodes one entry of a bridge collection, keeping `raw` untouched for the caller.
pub(crate) fn decode<T: DeserializeOwned>(kind: &str, id: &str, raw: &Value) -> crate::Result<T> {
    serde_json::from_value(raw.clone())
        .map_err(|e| HueError::protocol_err(format!("malformed {kind} {id}: {e}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightState {
    pub on: bool,
    pub bri: Option<u8>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub ct: Option<u16>,
    pub colormode: Option<String>,
    pub reachable: Option<bool>,
}

/// One entry of `GET lights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightAttributes {
    pub name: String,
    pub state: LightState,
    #[serde(rename = "type")]
    pub light_type: Option<String>,
    pub modelid: Option<String>,
    pub uniqueid: Option<String>,
}

/// One entry of `GET groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAttributes {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<String>,
    #[serde(rename = "type")]
    pub group_type: Option<String>,
}

/// One entry of `GET scenes`, or the body of `GET scenes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneAttributes {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<String>,
    /// `YYYY-MM-DDTHH:MM:SS`, local bridge time.
    pub lastupdated: Option<String>,
    pub owner: Option<String>,
    pub recycle: Option<bool>,
    pub locked: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_light_with_extra_fields() {
        let light: LightAttributes = serde_json::from_value(json!({
            "name": "Hue Lamp 1",
            "type": "Extended color light",
            "state": {"on": true, "bri": 144, "alert": "none", "reachable": true},
            "swversion": "66009461"
        }))
        .unwrap();
        assert_eq!(light.name, "Hue Lamp 1");
        assert!(light.state.on);
        assert_eq!(light.state.bri, Some(144));
        assert_eq!(light.light_type.as_deref(), Some("Extended color light"));
    }

    #[test]
    fn scene_lastupdated_may_be_null() {
        let scene: SceneAttributes = serde_json::from_value(json!({
            "name": "Evening",
            "lights": ["1", "2"],
            "lastupdated": null
        }))
        .unwrap();
        assert_eq!(scene.lights, vec!["1", "2"]);
        assert!(scene.lastupdated.is_none());
    }

    #[test]
    fn light_without_state_is_rejected() {
        let parsed = serde_json::from_value::<LightAttributes>(json!({"name": "Lamp"}));
        assert!(parsed.is_err());
    }
}
