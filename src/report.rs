//! Plain-text listings of bridge resources.
//!
//! Every entry is printed as `id) name [on: yes/no]`, followed by one ` - id) name [on: yes/no]`
//! line per light it controls.

use crate::light::Lights;
use crate::{Group, Hue, Scene};
use std::sync::Arc;

fn push_lights(out: &mut String, lights: &Lights) {
    for (id, light) in lights {
        out.push_str(&format!(" - {id}) {light}\n"));
    }
}

/// Renders `scenes` in the given order, resolving the lights of each scene.
pub async fn scenes(hue: &Hue, scenes: &[Arc<Scene>]) -> crate::Result<String> {
    let mut out = String::new();
    for scene in scenes {
        let on = if scene.is_on(hue).await? { "yes" } else { "no" };
        out.push_str(&format!(
            "{}) {} [on: {}]\n",
            scene.id().unwrap_or("-"),
            scene.name(),
            on
        ));
        push_lights(&mut out, scene.get_lights(hue).await?);
    }
    Ok(out)
}

pub fn lights(lights: &Lights) -> String {
    lights
        .iter()
        .map(|(id, light)| format!("{id}) {light}\n"))
        .collect()
}

pub async fn groups(hue: &Hue, groups: &[Arc<Group>]) -> crate::Result<String> {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("{}) {}\n", group.id(), group.name()));
        push_lights(&mut out, group.get_lights(hue).await?);
    }
    Ok(out)
}
