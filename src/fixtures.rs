//! A fake bridge for tests.

use crate::{Config, Hue};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) fn lights() -> Value {
    json!({
        "1": {"name": "Desk", "type": "Extended color light", "state": {"on": true, "bri": 200}},
        "2": {"name": "Sofa", "type": "Dimmable light", "state": {"on": true, "bri": 80}},
        "3": {"name": "Hall", "type": "Dimmable light", "state": {"on": false}}
    })
}

pub(crate) fn groups() -> Value {
    json!({
        "1": {"name": "Living room", "type": "Room", "lights": ["1", "2"]},
        "2": {"name": "Hallway", "type": "Room", "lights": ["3"]},
        "3": {"name": "Broken", "type": "LightGroup", "lights": ["9"]}
    })
}

pub(crate) fn scenes() -> Value {
    json!({
        "s1": {"name": "Evening", "lights": ["1", "2"], "lastupdated": "2016-01-10T20:00:00"},
        "s2": {"name": "Party Time", "lights": ["1", "3"], "lastupdated": "2016-01-05T21:30:00"},
        "s3": {"name": "Party Lights", "lights": ["2"], "lastupdated": "2016-02-01T08:15:00"},
        "s4": {"name": "Empty", "lights": [], "lastupdated": null},
        "s5": {"name": "Reading", "lights": ["1"], "lastupdated": "2016-01-05T21:30:00"}
    })
}

/// Serves `collection` at `GET /api/token/{name}`, answering at most `times` requests.
pub(crate) async fn serve(server: &MockServer, name: &str, collection: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/token/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection))
        .up_to_n_times(times)
        .expect(0..=times)
        .mount(server)
        .await;
}

/// A bridge serving the three fixture collections, each of which may be fetched once.
pub(crate) async fn bridge() -> MockServer {
    let server = MockServer::start().await;
    serve(&server, "lights", lights(), 1).await;
    serve(&server, "groups", groups(), 1).await;
    serve(&server, "scenes", scenes(), 1).await;
    server
}

pub(crate) fn session(server: &MockServer) -> Hue {
    Hue::from_config(Config::new(server.address().to_string(), "token"))
}
