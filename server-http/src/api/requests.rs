use serde::Deserialize;

/// Query string of `GET /cache`.
#[derive(Debug, Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    pub uuid: Option<String>,
}
