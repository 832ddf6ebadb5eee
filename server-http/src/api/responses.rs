use serde::Serialize;

/// Response body of `POST /cache`: one entry per put, in request order.
#[derive(Debug, Serialize)]
pub struct PutResponse {
    pub responses: Vec<PutResponseObject>,
}

#[derive(Debug, Serialize)]
pub struct PutResponseObject {
    pub uuid: String,
}

impl From<Vec<String>> for PutResponse {
    fn from(ids: Vec<String>) -> Self {
        Self {
            responses: ids
                .into_iter()
                .map(|uuid| PutResponseObject { uuid })
                .collect(),
        }
    }
}
