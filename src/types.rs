use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Body of `POST /timeMachine/setGlobalClock`.
#[derive(Serialize)]
pub struct SetClockRequest {
    pub date: Timestamp,
}

/// Body of `GET /timeMachine`.
#[derive(Deserialize)]
pub struct ServerTimeResponse {
    pub time: Timestamp,
}
