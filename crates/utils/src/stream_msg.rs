use axum::response::sse::Event;
use json_patch::Patch;
use serde::{Deserialize, Serialize};

pub const EV_JSON_PATCH: &str = "json_patch";

/// Message carried by the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamMsg {
    JsonPatch(Patch),
}

impl StreamMsg {
    pub fn to_sse_event(&self) -> Event {
        match self {
            StreamMsg::JsonPatch(patch) => {
                let data = serde_json::to_string(patch).unwrap_or_else(|_| "[]".to_string());
                Event::default().event(EV_JSON_PATCH).data(data)
            }
        }
    }
}
