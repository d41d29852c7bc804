use serde::Serialize;

use crate::domain::summary::SummaryEntry;

#[derive(Debug, Clone, Serialize)]
pub struct ControlResponse {
    pub status: &'static str,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifiedItemsResponse {
    pub identified_items: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
