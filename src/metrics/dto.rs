use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupsParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deltas {
    pub users: f64,
    pub teachers: f64,
    pub students: f64,
    pub weekly_signups: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_users: u64,
    pub total_teachers: u64,
    pub total_students: u64,
    pub weekly_signups: u64,
    pub deltas: Deltas,
}
