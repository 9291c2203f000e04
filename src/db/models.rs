use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisHistory {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub result_json: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewAnalysisHistory<'a> {
    pub user_id: i64,
    pub filename: &'a str,
    pub result_json: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
}
