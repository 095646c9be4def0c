use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub database: bool,
}
