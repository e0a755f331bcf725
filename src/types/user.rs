use serde::{Deserialize, Serialize};

use super::Gender;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub gender: Gender,
    pub email: String,
    #[serde(rename = "eyeColor")]
    pub eye_color: String,
}

/// One page of users as returned by both the listing and search endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}
