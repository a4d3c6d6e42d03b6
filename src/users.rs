//! User resources. The backend serves these as flat JSON without an envelope.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{ApiClient, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// `GET /users`
pub async fn get_users(client: &ApiClient) -> Result<Vec<User>> {
    client.get("/users").await.map_err(|err| {
        error!(error = %err, "get_users failed");
        err
    })
}

/// `GET /users/{id}`
pub async fn get_user(client: &ApiClient, id: u64) -> Result<User> {
    client.get(&format!("/users/{id}")).await.map_err(|err| {
        error!(id, error = %err, "get_user failed");
        err
    })
}
