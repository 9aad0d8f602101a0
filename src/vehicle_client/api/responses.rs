use serde::Deserialize;

/// Session returned by the bridge after a successful login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
