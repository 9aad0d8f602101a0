mod queries;
mod responses;

pub use queries::{LoginRequest, StatusQuery};
pub use responses::LoginResponse;
