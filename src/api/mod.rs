pub mod leave_request;
pub mod profile;
