pub mod hire_profile;
pub mod leave_request;
pub mod role;
pub mod user;
