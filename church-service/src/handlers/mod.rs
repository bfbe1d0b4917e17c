pub mod auth;
pub mod church_access;
pub mod churches;
pub mod members;
pub mod users;
