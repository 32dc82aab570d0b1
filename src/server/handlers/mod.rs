pub mod auth;
pub mod repos;
pub mod twofa;
pub mod users;
