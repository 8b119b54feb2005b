pub mod acquire;
pub mod handlers;
pub mod substitute;
