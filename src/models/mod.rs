pub mod conversation;
pub mod feedback;
pub mod job;
pub mod message;
pub mod user;
