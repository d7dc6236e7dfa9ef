pub mod channel;
pub mod post;
pub mod reaction;
pub mod user;
