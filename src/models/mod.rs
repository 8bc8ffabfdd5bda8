mod post;
mod user;

pub use post::{FileType, Post};
pub use user::User;
