pub mod post;
pub mod question;
