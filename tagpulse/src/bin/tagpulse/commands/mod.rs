pub mod analytics;
pub mod comment;
pub mod engagement;
pub mod feed;
pub mod post;
pub mod seed;
pub mod user;
