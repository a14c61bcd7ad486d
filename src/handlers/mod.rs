pub mod admin;
pub mod appeal;
pub mod auth;
pub mod comment;
pub mod follow;
pub mod like;
pub mod notification;
pub mod report;
pub mod sport;
pub mod stats;
pub mod upload;
pub mod user;
pub mod workout;

pub use auth::*;
