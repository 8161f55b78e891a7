//! Application services layer.

pub mod blog;
pub mod chat;
pub mod contact;
pub mod error;
pub mod gateways;
pub mod newsletter;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod repos;
pub mod scheduler;
pub mod sitemap;
pub mod stats;
pub mod syndication;
