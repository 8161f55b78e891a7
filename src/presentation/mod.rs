//! Server-rendered views and their askama templates.

pub mod views;
