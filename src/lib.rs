//! DUODRIVEN marketing site, blog reader and automation-facing content API.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
