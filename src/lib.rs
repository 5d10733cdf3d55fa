//! CreatorLink: tracking links, click redirects and attribution stats for creator campaigns

pub mod api;
pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod models;
pub mod redirect;
pub mod registry;
pub mod seed;
pub mod stats;
pub mod storage;
