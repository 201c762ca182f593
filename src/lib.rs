//! Host metrics sampling with ranked per-process views and a terminal dashboard.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod widgets;
