//! TargetUP - a terminal client for competitive-exam practice
//!
//! Students browse JEE, NEET, SSC and UPSC question banks by exam, subject
//! and chapter, answer with instant feedback, bookmark questions and sit
//! timed mock tests with negative marking. Progress lives in a local file
//! for guests and in the hosted backend once signed in; admins can edit
//! the question bank from the same interface.

pub mod admin;
pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod model;
pub mod progress;
pub mod quiz;
pub mod sync;
pub mod theme;
pub mod ui;

pub use app::App;
pub use config::Config;
pub use theme::Theme;
