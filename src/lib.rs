//! FocusHub - a community platform for ADHD support
//!
//! This library provides the core functionality for FocusHub: the resource
//! library, the tool directory with reviews, and the community forums.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
