//! Library exports for the URL shortener application
//!
//! This module exposes internal components for testing and potential library usage.

pub mod analytics;
pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod handler;
pub mod model;
pub mod resolver;
pub mod route;
pub mod service;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod validator;
