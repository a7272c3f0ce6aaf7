//! Recipe management REST API
//!
//! Users sign up with an email address, obtain a token and manage their own
//! tags, ingredients and recipes. Every owned row is invisible to other users.

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;
