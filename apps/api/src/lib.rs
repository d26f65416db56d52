//! Portfolio deployment service: publishes a generated portfolio site to the
//! caller's GitHub account and reports its Pages build.

pub mod auth;
pub mod config;
pub mod controller;
pub mod deploy;
pub mod errors;
pub mod github;
pub mod models;
pub mod routes;
pub mod state;
