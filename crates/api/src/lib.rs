//! HTTP API: session resolution, request scoping and response framing around
//! the authorization core.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod keys;
pub mod limiter;
pub mod mailer;
pub mod middleware;
