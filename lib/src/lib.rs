//! Protocol core for the maintenance portal: a minimal SMTP submission
//! client over implicit TLS, MIME message construction, defect
//! notification rendering, and a Google Drive upload client backed by
//! service-account JWT authentication.

pub mod config;
pub mod drive;
pub mod email;
pub mod error;
pub mod notify;
pub mod smtp;

pub use crate::config::Config;
pub use crate::error::Error;
