pub mod api;
pub mod client;
pub mod token;

pub use client::{DriveClient, DriveUploadResult};
pub use token::{AccessToken, ServiceAccountCredential};
