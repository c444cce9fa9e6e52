//! Sequential QR code labels laid out on printable label sheets.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod labels;
pub mod layout;
pub mod manifest;
pub mod output;
pub mod pdf;
pub mod template;
