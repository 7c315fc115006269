//! Find saved web pages (an HTML file plus the resource folder a browser
//! wrote next to it) and pack each pair into a verified 7-Zip archive.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod error;
pub mod logging;
pub mod platform;
pub mod ports;
pub mod services;
