#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod config;
pub mod datasets;
pub mod logging;
pub mod srv;

mod error;
pub use error::{DellingError, DellingResult};
