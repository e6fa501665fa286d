#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod config;
pub mod endpoints;
pub mod logging;
pub mod negotiate;
pub mod srv;
pub mod templates;

mod utils;
pub use utils::{StacHtmlError, StacHtmlResult};
