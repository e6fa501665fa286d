pub mod env;

mod error;
pub use error::{ConfigFileError, ConfigFileResult};

mod hooks;
pub use hooks::*;

pub mod html;
pub mod srv;

mod main;
pub use main::*;
