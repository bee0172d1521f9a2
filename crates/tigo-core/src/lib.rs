pub mod env;
pub mod error;
pub mod health;
pub mod installer;
pub mod io;
pub mod lifecycle;
pub mod npm;
pub mod pack;
pub mod paths;
pub mod process;
pub mod rc;
pub mod registry;
pub mod scaffold;
pub mod store;
pub mod user_config;
pub mod version;

pub use error::{Result, TigoError};
