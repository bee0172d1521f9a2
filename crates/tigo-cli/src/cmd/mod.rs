pub mod add;
pub mod config;
pub mod init;
pub mod rc;
pub mod remove;
pub mod server;
pub mod show;
pub mod upgrade;
