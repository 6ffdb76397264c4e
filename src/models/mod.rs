pub mod command;
pub mod config;
pub mod error;
pub mod giveaway;
pub mod handler;
pub mod permissions;
pub mod response;
