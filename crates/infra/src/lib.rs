//! Infrastructure layer: event storage, account persistence, command execution, config.

pub mod account_repository;
pub mod account_service;
pub mod config;
pub mod event_store;


pub use account_repository::{AccountRepository, LoadedAccount, RepositoryError, decode_event};
pub use account_service::{AccountService, AccountUpdate, DispatchError};
pub use config::{ConfigError, ServiceConfig};
