pub mod action;
pub mod backend;
pub mod config;
pub mod deployment;
pub mod error;
pub mod explorer;
pub mod io;
pub mod memory;
pub mod modal;
pub mod names;
pub mod notification;
pub mod order;
pub mod partition;
pub mod paths;
pub mod selection;
pub mod setting;
pub mod store;
pub mod toast;
pub mod types;

pub use error::{Result, TriggerError};
