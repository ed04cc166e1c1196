pub mod app_command;
pub mod backend;
pub mod detail;
pub mod document;

pub use app_command::{AppCommand, DocOwner, FilterField, PageMove, TabTarget};
