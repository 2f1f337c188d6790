pub mod activate;
pub mod config;
pub(crate) mod context;
pub mod dispatch;
pub mod fetch;
pub mod install;
pub mod list;
pub mod purge;
pub(crate) mod state;

pub use dispatch::dispatch;
