//! Command implementations.

pub mod batch;
pub mod blocks;
pub mod config;
pub mod extract;

pub use self::batch::execute_batch;
pub use self::blocks::execute_blocks;
pub use self::config::execute_config;
pub use self::extract::execute_extract;
