//! CLI command implementations.

mod config;
mod create_index;
mod doctor;
mod list;
mod serve;
mod upload;

pub use config::run_config;
pub use create_index::run_create_index;
pub use doctor::run_doctor;
pub use list::{run_list_indexes, run_list_videos};
pub use serve::run_serve;
pub use upload::{run_upload, wait_for_task};
