//! Configuration for orchestration runs
//!
//! Two layers:
//! - `Settings`: per project, from the root package's extension block
//! - `ToolConfig`: per machine, from `~/.config/nodevendor/config.toml`

pub mod settings;
pub mod tool;

pub use settings::{DEFAULT_TARGET_DIR, RuntimeMetadata, Settings};
pub use tool::{DEFAULT_DIST_URL, ToolConfig};
