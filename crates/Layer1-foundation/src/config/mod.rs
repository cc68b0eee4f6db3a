//! Config - persisted settings model
//!
//! - `settings.rs` - GlobalSettings (threshold, git profile, temp branches)
//! - `doh.rs` - DohConfig document (directories, exclusions)

mod doh;
mod settings;

pub use doh::{
    default_name, DirectoryEntry, DohConfig, ExclusionEntry, CONFIG_VERSION, DOH_CONFIG_FILE,
};
pub use settings::{expand_home, GlobalSettings, DEFAULT_TEMP_BRANCH_PREFIX, DEFAULT_THRESHOLD};
