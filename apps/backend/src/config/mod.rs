pub mod profile;

pub use profile::{config_dir, Config, Profile, ProfileConfig};
