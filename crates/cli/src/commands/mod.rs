pub mod browse;
pub mod build;
pub mod init;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use spacetraveling_core::BlogConfig;
use spacetraveling_core::config::{BLOG_TOML, parse_blog_toml};
use std::path::Path;

/// Load blog.toml from a blog directory with a helpful error when missing
pub fn load_config(path: &Path) -> Result<BlogConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Blog directory does not exist: {}\nRun 'spacetraveling init {}' first",
            path.display(),
            path.display()
        );
    }

    let config_path = path.join(BLOG_TOML);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'spacetraveling init {}' first",
            BLOG_TOML,
            path.display(),
            path.display()
        );
    }

    parse_blog_toml(&config_path).with_context(|| format!("Failed to parse {}", BLOG_TOML))
}
