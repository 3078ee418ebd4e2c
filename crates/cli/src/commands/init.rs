use anyhow::{Context, Result};
use spacetraveling_core::config::{ACCESS_TOKEN_ENV, BLOG_TOML, parse_blog_toml_str};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ENDPOINT: &str = "https://your-repo.cdn.prismic.io/api/v2";

/// Escape a string for safe inclusion in a TOML basic string
///
/// The template is written by hand to keep its comments, so values are
/// escaped here instead of going through toml serialization.
///
/// See: https://toml.io/en/v1.0.0#string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Derive a site title from the directory name
fn title_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.replace(['-', '_'], " ").trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "spacetraveling".to_string())
}

/// Generate blog.toml content and check that it parses
fn generate_blog_toml(title: &str, endpoint: &str) -> Result<String> {
    let content = format!(
        r#"# Blog configuration

[site]
title = "{title}"
lang = "pt-BR"

[cms]
# Repository API endpoint of the headless CMS
endpoint = "{endpoint}"
document_type = "posts"
page_size = 5
# access_token = "..."  # or set {env}

[render]
# Regenerate the home page at most once per window (seconds)
revalidate_secs = 3600
"#,
        title = toml_escape_string(title),
        endpoint = toml_escape_string(endpoint),
        env = ACCESS_TOKEN_ENV,
    );

    parse_blog_toml_str(&content).context("Generated blog.toml is invalid")?;

    Ok(content)
}

/// Initialize a new blog directory with a blog.toml template.
///
/// Refuses to overwrite an existing blog.toml.
pub async fn run(path: PathBuf, endpoint: Option<String>) -> Result<()> {
    println!("🚀 Initializing blog at: {}", path.display());

    let config_path = path.join(BLOG_TOML);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists in {}. Remove it first to re-initialize.",
            BLOG_TOML,
            path.display()
        );
    }

    fs::create_dir_all(&path).context("Failed to create blog directory")?;

    let title = title_from_path(&path);
    let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let content = generate_blog_toml(&title, &endpoint)?;
    fs::write(&config_path, content).context("Failed to write blog.toml")?;
    println!("   ✓ Created {}", BLOG_TOML);

    let gitignore = path.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "dist/\n").context("Failed to write .gitignore")?;
        println!("   ✓ Created .gitignore");
    }

    println!();
    println!("✅ Blog initialized!");
    if endpoint == DEFAULT_ENDPOINT {
        println!("   💡 Edit cms.endpoint in {} to point at your repository", BLOG_TOML);
    }
    println!("   Next: spacetraveling preview {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacetraveling_core::config::parse_blog_toml;
    use tempfile::TempDir;

    #[test]
    fn test_toml_escape_string() {
        assert_eq!(toml_escape_string("plain"), "plain");
        assert_eq!(toml_escape_string("a \"quote\""), "a \\\"quote\\\"");
        assert_eq!(toml_escape_string("back\\slash"), "back\\\\slash");
        assert_eq!(toml_escape_string("line\nbreak\ttab"), "line\\nbreak\\ttab");
    }

    #[test]
    fn test_title_from_path() {
        assert_eq!(title_from_path(Path::new("/tmp/my-space_blog")), "my space blog");
        assert_eq!(title_from_path(Path::new("/")), "spacetraveling");
    }

    #[test]
    fn test_generate_blog_toml_with_special_characters() {
        let content =
            generate_blog_toml("Blog \"Espacial\" \\ 2021", "https://x.cdn.prismic.io/api/v2")
                .unwrap();
        let config = parse_blog_toml_str(&content).unwrap();
        assert_eq!(config.site.title, "Blog \"Espacial\" \\ 2021");
        assert_eq!(config.cms.page_size, 5);
    }

    #[test]
    fn test_generate_blog_toml_rejects_bad_endpoint() {
        assert!(generate_blog_toml("Blog", "not-a-url").is_err());
    }

    #[tokio::test]
    async fn test_init_creates_parseable_config() {
        let temp = TempDir::new().unwrap();
        let blog = temp.path().join("space-blog");

        run(blog.clone(), Some("http://localhost:9000/api/v2".to_string()))
            .await
            .unwrap();

        let config = parse_blog_toml(blog.join(BLOG_TOML)).unwrap();
        assert_eq!(config.site.title, "space blog");
        assert_eq!(config.cms.endpoint, "http://localhost:9000/api/v2");
        assert!(blog.join(".gitignore").exists());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(BLOG_TOML), "# mine").unwrap();

        let result = run(temp.path().to_path_buf(), None).await;
        assert!(result.unwrap_err().to_string().contains("already exists"));
        assert_eq!(
            fs::read_to_string(temp.path().join(BLOG_TOML)).unwrap(),
            "# mine"
        );
    }
}
