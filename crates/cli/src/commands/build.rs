use anyhow::{Context, Result};
use spacetraveling_cms::PrismicClient;
use spacetraveling_generator::{GeneratedSite, PreviewContext, generate_site, load_home};
use std::fs;
use std::path::{Path, PathBuf};

/// Build the static home page for deployment
pub async fn run(path: PathBuf, output: PathBuf, preview_ref: Option<String>) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let config = super::load_config(&path)?;

    println!("✓ Loaded: {}", config.site.title);
    println!("  CMS: {}", config.cms.endpoint);
    println!();

    let cms = PrismicClient::from_config(&config.cms).context("Failed to create CMS client")?;
    let preview = preview_ref
        .map(PreviewContext::with_ref)
        .unwrap_or_else(PreviewContext::published);

    // Fetch first page of posts
    println!("📡 Fetching posts...");
    let props = load_home(&cms, &config, &preview).await?;
    let pagination = &props.props.posts_pagination;
    println!("   ✓ {} posts", pagination.results.len());
    if pagination.next_page.is_some() {
        println!("   ✓ More pages available (load more enabled)");
    }
    if preview.enabled {
        println!("   👀 Preview mode");
    }

    // Render
    println!("📄 Generating index.html...");
    let site = generate_site(&config, &props)?;
    let written = write_site(&output, &site)?;
    println!("   ✓ Wrote {} files", written);

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!(
        "   Regenerate within: {}s (see _headers)",
        props.revalidate.as_secs()
    );
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    println!();

    Ok(())
}

/// Write generated pages and assets under `output`, returning the file count
pub fn write_site(output: &Path, site: &GeneratedSite) -> Result<usize> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut written = 0;
    let files = site
        .pages
        .iter()
        .map(|(p, html)| (p, html.as_bytes()))
        .chain(site.assets.iter().map(|(p, data)| (p, data.as_slice())));

    for (relative, data) in files {
        let dst = output.join(relative);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dst, data).with_context(|| format!("Failed to write {}", dst.display()))?;
        written += 1;
    }

    Ok(written)
}
