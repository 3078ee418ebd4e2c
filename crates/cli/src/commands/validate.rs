use anyhow::{Context, Result};
use spacetraveling_cms::PrismicClient;
use spacetraveling_generator::{PreviewContext, load_home};
use std::path::PathBuf;

pub async fn run(path: PathBuf, online: bool) -> Result<()> {
    println!("Validating blog at: {}", path.display());

    let config = super::load_config(&path)?;

    println!("✓ blog.toml valid");
    println!("  Site: {} ({})", config.site.title, config.site.lang);
    println!("  CMS: {}", config.cms.endpoint);
    println!(
        "  Query: type '{}', {} per page",
        config.cms.document_type, config.cms.page_size
    );
    println!("  Revalidate: every {}s", config.render.revalidate_secs);
    if config.cms.access_token.is_none() {
        println!("  ℹ️  No access token (set PRISMIC_ACCESS_TOKEN for private repositories)");
    }

    if !online {
        return Ok(());
    }

    println!();
    println!("📡 Checking CMS...");
    let cms = PrismicClient::from_config(&config.cms).context("Failed to create CMS client")?;
    let master = cms.master_ref().await.context("Failed to resolve master ref")?;
    println!("   ✓ Master ref: {}", master);

    let props = load_home(&cms, &config, &PreviewContext::published()).await?;
    let results = &props.props.posts_pagination.results;
    println!("   ✓ First page: {} posts", results.len());

    let unlinkable = results.iter().filter(|p| p.href().is_none()).count();
    if unlinkable > 0 {
        println!("   ⚠ {} posts have no uid and cannot be linked", unlinkable);
    }

    Ok(())
}
