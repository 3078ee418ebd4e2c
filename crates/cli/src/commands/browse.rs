use anyhow::{Context, Result};
use spacetraveling_cms::{CmsClient, PrismicClient};
use spacetraveling_core::Post;
use spacetraveling_generator::pagination::{LoadOutcome, PostList, load_more};
use spacetraveling_generator::{PreviewContext, load_home};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Failed loads in a row before browsing gives up
const MAX_FAILED_LOADS: usize = 3;

/// Prompt and read one answer; `None` once the input is closed
fn read_answer<R: BufRead>(input: &mut R, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(None);
    }
    Ok(Some(answer.trim().to_string()))
}

fn wants_more(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "" | "s" | "sim" | "y" | "yes")
}

/// One post as a terminal entry
fn format_post(index: usize, post: &Post) -> String {
    let href = post.href().unwrap_or_else(|| "(sem uid)".to_string());
    let published = post.first_publication_date.as_deref().unwrap_or("--");

    format!(
        "{:>3}. {}\n     {}\n     📅 {}  👤 {}  {}",
        index + 1,
        post.data.title,
        post.data.subtitle,
        published,
        post.data.author,
        href
    )
}

fn print_from(list: &Mutex<PostList>, start: usize) -> usize {
    let guard = match list.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    for (i, post) in guard.posts().iter().enumerate().skip(start) {
        println!("{}", format_post(i, post));
    }
    guard.len()
}

fn has_more(list: &Mutex<PostList>) -> bool {
    match list.lock() {
        Ok(guard) => guard.has_more(),
        Err(poisoned) => poisoned.into_inner().has_more(),
    }
}

/// Print the list and load further pages until the cursor runs out, the
/// reader declines or closes, or loads keep failing. Returns the posts shown.
async fn page_through<C, R>(list: &Mutex<PostList>, cms: &C, input: &mut R, all: bool) -> Result<usize>
where
    C: CmsClient + ?Sized,
    R: BufRead,
{
    let mut shown = print_from(list, 0);
    let mut failures = 0;

    while has_more(list) {
        if !all {
            println!();
            match read_answer(input, "Carregar mais posts? [S/n] ")? {
                Some(answer) if wants_more(&answer) => {}
                _ => return Ok(shown),
            }
        }

        match load_more(list, cms).await {
            LoadOutcome::Appended { .. } => {
                failures = 0;
                shown = print_from(list, shown);
            }
            LoadOutcome::Failed { reason } => {
                failures += 1;
                if all || failures >= MAX_FAILED_LOADS {
                    anyhow::bail!("Failed to load more posts: {}", reason);
                }
                eprintln!("   ⚠ Não foi possível carregar mais posts: {}", reason);
            }
            LoadOutcome::Refused(refused) => {
                tracing::debug!(%refused, "Load more refused.");
                break;
            }
            LoadOutcome::Stale => {}
        }
    }

    println!();
    println!("✓ {} posts, fim da lista", shown);

    Ok(shown)
}

/// List the published posts, loading further pages on demand
pub async fn run(path: PathBuf, all: bool) -> Result<()> {
    let config = super::load_config(&path)?;
    let cms = PrismicClient::from_config(&config.cms).context("Failed to create CMS client")?;

    println!("📡 {} ({})", config.site.title, config.cms.endpoint);
    println!();

    let props = load_home(&cms, &config, &PreviewContext::published()).await?;
    let list = Mutex::new(PostList::from_pagination(props.props.posts_pagination));

    let stdin = io::stdin();
    page_through(&list, &cms, &mut stdin.lock(), all).await?;

    Ok(())
}
