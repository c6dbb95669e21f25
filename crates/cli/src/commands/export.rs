//! Export posts from a running content backend.
//!
//! Pages through the post list with the same loader the blog index uses and
//! writes one JSON object per line.

use std::io::Write;
use std::path::Path;

use emporium_core::Post;
use emporium_storefront::backend::BackendClient;
use emporium_storefront::listing::{BackendPostSource, InfiniteItems};

/// Filters and paging for an export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub search: Option<String>,
    pub topic: Option<String>,
    pub page_size: u32,
}

/// Write all matching posts, newest first, to `output` (or stdout).
///
/// A page that fails to load ends the export; the posts fetched so far are
/// still written.
///
/// # Errors
///
/// Returns an error if the backend URL is invalid or the output cannot be
/// written.
pub async fn posts(
    api_url: &str,
    options: ExportOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = BackendClient::new(api_url)?;
    let source = BackendPostSource::new(client, options.search)
        .with_topic(options.topic.filter(|t| !t.trim().is_empty()));

    let list = InfiniteItems::with_page_size(source, options.page_size);
    list.reload_items().await;
    while list.load_next_items().await {}
    let posts = list.items().await;

    match output {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            write_json_lines(&mut file, &posts)?;
            file.flush()?;
        }
        None => write_json_lines(&mut std::io::stdout().lock(), &posts)?,
    }

    tracing::info!(count = posts.len(), "Posts exported");
    Ok(())
}

fn write_json_lines(out: &mut impl Write, posts: &[Post]) -> std::io::Result<()> {
    for post in posts {
        serde_json::to_writer(&mut *out, post)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
