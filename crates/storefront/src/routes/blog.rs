//! Blog route handlers.
//!
//! The index renders the first page of an [`InfiniteItems`] list; each
//! "load more" request resumes the list after the page the client already has
//! and returns only the next page as a fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use emporium_core::{ImageSize, Post};
use serde::Deserialize;
use tracing::instrument;

use crate::filters::{self, render_optional_markdown};
use crate::layout::Layout;
use crate::listing::{BackendPostSource, InfiniteItems};
use crate::middleware::RequestId;
use crate::routes::pages::backend_error_page;
use crate::state::AppState;
use crate::views::ImageView;

/// Post teaser for listings.
#[derive(Clone)]
pub struct PostCardView {
    pub href: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub image: Option<ImageView>,
    pub date: Option<String>,
    pub reading_time: Option<String>,
}

impl PostCardView {
    fn new(post: &Post, media_base: &str) -> Self {
        Self {
            href: format!("/blog/{}", post.identifier),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            description: post.description.clone(),
            topic: post.topic.clone().filter(|t| !t.is_empty()),
            image: ImageView::from_option(post.image.as_ref(), ImageSize::Small, media_base),
            date: post.created_at.map(|d| d.format("%B %-d, %Y").to_string()),
            reading_time: reading_time(post),
        }
    }
}

/// Author box under a post.
#[derive(Clone)]
pub struct AuthorView {
    pub name: String,
    pub image: Option<ImageView>,
    pub description: Option<String>,
    pub twitter: Option<String>,
}

/// Topic link back to the filtered index.
#[derive(Clone)]
pub struct TopicView {
    pub name: String,
    pub href: String,
}

/// Full post view.
#[derive(Clone)]
pub struct PostDetailView {
    pub title: String,
    pub subtitle: Option<String>,
    pub topic: Option<TopicView>,
    pub image: Option<ImageView>,
    pub date: Option<String>,
    pub reading_time: Option<String>,
    /// Rendered Markdown
    pub content: String,
    pub author: Option<AuthorView>,
}

impl PostDetailView {
    fn new(post: &Post, media_base: &str) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            topic: post
                .topic
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|name| TopicView {
                    name: name.to_owned(),
                    href: format!("/blog?topic={}", urlencoding::encode(name)),
                }),
            image: ImageView::from_option(post.image.as_ref(), ImageSize::Large, media_base),
            date: post.created_at.map(|d| d.format("%B %-d, %Y").to_string()),
            reading_time: reading_time(post),
            content: render_optional_markdown(post.content.as_deref()),
            author: post.author.as_ref().map(|author| AuthorView {
                name: author.name.clone(),
                image: ImageView::from_option(author.image.as_ref(), ImageSize::Thumbnail, media_base),
                description: author.description.clone(),
                twitter: author
                    .twitter
                    .as_deref()
                    .map(|handle| {
                        handle
                            .chars()
                            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                            .collect::<String>()
                    })
                    .filter(|handle| !handle.is_empty()),
            }),
        }
    }
}

fn reading_time(post: &Post) -> Option<String> {
    post.duration
        .filter(|minutes| *minutes > 0)
        .map(|minutes| format!("{minutes} min read"))
}

/// Filters shared by the index and the "load more" fragment.
#[derive(Debug, Default, Deserialize)]
pub struct BlogParams {
    pub q: Option<String>,
    pub topic: Option<String>,
}

/// "Load more" parameters: the page to fetch plus the index filters.
#[derive(Debug, Deserialize)]
pub struct BlogItemsParams {
    pub page: u32,
    pub q: Option<String>,
    pub topic: Option<String>,
}

/// Link that fetches the page after the rendered ones.
#[derive(Clone)]
pub struct MoreView {
    pub href: String,
}

impl MoreView {
    fn after(page: u32, q: Option<&str>, topic: Option<&str>) -> Self {
        let mut href = format!("/blog/items?page={}", page.saturating_add(1));
        if let Some(q) = q.filter(|q| !q.is_empty()) {
            href.push_str("&q=");
            href.push_str(&urlencoding::encode(q));
        }
        if let Some(topic) = topic.filter(|t| !t.is_empty()) {
            href.push_str("&topic=");
            href.push_str(&urlencoding::encode(topic));
        }
        Self { href }
    }
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub layout: Layout,
    pub posts: Vec<PostCardView>,
    pub more: Option<MoreView>,
    pub search: String,
    /// Total hits, shown for searches only
    pub result_count: Option<u64>,
}

/// Next page of posts (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "blog/items.html")]
pub struct BlogItemsTemplate {
    pub posts: Vec<PostCardView>,
    pub more: Option<MoreView>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub layout: Layout,
    pub post: PostDetailView,
}

fn post_source(state: &AppState, q: Option<String>, topic: Option<String>) -> BackendPostSource {
    BackendPostSource::new(state.backend().clone(), q)
        .with_topic(topic.filter(|t| !t.trim().is_empty()))
}

/// Display the first page of posts, optionally filtered by search and topic.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<BlogParams>,
    layout: Layout,
) -> impl IntoResponse {
    let source = post_source(&state, params.q.clone(), params.topic.clone());
    let search = source.search().map(str::to_owned);
    let list = InfiniteItems::with_page_size(source, state.config().page_size);
    list.reload_items().await;
    let snapshot = list.snapshot().await;

    let result_count = match search.as_deref() {
        Some(q) => {
            let query = emporium_core::PostQuery {
                q: Some(q.to_owned()),
                topic: params.topic.clone(),
                ..emporium_core::PostQuery::default()
            };
            state
                .backend()
                .count_posts(&query)
                .await
                .inspect_err(|e| tracing::warn!(error = e.message(), "Failed to count posts"))
                .ok()
        }
        None => None,
    };

    let media_base = &state.config().api_url;
    BlogIndexTemplate {
        layout: layout.titled(Some("Blog")),
        posts: snapshot
            .items
            .iter()
            .map(|post| PostCardView::new(post, media_base))
            .collect(),
        more: (!snapshot.page_limit_reached).then(|| {
            MoreView::after(snapshot.page, search.as_deref(), params.topic.as_deref())
        }),
        search: search.unwrap_or_default(),
        result_count,
    }
}

/// Fetch page `page` of the list (HTMX "load more").
#[instrument(skip(state))]
pub async fn items(
    State(state): State<AppState>,
    Query(params): Query<BlogItemsParams>,
) -> impl IntoResponse {
    let source = post_source(&state, params.q.clone(), params.topic.clone());
    let list = match params.page.checked_sub(1) {
        Some(previous) => {
            let list = InfiniteItems::resume_after(source, state.config().page_size, previous);
            list.load_next_items().await;
            list
        }
        None => {
            let list = InfiniteItems::with_page_size(source, state.config().page_size);
            list.reload_items().await;
            list
        }
    };
    let snapshot = list.snapshot().await;

    let media_base = &state.config().api_url;
    BlogItemsTemplate {
        posts: snapshot
            .items
            .iter()
            .map(|post| PostCardView::new(post, media_base))
            .collect(),
        more: (!snapshot.page_limit_reached).then(|| {
            MoreView::after(snapshot.page, params.q.as_deref(), params.topic.as_deref())
        }),
    }
}

/// Display a single post.
#[instrument(skip(state, layout, request_id))]
pub async fn show(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    layout: Layout,
    RequestId(request_id): RequestId,
) -> Response {
    let post = match state.backend().get_post(&identifier).await {
        Ok(post) => post,
        Err(e) => return backend_error_page(layout, &e, request_id),
    };

    BlogShowTemplate {
        layout: layout
            .titled(Some(&post.title))
            .described(post.description.as_deref(), post.keywords.as_deref()),
        post: PostDetailView::new(&post, &state.config().api_url),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_more_link_keeps_filters() {
        assert_eq!(MoreView::after(0, None, None).href, "/blog/items?page=1");
        assert_eq!(
            MoreView::after(2, Some("rust async"), Some("news")).href,
            "/blog/items?page=3&q=rust%20async&topic=news"
        );
    }

    #[test]
    fn test_reading_time() {
        let mut post: Post = serde_json::from_value(serde_json::json!({
            "id": 1,
            "identifier": "hello-1",
            "title": "Hello"
        }))
        .unwrap();
        assert_eq!(reading_time(&post), None);
        post.duration = Some(4);
        assert_eq!(reading_time(&post).as_deref(), Some("4 min read"));

        let card = PostCardView::new(&post, "http://cms.test");
        assert_eq!(card.href, "/blog/hello-1");
    }
}
