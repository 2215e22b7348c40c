//! Stage 1: collect headline articles for every requested category.
//!
//! Categories are dispatched in request order and run concurrently up to
//! `scraping.concurrency`. Every request, including retries, first waits on a
//! shared [`RequestSpacer`] so the source sees at most one request per
//! `request_delay`. A category that exhausts its retries becomes a failed
//! [`CategoryResult`]; it never aborts the other categories.

use crate::category::Category;
use crate::config::ScrapingConfig;
use crate::error::Result;
use crate::models::{Article, CategoryResult};
use crate::pipeline::within_deadline;
use crate::retry::RetryPolicy;
use crate::scrapers::naver::parse_headlines;
use crate::scrapers::{FetchHtml, RequestSpacer};
use chrono::Local;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, instrument};

/// Collect every category, returning exactly one result per category in
/// `categories` order.
#[instrument(level = "info", skip_all, fields(categories = categories.len()))]
pub async fn collect<F: FetchHtml>(
    fetcher: &F,
    categories: &[Category],
    config: &ScrapingConfig,
    deadline: Option<tokio::time::Instant>,
) -> Vec<CategoryResult> {
    let t0 = Instant::now();
    let spacer = RequestSpacer::new(config.request_delay());
    let policy = config.retry_policy();
    let spacer = &spacer;
    let policy = &policy;

    let mut results: Vec<CategoryResult> = stream::iter(categories.iter().copied())
        .map(|category| async move {
            let unit = collect_category(fetcher, spacer, policy, category, config.max_articles_per_category);
            match within_deadline(deadline, &format!("collection of {}", category), unit).await {
                Ok(articles) => CategoryResult::collected(category, articles),
                Err(e) => {
                    error!(%category, error = %e, "Collection failed");
                    CategoryResult::failed(category, format!("collection failed for {}: {}", category, e))
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|r| categories.iter().position(|c| *c == r.category));

    info!(
        total_articles = results.iter().map(CategoryResult::article_count).sum::<usize>(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Collection stage finished"
    );
    results
}

#[instrument(level = "info", skip(fetcher, spacer, policy))]
async fn collect_category<F: FetchHtml>(
    fetcher: &F,
    spacer: &RequestSpacer,
    policy: &RetryPolicy,
    category: Category,
    max_articles: usize,
) -> Result<Vec<Article>> {
    let url = category.section_url();
    let label = format!("collect {}", category);
    let articles = policy
        .run(&label, || async {
            spacer.wait().await;
            let html = fetcher.fetch(&url).await?;
            parse_headlines(&html, category, max_articles, Local::now())
        })
        .await?;
    info!(%category, count = articles.len(), "Collected category");
    Ok(articles)
}
