//! Pipeline driver: Collect → Summarize → Format.
//!
//! The driver owns the [`RunState`]. Each stage runs its categories
//! concurrently and hands back per-category outputs; the driver waits for the
//! whole stage, then merges those outputs before starting the next stage.

use crate::api::AskAsync;
use crate::collector;
use crate::config::PipelineConfig;
use crate::error::{NewsError, Result};
use crate::formatter::{self, ReportOptions};
use crate::models::{CategoryResult, CategoryStatus, RunState, RunStatistics};
use crate::scrapers::FetchHtml;
use crate::summarizer::{self, SummaryUpdate};
use chrono::Local;
use std::future::Future;
use std::time::Instant;
use tokio::time::timeout_at;
use tracing::{info, instrument, warn};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub stats: RunStatistics,
    /// Every requested category ended in [`CategoryStatus::Success`].
    pub success: bool,
}

/// Bound `unit` by the run deadline.
///
/// A unit that has not started by the deadline is cancelled without being
/// polled; one still running when it passes is dropped.
pub async fn within_deadline<T, Fut>(
    deadline: Option<tokio::time::Instant>,
    what: &str,
    unit: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let Some(deadline) = deadline else {
        return unit.await;
    };
    if tokio::time::Instant::now() >= deadline {
        return Err(NewsError::Cancelled(format!(
            "{} was not started before the run deadline",
            what
        )));
    }
    match timeout_at(deadline, unit).await {
        Ok(result) => result,
        Err(_) => Err(NewsError::Cancelled(format!(
            "{} did not finish before the run deadline",
            what
        ))),
    }
}

fn merge_collected(state: &mut RunState, collected: Vec<CategoryResult>) {
    for result in collected {
        if let Some(error) = &result.error {
            state.errors.push(error.clone());
        }
        state.results.insert(result.category, result);
    }
}

fn merge_summaries(state: &mut RunState, updates: Vec<SummaryUpdate>) {
    for update in updates {
        let Some(result) = state.results.get_mut(&update.category) else {
            continue;
        };
        match update.outcome {
            Ok(summary) => result.summary_text = summary,
            Err(e) => {
                let message = format!("summary failed for {}: {}", update.category, e);
                result.status = if matches!(e, NewsError::Cancelled(_)) {
                    CategoryStatus::Failed
                } else {
                    CategoryStatus::Partial
                };
                result.error = Some(message.clone());
                state.errors.push(message);
            }
        }
    }
}

/// Run the three stages against `fetcher` and `client`.
///
/// Per-category failures are folded into the returned state; this never
/// fails once it has started.
#[instrument(level = "info", skip_all, fields(categories = config.categories.len()))]
pub async fn run_pipeline<F, C>(config: &PipelineConfig, fetcher: &F, client: &C) -> RunOutcome
where
    F: FetchHtml,
    C: AskAsync,
{
    let mut state = RunState::new(config.categories.clone(), Local::now());
    let deadline = config
        .run_timeout()
        .map(|limit| tokio::time::Instant::now() + limit);
    info!(
        requested = ?state.requested.iter().map(|c| c.name()).collect::<Vec<_>>(),
        deadline_secs = ?config.run_timeout_secs,
        "Pipeline starting"
    );

    let t0 = Instant::now();
    let collected = collector::collect(fetcher, &state.requested, &config.scraping, deadline).await;
    merge_collected(&mut state, collected);
    state.timings.collection_secs = t0.elapsed().as_secs_f64();

    let t1 = Instant::now();
    let updates = summarizer::summarize(client, &state.requested, &state.results, &config.llm, deadline).await;
    merge_summaries(&mut state, updates);
    state.timings.summarization_secs = t1.elapsed().as_secs_f64();

    let t2 = Instant::now();
    let (report, _) = formatter::format_report(&state, &ReportOptions::from(&config.output));
    state.final_report = report;
    state.timings.formatting_secs = t2.elapsed().as_secs_f64();
    state.finished_at = Some(Local::now());

    let stats = formatter::compute_statistics(&state);
    let success = state.is_fully_successful();
    if success {
        info!(
            total_articles = stats.total_articles,
            elapsed_secs = stats.timings.total_secs(),
            "Pipeline finished"
        );
    } else {
        warn!(
            succeeded = stats.succeeded,
            partial = stats.partial,
            failed = stats.failed,
            errors = state.errors.len(),
            "Pipeline finished with degraded categories"
        );
    }

    RunOutcome {
        state,
        stats,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::testing::{FakeLlm, FakeSource, fast_pipeline_config};
    use std::time::Duration;

    #[tokio::test]
    async fn test_single_category_happy_path() {
        let source = FakeSource::new().with_headlines(Category::Politics, 2);
        let llm = FakeLlm::new();
        let config = fast_pipeline_config(&[Category::Politics]);

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(outcome.success);
        assert_eq!(outcome.state.results.len(), 1);

        let politics = &outcome.state.results[&Category::Politics];
        assert_eq!(politics.status, CategoryStatus::Success);
        assert_eq!(politics.article_count(), 2);
        assert_eq!(politics.summary_text.matches("**정치 헤드라인").count(), 2);

        let report = &outcome.state.final_report;
        assert_eq!(report.matches("## 🏛️ 정치").count(), 1);
        assert!(report.contains("## 🏛️ 정치\n\n### 주요 뉴스"));
        assert!(outcome.state.errors.is_empty());
        assert!(outcome.state.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_collection_failure_is_isolated() {
        let source = FakeSource::new()
            .with_headlines(Category::Politics, 3)
            .with_failure(Category::Economy, || {
                NewsError::Network("https://news.naver.com/section/101 returned 503".into())
            });
        let llm = FakeLlm::new();
        let config = fast_pipeline_config(&[Category::Politics, Category::Economy]);

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(!outcome.success);
        assert_eq!(source.fetches_for(Category::Economy), 3);
        assert_eq!(llm.calls_for(Category::Economy), 0);

        let economy = &outcome.state.results[&Category::Economy];
        assert_eq!(economy.status, CategoryStatus::Failed);
        assert!(economy.articles.is_empty());

        let politics = &outcome.state.results[&Category::Politics];
        assert_eq!(politics.status, CategoryStatus::Success);
        assert!(!politics.summary_text.is_empty());

        assert_eq!(outcome.state.errors.len(), 1);
        let report = &outcome.state.final_report;
        assert!(report.contains("## 🏛️ 정치"));
        assert!(report.contains("## 💰 경제\n\n⚠️ **알림**"));
        assert_eq!(outcome.stats.failed, 1);
    }

    #[tokio::test]
    async fn test_empty_category_skips_llm() {
        let source = FakeSource::new()
            .with_headlines(Category::World, 0)
            .with_headlines(Category::Society, 2);
        let llm = FakeLlm::new();
        let config = fast_pipeline_config(&[Category::World, Category::Society]);

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(outcome.success);
        assert_eq!(llm.calls_for(Category::World), 0);
        assert_eq!(llm.calls_for(Category::Society), 1);

        let world = &outcome.state.results[&Category::World];
        assert_eq!(world.status, CategoryStatus::Success);
        assert!(world.summary_text.is_empty());
        assert!(
            outcome
                .state
                .final_report
                .contains("## 🌍 세계\n\n📭 **알림**: 이 카테고리에서 수집된 기사가 없습니다.")
        );
    }

    #[tokio::test]
    async fn test_summary_failure_degrades_to_partial() {
        let source = FakeSource::new()
            .with_headlines(Category::Politics, 2)
            .with_headlines(Category::TechScience, 3);
        let llm = FakeLlm::new().failing(Category::TechScience);
        let config = fast_pipeline_config(&[Category::Politics, Category::TechScience]);

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(!outcome.success);
        assert_eq!(llm.calls_for(Category::TechScience), 3);
        assert_eq!(source.fetches_for(Category::TechScience), 1);

        let tech = &outcome.state.results[&Category::TechScience];
        assert_eq!(tech.status, CategoryStatus::Partial);
        assert_eq!(tech.article_count(), 3);
        assert!(tech.error.as_deref().unwrap().starts_with("summary failed for IT/과학"));

        let report = &outcome.state.final_report;
        assert!(!report.is_empty());
        assert!(report.contains("## 🏛️ 정치\n\n### 주요 뉴스"));
        assert!(report.contains("- 수집된 기사: 3개"));
        assert!(report.contains("[IT/과학 헤드라인 3]"));
        assert_eq!(outcome.stats.partial, 1);
    }

    #[tokio::test]
    async fn test_repeated_category_runs_once() {
        let source = FakeSource::new().with_headlines(Category::Politics, 2);
        let llm = FakeLlm::new();
        let mut config = fast_pipeline_config(&[]);
        config.categories = PipelineConfig::from_yaml("categories: [\"정치\", \"정치\"]")
            .unwrap()
            .categories;

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(outcome.success);
        assert_eq!(outcome.state.requested, vec![Category::Politics]);
        assert_eq!(source.fetches_for(Category::Politics), 1);
        assert_eq!(llm.calls_for(Category::Politics), 1);
        assert_eq!(outcome.stats.categories_requested, 1);
        assert!(outcome.state.final_report.contains("- **성공률**: 100.0%"));
    }

    #[tokio::test]
    async fn test_every_category_gets_exactly_one_result() {
        let mut source = FakeSource::new();
        for (i, category) in Category::ALL.iter().enumerate() {
            source = source.with_headlines(*category, i);
        }
        let llm = FakeLlm::new();
        let config = fast_pipeline_config(&Category::ALL);

        let outcome = run_pipeline(&config, &source, &llm).await;
        assert_eq!(outcome.state.results.len(), Category::ALL.len());
        for category in Category::ALL {
            assert_eq!(outcome.state.results[&category].category, category);
        }
        assert_eq!(outcome.stats.total_articles, (0..6).sum::<usize>());
        assert_eq!(llm.total_calls(), 5);
    }

    #[tokio::test]
    async fn test_deadline_cancels_unfinished_work_and_keeps_completed() {
        let source = FakeSource::new()
            .with_headlines(Category::Politics, 2)
            .with_slow(Category::Economy, Duration::from_secs(5), 2);
        let llm = FakeLlm::new();
        let mut config = fast_pipeline_config(&[Category::Politics, Category::Economy]);
        config.run_timeout_secs = Some(1);

        let t0 = Instant::now();
        let outcome = run_pipeline(&config, &source, &llm).await;
        assert!(t0.elapsed() < Duration::from_secs(4));
        assert!(!outcome.success);

        let economy = &outcome.state.results[&Category::Economy];
        assert_eq!(economy.status, CategoryStatus::Failed);
        assert!(economy.error.as_deref().unwrap().contains("cancelled"));

        let politics = &outcome.state.results[&Category::Politics];
        assert_eq!(politics.article_count(), 2);
        assert!(outcome.state.final_report.contains("## 💰 경제"));
    }

    #[tokio::test]
    async fn test_slow_summary_is_cancelled_as_failed() {
        let source = FakeSource::new().with_headlines(Category::LifeCulture, 2);
        let llm = FakeLlm::new().with_delay(Duration::from_secs(5));
        let mut config = fast_pipeline_config(&[Category::LifeCulture]);
        config.run_timeout_secs = Some(1);

        let outcome = run_pipeline(&config, &source, &llm).await;
        let life = &outcome.state.results[&Category::LifeCulture];
        assert_eq!(life.status, CategoryStatus::Failed);
        assert_eq!(life.article_count(), 2);
        assert!(life.error.as_deref().unwrap().contains("deadline"));
        assert!(outcome.state.final_report.contains("[생활/문화 헤드라인 1]"));
    }

    #[tokio::test]
    async fn test_within_deadline_without_deadline_just_awaits() {
        let value = within_deadline(None, "noop", async { Ok::<_, NewsError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_within_deadline_expired_does_not_poll() {
        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = within_deadline(Some(tokio::time::Instant::now()), "late", async {
            polled.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, NewsError>(())
        })
        .await;
        assert!(matches!(result, Err(NewsError::Cancelled(_))));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }
}
