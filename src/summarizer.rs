//! Stage 2: turn each category's headlines into a Korean digest.
//!
//! Only categories that collected at least one article are sent to the model.
//! Each category gets one prompt built from its articles; retries re-send that
//! same prompt and never go back to the source.

use crate::api::AskAsync;
use crate::category::Category;
use crate::config::LlmConfig;
use crate::error::Result;
use crate::models::{Article, CategoryResult};
use crate::pipeline::within_deadline;
use crate::retry::RetryPolicy;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub const SYSTEM_PROMPT: &str = "당신은 전문적인 한국 뉴스 에디터입니다.
다음 역할을 수행해야 합니다:

1. 주어진 뉴스 목록을 분석하여 가장 중요한 뉴스 3-5개를 선별
2. 각 뉴스의 핵심 내용을 명확하고 간결하게 요약
3. 전체적인 트렌드와 시사점을 파악하여 '오늘의 포인트' 제시
4. 한국 독자들이 이해하기 쉬운 언어와 표현 사용
5. 객관적이고 균형잡힌 시각으로 정보 전달

출력 형식을 정확히 지켜주세요.";

pub const MAIN_NEWS_HEADING: &str = "### 주요 뉴스";
pub const TAKEAWAYS_HEADING: &str = "### 오늘의 포인트";

/// Summary produced (or not) for one category.
#[derive(Debug)]
pub struct SummaryUpdate {
    pub category: Category,
    pub outcome: Result<String>,
}

/// Build the user prompt for one category.
pub fn build_prompt(category: Category, articles: &[Article]) -> String {
    let mut listing = String::new();
    for (i, article) in articles.iter().enumerate() {
        writeln!(listing, "{}. 제목: {}", i + 1, article.title).unwrap();
        if let Some(summary) = article.summary.as_deref().filter(|s| !s.is_empty()) {
            writeln!(listing, "   요약: {}", summary).unwrap();
        }
        writeln!(listing, "   링크: {}\n", article.url).unwrap();
    }

    format!(
        "카테고리: {glyph} {name}

{guidance}

뉴스 목록:
{listing}
다음 형식으로 정확히 출력해주세요:

{main}

1. **[첫 번째 중요 뉴스 제목]**
   - 핵심 내용을 2-3문장으로 명확하게 요약
   - 배경과 의미를 포함하여 설명

2. **[두 번째 중요 뉴스 제목]**
   - 핵심 내용을 2-3문장으로 명확하게 요약
   - 배경과 의미를 포함하여 설명

[3-5개 뉴스까지 동일한 형식으로 계속]

{takeaways}

- {name} 분야의 주요 트렌드나 중요한 시사점을 3-4개 항목으로 정리
- 각 항목은 한 문장으로 간결하게 표현
- 전체적인 흐름과 의미를 파악할 수 있도록 구성

중요: 마크다운 형식을 정확히 지키고, 한국어로만 작성해주세요.",
        glyph = category.glyph(),
        name = category.name(),
        guidance = category.guidance(),
        listing = listing,
        main = MAIN_NEWS_HEADING,
        takeaways = TAKEAWAYS_HEADING,
    )
}

/// Structural sanity check on a model reply. Returns `(passed, total)`.
pub fn quality_checks(summary: &str) -> (usize, usize) {
    let checks = [
        summary.chars().count() >= 100,
        summary.contains(MAIN_NEWS_HEADING),
        summary.contains(TAKEAWAYS_HEADING),
        summary.matches("**").count() >= 2,
        summary.lines().count() >= 5,
    ];
    (checks.iter().filter(|ok| **ok).count(), checks.len())
}

/// At least 80% of [`quality_checks`] pass.
pub fn looks_well_formed(summary: &str) -> bool {
    let (passed, total) = quality_checks(summary);
    passed * 5 >= total * 4
}

/// Summarize every result that collected articles.
///
/// Results that failed collection or found nothing are skipped and produce no
/// update. Updates come back in category order.
#[instrument(level = "info", skip_all, fields(model = %config.model))]
pub async fn summarize<C: AskAsync>(
    client: &C,
    requested: &[Category],
    results: &BTreeMap<Category, CategoryResult>,
    config: &LlmConfig,
    deadline: Option<tokio::time::Instant>,
) -> Vec<SummaryUpdate> {
    let t0 = Instant::now();
    let policy = config.retry_policy();
    let policy = &policy;

    // Units start in request order; the output is sorted afterwards.
    let pending: Vec<&CategoryResult> = requested
        .iter()
        .filter_map(|c| results.get(c))
        .filter(|r| r.needs_summary())
        .collect();
    for skipped in results.values().filter(|r| !r.needs_summary()) {
        debug!(category = %skipped.category, status = ?skipped.status, "Skipping summary");
    }
    info!(pending = pending.len(), "Summarization stage starting");

    let mut updates: Vec<SummaryUpdate> = stream::iter(pending)
        .map(|result| async move {
            let category = result.category;
            let unit = summarize_category(client, policy, category, &result.articles);
            let outcome = within_deadline(deadline, &format!("summary of {}", category), unit).await;
            if let Err(e) = &outcome {
                error!(%category, error = %e, "Summarization failed");
            }
            SummaryUpdate { category, outcome }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    updates.sort_by_key(|u| u.category);
    info!(
        summarized = updates.iter().filter(|u| u.outcome.is_ok()).count(),
        failed = updates.iter().filter(|u| u.outcome.is_err()).count(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Summarization stage finished"
    );
    updates
}

#[instrument(level = "info", skip(client, policy, articles), fields(articles = articles.len()))]
async fn summarize_category<C: AskAsync>(
    client: &C,
    policy: &RetryPolicy,
    category: Category,
    articles: &[Article],
) -> Result<String> {
    let t0 = Instant::now();
    let prompt = build_prompt(category, articles);
    let label = format!("summarize {}", category);
    let summary = policy
        .run(&label, || client.ask(SYSTEM_PROMPT, &prompt))
        .await?;

    let (passed, total) = quality_checks(&summary);
    if looks_well_formed(&summary) {
        debug!(%category, passed, total, "Summary passed structure check");
    } else {
        warn!(%category, passed, total, "Summary does not match the requested layout; keeping it");
    }
    info!(
        %category,
        chars = summary.chars().count(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Summarized category"
    );
    Ok(summary)
}
