//! Markdown rendering of a finished run.
//!
//! The report is a pure function of [`RunState`] and its statistics: a header
//! with run metadata, one section per requested category in canonical order,
//! then statistics, problems and a footer. The clock is never read here.

use crate::category::Category;
use crate::formatter::ReportOptions;
use crate::models::{CategoryResult, CategoryStatus, RunState, RunStatistics};
use crate::utils::{time_of_day, upcase};
use std::fmt::Write;
use tracing::{debug, instrument};

pub const REPORT_TITLE: &str = "# 📰 네이버 뉴스 헤드라인 요약";

/// Render a finished run as a Markdown report.
///
/// Reads nothing but its arguments, so the same state always renders to the
/// same text.
#[instrument(level = "debug", skip_all)]
pub fn run_to_markdown(state: &RunState, stats: &RunStatistics, options: &ReportOptions) -> String {
    let mut md = String::new();

    write_header(&mut md, state, options);

    let mut categories = state.requested.clone();
    categories.sort();
    categories.dedup();

    if categories.is_empty() {
        writeln!(md, "## ⚠️ 알림\n\n요약된 뉴스가 없습니다.\n").unwrap();
    }
    for category in categories {
        write_category(&mut md, category, state.results.get(&category));
    }

    if options.include_stats {
        write_statistics(&mut md, stats, &state.errors);
    }
    write_footer(&mut md, state);

    debug!(chars = md.len(), "Rendered Markdown length");
    md
}

fn edition_label(edition: &str) -> &'static str {
    match edition {
        "morning" => "오전",
        "afternoon" => "오후",
        _ => "저녁",
    }
}

fn write_header(md: &mut String, state: &RunState, options: &ReportOptions) {
    writeln!(md, "{}\n", REPORT_TITLE).unwrap();
    if !options.include_metadata {
        return;
    }
    let edition = time_of_day(state.started_at.time());
    writeln!(
        md,
        "> **생성 시각**: {}  ",
        state.started_at.format("%Y년 %m월 %d일 %H시 %M분")
    )
    .unwrap();
    writeln!(md, "> **에디션**: {} ({})  ", edition_label(edition), upcase(edition)).unwrap();
    writeln!(md, "> **데이터 출처**: 네이버 뉴스  ").unwrap();
    writeln!(md, "> **생성 방식**: AI 자동 요약  \n").unwrap();
    writeln!(md, "---\n").unwrap();
}

fn write_category(md: &mut String, category: Category, result: Option<&CategoryResult>) {
    writeln!(md, "## {} {}\n", category.glyph(), category.name()).unwrap();

    let Some(result) = result else {
        write_unavailable(md, 0, "결과가 기록되지 않았습니다");
        return;
    };

    match result.status {
        CategoryStatus::Success if result.articles.is_empty() => {
            writeln!(md, "📭 **알림**: 이 카테고리에서 수집된 기사가 없습니다.\n").unwrap();
        }
        CategoryStatus::Success if !result.summary_text.trim().is_empty() => {
            writeln!(md, "{}\n", result.summary_text.trim()).unwrap();
        }
        _ => {
            let cause = result.error.as_deref().unwrap_or("AI 요약 생성 실패");
            write_unavailable(md, result.article_count(), cause);
            write_headlines(md, result);
        }
    }
}

fn write_unavailable(md: &mut String, article_count: usize, cause: &str) {
    writeln!(md, "⚠️ **알림**: 이 카테고리의 요약을 생성할 수 없었습니다.").unwrap();
    writeln!(md, "- 수집된 기사: {}개", article_count).unwrap();
    writeln!(md, "- 원인: {}\n", cause).unwrap();
}

/// Bare headline list shown when there is no digest for collected articles.
fn write_headlines(md: &mut String, result: &CategoryResult) {
    if result.articles.is_empty() {
        return;
    }
    writeln!(md, "### 수집된 헤드라인\n").unwrap();
    for (i, article) in result.articles.iter().enumerate() {
        writeln!(md, "{}. [{}]({})", i + 1, article.title, article.url).unwrap();
        if let Some(summary) = &article.summary {
            writeln!(md, "   - {}", summary).unwrap();
        }
    }
    writeln!(md).unwrap();
}

fn write_statistics(md: &mut String, stats: &RunStatistics, errors: &[String]) {
    let requested = stats.categories_requested.max(1);
    writeln!(md, "---\n").unwrap();
    writeln!(md, "## 📊 생성 통계\n").unwrap();

    writeln!(md, "### 처리 결과").unwrap();
    writeln!(md, "- **총 수집 기사**: {}개", stats.total_articles).unwrap();
    writeln!(md, "- **처리 카테고리**: {}개", stats.categories_requested).unwrap();
    writeln!(
        md,
        "- **성공 / 부분 성공 / 실패**: {} / {} / {}",
        stats.succeeded, stats.partial, stats.failed
    )
    .unwrap();
    writeln!(
        md,
        "- **성공률**: {:.1}%\n",
        stats.succeeded as f64 / requested as f64 * 100.0
    )
    .unwrap();

    writeln!(md, "### 처리 시간").unwrap();
    writeln!(md, "- **뉴스 수집**: {:.2}초", stats.timings.collection_secs).unwrap();
    writeln!(md, "- **AI 요약**: {:.2}초", stats.timings.summarization_secs).unwrap();
    writeln!(md, "- **포맷팅**: {:.2}초", stats.timings.formatting_secs).unwrap();
    writeln!(md, "- **전체 시간**: {:.2}초\n", stats.timings.total_secs()).unwrap();

    writeln!(md, "### 성능 지표").unwrap();
    writeln!(md, "- **처리량**: {:.1}기사/초", stats.articles_per_second).unwrap();
    writeln!(
        md,
        "- **카테고리당 요약 시간**: {:.2}초\n",
        stats.timings.summarization_secs / requested as f64
    )
    .unwrap();

    if !errors.is_empty() {
        writeln!(md, "### ⚠️ 발생한 문제\n").unwrap();
        for (i, error) in errors.iter().enumerate() {
            writeln!(md, "{}. {}", i + 1, error).unwrap();
        }
        writeln!(md).unwrap();
    }
}

fn write_footer(md: &mut String, state: &RunState) {
    writeln!(md, "---\n").unwrap();
    writeln!(md, "## 📋 이용 안내\n").unwrap();
    writeln!(md, "- **데이터 출처**: 네이버 뉴스 (https://news.naver.com)").unwrap();
    writeln!(md, "- **요약 방식**: OpenAI 호환 모델을 활용한 AI 자동 요약").unwrap();
    writeln!(md, "- **업데이트**: 실행 시점 기준 최신 헤드라인\n").unwrap();
    writeln!(md, "---\n").unwrap();
    writeln!(
        md,
        "*이 리포트는 네이버 뉴스 헤드라인 요약 에이전트에 의해 자동 생성되었습니다.*  "
    )
    .unwrap();
    writeln!(md, "*생성 시각: {}*", state.started_at.format("%Y-%m-%d %H:%M:%S")).unwrap();
}
