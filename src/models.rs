//! Data models threaded through the collect → summarize → format pipeline.
//!
//! - [`Article`]: one headline scraped from a section page
//! - [`CategoryResult`]: everything known about one requested category
//! - [`RunState`]: the record owned by the pipeline driver
//! - [`RunStatistics`]: descriptive numbers computed by the formatter

use crate::category::Category;
use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A headline entry as scraped from a section page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub category: Category,
    /// Lede text shown under the headline, when the page has one.
    pub summary: Option<String>,
    pub collected_at: DateTime<Local>,
}

/// Outcome of a category after the stages that touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Success,
    /// Articles were collected but summarization failed.
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub articles: Vec<Article>,
    pub summary_text: String,
    pub status: CategoryStatus,
    pub error: Option<String>,
}

impl CategoryResult {
    pub fn collected(category: Category, articles: Vec<Article>) -> Self {
        Self {
            category,
            articles,
            summary_text: String::new(),
            status: CategoryStatus::Success,
            error: None,
        }
    }

    pub fn failed(category: Category, error: String) -> Self {
        Self {
            category,
            articles: Vec::new(),
            summary_text: String::new(),
            status: CategoryStatus::Failed,
            error: Some(error),
        }
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Whether the summarizer should send this category to the LLM.
    pub fn needs_summary(&self) -> bool {
        self.status == CategoryStatus::Success && !self.articles.is_empty()
    }
}

/// Wall-clock seconds spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub collection_secs: f64,
    pub summarization_secs: f64,
    pub formatting_secs: f64,
}

impl StageTimings {
    pub fn total_secs(&self) -> f64 {
        self.collection_secs + self.summarization_secs + self.formatting_secs
    }
}

/// The record threaded through the pipeline.
///
/// Only the driver mutates it, and only between stage barriers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub requested: Vec<Category>,
    pub results: BTreeMap<Category, CategoryResult>,
    pub final_report: String,
    pub errors: Vec<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub timings: StageTimings,
}

impl RunState {
    /// Repeated categories keep their first position.
    pub fn new(requested: Vec<Category>, started_at: DateTime<Local>) -> Self {
        Self {
            requested: requested.into_iter().unique().collect(),
            results: BTreeMap::new(),
            final_report: String::new(),
            errors: Vec::new(),
            started_at,
            finished_at: None,
            timings: StageTimings::default(),
        }
    }

    pub fn total_articles(&self) -> usize {
        self.results.values().map(CategoryResult::article_count).sum()
    }

    pub fn count_status(&self, status: CategoryStatus) -> usize {
        self.results.values().filter(|r| r.status == status).count()
    }

    /// True when every requested category ended in [`CategoryStatus::Success`].
    pub fn is_fully_successful(&self) -> bool {
        self.requested.iter().all(|c| {
            self.results
                .get(c)
                .is_some_and(|r| r.status == CategoryStatus::Success)
        })
    }
}

/// Descriptive statistics for a finished run. Nothing depends on these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_articles: usize,
    pub categories_requested: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub timings: StageTimings,
    pub articles_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(category: Category, n: usize) -> Article {
        Article {
            title: format!("headline {}", n),
            url: format!("https://n.news.naver.com/article/001/{:010}", n),
            category,
            summary: None,
            collected_at: Local::now(),
        }
    }

    #[test]
    fn test_needs_summary() {
        let empty = CategoryResult::collected(Category::World, vec![]);
        assert!(!empty.needs_summary());

        let full = CategoryResult::collected(Category::World, vec![article(Category::World, 1)]);
        assert!(full.needs_summary());

        let failed = CategoryResult::failed(Category::World, "boom".into());
        assert!(!failed.needs_summary());
        assert_eq!(failed.article_count(), 0);
    }

    #[test]
    fn test_run_state_dedupes_requested() {
        let state = RunState::new(
            vec![Category::World, Category::Politics, Category::World],
            Local::now(),
        );
        assert_eq!(state.requested, vec![Category::World, Category::Politics]);
    }

    #[test]
    fn test_run_state_counts() {
        let mut state = RunState::new(vec![Category::Politics, Category::Economy], Local::now());
        state.results.insert(
            Category::Politics,
            CategoryResult::collected(
                Category::Politics,
                vec![article(Category::Politics, 1), article(Category::Politics, 2)],
            ),
        );
        state
            .results
            .insert(Category::Economy, CategoryResult::failed(Category::Economy, "x".into()));

        assert_eq!(state.total_articles(), 2);
        assert_eq!(state.count_status(CategoryStatus::Success), 1);
        assert_eq!(state.count_status(CategoryStatus::Failed), 1);
        assert!(!state.is_fully_successful());
    }

    #[test]
    fn test_missing_result_is_not_success() {
        let state = RunState::new(vec![Category::Society], Local::now());
        assert!(!state.is_fully_successful());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CategoryStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }

    #[test]
    fn test_stage_timings_total() {
        let t = StageTimings {
            collection_secs: 1.5,
            summarization_secs: 2.0,
            formatting_secs: 0.5,
        };
        assert!((t.total_secs() - 4.0).abs() < f64::EPSILON);
    }
}
