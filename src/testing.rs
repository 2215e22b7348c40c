//! In-memory stand-ins for the news source and the LLM endpoint.

use crate::api::AskAsync;
use crate::category::Category;
use crate::config::{LlmConfig, PipelineConfig, ScrapingConfig};
use crate::error::{NewsError, Result};
use crate::models::Article;
use crate::scrapers::FetchHtml;
use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;

pub fn article(category: Category, n: usize) -> Article {
    Article {
        title: format!("{} 헤드라인 {}", category.name(), n),
        url: article_url(category, n),
        category,
        summary: None,
        collected_at: Local::now(),
    }
}

fn article_url(category: Category, n: usize) -> String {
    format!(
        "https://n.news.naver.com/mnews/article/{}/{:010}",
        category.section_id(),
        n
    )
}

/// A section page in the current `sa_item` layout with `count` headlines.
pub fn section_page(category: Category, count: usize) -> String {
    let mut html = String::from("<html><body><ul class=\"sa_list\">\n");
    for n in 1..=count {
        writeln!(
            html,
            r#"<li class="sa_item"><div class="sa_text">
<a href="{url}" class="sa_text_title"><strong class="sa_text_strong">{name} 헤드라인 {n}</strong></a>
<div class="sa_text_lede">{name} 기사 {n} 요약</div>
</div></li>"#,
            url = article_url(category, n),
            name = category.name(),
            n = n,
        )
        .unwrap();
    }
    html.push_str("</ul></body></html>");
    html
}

pub fn fast_scraping_config() -> ScrapingConfig {
    ScrapingConfig {
        request_delay_ms: 0,
        retry_delay_ms: 0,
        ..ScrapingConfig::default()
    }
}

pub fn fast_llm_config() -> LlmConfig {
    LlmConfig {
        api_key: "sk-test".to_string(),
        retry_base_delay_ms: 0,
        retry_max_delay_ms: 0,
        retry_jitter_ms: 0,
        ..LlmConfig::default()
    }
}

pub fn fast_pipeline_config(categories: &[Category]) -> PipelineConfig {
    PipelineConfig {
        categories: categories.to_vec(),
        scraping: fast_scraping_config(),
        llm: fast_llm_config(),
        ..PipelineConfig::default()
    }
}

#[derive(Clone, Copy)]
enum Page {
    Headlines(usize),
    Failure(fn() -> NewsError),
    Flaky { failures: usize, count: usize },
    Slow { delay: Duration, count: usize },
}

/// Serves canned section pages and counts fetches per category.
pub struct FakeSource {
    pages: HashMap<Category, Page>,
    fetches: Mutex<HashMap<Category, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fetches: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_headlines(mut self, category: Category, count: usize) -> Self {
        self.pages.insert(category, Page::Headlines(count));
        self
    }

    pub fn with_failure(mut self, category: Category, error: fn() -> NewsError) -> Self {
        self.pages.insert(category, Page::Failure(error));
        self
    }

    /// Fail the first `failures` fetches, then serve `count` headlines.
    pub fn with_flaky(mut self, category: Category, failures: usize, count: usize) -> Self {
        self.pages.insert(category, Page::Flaky { failures, count });
        self
    }

    pub fn with_slow(mut self, category: Category, delay: Duration, count: usize) -> Self {
        self.pages.insert(category, Page::Slow { delay, count });
        self
    }

    pub fn fetches_for(&self, category: Category) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&category)
            .copied()
            .unwrap_or(0)
    }
}

impl FetchHtml for FakeSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let category = Category::ALL
            .iter()
            .copied()
            .find(|c| c.section_url() == url)
            .ok_or_else(|| NewsError::Network(format!("{} returned 404 Not Found", url)))?;

        let previous = {
            let mut fetches = self.fetches.lock().unwrap();
            let n = fetches.entry(category).or_insert(0);
            *n += 1;
            *n - 1
        };

        match self.pages.get(&category).copied().unwrap_or(Page::Headlines(0)) {
            Page::Headlines(count) => Ok(section_page(category, count)),
            Page::Failure(error) => Err(error()),
            Page::Flaky { failures, count } => {
                if previous < failures {
                    Err(NewsError::Network("connection reset by peer".to_string()))
                } else {
                    Ok(section_page(category, count))
                }
            }
            Page::Slow { delay, count } => {
                tokio::time::sleep(delay).await;
                Ok(section_page(category, count))
            }
        }
    }
}

/// Answers prompts with a well-formed digest and records every prompt.
pub struct FakeLlm {
    failing: HashSet<Category>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<(Category, String)>>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, category: Category) -> Self {
        self.failing.insert(category);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls_for(&self, category: Category) -> usize {
        self.prompts_for(category).len()
    }

    pub fn total_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Categories in the order their prompts arrived.
    pub fn call_order(&self) -> Vec<Category> {
        self.prompts.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn prompts_for(&self, category: Category) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// The reply this fake gives for `count` articles of `category`.
    pub fn digest_for(category: Category, count: usize) -> String {
        let mut md = String::from("### 주요 뉴스\n\n");
        for n in 1..=count {
            writeln!(
                md,
                "{}. **{} 헤드라인 {}**\n   - 핵심 내용을 정리한 첫 문장입니다. 배경을 설명하는 두 번째 문장입니다.\n",
                n,
                category.name(),
                n
            )
            .unwrap();
        }
        write!(
            md,
            "### 오늘의 포인트\n\n- {} 분야에서 {}건의 기사가 보도되었습니다.\n- 자세한 내용은 개별 기사를 참고해 주세요.",
            category.name(),
            count
        )
        .unwrap();
        md
    }
}

fn category_of(prompt: &str) -> Option<Category> {
    let first = prompt.lines().next()?.strip_prefix("카테고리: ")?;
    Category::ALL.iter().copied().find(|c| first.ends_with(c.name()))
}

impl AskAsync for FakeLlm {
    async fn ask(&self, _system: &str, prompt: &str) -> Result<String> {
        let category = category_of(prompt)
            .ok_or_else(|| NewsError::Api("prompt has no category line".to_string()))?;
        self.prompts
            .lock()
            .unwrap()
            .push((category, prompt.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&category) {
            return Err(NewsError::Api("completion endpoint returned 503 Service Unavailable".to_string()));
        }
        let count = prompt.matches(". 제목: ").count();
        Ok(Self::digest_for(category, count))
    }
}
