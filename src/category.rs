//! The fixed set of Naver News sections the digest covers.
//!
//! Each [`Category`] owns its section id on `news.naver.com`, the glyph used
//! in report headings, and the editorial guidance appended to the LLM prompt.
//! Names are parsed strictly: an unknown name is a configuration error rather
//! than a silent lookup miss halfway through a run.

use crate::error::NewsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base URL of the news portal.
pub const NAVER_NEWS_BASE_URL: &str = "https://news.naver.com";

/// A news section. Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Politics,
    Economy,
    Society,
    LifeCulture,
    TechScience,
    World,
}

struct CategoryInfo {
    name: &'static str,
    section_id: &'static str,
    glyph: &'static str,
    guidance: &'static str,
}

const fn info(category: Category) -> &'static CategoryInfo {
    match category {
        Category::Politics => &CategoryInfo {
            name: "정치",
            section_id: "100",
            glyph: "🏛️",
            guidance: "정치 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 정책 변화와 그 영향\n\
                - 정당 간 주요 이슈와 입장 차이\n\
                - 국정 운영과 관련된 중요 결정\n\
                - 선거나 정치적 변화의 의미",
        },
        Category::Economy => &CategoryInfo {
            name: "경제",
            section_id: "101",
            glyph: "💰",
            guidance: "경제 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 주요 경제 지표의 변화와 의미\n\
                - 기업과 산업계의 중요한 움직임\n\
                - 금융 시장의 동향과 전망\n\
                - 일반 국민 생활에 미치는 영향",
        },
        Category::Society => &CategoryInfo {
            name: "사회",
            section_id: "102",
            glyph: "🏘️",
            guidance: "사회 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 사회 현상과 이슈의 배경\n\
                - 제도나 정책 변화가 시민에게 미치는 영향\n\
                - 사회 갈등과 그 해결 방안\n\
                - 문화적, 사회적 변화의 의미",
        },
        Category::LifeCulture => &CategoryInfo {
            name: "생활/문화",
            section_id: "103",
            glyph: "🎭",
            guidance: "생활/문화 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 일상생활과 직접 관련된 정보\n\
                - 문화 트렌드와 새로운 현상\n\
                - 건강, 교육, 여가 관련 실용 정보\n\
                - 라이프스타일 변화와 그 의미",
        },
        Category::TechScience => &CategoryInfo {
            name: "IT/과학",
            section_id: "105",
            glyph: "💻",
            guidance: "IT/과학 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 기술 혁신과 그 사회적 영향\n\
                - 과학적 발견과 연구 성과\n\
                - 디지털 전환과 새로운 서비스\n\
                - 미래 기술 동향과 전망",
        },
        Category::World => &CategoryInfo {
            name: "세계",
            section_id: "104",
            glyph: "🌍",
            guidance: "세계 뉴스 요약 시 다음 사항에 주목하세요:\n\
                - 국제 정세 변화와 한국에 미치는 영향\n\
                - 주요 국가들의 정책과 외교 관계\n\
                - 글로벌 경제와 문화 동향\n\
                - 국제적 이슈와 그 의미",
        },
    }
}

impl Category {
    /// Every category in canonical order.
    pub const ALL: [Category; 6] = [
        Category::Politics,
        Category::Economy,
        Category::Society,
        Category::LifeCulture,
        Category::TechScience,
        Category::World,
    ];

    /// Korean display name, also the accepted input spelling.
    pub fn name(self) -> &'static str {
        info(self).name
    }

    pub fn section_id(self) -> &'static str {
        info(self).section_id
    }

    pub fn glyph(self) -> &'static str {
        info(self).glyph
    }

    /// Editorial focus points for the summarization prompt.
    pub fn guidance(self) -> &'static str {
        info(self).guidance
    }

    /// Section page URL, e.g. `https://news.naver.com/section/100`.
    pub fn section_url(self) -> String {
        format!("{}/section/{}", NAVER_NEWS_BASE_URL, self.section_id())
    }

    /// Parse a list of names, dropping duplicates but keeping request order.
    ///
    /// An empty list means "all categories".
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Category>, NewsError> {
        if names.is_empty() {
            return Ok(Category::ALL.to_vec());
        }
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let category = name.as_ref().parse::<Category>()?;
            if !out.contains(&category) {
                out.push(category);
            }
        }
        Ok(out)
    }
}

impl FromStr for Category {
    type Err = NewsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| {
                let supported = Category::ALL.map(|c| c.name()).join(", ");
                NewsError::Config(format!(
                    "unsupported category '{}' (supported: {})",
                    wanted, supported
                ))
            })
    }
}

impl TryFrom<String> for Category {
    type Error = NewsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
