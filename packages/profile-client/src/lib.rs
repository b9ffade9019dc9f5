//! Best-effort public profile page fetcher.
//!
//! Fetches a profile URL and extracts whatever structured fields the page
//! yields (name, headline, company, location, about). The target is an
//! uncooperative, bot-defensive source, so the contract is deliberately
//! "best effort, never fail past this boundary": `fetch` always returns a
//! [`FetchedProfile`] whose [`FetchStatus`] tells the caller how much to
//! trust it.
//!
//! # Example
//!
//! ```rust,ignore
//! use profile_client::ProfileClient;
//!
//! let client = ProfileClient::new();
//! let profile = client.fetch("https://www.linkedin.com/in/someone").await;
//! println!("{:?} {:?}", profile.fetch_status, profile.full_name);
//! ```

pub mod error;
pub mod types;

pub use error::FetchError;
pub use types::{FetchStatus, FetchedProfile};

use std::time::Duration;

use scraper::{Html, Selector};
use tokio::time::Instant;

/// Selectors that indicate the primary profile content has rendered.
/// Bot-defensive sources sometimes serve a shell page first.
const PRIMARY_CONTENT_SELECTORS: &[&str] = &[
    "main h1",
    "h1[class*='heading']",
    "h1.top-card-layout__title",
    "meta[property='og:title']",
];

/// Body substrings that mark an anti-bot challenge page.
const CHALLENGE_MARKERS: &[&str] = &["captcha", "challenge-page", "unusual activity"];

/// Configuration for a [`ProfileClient`].
#[derive(Debug, Clone)]
pub struct ProfileClientConfig {
    /// Overall deadline for one fetch, network time included
    pub page_timeout: Duration,
    /// How long to wait for the primary content marker before degrading
    pub content_timeout: Duration,
    /// Pause between re-requests while waiting for the content marker
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for ProfileClientConfig {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(30),
            content_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(1500),
            // Browser-like User-Agent to avoid trivial bot detection
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Best-effort profile page fetcher.
///
/// Holds configuration only. Each `fetch` builds an isolated
/// `reqwest::Client` with its own cookie jar and connection state, so one
/// poisoned session cannot taint the next fetch; the client is dropped on
/// every exit path.
pub struct ProfileClient {
    config: ProfileClientConfig,
}

impl ProfileClient {
    pub fn new() -> Self {
        Self {
            config: ProfileClientConfig::default(),
        }
    }

    pub fn with_config(config: ProfileClientConfig) -> Self {
        Self { config }
    }

    /// Fetch a profile URL. Never fails: every failure mode is folded into
    /// the returned profile's `fetch_status`.
    pub async fn fetch(&self, url: &str) -> FetchedProfile {
        let url = normalize_url(url);
        tracing::debug!(url = %url, "fetching profile");

        let profile =
            match tokio::time::timeout(self.config.page_timeout, self.fetch_inner(&url)).await {
                Ok(Ok(profile)) => profile,
                Ok(Err(err)) => {
                    tracing::warn!(url = %url, error = %err, "profile fetch failed");
                    FetchedProfile::from_failure(&url, &err)
                }
                // Outer deadline fired while a request was in flight
                Err(_) => {
                    tracing::warn!(url = %url, "profile fetch exceeded page timeout");
                    FetchedProfile::empty(url.as_str(), FetchStatus::Timeout)
                }
            };

        tracing::debug!(
            url = %url,
            status = profile.fetch_status.as_str(),
            extracted = profile.has_any_field(),
            "profile fetch finished"
        );
        profile
    }

    /// Load the page, re-requesting until the primary content marker appears
    /// or `content_timeout` expires, then extract fields.
    async fn fetch_inner(&self, url: &str) -> Result<FetchedProfile, FetchError> {
        let client = self.build_client()?;
        let deadline = Instant::now() + self.config.content_timeout;
        let mut last_profile: Option<FetchedProfile> = None;

        loop {
            let html = Self::load_page(&client, url).await?;
            let (profile, has_primary) = extract_profile(url, &html);

            // Once the primary content rendered the page is as good as it
            // gets; Ok or Partial, stop re-requesting.
            if has_primary {
                return Ok(profile);
            }
            if profile.has_any_field() {
                last_profile = Some(profile);
            }

            if Instant::now() + self.config.retry_backoff >= deadline {
                break;
            }
            tokio::time::sleep(self.config.retry_backoff).await;
        }

        // Content marker never appeared within the inner deadline. Keep any
        // fields the shell page did yield, per the best-effort contract.
        Ok(match last_profile {
            Some(mut profile) => {
                profile.fetch_status = FetchStatus::Timeout;
                profile
            }
            None => FetchedProfile::empty(url, FetchStatus::Timeout),
        })
    }

    /// Fresh client per fetch: isolated cookie jar and connection pool.
    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .timeout(self.config.page_timeout)
            .user_agent(&self.config.user_agent)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))
    }

    async fn load_page(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
        let response = client.get(url).send().await?;

        let status = response.status();
        if is_blocked_status(status.as_u16()) {
            return Err(FetchError::Blocked {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} for {}", status, url)));
        }

        let body = response.text().await?;
        if is_challenge_page(&body) {
            return Err(FetchError::Blocked {
                status: status.as_u16(),
            });
        }
        Ok(body)
    }
}

impl Default for ProfileClient {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP statuses used by bot defenses. 999 is the classic LinkedIn refusal.
fn is_blocked_status(status: u16) -> bool {
    matches!(status, 403 | 429 | 999)
}

fn is_challenge_page(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Add https:// when the scheme is missing.
fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Extract profile fields from a page. Per-field failures leave the field
/// `None`; the status reflects how much of the page was usable. Also
/// reports whether the primary content marker was present.
fn extract_profile(url: &str, html: &str) -> (FetchedProfile, bool) {
    let document = Html::parse_document(html);

    let full_name = select_text(&document, &["main h1", "h1.top-card-layout__title", "h1"])
        .or_else(|| select_meta(&document, "og:title").map(strip_title_suffix));
    let headline = select_text(
        &document,
        &[
            "main h2",
            ".top-card-layout__headline",
            "[class*='headline']",
        ],
    )
    .or_else(|| select_meta(&document, "og:description"));
    let company = select_text(
        &document,
        &[
            "[class*='experience'] h3",
            "[class*='current-company']",
            "[data-section='currentPositions'] h4",
        ],
    );
    let location = select_text(
        &document,
        &[
            "[class*='location']",
            ".locality",
            "[class*='top-card'] [class*='subline']",
        ],
    );
    let about = select_text(
        &document,
        &["section[id*='about'] p", "[class*='summary'] p", "[class*='about'] p"],
    );

    let has_primary = has_primary_content(&document);
    let mut profile = FetchedProfile {
        source_url: url.to_string(),
        full_name,
        headline,
        company,
        location,
        about,
        fetch_status: FetchStatus::Partial,
    };

    profile.fetch_status = if has_primary && profile.full_name.is_some() {
        FetchStatus::Ok
    } else {
        FetchStatus::Partial
    };
    (profile, has_primary)
}

fn has_primary_content(document: &Html) -> bool {
    PRIMARY_CONTENT_SELECTORS.iter().any(|sel| {
        Selector::parse(sel)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false)
    })
}

/// First non-empty text match across candidate selectors.
fn select_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<String>();
            let text = squash_whitespace(&text);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn select_meta(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property='{}']", property)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(squash_whitespace)
        .filter(|s| !s.is_empty())
}

/// og:title pages carry "Name - Headline | Site" shapes; keep the name.
fn strip_title_suffix(title: String) -> String {
    title
        .split(&['-', '|'][..])
        .next()
        .map(|s| s.trim().to_string())
        .unwrap_or(title)
}

fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
