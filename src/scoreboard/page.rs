use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures_util::StreamExt;
use reqwest::Client;
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::extract::MATCH_CARD_CLASS;
use crate::error::ScrapeError;

/// Source of the raw scoreboard page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Return the page content once match cards are present.
    async fn fetch_page(&self) -> Result<String, ScrapeError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

// Same desktop Chrome identity the site is normally visited with
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// placardefutebol.com.br tournament page rendered in headless Chrome.
///
/// The match list is built by the page's scripts, so the rendered DOM is
/// read repeatedly until a match card shows up or `wait_timeout` elapses.
pub struct ChromePage {
    url: String,
    chrome_executable: Option<String>,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl ChromePage {
    pub fn new(
        url: &str,
        chrome_executable: Option<String>,
        wait_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        ChromePage {
            url: url.to_string(),
            chrome_executable,
            wait_timeout,
            poll_interval,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", USER_AGENT));
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScrapeError::BrowserConfig)
    }

    async fn render(&self, browser: &Browser) -> Result<String, ScrapeError> {
        let page = browser.new_page(self.url.as_str()).await?;
        let page = &page;
        wait_for_cards(
            move || async move { Ok(page.content().await?) },
            self.wait_timeout,
            self.poll_interval,
        )
        .await
    }
}

#[async_trait]
impl PageSource for ChromePage {
    fn name(&self) -> &str {
        "placardefutebol (chrome)"
    }

    async fn fetch_page(&self) -> Result<String, ScrapeError> {
        info!("Rendering scoreboard page {}", self.url);
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.render(&browser).await;

        // The browser process is shut down on every path, including failures
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        handler_task.abort();

        let body = result?;
        info!("Scoreboard page ready ({} bytes)", body.len());
        Ok(body)
    }
}

/// Plain HTTP fetch of the same page, for snapshots that already carry
/// the match list in the served HTML. Read once; no waiting.
pub struct HttpPage {
    http: Client,
    url: String,
}

impl HttpPage {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(HttpPage {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPage {
    fn name(&self) -> &str {
        "placardefutebol (http)"
    }

    async fn fetch_page(&self) -> Result<String, ScrapeError> {
        info!("Fetching scoreboard page {}", self.url);
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Status(resp.status()));
        }
        let body = resp.text().await?;
        if !has_match_card(&body) {
            return Err(ScrapeError::PageStructure(
                "served page has no match card".into(),
            ));
        }
        info!("Scoreboard page ready ({} bytes)", body.len());
        Ok(body)
    }
}

/// Re-read the page through `read` until a match card is present, bounded
/// by `timeout`. A failed read ends the wait immediately.
pub async fn wait_for_cards<F, Fut>(
    mut read: F,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<String, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, ScrapeError>>,
{
    tokio::time::timeout(timeout, poll_until_cards(&mut read, poll_interval))
        .await
        .map_err(|_| ScrapeError::Timeout(timeout))?
}

async fn poll_until_cards<F, Fut>(read: &mut F, poll_interval: Duration) -> Result<String, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, ScrapeError>>,
{
    loop {
        let body = read().await?;
        if has_match_card(&body) {
            return Ok(body);
        }
        debug!("No match card rendered yet, waiting {:?}", poll_interval);
        tokio::time::sleep(poll_interval).await;
    }
}

/// Whether any element carries the match card class, as the extractor sees it.
pub fn has_match_card(body: &str) -> bool {
    match Selector::parse(&format!(".{}", MATCH_CARD_CLASS)) {
        Ok(selector) => Html::parse_document(body).select(&selector).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOADING: &str = r#"<div id="main">Carregando...</div>"#;
    const READY: &str = r#"<div id="main"><a class="match__md"></a></div>"#;

    #[test]
    fn test_marker_detection_ignores_sub_classes() {
        assert!(has_match_card(r#"<a class="match__md" href="/x">"#));
        assert!(has_match_card(r#"<a class="link match__md active">"#));
        assert!(!has_match_card(r#"<div class="match__md_card--ht-name">"#));
        assert!(!has_match_card(LOADING));
    }

    #[test]
    fn test_marker_detection_agrees_with_extractor() {
        let body = "<div id=\"main\"><a class=\"match__md\n\" href=\"/x\">\
             <div class=\"match__md_card--ht-name\">Flamengo</div>\
             <div class=\"match__md_card--at-name\">Al Ahly</div></a></div>";
        assert_eq!(crate::scoreboard::extract(body).unwrap().len(), 1);
        assert!(has_match_card(body));
        assert!(has_match_card("<div class=\"big\tmatch__md\"></div>"));
        assert!(has_match_card("<a class=match__md href=/x></a>"));
    }

    #[tokio::test]
    async fn test_wait_returns_once_cards_render() {
        let mut snapshots = vec![LOADING, LOADING, READY].into_iter();
        let mut reads = 0;
        let body = wait_for_cards(
            || {
                reads += 1;
                let next = snapshots.next();
                async move {
                    next.map(str::to_string)
                        .ok_or_else(|| ScrapeError::PageStructure("no more snapshots".into()))
                }
            },
            Duration::from_secs(5),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert_eq!(body, READY);
        assert_eq!(reads, 3);
    }

    #[tokio::test]
    async fn test_wait_times_out_without_cards() {
        let err = wait_for_cards(
            || async { Ok(LOADING.to_string()) },
            Duration::from_millis(100),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_wait_stops_on_read_error() {
        let mut reads = 0;
        let err = wait_for_cards(
            || {
                reads += 1;
                async { Err(ScrapeError::PageStructure("tab crashed".into())) }
            },
            Duration::from_secs(5),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::PageStructure(_)));
        assert_eq!(reads, 1);
    }

    #[tokio::test]
    async fn test_http_fetch_returns_page_with_cards() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mundial-clubes-fifa")
            .with_status(200)
            .with_body(READY)
            .create_async()
            .await;

        let page = HttpPage::new(
            &format!("{}/mundial-clubes-fifa", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        let body = page.fetch_page().await.unwrap();
        assert!(body.contains("match__md"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetch_without_cards_is_structural_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mundial-clubes-fifa")
            .with_status(200)
            .with_body(LOADING)
            .expect(1)
            .create_async()
            .await;

        let page = HttpPage::new(
            &format!("{}/mundial-clubes-fifa", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = page.fetch_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::PageStructure(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mundial-clubes-fifa")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let page = HttpPage::new(
            &format!("{}/mundial-clubes-fifa", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = page.fetch_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Status(s) if s.as_u16() == 503));
        mock.assert_async().await;
    }
}
