// src/fetch/urls.rs
use anyhow::Result;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::fetch_page;

static ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("CSS selector for anchors should be valid"));

/// Fetch a league page and return up to `limit` squad-page URLs.
pub async fn fetch_team_urls(
    client: &Client,
    league_url: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let html = fetch_page(client, league_url).await?;
    team_urls_from_html(&html, league_url, limit)
}

/// Collect `/squads/` links from a league page, deduplicated by squad path
/// and capped at `limit`, in page order. Relative hrefs are joined against
/// `league_url`.
pub fn team_urls_from_html(html: &str, league_url: &str, limit: usize) -> Result<Vec<String>> {
    let base = Url::parse(league_url)?;
    let doc = Html::parse_document(html);

    let mut squad_paths: Vec<String> = Vec::new();
    let mut team_urls = Vec::new();
    for element in doc.select(&ANCHOR_SEL) {
        if team_urls.len() >= limit {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(squad_path) = href.split("/squads/").nth(1) else {
            continue;
        };
        if squad_path.is_empty() || squad_paths.iter().any(|p| p == squad_path) {
            continue;
        }
        let Ok(joined) = base.join(href) else {
            continue;
        };
        squad_paths.push(squad_path.to_string());
        team_urls.push(joined.to_string());
    }

    Ok(team_urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAGUE_URL: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";

    const LEAGUE_PAGE: &str = r#"
        <html><body>
        <a href="/en/comps/9/schedule/">Fixtures</a>
        <a href="/en/squads/18bb7c10/Arsenal-Stats">Arsenal</a>
        <a href="/en/squads/18bb7c10/Arsenal-Stats">Arsenal again</a>
        <a href="/en/squads/">broken</a>
        <a href="/en/squads/cff3d9bb/Chelsea-Stats">Chelsea</a>
        <a href="/en/squads/b8fd03ef/Manchester-City-Stats">City</a>
        </body></html>
    "#;

    #[test]
    fn collects_squad_links_in_page_order() {
        let urls = team_urls_from_html(LEAGUE_PAGE, LEAGUE_URL, 20).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://fbref.com/en/squads/18bb7c10/Arsenal-Stats",
                "https://fbref.com/en/squads/cff3d9bb/Chelsea-Stats",
                "https://fbref.com/en/squads/b8fd03ef/Manchester-City-Stats",
            ]
        );
    }

    #[test]
    fn dedupes_and_skips_empty_squad_paths() {
        let urls = team_urls_from_html(LEAGUE_PAGE, LEAGUE_URL, 20).unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls.iter().all(|u| !u.ends_with("/squads/")));
    }

    #[test]
    fn honors_team_limit() {
        let urls = team_urls_from_html(LEAGUE_PAGE, LEAGUE_URL, 2).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("Arsenal"));
        assert!(urls[1].contains("Chelsea"));
    }
}
