use std::sync::LazyLock;

use chrono::{DateTime, Local, TimeDelta};
use regex::Regex;

use crate::dom::{self, Dom, DomResult};
use crate::models::UNKNOWN;
use crate::selectors;

static POSTED_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(second|minute|hour|day|week|month|year)s?\b")
        .expect("constant regex pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiringManager {
    pub name: String,
    pub link: String,
}

impl Default for HiringManager {
    fn default() -> Self {
        Self { name: UNKNOWN.to_string(), link: UNKNOWN.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listed {
    /// Formatted timestamp, or "Unknown".
    pub date: String,
    pub reposted: bool,
}

impl Default for Listed {
    fn default() -> Self {
        Self { date: UNKNOWN.to_string(), reposted: false }
    }
}

pub fn hiring_manager<D: Dom>(dom: &D) -> DomResult<HiringManager> {
    let Some(card) = dom::find_first(dom, None, selectors::HIRER_CARD)? else {
        return Ok(HiringManager::default());
    };
    let link = match dom::find_first(dom, Some(&card), selectors::HIRER_LINK)? {
        Some(a) => dom.attr(&a, "href")?.unwrap_or_else(|| UNKNOWN.to_string()),
        None => UNKNOWN.to_string(),
    };
    let name = dom::find_text(dom, Some(&card), selectors::HIRER_NAME)?
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());
    Ok(HiringManager { name, link })
}

pub fn date_listed<D: Dom>(dom: &D, now: DateTime<Local>) -> DomResult<Listed> {
    let Some(top) = dom::find_first(dom, None, selectors::TOP_CARD)? else {
        return Ok(Listed::default());
    };
    let Some(text) = dom::find_text(dom, Some(&top), selectors::POSTED_AGO)? else {
        return Ok(Listed::default());
    };
    let reposted = text.contains("Reposted");
    let date = parse_posted_ago(&text.replace("Reposted", ""), now)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    Ok(Listed { date, reposted })
}

/// "3 days ago" relative to `now`. Months count as 30 days, years as 365.
pub fn parse_posted_ago(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let caps = POSTED_AGO.captures(text)?;
    let n: i64 = caps[1].parse().ok()?;
    let ago = match caps[2].to_lowercase().as_str() {
        "second" => TimeDelta::try_seconds(n),
        "minute" => TimeDelta::try_minutes(n),
        "hour" => TimeDelta::try_hours(n),
        "day" => TimeDelta::try_days(n),
        "week" => TimeDelta::try_weeks(n),
        "month" => n.checked_mul(30).and_then(TimeDelta::try_days),
        "year" => n.checked_mul(365).and_then(TimeDelta::try_days),
        _ => None,
    }?;
    now.checked_sub_signed(ago)
}

pub fn has_easy_apply_button<D: Dom>(dom: &D) -> DomResult<bool> {
    Ok(dom::find_first(dom, None, selectors::EASY_APPLY_BUTTON)?.is_some())
}

pub fn shows_application_link<D: Dom>(dom: &D) -> DomResult<bool> {
    Ok(dom::find_first(dom, None, selectors::APPLIED_LINK)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDom;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[yare::parameterized(
        hours = { "5 hours ago", TimeDelta::hours(5) },
        one_day = { "1 day ago", TimeDelta::days(1) },
        weeks = { "2 weeks ago", TimeDelta::weeks(2) },
        months = { "3 months ago", TimeDelta::days(90) },
        minutes = { "Posted 45 minutes ago", TimeDelta::minutes(45) },
    )]
    fn test_parse_posted_ago(text: &str, ago: TimeDelta) {
        assert_eq!(parse_posted_ago(text, now()), Some(now() - ago));
    }

    #[test]
    fn test_parse_posted_ago_garbage() {
        assert_eq!(parse_posted_ago("yesterday", now()), None);
    }

    #[yare::parameterized(
        years_overflow_days = { "99999999999999 years ago" },
        months_overflow_mul = { "9223372036854775807 months ago" },
        too_long_for_i64 = { "99999999999999999999 days ago" },
        before_min_date = { "900000000 days ago" },
    )]
    fn test_parse_posted_ago_absurd_values(text: &str) {
        assert_eq!(parse_posted_ago(text, now()), None);
    }

    #[test]
    fn test_date_listed_reposted() {
        let dom = FakeDom::new();
        let top = dom.node("div", "");
        let span = dom.node("span", "Reposted 2 days ago");
        dom.on_first(None, selectors::TOP_CARD, &[top]);
        dom.on_first(Some(top), selectors::POSTED_AGO, &[span]);

        let listed = date_listed(&dom, now()).unwrap();
        assert!(listed.reposted);
        assert_eq!(listed.date, "2024-06-13 12:00:00");
    }

    #[test]
    fn test_date_listed_missing() {
        let dom = FakeDom::new();
        let listed = date_listed(&dom, now()).unwrap();
        assert_eq!(listed, Listed { date: "Unknown".to_string(), reposted: false });
    }

    #[test]
    fn test_hiring_manager() {
        let dom = FakeDom::new();
        assert_eq!(hiring_manager(&dom).unwrap(), HiringManager::default());

        let card = dom.node("div", "");
        let link = dom.node("a", "");
        dom.set_attr(link, "href", "https://www.linkedin.com/in/jane");
        let name = dom.node("span", " Jane Doe ");
        dom.on_first(None, selectors::HIRER_CARD, &[card]);
        dom.on_first(Some(card), selectors::HIRER_LINK, &[link]);
        dom.on_first(Some(card), selectors::HIRER_NAME, &[name]);

        let hr = hiring_manager(&dom).unwrap();
        assert_eq!(hr.name, "Jane Doe");
        assert_eq!(hr.link, "https://www.linkedin.com/in/jane");
    }
}
