use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::dom::{self, Dom, DomError, DomResult};
use crate::models::{JobListing, UNKNOWN, WorkStyle};
use crate::selectors;
use crate::state::RunState;

const OPEN_ATTEMPTS: u32 = 3;
const OPEN_BACKOFF: Duration = Duration::from_millis(300);

static JOB_VIEW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/jobs/view/(\d+)").expect("constant regex pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BlacklistedCompany,
    PreviouslyRejected,
    AlreadyApplied,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::BlacklistedCompany => "Blacklisted Company",
            SkipReason::PreviouslyRejected => "Previously rejected",
            SkipReason::AlreadyApplied => "Already applied",
        }
    }
}

pub fn job_cards<D: Dom>(dom: &D) -> DomResult<Vec<D::Element>> {
    dom::find_all_first(dom, None, selectors::JOB_CARDS)
}

pub fn read_card<D: Dom>(dom: &D, card: &D::Element) -> DomResult<JobListing> {
    let link = dom::find_first(dom, Some(card), selectors::CARD_LINK)?;

    let job_link = match &link {
        Some(a) => dom.attr(a, "href")?.filter(|h| !h.is_empty()),
        None => None,
    };

    let mut job_id = None;
    for name in selectors::CARD_ID_ATTRS {
        if let Some(id) = dom.attr(card, name)?.filter(|v| !v.trim().is_empty()) {
            job_id = Some(id.trim().to_string());
            break;
        }
    }
    let job_id = job_id
        .or_else(|| job_link.as_deref().and_then(job_id_from_link))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let mut title = match &link {
        Some(a) => first_line(&dom.text(a)?),
        None => String::new(),
    };
    if title.is_empty() {
        title = dom::find_text(dom, Some(card), selectors::CARD_TITLE)?
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string());
    }

    let (company, raw_location) = match dom::find_text(dom, Some(card), selectors::CARD_SUBTITLE)? {
        Some(subtitle) if !subtitle.is_empty() => split_subtitle(&subtitle),
        _ => {
            let company = dom::find_text(dom, Some(card), selectors::CARD_COMPANY)?.filter(|c| !c.is_empty());
            let location = dom::find_text(dom, Some(card), selectors::CARD_LOCATION)?.filter(|l| !l.is_empty());
            (company, location)
        }
    };
    let company = company.unwrap_or_else(|| "Unknown Company".to_string());
    let (work_location, work_style) = split_location(raw_location.as_deref().unwrap_or("Unknown Location"));

    let job_link = match job_link {
        Some(link) => link,
        None if job_id != UNKNOWN => format!("{}{}", selectors::JOB_VIEW_URL, job_id),
        None => UNKNOWN.to_string(),
    };

    Ok(JobListing {
        job_id,
        title,
        company,
        work_location,
        work_style,
        job_link,
    })
}

pub fn shows_applied_badge<D: Dom>(dom: &D, card: &D::Element) -> DomResult<bool> {
    Ok(dom::find_text(dom, Some(card), selectors::CARD_STATE)?.is_some_and(|s| s == "Applied"))
}

/// Skip checks in precedence order: blacklisted company, rejected id, applied badge.
pub fn skip_reason(listing: &JobListing, applied_badge: bool, state: &RunState) -> Option<SkipReason> {
    if state.blacklisted_companies.contains(&listing.company) {
        Some(SkipReason::BlacklistedCompany)
    } else if state.rejected.contains(&listing.job_id) {
        Some(SkipReason::PreviouslyRejected)
    } else if applied_badge {
        Some(SkipReason::AlreadyApplied)
    } else {
        None
    }
}

pub fn excluded_location<'a>(work_location: &str, excludes: &'a [String]) -> Option<&'a str> {
    let location = work_location.to_lowercase();
    excludes
        .iter()
        .map(|e| e.trim())
        .find(|e| !e.is_empty() && location.contains(&e.to_lowercase()))
}

pub fn open_card<D: Dom>(dom: &D, card: &D::Element, gap: Duration) -> DomResult<()> {
    dom::retry_transient(dom, OPEN_ATTEMPTS, OPEN_BACKOFF, || {
        let link = dom::find_first(dom, Some(card), selectors::CARD_LINK)?
            .ok_or_else(|| DomError::Other("job card has no link".to_string()))?;
        dom::click_with_fallback(dom, &link)
    })?;
    dom.pause(gap);
    Ok(())
}

pub fn job_id_from_link(link: &str) -> Option<String> {
    JOB_VIEW_ID.captures(link).map(|c| c[1].to_string())
}

/// "Acme · Austin, TX (Remote)" into company and location.
fn split_subtitle(subtitle: &str) -> (Option<String>, Option<String>) {
    match subtitle.split_once(" · ") {
        Some((company, location)) => (
            Some(company.trim().to_string()).filter(|c| !c.is_empty()),
            Some(location.trim().to_string()).filter(|l| !l.is_empty()),
        ),
        None => (Some(subtitle.trim().to_string()), None),
    }
}

/// Pulls a trailing "(Remote)" style suffix off a location.
pub fn split_location(raw: &str) -> (String, WorkStyle) {
    let raw = raw.trim();
    match (raw.rfind('('), raw.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            let style = raw[open + 1..close].trim();
            let location = raw[..open].trim();
            let location = if location.is_empty() { raw } else { location };
            debug!(location, style, "split work style from location");
            (location.to_string(), WorkStyle::parse(style))
        }
        _ => (raw.to_string(), WorkStyle::Unknown),
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDom;
    use std::collections::HashSet;

    fn listing(company: &str, job_id: &str) -> JobListing {
        JobListing {
            job_id: job_id.to_string(),
            title: "Engineer".to_string(),
            company: company.to_string(),
            work_location: "Austin, TX".to_string(),
            work_style: WorkStyle::Remote,
            job_link: UNKNOWN.to_string(),
        }
    }

    #[yare::parameterized(
        remote = { "Austin, TX (Remote)", "Austin, TX", WorkStyle::Remote },
        hybrid = { "Berlin, Germany (Hybrid)", "Berlin, Germany", WorkStyle::Hybrid },
        on_site = { "Madrid (On-site)", "Madrid", WorkStyle::OnSite },
        plain = { "Toronto, ON", "Toronto, ON", WorkStyle::Unknown },
        reversed = { "Odd) place (", "Odd) place (", WorkStyle::Unknown },
    )]
    fn test_split_location(raw: &str, location: &str, style: WorkStyle) {
        assert_eq!(split_location(raw), (location.to_string(), style));
    }

    #[test]
    fn test_read_card_full() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        dom.set_attr(card, "data-occludable-job-id", "4012345678");
        let link = dom.node("a", "Senior Rust Engineer\nSenior Rust Engineer with verification");
        dom.set_attr(link, "href", "https://www.linkedin.com/jobs/view/4012345678/?trk=x");
        let subtitle = dom.node("div", "Acme Corp · Austin, TX (Hybrid)");
        dom.on_first(Some(card), selectors::CARD_LINK, &[link]);
        dom.on_first(Some(card), selectors::CARD_SUBTITLE, &[subtitle]);

        let job = read_card(&dom, &card).unwrap();
        assert_eq!(job.job_id, "4012345678");
        assert_eq!(job.title, "Senior Rust Engineer");
        assert_eq!(job.company, "Acme Corp");
        assert_eq!(job.work_location, "Austin, TX");
        assert_eq!(job.work_style, WorkStyle::Hybrid);
        assert!(job.job_link.starts_with("https://www.linkedin.com/jobs/view/4012345678"));
    }

    #[test]
    fn test_read_card_fallbacks() {
        let dom = FakeDom::new();
        let card = dom.node("div", "");
        let link = dom.node("a", "");
        dom.set_attr(link, "href", "https://www.linkedin.com/jobs/view/777/");
        let title = dom.node("strong", "Data Engineer");
        let company = dom.node("span", "Globex");
        let location = dom.node("li", "Remote");
        // Only the secondary link strategy matches
        dom.on(Some(card), &selectors::CARD_LINK[1], &[link]);
        dom.on_first(Some(card), selectors::CARD_TITLE, &[title]);
        dom.on_first(Some(card), selectors::CARD_COMPANY, &[company]);
        dom.on_first(Some(card), selectors::CARD_LOCATION, &[location]);

        let job = read_card(&dom, &card).unwrap();
        assert_eq!(job.job_id, "777");
        assert_eq!(job.title, "Data Engineer");
        assert_eq!(job.company, "Globex");
        assert_eq!(job.work_location, "Remote");
        assert_eq!(job.work_style, WorkStyle::Unknown);
    }

    #[test]
    fn test_read_card_without_anything() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        let job = read_card(&dom, &card).unwrap();
        assert_eq!(job.job_id, "Unknown");
        assert_eq!(job.job_link, "Unknown");
        assert_eq!(job.title, "Unknown Title");
        assert_eq!(job.company, "Unknown Company");
        assert_eq!(job.work_location, "Unknown Location");
    }

    #[test]
    fn test_link_synthesised_from_id() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        dom.set_attr(card, "data-job-id", "55");
        let job = read_card(&dom, &card).unwrap();
        assert_eq!(job.job_link, "https://www.linkedin.com/jobs/view/55");
    }

    #[test]
    fn test_skip_precedence() {
        let mut state = RunState::new(HashSet::new());
        state.blacklisted_companies.insert("Acme".to_string());
        state.rejected.insert("1".to_string());

        assert_eq!(skip_reason(&listing("Acme", "1"), true, &state), Some(SkipReason::BlacklistedCompany));
        assert_eq!(skip_reason(&listing("Globex", "1"), true, &state), Some(SkipReason::PreviouslyRejected));
        assert_eq!(skip_reason(&listing("Globex", "2"), true, &state), Some(SkipReason::AlreadyApplied));
        assert_eq!(skip_reason(&listing("Globex", "2"), false, &state), None);
    }

    #[test]
    fn test_applied_badge() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        let footer = dom.node("li", "Applied");
        assert!(!shows_applied_badge(&dom, &card).unwrap());
        dom.on_first(Some(card), selectors::CARD_STATE, &[footer]);
        assert!(shows_applied_badge(&dom, &card).unwrap());
    }

    #[test]
    fn test_excluded_location() {
        let excludes = vec!["United Kingdom".to_string(), " ".to_string()];
        assert_eq!(excluded_location("London, united kingdom", &excludes), Some("United Kingdom"));
        assert_eq!(excluded_location("Dublin, Ireland", &excludes), None);
    }

    #[test]
    fn test_open_card_retries_stale() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        let link = dom.node("a", "Job");
        dom.on_first(Some(card), selectors::CARD_LINK, &[link]);
        dom.fail_click(link, DomError::StaleElement);
        dom.fail_click(link, DomError::ClickIntercepted("overlay".into()));

        open_card(&dom, &card, Duration::ZERO).unwrap();
        // intercepted click falls back to a script click on the same attempt
        assert_eq!(dom.native_clicks_on(link), 1);
    }

    #[test]
    fn test_open_card_gives_up() {
        let dom = FakeDom::new();
        let card = dom.node("li", "");
        let link = dom.node("a", "Job");
        dom.on_first(Some(card), selectors::CARD_LINK, &[link]);
        for _ in 0..OPEN_ATTEMPTS {
            dom.fail_click(link, DomError::StaleElement);
        }
        assert_eq!(open_card(&dom, &card, Duration::ZERO), Err(DomError::StaleElement));
    }
}
