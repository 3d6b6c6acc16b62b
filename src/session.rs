use std::time::Duration;

use tracing::{info, warn};

use crate::dom::{self, Dom, DomResult};
use crate::operator::Operator;
use crate::selectors;

pub const LOGIN_ATTEMPTS: u32 = 3;

const SETTLE: Duration = Duration::from_secs(2);
const SIGNED_OUT_PATHS: &[&str] = &["/login", "/checkpoint", "/signup"];

/// Best guess from the current URL and what the page shows. Unclear pages
/// count as signed out.
pub fn is_logged_in<D: Dom>(dom: &D) -> DomResult<bool> {
    let url = dom.current_url()?.to_lowercase();
    if url.contains("/feed") {
        return Ok(true);
    }
    if SIGNED_OUT_PATHS.iter().any(|p| url.contains(p)) {
        return Ok(false);
    }
    if dom::find_first(dom, None, selectors::LOGIN_FIELDS)?.is_some()
        || dom::find_first(dom, None, selectors::SIGNED_OUT_CONTROLS)?.is_some()
    {
        return Ok(false);
    }
    if dom::find_first(dom, None, selectors::PROFILE_MENU)?.is_some() {
        return Ok(true);
    }
    warn!(url = %url, "login status is unclear, treating as signed out");
    Ok(false)
}

/// Opens the feed and, when that lands on a login wall, waits on the operator
/// to sign in. Returns whether the session ended up signed in.
pub fn ensure_logged_in<D: Dom>(dom: &D, operator: &dyn Operator) -> DomResult<bool> {
    dom.navigate(selectors::FEED_URL)?;
    dom.pause(SETTLE);
    if is_logged_in(dom)? {
        info!("already signed in");
        return Ok(true);
    }

    if !dom.current_url()?.contains("/login") {
        dom.navigate(selectors::LOGIN_URL)?;
    }
    for attempt in 1..=LOGIN_ATTEMPTS {
        let choice = operator.confirm(
            "Login required",
            "Please sign in to LinkedIn in the browser window, then continue here.",
            &["I'm signed in", "Give up"],
        );
        if choice == 1 {
            break;
        }
        dom.pause(SETTLE);
        if is_logged_in(dom)? {
            info!(attempt, "signed in");
            return Ok(true);
        }
        warn!(attempt, "still not signed in");
    }
    Ok(false)
}
