use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::dom::{self, Dom, DomResult};
use crate::filters;
use crate::selectors;

pub const LISTINGS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct PageInfo<E> {
    pub control: E,
    pub current: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(u32),
    /// No control for the next page, or it would not take a click.
    Exhausted,
}

pub fn wait_for_listings<D: Dom>(dom: &D, timeout: Duration) -> DomResult<bool> {
    Ok(dom::wait_for(dom, None, selectors::JOB_CARDS, timeout)?.is_some())
}

/// Current page number and its control, or `None` for a single-page result.
pub fn page_info<D: Dom>(dom: &D) -> DomResult<Option<PageInfo<D::Element>>> {
    let Some(control) = dom::find_first(dom, None, selectors::PAGINATION)? else {
        debug!("no pagination control, single page of results");
        return Ok(None);
    };
    dom.scroll_into_view(&control)?;
    let Some(text) = dom::find_text(dom, Some(&control), selectors::ACTIVE_PAGE)? else {
        return Ok(None);
    };
    match text.parse::<u32>() {
        Ok(current) => Ok(Some(PageInfo { control, current })),
        Err(_) => {
            warn!(text = %text, "active page label is not a number");
            Ok(None)
        }
    }
}

/// Clicks the button for `current + 1`, trying again once if the first click
/// hits a re-render, then puts back any URL filter the navigation dropped.
pub fn next_page<D: Dom>(dom: &D, current: u32, search: &SearchConfig) -> DomResult<Advance> {
    let target = current + 1;
    let strategies = selectors::page_button(target);
    let click = || -> DomResult<bool> {
        match dom::find_first(dom, None, &strategies)? {
            Some(button) => dom::click_with_fallback(dom, &button).map(|()| true),
            None => Ok(false),
        }
    };

    let clicked = match click() {
        Ok(clicked) => clicked,
        Err(e) if e.is_transient() => {
            debug!(page = target, error = %e, "page button went stale, retrying");
            match click() {
                Ok(clicked) => clicked,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(page = target, error = %e, "could not move to the next page");
                    false
                }
            }
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!(page = target, error = %e, "could not move to the next page");
            false
        }
    };
    if !clicked {
        info!(page = current, "no more pages");
        return Ok(Advance::Exhausted);
    }

    filters::reassert_url_filters(dom, search)?;
    info!(page = target, "moved to next page");
    Ok(Advance::Moved(target))
}
