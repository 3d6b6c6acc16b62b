use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

// --- Locators ---

/// One way of finding an element. Callers always pass an ordered list of
/// these and take the first strategy that yields something.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(Cow<'static, str>),
    XPath(Cow<'static, str>),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(Cow::Owned(expr.into()))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "css={}", sel),
            Locator::XPath(expr) => write!(f, "xpath={}", expr),
        }
    }
}

pub const fn css(sel: &'static str) -> Locator {
    Locator::Css(Cow::Borrowed(sel))
}

pub const fn xp(expr: &'static str) -> Locator {
    Locator::XPath(Cow::Borrowed(expr))
}

// --- Errors ---

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("stale element reference")]
    StaleElement,
    #[error("element click intercepted: {0}")]
    ClickIntercepted(String),
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("browser session lost: {0}")]
    SessionLost(String),
    #[error("{0}")]
    Other(String),
}

impl DomError {
    /// The page re-rendered under us; trying again usually works.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomError::StaleElement | DomError::ClickIntercepted(_))
    }

    /// Nothing more can be done without a new browser session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomError::SessionLost(_))
    }
}

pub type DomResult<T> = Result<T, DomError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowDown,
    Enter,
}

// --- Capability ---

/// Everything the engine needs from a live document.
///
/// Lookups that find nothing return an empty list rather than an error, so
/// "not found" is an ordinary value all the way up.
pub trait Dom {
    type Element: Clone + fmt::Debug;

    fn find_all(&self, scope: Option<&Self::Element>, locator: &Locator)
    -> DomResult<Vec<Self::Element>>;
    fn text(&self, element: &Self::Element) -> DomResult<String>;
    fn attr(&self, element: &Self::Element, name: &str) -> DomResult<Option<String>>;
    fn prop(&self, element: &Self::Element, name: &str) -> DomResult<Option<String>>;
    fn tag_name(&self, element: &Self::Element) -> DomResult<String>;
    fn is_selected(&self, element: &Self::Element) -> DomResult<bool>;
    fn click(&self, element: &Self::Element) -> DomResult<()>;
    /// Click dispatched from script, bypassing overlays.
    fn native_click(&self, element: &Self::Element) -> DomResult<()>;
    fn clear(&self, element: &Self::Element) -> DomResult<()>;
    fn type_text(&self, element: &Self::Element, text: &str) -> DomResult<()>;
    fn scroll_into_view(&self, element: &Self::Element) -> DomResult<()>;
    fn press_key(&self, key: Key) -> DomResult<()>;
    fn current_url(&self) -> DomResult<String>;
    fn navigate(&self, url: &str) -> DomResult<()>;
    fn screenshot(&self, path: &Path) -> DomResult<()>;
    fn window_count(&self) -> DomResult<usize>;
    fn switch_to_newest_window(&self) -> DomResult<()>;
    fn close_current_window(&self) -> DomResult<()>;
    fn switch_to_main_window(&self) -> DomResult<()>;
    fn pause(&self, duration: Duration);
}

// --- Strategy helpers ---

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn find_first<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[Locator],
) -> DomResult<Option<D::Element>> {
    for locator in strategies {
        if let Some(element) = dom.find_all(scope, locator)?.into_iter().next() {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

pub fn find_all_first<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[Locator],
) -> DomResult<Vec<D::Element>> {
    for locator in strategies {
        let found = dom.find_all(scope, locator)?;
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

/// Polls `find_first` until something shows up or `timeout` elapses.
pub fn wait_for<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[Locator],
    timeout: Duration,
) -> DomResult<Option<D::Element>> {
    let polls = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1);
    for attempt in 0..polls {
        match find_first(dom, scope, strategies) {
            Ok(Some(element)) => return Ok(Some(element)),
            Ok(None) => {}
            Err(e) if e.is_transient() => {}
            Err(e) => return Err(e),
        }
        if attempt + 1 < polls {
            dom.pause(POLL_INTERVAL);
        }
    }
    Ok(None)
}

pub fn find_text<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[Locator],
) -> DomResult<Option<String>> {
    match find_first(dom, scope, strategies)? {
        Some(element) => Ok(Some(dom.text(&element)?.trim().to_string())),
        None => Ok(None),
    }
}

/// Runs `op` up to `attempts` times, sleeping `backoff` between transient failures.
pub fn retry_transient<D: Dom, T>(
    dom: &D,
    attempts: u32,
    backoff: Duration,
    mut op: impl FnMut() -> DomResult<T>,
) -> DomResult<T> {
    let mut last = DomError::Other("no attempts made".to_string());
    for attempt in 1..=attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                tracing::debug!(attempt, error = %e, "transient DOM failure, retrying");
                last = e;
                if attempt < attempts {
                    dom.pause(backoff);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(last)
}

/// Scrolls to and clicks `element`, falling back to a script click when the
/// direct click fails for any reason other than staleness or a dead session.
pub fn click_with_fallback<D: Dom>(dom: &D, element: &D::Element) -> DomResult<()> {
    dom.scroll_into_view(element)?;
    match dom.click(element) {
        Ok(()) => Ok(()),
        Err(DomError::StaleElement) => Err(DomError::StaleElement),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "direct click failed, using script click");
            dom.native_click(element)
        }
    }
}

/// Finds and clicks the first match within `timeout`. Returns whether a click happened.
pub fn wait_and_click<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[Locator],
    timeout: Duration,
) -> DomResult<bool> {
    match wait_for(dom, scope, strategies, timeout)? {
        Some(element) => {
            click_with_fallback(dom, &element)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Saves a screenshot under `<logs>/screenshots` and returns the file name used.
pub fn save_screenshot<D: Dom>(dom: &D, logs_folder: &Path, job_id: &str, stage: &str) -> String {
    let stamp = chrono::Local::now().format("%Y-%m-%d %H.%M.%S");
    let name = format!("{} - {} - {}.png", job_id, stage, stamp).replace(':', ".");
    let dir = logs_folder.join("screenshots");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, dir = %dir.display(), "could not create screenshot folder");
    }
    match dom.screenshot(&dir.join(&name)) {
        Ok(()) => name,
        Err(e) => {
            tracing::warn!(job_id, stage, error = %e, "screenshot failed");
            "Not Available".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDom;

    const FIRST: Locator = xp("//first");
    const SECOND: Locator = xp("//second");

    #[test]
    fn test_find_first_uses_strategy_order() {
        let dom = FakeDom::new();
        let a = dom.node("div", "a");
        let b = dom.node("div", "b");
        dom.on(None, &FIRST, &[]);
        dom.on(None, &SECOND, &[a, b]);

        let found = find_first(&dom, None, &[FIRST, SECOND]).unwrap();
        assert_eq!(found, Some(a));

        dom.on(None, &FIRST, &[b]);
        let found = find_first(&dom, None, &[FIRST, SECOND]).unwrap();
        assert_eq!(found, Some(b));
    }

    #[test]
    fn test_find_first_not_found_is_none() {
        let dom = FakeDom::new();
        assert_eq!(find_first(&dom, None, &[FIRST, SECOND]).unwrap(), None);
        assert!(find_all_first(&dom, None, &[FIRST]).unwrap().is_empty());
    }

    #[test]
    fn test_retry_transient_gives_up_after_attempts() {
        let dom = FakeDom::new();
        let mut calls = 0;
        let result: DomResult<()> = retry_transient(&dom, 3, Duration::ZERO, || {
            calls += 1;
            Err(DomError::StaleElement)
        });
        assert_eq!(result, Err(DomError::StaleElement));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_transient_does_not_retry_fatal() {
        let dom = FakeDom::new();
        let mut calls = 0;
        let result: DomResult<()> = retry_transient(&dom, 3, Duration::ZERO, || {
            calls += 1;
            Err(DomError::SessionLost("window closed".into()))
        });
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_click_with_fallback_uses_native_click() {
        let dom = FakeDom::new();
        let button = dom.node("button", "Go");
        dom.fail_click(button, DomError::NotInteractable("covered".into()));
        click_with_fallback(&dom, &button).unwrap();
        assert_eq!(dom.native_clicks_on(button), 1);
    }

    #[test]
    fn test_error_classification() {
        assert!(DomError::StaleElement.is_transient());
        assert!(DomError::ClickIntercepted("x".into()).is_transient());
        assert!(!DomError::Timeout("x".into()).is_transient());
        assert!(DomError::SessionLost("x".into()).is_fatal());
        assert!(!DomError::Other("x".into()).is_fatal());
    }
}
