use std::time::Duration;

use tracing::{debug, info, warn};

use super::labels::{self, MatchKind};
use crate::config::SearchConfig;
use crate::dom::{self, Dom, DomError, DomResult, Key};
use crate::selectors;

const STALE_ATTEMPTS: u32 = 3;
const STALE_COOLDOWN: Duration = Duration::from_millis(500);
const CLICKABLE_TAGS: &[&str] = &["button", "label", "a", "input"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PanelReport {
    pub opened: bool,
    pub applied: Vec<String>,
    pub not_found: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Option,
    Switch,
}

fn wanted(search: &SearchConfig) -> Vec<(String, Control)> {
    let mut out = Vec::new();
    let lists = [
        &search.companies,
        &search.location,
        &search.industry,
        &search.job_function,
        &search.job_titles,
    ];
    for list in lists {
        out.extend(list.iter().map(|l| (l.clone(), Control::Option)));
    }
    if search.in_your_network {
        out.push(("In your network".to_string(), Control::Switch));
    }
    if search.fair_chance_employer {
        out.push(("Fair Chance Employer".to_string(), Control::Switch));
    }
    if !search.salary.trim().is_empty() {
        out.push((search.salary.clone(), Control::Option));
    }
    for list in [&search.benefits, &search.commitments] {
        out.extend(list.iter().map(|l| (l.clone(), Control::Option)));
    }
    out.retain(|(label, _)| !label.trim().is_empty());
    out
}

pub fn has_panel_filters(search: &SearchConfig) -> bool {
    !wanted(search).is_empty()
}

/// Opens the panel, clicks every configured label it can resolve and shows
/// the results. Only a lost session is returned as an error.
pub fn apply_panel_filters<D: Dom>(dom: &D, search: &SearchConfig, gap: Duration) -> DomResult<PanelReport> {
    let mut report = PanelReport::default();
    let wanted = wanted(search);
    if wanted.is_empty() {
        return Ok(report);
    }

    let Some(button) = dom::find_first(dom, None, selectors::ALL_FILTERS_BUTTON)? else {
        warn!("Couldn't find 'All filters' button, continuing without panel filters");
        report.not_found = wanted.into_iter().map(|(l, _)| l).collect();
        return Ok(report);
    };
    dom::click_with_fallback(dom, &button)?;
    report.opened = true;
    dom.pause(gap);

    let panel = dom::wait_for(dom, None, selectors::FILTER_PANEL, Duration::from_secs(2))?;

    for (label, control) in wanted {
        let result = dom::retry_transient(dom, STALE_ATTEMPTS, STALE_COOLDOWN, || match control {
            Control::Option => click_filter_text(dom, panel.as_ref(), &label),
            Control::Switch => toggle_switch(dom, panel.as_ref(), &label),
        });
        match result {
            Ok(true) => {
                debug!(label = %label, "filter set");
                dom.pause(gap);
                report.applied.push(label);
            }
            Ok(false) => {
                warn!(label = %label, "Click failed, didn't find filter");
                report.not_found.push(label);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(label = %label, error = %e, "filter could not be set, continuing without it");
                report.failed.push(label);
            }
        }
    }

    match dom::find_first(dom, None, selectors::SHOW_RESULTS_BUTTON)? {
        Some(show) => dom::click_with_fallback(dom, &show)?,
        None => dom.press_key(Key::Escape)?,
    }
    info!(
        applied = report.applied.len(),
        not_found = report.not_found.len(),
        failed = report.failed.len(),
        "panel filters done"
    );
    Ok(report)
}

fn resolve_click_target<D: Dom>(dom: &D, element: &D::Element) -> DomResult<D::Element> {
    let tag = dom.tag_name(element)?.to_lowercase();
    if CLICKABLE_TAGS.contains(&tag.as_str()) {
        return Ok(element.clone());
    }
    Ok(dom::find_first(dom, Some(element), selectors::CLICKABLE_ANCESTOR)?.unwrap_or_else(|| element.clone()))
}

/// Normalized texts an element can be recognised by. Stale elements have none.
fn probes<D: Dom>(dom: &D, element: &D::Element) -> DomResult<Vec<String>> {
    let read = || -> DomResult<Vec<Option<String>>> {
        Ok(vec![
            Some(dom.text(element)?),
            dom.attr(element, "aria-label")?,
            dom.prop(element, "innerText")?,
            dom.attr(element, "value")?,
        ])
    };
    match read() {
        Ok(raw) => Ok(raw
            .into_iter()
            .flatten()
            .map(|p| labels::normalize(&p))
            .filter(|p| !p.is_empty())
            .collect()),
        Err(DomError::StaleElement) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Best-matching element for `label` under `scope`: exact matches beat containment.
fn best_match<D: Dom>(
    dom: &D,
    scope: Option<&D::Element>,
    strategies: &[crate::dom::Locator],
    label: &str,
) -> DomResult<Vec<D::Element>> {
    let targets = labels::normalized_candidates(label);
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    let mut exact = Vec::new();
    let mut partial = Vec::new();
    for element in dom::find_all_first(dom, scope, strategies)? {
        match labels::matches(&targets, &probes(dom, &element)?) {
            Some(MatchKind::Exact) => exact.push(element),
            Some(MatchKind::Contains) => partial.push(element),
            None => {}
        }
    }
    exact.extend(partial);
    Ok(exact)
}

pub fn click_filter_text<D: Dom>(dom: &D, scope: Option<&D::Element>, label: &str) -> DomResult<bool> {
    let Some(element) = best_match(dom, scope, selectors::FILTER_CANDIDATES, label)?.into_iter().next() else {
        return Ok(false);
    };
    let target = resolve_click_target(dom, &element)?;
    dom::click_with_fallback(dom, &target)?;
    Ok(true)
}

/// Turns on the switch in the row labelled `label`. Already-on counts as done.
pub fn toggle_switch<D: Dom>(dom: &D, scope: Option<&D::Element>, label: &str) -> DomResult<bool> {
    for candidate in best_match(dom, scope, selectors::SWITCH_CANDIDATES, label)? {
        let row = dom::find_first(dom, Some(&candidate), selectors::SWITCH_ROW)?.unwrap_or_else(|| candidate.clone());
        let Some(switch) = dom::find_first(dom, Some(&row), selectors::SWITCH_INPUT)? else {
            continue;
        };
        if !dom.is_selected(&switch)? {
            dom::click_with_fallback(dom, &switch)?;
        }
        return Ok(true);
    }
    Ok(false)
}
