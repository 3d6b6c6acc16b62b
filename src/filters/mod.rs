pub mod labels;
pub mod panel;
pub mod query;

use std::time::Duration;

use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::dom::{Dom, DomResult};

pub use panel::PanelReport;
pub use query::build_search_url;

pub fn configure_results<D: Dom>(
    dom: &D,
    term: &str,
    search: &SearchConfig,
    gap: Duration,
) -> DomResult<PanelReport> {
    let url = build_search_url(term, search);
    dom.navigate(&url)?;
    info!(url = %url, "search url");

    let report = if panel::has_panel_filters(search) {
        match panel::apply_panel_filters(dom, search, gap) {
            Ok(report) => report,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "setting the panel filters failed, continuing with URL filters only");
                PanelReport::default()
            }
        }
    } else {
        PanelReport::default()
    };

    reassert_url_filters(dom, search)?;
    Ok(report)
}

/// Puts back any sticky URL toggle the page dropped. Returns whether it navigated.
pub fn reassert_url_filters<D: Dom>(dom: &D, search: &SearchConfig) -> DomResult<bool> {
    let mut url = dom.current_url()?;
    let mut changed = false;
    for (param, value) in query::sticky_params(search) {
        if let Some(next) = query::ensure_param(&url, param, value) {
            url = next;
            changed = true;
        }
    }
    if changed {
        dom.navigate(&url)?;
        info!(url = %url, "re-applied URL filters");
    }
    Ok(changed)
}
