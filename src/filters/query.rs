use url::{Url, form_urlencoded};

use crate::config::SearchConfig;
use crate::selectors::SEARCH_URL;

/// Deterministic search URL for one term. Same config in, same URL out.
pub fn build_search_url(term: &str, search: &SearchConfig) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("keywords", term.trim());

    let location = search.search_location.trim();
    if !location.is_empty() {
        query.append_pair("location", location);
    }
    if let Some(sort) = search.sort_by {
        query.append_pair("sortBy", sort.url_code());
    }
    if let Some(code) = search.date_posted.and_then(|d| d.url_code()) {
        query.append_pair("f_TPR", code);
    }
    if search.easy_apply_only {
        query.append_pair("f_AL", "true");
    }
    if search.under_10_applicants {
        query.append_pair("f_EA", "true");
    }

    let work_types = joined(search.on_site.iter().map(|w| w.url_code()));
    if !work_types.is_empty() {
        query.append_pair("f_WT", &work_types);
    }
    let job_types = joined(search.job_type.iter().map(|j| j.url_code()));
    if !job_types.is_empty() {
        query.append_pair("f_JT", &job_types);
    }
    let levels = joined(search.experience_level.iter().map(|e| e.url_code()));
    if !levels.is_empty() {
        query.append_pair("f_E", &levels);
    }

    format!("{}?{}", SEARCH_URL, query.finish())
}

fn joined<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for code in codes {
        if !seen.contains(&code) {
            seen.push(code);
        }
    }
    seen.join(",")
}

/// `current` with `param=value` set, or `None` when it already is.
/// Repeated keys collapse to one (last value wins, first position kept).
pub fn ensure_param(current: &str, param: &str, value: &str) -> Option<String> {
    let mut url = Url::parse(current).ok()?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, val) in url.query_pairs() {
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = val.into_owned(),
            None => pairs.push((key.into_owned(), val.into_owned())),
        }
    }

    match pairs.iter_mut().find(|(k, _)| k == param) {
        Some((_, v)) if v == value => return None,
        Some((_, v)) => *v = value.to_string(),
        None => pairs.push((param.to_string(), value.to_string())),
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();
    url.set_query(Some(&query));
    Some(url.to_string())
}

pub fn sticky_params(search: &SearchConfig) -> Vec<(&'static str, &'static str)> {
    let mut params = Vec::new();
    if search.easy_apply_only {
        params.push(("f_AL", "true"));
    }
    if search.under_10_applicants {
        params.push(("f_EA", "true"));
    }
    params
}
