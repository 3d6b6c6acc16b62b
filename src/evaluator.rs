use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::dom::{self, Dom, DomResult};
use crate::models::{Experience, JobDescription, UNKNOWN};
use crate::selectors;

pub const REASON_BAD_WORD: &str = "Found a Bad Word in About Job";
pub const REASON_CLEARANCE: &str = "Asking for Security clearance";
pub const REASON_EXPERIENCE: &str = "Required experience is high";
pub const REASON_NON_ENGLISH: &str = "Non-English job post";
pub const REASON_COMPANY: &str = "Found Blacklisted words in About Company";

/// Years above this are taken to be company age or similar, not a requirement.
const MAX_PLAUSIBLE_YEARS: u32 = 12;
const MASTERS_BONUS: i32 = 2;
const CLEARANCE_MARKERS: &[&str] = &["polygraph", "clearance", "secret"];

static EXPERIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(]?\s*(\d+)\s*[)]?\s*[-to]*\s*(\d*)[+]*\s*years?")
        .expect("constant regex pattern is valid")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z']+").expect("constant regex pattern is valid"));

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "with", "for", "you", "your", "will", "this", "that", "from", "experience",
    "skills", "required", "apply", "job", "work", "team", "role",
];

const NON_ENGLISH_MARKERS: &[&str] = &[
    "de", "la", "el", "los", "las", "con", "para", "que", "una", "un", "en", "y", "por", "se",
    "del", "les", "des", "und", "mit", "der", "die", "das", "com", "uma", "gli", "che", "een",
    "van", "het",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Reject { reason: &'static str, detail: String },
}

impl Verdict {
    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub description: JobDescription,
    pub verdict: Verdict,
}

/// Company-level gate. A good word anywhere in the "about company" text skips
/// the bad-word check for it entirely.
pub fn check_about_company(about: &str, search: &SearchConfig) -> Verdict {
    let lower = about.to_lowercase();
    if let Some(good) = search
        .about_company_good_words
        .iter()
        .find(|w| !w.is_empty() && lower.contains(&w.to_lowercase()))
    {
        debug!(word = %good, "found good word, skipped checking for blacklist words");
        return Verdict::Admit;
    }
    match search
        .about_company_bad_words
        .iter()
        .find(|w| !w.is_empty() && lower.contains(&w.to_lowercase()))
    {
        Some(bad) => Verdict::Reject {
            reason: REASON_COMPANY,
            detail: format!("About company contains \"{}\"", bad),
        },
        None => Verdict::Admit,
    }
}

/// Job-level rules, in order: bad words, clearance, experience.
pub fn evaluate_description(text: &str, search: &SearchConfig) -> Evaluation {
    let lower = text.to_lowercase();
    let reject = |reason, detail: String, experience| Evaluation {
        description: JobDescription { text: text.to_string(), experience_required: experience },
        verdict: Verdict::Reject { reason, detail },
    };

    if let Some(word) = search
        .bad_words
        .iter()
        .find(|w| !w.is_empty() && lower.contains(&w.to_lowercase()))
    {
        return reject(
            REASON_BAD_WORD,
            format!("Contains bad word \"{}\"", word),
            Experience::Unknown,
        );
    }

    if !search.security_clearance {
        if let Some(marker) = CLEARANCE_MARKERS.iter().find(|m| lower.contains(*m)) {
            return reject(
                REASON_CLEARANCE,
                format!("Found \"{}\"", marker),
                Experience::Unknown,
            );
        }
    }

    let bonus = if search.did_masters && lower.contains("master") {
        MASTERS_BONUS
    } else {
        0
    };
    let experience = extract_years(text);
    if let Experience::Years(required) = experience {
        let allowed = search.current_experience + bonus;
        if search.current_experience > -1 && required as i32 > allowed {
            return reject(
                REASON_EXPERIENCE,
                format!("Experience required {} > Current Experience {}", required, allowed),
                experience,
            );
        }
    }

    Evaluation {
        description: JobDescription { text: text.to_string(), experience_required: experience },
        verdict: Verdict::Admit,
    }
}

/// Largest plausible year count mentioned, counting both ends of ranges.
pub fn extract_years(text: &str) -> Experience {
    let mut best: Option<u32> = None;
    for caps in EXPERIENCE.captures_iter(text) {
        let values = [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .filter_map(|m| m.as_str().parse::<u32>().ok());
        for value in values {
            if value <= MAX_PLAUSIBLE_YEARS && best.is_none_or(|b| value > b) {
                best = Some(value);
            }
        }
    }
    match best {
        Some(years) => Experience::Years(years),
        None => Experience::Unknown,
    }
}

/// Word-count floor plus marker-word voting.
pub fn is_english(text: &str) -> bool {
    let sample = text.trim().to_lowercase();
    let words: Vec<&str> = WORD.find_iter(&sample).map(|m| m.as_str()).collect();
    if words.len() < 8 {
        return false;
    }
    let english = words.iter().filter(|w| ENGLISH_MARKERS.contains(w)).count();
    let other = words.iter().filter(|w| NON_ENGLISH_MARKERS.contains(w)).count();

    if other >= 3 && other > english {
        return false;
    }
    english >= 2 || other == 0
}

pub fn check_language(title: &str, description: Option<&str>) -> Verdict {
    // Without a description there is too little text to judge.
    let Some(description) = description else {
        return Verdict::Admit;
    };
    if is_english(&format!("{}\n{}", title, description)) {
        Verdict::Admit
    } else {
        Verdict::Reject {
            reason: REASON_NON_ENGLISH,
            detail: "Job content doesn't look English".to_string(),
        }
    }
}

// --- Page reading ---

pub fn read_about_company<D: Dom>(dom: &D) -> DomResult<Option<String>> {
    match dom::find_first(dom, None, selectors::ABOUT_COMPANY)? {
        Some(about) => {
            dom.scroll_into_view(&about)?;
            Ok(Some(dom.text(&about)?))
        }
        None => Ok(None),
    }
}

/// Reads the description and evaluates it. A missing description admits the
/// job with unknown experience; a read failure admits it with the error sentinel.
pub fn evaluate_page<D: Dom>(dom: &D, search: &SearchConfig) -> DomResult<Evaluation> {
    let read = dom::find_text(dom, None, selectors::DESCRIPTION);
    match read {
        Ok(Some(text)) if !text.is_empty() => Ok(evaluate_description(&text, search)),
        Ok(_) => {
            warn!("Unable to extract job description");
            Ok(Evaluation {
                description: JobDescription { text: UNKNOWN.to_string(), experience_required: Experience::Unknown },
                verdict: Verdict::Admit,
            })
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(error = %e, "Unable to extract years of experience required");
            Ok(Evaluation {
                description: JobDescription { text: UNKNOWN.to_string(), experience_required: Experience::Error },
                verdict: Verdict::Admit,
            })
        }
    }
}
