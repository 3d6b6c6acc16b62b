/// Placeholder the site puts first in every dropdown.
pub const PLACEHOLDER: &str = "Select an option";

const DECLINE_PHRASES: &[&str] = &["Decline", "not wish", "don't wish", "Prefer not", "not want"];
const YES_PHRASES: &[&str] = &["Yes", "Agree", "I do", "I have"];
const NO_PHRASES: &[&str] = &["No", "Disagree", "I don't", "I do not"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Exact(usize),
    Fuzzy(usize),
    /// Nothing resembled the answer; the choice is arbitrary.
    Fallback(usize),
}

impl Pick {
    pub fn index(self) -> usize {
        match self {
            Pick::Exact(i) | Pick::Fuzzy(i) | Pick::Fallback(i) => i,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Pick::Fallback(_))
    }
}

/// Phrases an option may contain (or be contained in) for `answer`.
pub fn phrases_for(answer: &str) -> Vec<String> {
    let lower = answer.to_lowercase();
    let table = if answer == "Decline" {
        Some(DECLINE_PHRASES)
    } else if lower.contains("yes") {
        Some(YES_PHRASES)
    } else if lower.contains("no") {
        Some(NO_PHRASES)
    } else {
        None
    };
    match table {
        Some(phrases) => phrases.iter().map(|p| p.to_string()).collect(),
        None => {
            let stripped: String = answer.chars().filter(|c| c.is_alphanumeric()).collect();
            let mut phrases = vec![answer.to_string(), lower, answer.to_uppercase(), stripped];
            phrases.retain(|p| !p.is_empty());
            phrases.dedup();
            phrases
        }
    }
}

fn is_placeholder(option: &str) -> bool {
    option.trim().is_empty() || option.trim().eq_ignore_ascii_case(PLACEHOLDER)
}

/// Chooses an option for `answer`: exact text, then phrase containment in
/// either direction, then the closest option by edit distance. `None` only
/// when there is nothing real to choose.
pub fn pick(answer: &str, options: &[String]) -> Option<Pick> {
    let real: Vec<(usize, &str)> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| !is_placeholder(o))
        .map(|(i, o)| (i, o.trim()))
        .collect();
    if real.is_empty() {
        return None;
    }

    let wanted = answer.trim();
    if let Some((i, _)) = real.iter().find(|(_, o)| o.eq_ignore_ascii_case(wanted)) {
        return Some(Pick::Exact(*i));
    }

    for phrase in phrases_for(wanted) {
        let phrase = phrase.to_lowercase();
        let found = real.iter().find(|(_, o)| {
            let option = o.to_lowercase();
            option.contains(&phrase) || phrase.contains(&option)
        });
        if let Some((i, _)) = found {
            return Some(Pick::Fuzzy(*i));
        }
    }

    let wanted = wanted.to_lowercase();
    real.iter()
        .map(|(i, o)| (*i, strsim::normalized_levenshtein(&wanted, &o.to_lowercase())))
        .fold(None, |best: Option<(usize, f64)>, (i, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((i, score)),
        })
        .map(|(i, _)| Pick::Fallback(i))
}

/// Index of the option carrying `code`. A literal code standing on its own
/// wins, then an option whose digit run equals the code's digits, then any
/// option whose digits contain them ("+1" matches "United States (1)").
pub fn pick_phone_code(code: &str, options: &[(String, String)]) -> Option<usize> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    let haystacks: Vec<String> =
        options.iter().map(|(text, value)| format!("{} {}", text.trim(), value.trim())).collect();
    if let Some(i) = haystacks.iter().position(|h| contains_bounded(h, code)) {
        return Some(i);
    }
    let code_digits = digits(code);
    if code_digits.is_empty() {
        return None;
    }
    haystacks
        .iter()
        .position(|h| h.split(|c: char| !c.is_ascii_digit()).any(|run| run == code_digits))
        .or_else(|| haystacks.iter().position(|h| digits(h).contains(&code_digits)))
}

/// `needle` occurs in `haystack` without a digit directly before or after it.
fn contains_bounded(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_ignores_case() {
        let options = opts(&[PLACEHOLDER, "Yes", "No"]);
        assert_eq!(pick("no", &options), Some(Pick::Exact(2)));
    }

    #[yare::parameterized(
        decline = { "Decline", &["Select an option", "Male", "Female", "I don't wish to answer"], 3 },
        yes_phrase = { "Yes", &["Select an option", "I agree", "I disagree"], 1 },
        no_phrase = { "No", &["Select an option", "Yes, I am", "I do not"], 2 },
        partial = { "Native", &["Select an option", "Basic", "Native or bilingual"], 2 },
    )]
    fn test_fuzzy(answer: &str, options: &[&str], expected: usize) {
        assert_eq!(pick(answer, &opts(options)), Some(Pick::Fuzzy(expected)));
    }

    #[test]
    fn test_fallback_skips_placeholder() {
        let options = opts(&[PLACEHOLDER, "Red", "Blue"]);
        let picked = pick("Bleu", &options).unwrap();
        assert!(picked.is_fallback());
        assert_eq!(picked.index(), 2);
    }

    #[test]
    fn test_nothing_to_pick() {
        assert_eq!(pick("Yes", &opts(&[PLACEHOLDER])), None);
        assert_eq!(pick("Yes", &[]), None);
    }

    #[test]
    fn test_phone_code_by_digits() {
        let options = vec![
            ("Select an option".to_string(), "".to_string()),
            ("India (+91)".to_string(), "IN".to_string()),
            ("United States (+1)".to_string(), "US".to_string()),
        ];
        assert_eq!(pick_phone_code("+91", &options), Some(1));
        assert_eq!(pick_phone_code("0091", &options), None);
        assert_eq!(pick_phone_code("91", &options), Some(1));
        assert_eq!(pick_phone_code("", &options), None);
    }

    #[yare::parameterized(
        plus_one = { "+1", 3 },
        bare_one = { "1", 3 },
        three_digits = { "+213", 1 },
        by_digit_run = { "+ 213", 1 },
    )]
    fn test_phone_code_prefers_whole_code(code: &str, expected: usize) {
        let options = vec![
            ("Select an option".to_string(), "".to_string()),
            ("Algeria (+213)".to_string(), "DZ".to_string()),
            ("India (+91)".to_string(), "IN".to_string()),
            ("United States (+1)".to_string(), "US".to_string()),
        ];
        assert_eq!(pick_phone_code(code, &options), Some(expected));
    }

    #[test]
    fn test_phone_code_contained_digits_last() {
        let options = vec![
            ("Select an option".to_string(), "".to_string()),
            ("Canada 1-CA".to_string(), "".to_string()),
            ("Jamaica (1876)".to_string(), "JM".to_string()),
        ];
        assert_eq!(pick_phone_code("+876", &options), Some(2));
    }
}
