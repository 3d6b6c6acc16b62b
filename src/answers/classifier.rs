//! Maps a form field's label to what the candidate profile says about it.
//!
//! Rules are plain data, checked in order against the lowercased label; the
//! first one whose keyword groups all match wins. A rule matches when the
//! label contains any word of `any`, any word of every group in `also`, and
//! none of `unless`.

use crate::answers::profile::Profile;
use crate::filters::labels;
use crate::models::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    YearsOfExperience,
    Phone,
    PhoneCountryCode,
    Street,
    City,
    WorkLocation,
    State,
    Zipcode,
    Country,
    FullName,
    FirstName,
    MiddleName,
    LastName,
    RecentEmployer,
    NoticeDays,
    NoticeWeeks,
    NoticeMonths,
    DesiredSalary,
    DesiredSalaryMonthly,
    DesiredSalaryLakhs,
    CurrentCtc,
    CurrentCtcMonthly,
    CurrentCtcLakhs,
    LinkedIn,
    Website,
    Confidence,
    Headline,
    Summary,
    CoverLetter,
    Referral,
    Visa,
    Citizenship,
    Veteran,
    Disability,
    Gender,
    Proficiency,
    /// Leave whatever the site pre-selected.
    KeepPrevious,
}

impl Category {
    /// Text fields whose input pops an autocomplete list to confirm.
    pub fn autocompletes(self) -> bool {
        matches!(self, Category::City)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Value { category: Category, value: String },
    Keep,
    /// No rule matched, or the profile has nothing for the matching rule.
    NeedsAi,
}

struct Rule {
    any: &'static [&'static str],
    also: &'static [&'static [&'static str]],
    unless: &'static [&'static str],
    category: Category,
}

const fn rule(any: &'static [&'static str], category: Category) -> Rule {
    Rule { any, also: &[], unless: &[], category }
}

const fn rule_with(
    any: &'static [&'static str],
    also: &'static [&'static [&'static str]],
    unless: &'static [&'static str],
    category: Category,
) -> Rule {
    Rule { any, also, unless, category }
}

const SALARY: &[&str] = &["salary", "compensation", "ctc", "pay"];
const CURRENT: &[&str] = &["current", "present"];
const VISA: Rule = rule(&["sponsorship", "visa"], Category::Visa);

const TEXT_RULES: &[Rule] = &[
    rule(&["experience", "years"], Category::YearsOfExperience),
    rule(&["phone", "mobile"], Category::Phone),
    rule(&["street"], Category::Street),
    rule(&["city", "location", "address"], Category::City),
    rule(&["signature"], Category::FullName),
    rule_with(&["name"], &[&["full"]], &[], Category::FullName),
    rule_with(&["name"], &[&["first"]], &["last"], Category::FirstName),
    rule_with(&["name"], &[&["middle"]], &["last"], Category::MiddleName),
    rule_with(&["name"], &[&["last"]], &["first"], Category::LastName),
    rule_with(&["name"], &[&["employer"]], &[], Category::RecentEmployer),
    rule(&["name"], Category::FullName),
    rule_with(&["notice"], &[&["month"]], &[], Category::NoticeMonths),
    rule_with(&["notice"], &[&["week"]], &[], Category::NoticeWeeks),
    rule(&["notice"], Category::NoticeDays),
    rule_with(SALARY, &[CURRENT, &["month"]], &[], Category::CurrentCtcMonthly),
    rule_with(SALARY, &[CURRENT, &["lakh"]], &[], Category::CurrentCtcLakhs),
    rule_with(SALARY, &[CURRENT], &[], Category::CurrentCtc),
    rule_with(SALARY, &[&["month"]], &[], Category::DesiredSalaryMonthly),
    rule_with(SALARY, &[&["lakh"]], &[], Category::DesiredSalaryLakhs),
    rule(SALARY, Category::DesiredSalary),
    rule(&["linkedin"], Category::LinkedIn),
    rule(&["website", "blog", "portfolio", "link"], Category::Website),
    rule(&["scale of 1-10"], Category::Confidence),
    rule(&["headline"], Category::Headline),
    rule_with(&["hear", "come across"], &[&["this"], &["job", "position"]], &[], Category::Referral),
    rule(&["state", "province"], Category::State),
    rule(&["zip", "postal", "code"], Category::Zipcode),
    rule(&["country"], Category::Country),
    VISA,
];

const TEXTAREA_RULES: &[Rule] = &[
    rule(&["summary"], Category::Summary),
    rule(&["cover"], Category::CoverLetter),
];

const SELECT_RULES: &[Rule] = &[
    rule(&["email", "phone"], Category::KeepPrevious),
    rule(&["gender", "sex"], Category::Gender),
    rule(&["disability"], Category::Disability),
    rule(&["proficiency"], Category::Proficiency),
    rule(&["country"], Category::Country),
    rule(&["state"], Category::State),
    rule(&["city"], Category::City),
    rule(&["location"], Category::WorkLocation),
    VISA,
];

const RADIO_RULES: &[Rule] = &[
    rule(&["citizenship", "employment eligibility"], Category::Citizenship),
    rule(&["veteran", "protected"], Category::Veteran),
    rule(&["disability", "handicapped"], Category::Disability),
    VISA,
];

const PHONE_CODE_PATTERNS: &[&str] = &[
    "phone country code",
    "country code",
    "codigo de pais",
    "codigo del pais",
    "indicativo",
    "prefijo",
];

impl Rule {
    fn matches(&self, label: &str) -> bool {
        let has_any = |words: &[&str]| words.iter().any(|w| label.contains(w));
        has_any(self.any) && self.also.iter().all(|group| has_any(group)) && !has_any(self.unless)
    }
}

fn rules_for(kind: FieldKind) -> &'static [Rule] {
    match kind {
        FieldKind::Text => TEXT_RULES,
        FieldKind::Textarea => TEXTAREA_RULES,
        FieldKind::Select => SELECT_RULES,
        FieldKind::Radio => RADIO_RULES,
        FieldKind::Checkbox => &[],
    }
}

pub fn is_phone_code_label(label: &str) -> bool {
    let normalized = labels::normalize(label);
    !normalized.is_empty() && PHONE_CODE_PATTERNS.iter().any(|p| normalized.contains(p))
}

pub fn classify(label: &str, kind: FieldKind) -> Option<Category> {
    if kind == FieldKind::Select && is_phone_code_label(label) {
        return Some(Category::PhoneCountryCode);
    }
    let label = label.to_lowercase();
    rules_for(kind)
        .iter()
        .find(|rule| rule.matches(&label))
        .map(|rule| rule.category)
}

#[derive(Debug, Clone, Copy)]
pub struct FieldClassifier<'a> {
    profile: &'a Profile,
    work_location: &'a str,
}

impl<'a> FieldClassifier<'a> {
    pub fn new(profile: &'a Profile, work_location: &'a str) -> Self {
        Self { profile, work_location }
    }

    pub fn suggest(&self, label: &str, kind: FieldKind) -> Suggestion {
        let Some(category) = classify(label, kind) else {
            return Suggestion::NeedsAi;
        };
        if category == Category::KeepPrevious {
            return Suggestion::Keep;
        }
        let value = self.value(category).trim().to_string();
        if value.is_empty() {
            Suggestion::NeedsAi
        } else {
            Suggestion::Value { category, value }
        }
    }

    pub fn value(&self, category: Category) -> &str {
        let p = self.profile;
        match category {
            Category::YearsOfExperience => &p.years_of_experience,
            Category::Phone => &p.phone_number,
            Category::PhoneCountryCode => &p.phone_country_code,
            Category::Street => &p.street,
            Category::City => p.city_or(self.work_location),
            Category::WorkLocation => self.work_location,
            Category::State => &p.state,
            Category::Zipcode => &p.zipcode,
            Category::Country => &p.country,
            Category::FullName => &p.full_name,
            Category::FirstName => &p.first_name,
            Category::MiddleName => &p.middle_name,
            Category::LastName => &p.last_name,
            Category::RecentEmployer => &p.recent_employer,
            Category::NoticeDays => &p.notice_period_days,
            Category::NoticeWeeks => &p.notice_period_weeks,
            Category::NoticeMonths => &p.notice_period_months,
            Category::DesiredSalary => &p.desired_salary,
            Category::DesiredSalaryMonthly => &p.desired_salary_monthly,
            Category::DesiredSalaryLakhs => &p.desired_salary_lakhs,
            Category::CurrentCtc => &p.current_ctc,
            Category::CurrentCtcMonthly => &p.current_ctc_monthly,
            Category::CurrentCtcLakhs => &p.current_ctc_lakhs,
            Category::LinkedIn => &p.linkedin,
            Category::Website => &p.website,
            Category::Confidence => &p.confidence_level,
            Category::Headline => &p.linkedin_headline,
            Category::Summary => &p.linkedin_summary,
            Category::CoverLetter => &p.cover_letter,
            Category::Referral => &p.referral_source,
            Category::Visa => &p.require_visa,
            Category::Citizenship => &p.us_citizenship,
            Category::Veteran => &p.veteran_status,
            Category::Disability => &p.disability_status,
            Category::Gender => &p.gender,
            Category::Proficiency => "Professional",
            Category::KeepPrevious => "",
        }
    }
}
