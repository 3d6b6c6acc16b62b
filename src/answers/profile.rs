use crate::config::{PersonalsConfig, QuestionsConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub phone_country_code: String,
    pub current_city: String,
    pub street: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub gender: String,
    pub disability_status: String,
    pub veteran_status: String,

    pub years_of_experience: String,
    pub require_visa: String,
    pub us_citizenship: String,
    pub linkedin: String,
    pub website: String,
    pub linkedin_headline: String,
    pub linkedin_summary: String,
    pub cover_letter: String,
    pub recent_employer: String,
    pub confidence_level: String,
    pub referral_source: String,

    pub desired_salary: String,
    pub desired_salary_monthly: String,
    pub desired_salary_lakhs: String,
    pub current_ctc: String,
    pub current_ctc_monthly: String,
    pub current_ctc_lakhs: String,
    pub notice_period_days: String,
    pub notice_period_weeks: String,
    pub notice_period_months: String,
}

impl Profile {
    pub fn new(personals: &PersonalsConfig, questions: &QuestionsConfig) -> Self {
        let full_name = [&personals.first_name, &personals.middle_name, &personals.last_name]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let notice = questions.notice_period;
        Self {
            first_name: personals.first_name.clone(),
            middle_name: personals.middle_name.clone(),
            last_name: personals.last_name.clone(),
            full_name,
            phone_number: personals.phone_number.clone(),
            phone_country_code: personals.phone_country_code.clone(),
            current_city: personals.current_city.clone(),
            street: personals.street.clone(),
            state: personals.state.clone(),
            zipcode: personals.zipcode.clone(),
            country: personals.country.clone(),
            gender: personals.gender.clone(),
            disability_status: personals.disability_status.clone(),
            veteran_status: personals.veteran_status.clone(),

            years_of_experience: questions.years_of_experience.clone(),
            require_visa: questions.require_visa.clone(),
            us_citizenship: questions.us_citizenship.clone(),
            linkedin: questions.linkedin.clone(),
            website: questions.website.clone(),
            linkedin_headline: questions.linkedin_headline.clone(),
            linkedin_summary: questions.linkedin_summary.clone(),
            cover_letter: questions.cover_letter.clone(),
            recent_employer: questions.recent_employer.clone(),
            confidence_level: questions.confidence_level.clone(),
            referral_source: questions.referral_source.clone(),

            desired_salary: questions.desired_salary.to_string(),
            desired_salary_monthly: decimal(questions.desired_salary as f64 / 12.0),
            desired_salary_lakhs: decimal(questions.desired_salary as f64 / 100_000.0),
            current_ctc: questions.current_ctc.to_string(),
            current_ctc_monthly: decimal(questions.current_ctc as f64 / 12.0),
            current_ctc_lakhs: decimal(questions.current_ctc as f64 / 100_000.0),
            notice_period_days: notice.to_string(),
            notice_period_weeks: (notice / 7).to_string(),
            notice_period_months: (notice / 30).to_string(),
        }
    }

    /// City for location fields, falling back to where the job is.
    pub fn city_or<'a>(&'a self, work_location: &'a str) -> &'a str {
        if self.current_city.trim().is_empty() {
            work_location
        } else {
            &self.current_city
        }
    }
}

/// Two decimals at most, trailing zeros dropped.
fn decimal(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
