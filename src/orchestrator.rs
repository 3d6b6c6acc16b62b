use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::ai::{self, TextGenerator};
use crate::answers::{FieldClassifier, FormAnswerer, Profile};
use crate::config::{Config, DatePosted, SortBy};
use crate::db::Database;
use crate::dom::{Dom, DomResult};
use crate::evaluator::{self, Verdict};
use crate::filters;
use crate::job_page::{self, Listed};
use crate::models::{ApplicationRecord, EASY_APPLIED, FailureRecord, JobListing, PENDING, QuestionSet, UNKNOWN};
use crate::operator::Operator;
use crate::pagination::{self, Advance, LISTINGS_TIMEOUT};
use crate::scanner;
use crate::state::RunState;
use crate::submit::{self, ApplyOutcome, ExternalOutcome, PREVIOUS_RESUME, REASON_EASY_APPLY, REASON_EXTERNAL, SubmitSettings};

const SKIPPED: &str = "Skipped";
const NOT_AVAILABLE: &str = "Not Available";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handled {
    Applied,
    Skipped,
    Failed,
    DailyLimit,
}

struct Cycle<'c> {
    config: &'c Config,
    profile: Profile,
    gap: Duration,
}

pub struct Orchestrator<'a, D: Dom> {
    dom: &'a D,
    db: &'a Database,
    operator: &'a dyn Operator,
    generator: Option<&'a dyn TextGenerator>,
    dry_run: bool,
}

impl<'a, D: Dom> Orchestrator<'a, D> {
    pub fn new(dom: &'a D, db: &'a Database, operator: &'a dyn Operator) -> Self {
        Self { dom, db, operator, generator: None, dry_run: false }
    }

    pub fn with_generator(mut self, generator: Option<&'a dyn TextGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one cycle, or keeps cycling in non-stop mode until the daily
    /// limit shows up. Only a lost session is an error.
    pub fn run(&self, config: Arc<Config>, state: &mut RunState) -> DomResult<()> {
        state.pause_before_submit = config.questions.pause_before_submit;
        state.pause_after_filters = config.search.pause_after_filters;
        if !config.questions.default_resume_path.exists() {
            warn!(
                path = %config.questions.default_resume_path.display(),
                "resume file not found, applications will use the previously uploaded resume"
            );
            state.use_new_resume = false;
        }

        let mut snapshot = config;
        loop {
            self.run_cycle(&snapshot, state)?;
            if state.daily_limit_reached {
                warn!("daily application limit reached, stopping");
                break;
            }
            if !snapshot.settings.run_non_stop {
                break;
            }

            let settings = &snapshot.settings;
            info!(secs = settings.cycle_sleep_secs, "sleeping before the next cycle");
            self.dom.pause(Duration::from_secs(settings.cycle_sleep_secs));

            let sort_by = snapshot.search.sort_by;
            let date_posted = if settings.cycle_date_posted {
                let current = snapshot.search.date_posted.unwrap_or(DatePosted::AnyTime);
                Some(current.next(settings.stop_date_cycle_at_24hr))
            } else {
                snapshot.search.date_posted
            };
            let rotated = snapshot.next_revision(sort_by, date_posted);
            snapshot = if settings.alternate_sortby {
                let flipped = rotated.next_revision(sort_by.map(SortBy::flipped), date_posted);
                self.run_cycle(&flipped, state)?;
                if state.daily_limit_reached {
                    warn!("daily application limit reached, stopping");
                    break;
                }
                Arc::new(flipped.next_revision(sort_by, date_posted))
            } else {
                Arc::new(rotated)
            };
        }
        Ok(())
    }

    fn run_cycle(&self, config: &Config, state: &mut RunState) -> DomResult<()> {
        let cycle = Cycle {
            config,
            profile: Profile::new(&config.personals, &config.questions),
            gap: Duration::from_secs_f64(config.settings.click_gap.max(0.0)),
        };
        info!(
            revision = config.revision,
            cycle = state.total_runs + 1,
            sort_by = config.search.sort_by.map(SortBy::label),
            date_posted = config.search.date_posted.map(DatePosted::label),
            "starting cycle"
        );

        let mut terms: Vec<&str> = config
            .search
            .search_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if config.search.randomize_search_order {
            terms.shuffle(&mut rand::thread_rng());
            debug!(?terms, "shuffled search terms");
        }

        for term in terms {
            self.search_term(&cycle, term, state)?;
            if state.daily_limit_reached {
                break;
            }
        }
        state.total_runs += 1;
        Ok(())
    }

    fn search_term(&self, cycle: &Cycle, term: &str, state: &mut RunState) -> DomResult<()> {
        let search = &cycle.config.search;
        info!(term, "searching");
        let report = filters::configure_results(self.dom, term, search, cycle.gap)?;
        if !report.not_found.is_empty() || !report.failed.is_empty() {
            warn!(
                term,
                not_found = ?report.not_found,
                failed = ?report.failed,
                "some filters could not be applied"
            );
        }

        if state.pause_after_filters {
            let choice = self.operator.confirm(
                "Filters applied",
                "Please check the filters in the browser and fix anything that is off, then continue.",
                &["Turn off Pause after search", "Look good, continue"],
            );
            if choice == 0 {
                state.pause_after_filters = false;
            }
        }

        let mut current_count = 0;
        while current_count < search.switch_number {
            if !pagination::wait_for_listings(self.dom, LISTINGS_TIMEOUT)? {
                warn!(term, "no job listings showed up");
                break;
            }
            let page = pagination::page_info(self.dom)?;
            let listings = scanner::job_cards(self.dom)?.len();
            debug!(term, page = page.as_ref().map(|p| p.current), listings, "processing page");

            for index in 0..listings {
                if current_count >= search.switch_number {
                    break;
                }
                // Cards re-render while we click around; fetch them fresh every time.
                let cards = scanner::job_cards(self.dom)?;
                let Some(card) = cards.get(index) else {
                    debug!(index, "listing disappeared from the page");
                    break;
                };
                let listing = match scanner::read_card(self.dom, card) {
                    Ok(listing) => listing,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(index, error = %e, "could not read job card");
                        continue;
                    }
                };
                match self.process_listing(cycle, card, &listing, state) {
                    Ok(Handled::Applied) => current_count += 1,
                    Ok(Handled::DailyLimit) => {
                        state.daily_limit_reached = true;
                        return Ok(());
                    }
                    Ok(Handled::Skipped | Handled::Failed) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!(job_id = %listing.job_id, error = %e, "failed to process job"),
                }
            }

            let Some(page) = page else {
                info!(term, "single page of results, finishing this search term");
                break;
            };
            if pagination::next_page(self.dom, page.current, search)? == Advance::Exhausted {
                break;
            }
        }
        info!(term, applied = current_count, "done with search term");
        Ok(())
    }

    fn process_listing(
        &self,
        cycle: &Cycle,
        card: &D::Element,
        listing: &JobListing,
        state: &mut RunState,
    ) -> DomResult<Handled> {
        let search = &cycle.config.search;
        let job_id = listing.job_id.as_str();

        let badge = scanner::shows_applied_badge(self.dom, card)?;
        if let Some(reason) = scanner::skip_reason(listing, badge, state) {
            info!(job_id, company = %listing.company, reason = reason.as_str(), "skipping job");
            state.skip_count += 1;
            return Ok(Handled::Skipped);
        }
        if let Some(excluded) = scanner::excluded_location(&listing.work_location, &search.exclude_locations) {
            info!(job_id, location = %listing.work_location, excluded, "skipping job in excluded location");
            state.skip_count += 1;
            return Ok(Handled::Skipped);
        }

        scanner::open_card(self.dom, card, cycle.gap)?;

        let easy_apply = job_page::has_easy_apply_button(self.dom)?;
        if search.easy_apply_only && !easy_apply {
            if submit::daily_limit_reached(self.dom)? {
                return Ok(Handled::DailyLimit);
            }
            info!(job_id, title = %listing.title, "skipping job without Easy Apply");
            state.skip_count += 1;
            return Ok(Handled::Skipped);
        }
        if state.applied.contains(job_id) || job_page::shows_application_link(self.dom)? {
            info!(job_id, title = %listing.title, company = %listing.company, "already applied");
            return Ok(Handled::Skipped);
        }

        match evaluator::read_about_company(self.dom) {
            Ok(Some(about)) => {
                if let Verdict::Reject { reason, detail } = evaluator::check_about_company(&about, search) {
                    info!(job_id, company = %listing.company, detail = %detail, "blacklisting company");
                    state.rejected.insert(job_id.to_string());
                    state.blacklisted_companies.insert(listing.company.clone());
                    self.save_failure(&failure(listing, UNKNOWN, reason, &detail, SKIPPED, NOT_AVAILABLE));
                    state.skip_count += 1;
                    return Ok(Handled::Skipped);
                }
            }
            Ok(None) => debug!(job_id, "no about company section"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(job_id, error = %e, "failed to read about company"),
        }

        let hiring_manager = or_default(job_page::hiring_manager(self.dom), job_id, "hiring manager")?;
        let listed = or_default(
            job_page::date_listed(self.dom, Local::now()),
            job_id,
            "date listed",
        )?;

        let evaluation = evaluator::evaluate_page(self.dom, search)?;
        if let Verdict::Reject { reason, detail } = &evaluation.verdict {
            self.reject(listing, &listed, reason, detail, state);
            return Ok(Handled::Skipped);
        }
        let description = Some(evaluation.description.text.as_str()).filter(|d| *d != UNKNOWN);
        if search.english_only_jobs {
            if let Verdict::Reject { reason, detail } = evaluator::check_language(&listing.title, description) {
                self.reject(listing, &listed, reason, &detail, state);
                return Ok(Handled::Skipped);
            }
        }

        let skills = match (self.generator, description) {
            (Some(generator), Some(text)) => match ai::extract_skills(generator, text) {
                Ok(skills) => {
                    info!(job_id, model = generator.model_name(), "extracted skills");
                    skills
                }
                Err(e) => {
                    warn!(job_id, error = %e, "failed to extract skills");
                    "Error extracting skills".to_string()
                }
            },
            _ => "In Development".to_string(),
        };

        if self.dry_run {
            info!(job_id, title = %listing.title, company = %listing.company, easy_apply, "dry run, not applying");
            return Ok(Handled::Skipped);
        }

        let mut record = ApplicationRecord {
            job_id: listing.job_id.clone(),
            title: listing.title.clone(),
            company: listing.company.clone(),
            work_location: listing.work_location.clone(),
            work_style: listing.work_style.as_str().to_string(),
            about_job: evaluation.description.text.clone(),
            experience_required: evaluation.description.experience_required.to_string(),
            skills,
            hr_name: hiring_manager.name,
            hr_link: hiring_manager.link,
            resume: PENDING.to_string(),
            reposted: listed.reposted,
            date_listed: listed.date.clone(),
            date_applied: PENDING.to_string(),
            job_link: listing.job_link.clone(),
            application_link: EASY_APPLIED.to_string(),
            questions: QuestionSet::new(),
            connect_request: "In Development".to_string(),
        };

        if easy_apply {
            let config = cycle.config;
            let settings = SubmitSettings {
                resume_path: &config.questions.default_resume_path,
                logs_folder: &config.settings.logs_folder_path,
                follow_companies: config.settings.follow_companies,
                pause_at_failed_question: config.questions.pause_at_failed_question,
                click_gap: cycle.gap,
            };
            let answerer = FormAnswerer {
                classifier: FieldClassifier::new(&cycle.profile, &listing.work_location),
                generator: self.generator,
                job_description: description,
                user_information: &config.questions.user_information_all,
                overwrite: config.questions.overwrite_previous_answers,
            };
            match submit::easy_apply(self.dom, job_id, &settings, &answerer, self.operator, state)? {
                ApplyOutcome::Submitted { date_applied, resume, questions } => {
                    record.date_applied = date_applied.format(DATE_FORMAT).to_string();
                    record.resume = resume;
                    record.questions = questions;
                }
                ApplyOutcome::Discarded { resume, .. } => {
                    let mut failed = failure(
                        listing,
                        &listed.date,
                        REASON_EASY_APPLY,
                        "Job application discarded by user!",
                        EASY_APPLIED,
                        NOT_AVAILABLE,
                    );
                    failed.resume = resume;
                    self.save_failure(&failed);
                    state.failed_count += 1;
                    return Ok(Handled::Failed);
                }
                ApplyOutcome::Failed { stage, detail, screenshot, resume, .. } => {
                    warn!(job_id, stage = ?stage, detail = %detail, "easy apply failed");
                    let mut failed =
                        failure(listing, &listed.date, REASON_EASY_APPLY, &detail, EASY_APPLIED, &screenshot);
                    failed.resume = resume;
                    self.save_failure(&failed);
                    state.failed_count += 1;
                    return Ok(Handled::Failed);
                }
            }
        } else {
            match submit::external_apply(self.dom, cycle.config.settings.close_tabs)? {
                ExternalOutcome::Collected { link } => record.application_link = link,
                ExternalOutcome::Failed { detail } => {
                    self.save_failure(&failure(listing, &listed.date, REASON_EXTERNAL, &detail, UNKNOWN, NOT_AVAILABLE));
                    state.failed_count += 1;
                    return Ok(Handled::Failed);
                }
            }
        }

        self.save_application(&record);
        if easy_apply {
            if record.resume != PREVIOUS_RESUME {
                state.use_new_resume = false;
            }
            state.easy_applied_count += 1;
        } else {
            state.external_jobs_count += 1;
        }
        state.applied.insert(record.job_id);
        info!(job_id, title = %listing.title, company = %listing.company, "saved job");
        Ok(Handled::Applied)
    }

    fn reject(&self, listing: &JobListing, listed: &Listed, reason: &str, detail: &str, state: &mut RunState) {
        info!(job_id = %listing.job_id, reason, detail, "skipping job");
        self.save_failure(&failure(listing, &listed.date, reason, detail, SKIPPED, NOT_AVAILABLE));
        state.rejected.insert(listing.job_id.clone());
        state.skip_count += 1;
    }

    fn save_application(&self, record: &ApplicationRecord) {
        if let Err(e) = self.db.append_application(record) {
            error!(job_id = %record.job_id, error = %e, "failed to save application record");
            self.operator.alert(
                "Failed to save record",
                &format!(
                    "Could not save the application for job {} ({}) to {}:\n{:#}\n\nThe run will continue.",
                    record.job_id,
                    record.title,
                    self.db.path().display(),
                    e
                ),
            );
        }
    }

    fn save_failure(&self, record: &FailureRecord) {
        if let Err(e) = self.db.append_failure(record) {
            error!(job_id = %record.job_id, error = %e, "failed to save failure record");
            self.operator.alert(
                "Failed to save record",
                &format!(
                    "Could not save the failure for job {} to {}:\n{:#}\n\nThe run will continue.",
                    record.job_id,
                    self.db.path().display(),
                    e
                ),
            );
        }
    }
}

fn failure(
    listing: &JobListing,
    date_listed: &str,
    reason: &str,
    detail: &str,
    application_link: &str,
    screenshot: &str,
) -> FailureRecord {
    FailureRecord {
        job_id: listing.job_id.clone(),
        job_link: listing.job_link.clone(),
        resume: PENDING.to_string(),
        date_listed: date_listed.to_string(),
        date_tried: Local::now().format(DATE_FORMAT).to_string(),
        reason: reason.to_string(),
        detail: detail.to_string(),
        application_link: application_link.to_string(),
        screenshot: screenshot.to_string(),
    }
}

/// Optional page facts: a read failure falls back to the default.
fn or_default<T: Default>(read: DomResult<T>, job_id: &str, what: &str) -> DomResult<T> {
    match read {
        Ok(value) => Ok(value),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!(job_id, what, error = %e, "could not read job page detail");
            Ok(T::default())
        }
    }
}
