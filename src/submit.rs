use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::answers::FormAnswerer;
use crate::dom::{self, Dom, DomError, DomResult, Key};
use crate::models::QuestionSet;
use crate::operator::Operator;
use crate::selectors;
use crate::state::RunState;

/// Advance attempts before the dialog is considered stuck.
pub const MAX_NEXT_CLICKS: u32 = 15;

pub const REASON_EASY_APPLY: &str = "Problem in Easy Applying";
pub const REASON_EXTERNAL: &str = "Probably didn't find Apply button or unable to switch tabs.";

pub const PREVIOUS_RESUME: &str = "Previous resume";
const STUCK: &str = "Seems like stuck in a continuous loop of next, probably because of new questions.";
const DAILY_LIMIT: &str = "exceeded the daily application limit";

const SHORT_WAIT: Duration = Duration::from_secs(1);
const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Started,
    Answering,
    Reviewing,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Submitted {
        date_applied: DateTime<Local>,
        resume: String,
        questions: QuestionSet,
    },
    /// The operator chose to throw the application away.
    Discarded { resume: String, questions: QuestionSet },
    Failed {
        stage: Stage,
        detail: String,
        screenshot: String,
        resume: String,
        questions: QuestionSet,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalOutcome {
    Collected { link: String },
    Failed { detail: String },
}

#[derive(Debug, Clone, Copy)]
pub struct SubmitSettings<'a> {
    pub resume_path: &'a Path,
    pub logs_folder: &'a Path,
    pub follow_companies: bool,
    pub pause_at_failed_question: bool,
    pub click_gap: Duration,
}

enum Abort {
    Dom(DomError),
    Discarded,
    Failed { detail: String, screenshot: String },
}

impl From<DomError> for Abort {
    fn from(e: DomError) -> Self {
        Abort::Dom(e)
    }
}

struct Attempt {
    stage: Stage,
    resume: String,
    questions: QuestionSet,
}

pub fn easy_apply<D: Dom>(
    dom: &D,
    job_id: &str,
    settings: &SubmitSettings,
    answerer: &FormAnswerer,
    operator: &dyn Operator,
    state: &mut RunState,
) -> DomResult<ApplyOutcome> {
    let mut attempt = Attempt {
        stage: Stage::Started,
        resume: PREVIOUS_RESUME.to_string(),
        questions: QuestionSet::new(),
    };

    let result = drive(dom, job_id, settings, answerer, operator, state, &mut attempt);
    let Attempt { stage, resume, questions } = attempt;
    match result {
        Ok(date_applied) => {
            info!(job_id, questions = questions.len(), "application submitted");
            Ok(ApplyOutcome::Submitted { date_applied, resume, questions })
        }
        Err(Abort::Dom(e)) if e.is_fatal() => Err(e),
        Err(Abort::Discarded) => {
            info!(job_id, "application discarded by operator");
            discard(dom)?;
            Ok(ApplyOutcome::Discarded { resume, questions })
        }
        Err(Abort::Dom(e)) => {
            let detail = e.to_string();
            abandon(dom, job_id, stage, detail, "Not Available".to_string(), resume, questions)
        }
        Err(Abort::Failed { detail, screenshot }) => {
            abandon(dom, job_id, stage, detail, screenshot, resume, questions)
        }
    }
}

fn abandon<D: Dom>(
    dom: &D,
    job_id: &str,
    stage: Stage,
    detail: String,
    screenshot: String,
    resume: String,
    questions: QuestionSet,
) -> DomResult<ApplyOutcome> {
    warn!(job_id, stage = ?stage, detail = %detail, "failed to easy apply");
    discard(dom)?;
    Ok(ApplyOutcome::Failed { stage, detail, screenshot, resume, questions })
}

fn drive<D: Dom>(
    dom: &D,
    job_id: &str,
    settings: &SubmitSettings,
    answerer: &FormAnswerer,
    operator: &dyn Operator,
    state: &mut RunState,
    attempt: &mut Attempt,
) -> Result<DateTime<Local>, Abort> {
    let Some(button) = dom::find_first(dom, None, selectors::EASY_APPLY_BUTTON)? else {
        return Err(failed("Easy Apply button not found"));
    };
    dom::click_with_fallback(dom, &button)?;
    let Some(modal) = dom::wait_for(dom, None, selectors::EASY_APPLY_MODAL, WAIT)? else {
        return Err(failed("Easy Apply dialog did not open"));
    };
    dom::wait_and_click(dom, Some(&modal), &selectors::span_button("Next"), SHORT_WAIT)?;

    attempt.stage = Stage::Answering;
    let mut uploaded = false;
    let mut paused = false;
    let mut counter = 0;
    loop {
        counter += 1;
        if counter >= MAX_NEXT_CLICKS {
            if settings.pause_at_failed_question && !paused {
                dom::save_screenshot(dom, settings.logs_folder, job_id, "Needed manual intervention for failed question");
                operator.alert(
                    "Help Needed",
                    "Couldn't answer one or more questions.\nPlease answer them in the browser, then continue here.\n\
                     Do not click Back, Next or Review in the dialog.",
                );
                paused = true;
                counter = 1;
                continue;
            }
            if !attempt.questions.is_empty() {
                warn!(job_id, questions = ?attempt.questions, "stuck on one of these questions");
            }
            let screenshot = dom::save_screenshot(dom, settings.logs_folder, job_id, "Failed at questions");
            return Err(Abort::Failed { detail: STUCK.to_string(), screenshot });
        }

        answerer.answer_all(dom, &modal, state, &mut attempt.questions)?;
        if state.use_new_resume && !uploaded {
            let (ok, resume) = upload_resume(dom, &modal, settings.resume_path)?;
            uploaded = ok;
            attempt.resume = resume;
        }

        let advance = match dom::find_first(dom, Some(&modal), selectors::REVIEW_BUTTON)? {
            Some(review) => Some(review),
            None => dom::find_first(dom, Some(&modal), selectors::NEXT_BUTTON)?,
        };
        let Some(advance) = advance else {
            break;
        };
        match dom.click(&advance) {
            Ok(()) => {}
            // Usually a "Next" inside the company photo carousel
            Err(DomError::ClickIntercepted(_)) => break,
            Err(e) => return Err(e.into()),
        }
        dom.pause(settings.click_gap);
    }
    debug!(job_id, questions = ?attempt.questions, "answered questions");

    attempt.stage = Stage::Reviewing;
    dom::wait_and_click(dom, None, selectors::REVIEW_BUTTON, SHORT_WAIT)?;
    let pause = state.pause_before_submit;
    if pause {
        let choice = operator.confirm(
            "Confirm your information",
            "1. Please verify your information.\n2. If you edited something, return to this final screen.\n\
             3. Do not click \"Submit Application\" yourself.",
            &["Disable Pause", "Discard Application", "Submit Application"],
        );
        match choice {
            0 => state.pause_before_submit = false,
            1 => return Err(Abort::Discarded),
            _ => {}
        }
    }
    if let Err(e) = follow_company(dom, &modal, settings.follow_companies) {
        if e.is_fatal() {
            return Err(e.into());
        }
        warn!(job_id, error = %e, "failed to update follow company checkbox");
    }

    attempt.stage = Stage::Submitting;
    if dom::wait_and_click(dom, None, selectors::SUBMIT_BUTTON, WAIT)? {
        let date_applied = Local::now();
        if !dom::wait_and_click(dom, None, selectors::DONE_BUTTON, WAIT)? {
            dom.press_key(Key::Escape)?;
        }
        return Ok(date_applied);
    }
    if pause {
        let choice = operator.confirm(
            "Failed to find Submit Application!",
            "You submitted the application, didn't you?",
            &["Yes", "No"],
        );
        if choice == 0 {
            let date_applied = Local::now();
            dom::wait_and_click(dom, None, selectors::DONE_BUTTON, WAIT)?;
            return Ok(date_applied);
        }
    }
    let screenshot = dom::save_screenshot(dom, settings.logs_folder, job_id, "Failed to click Submit application");
    Err(Abort::Failed { detail: "Failed to click Submit application".to_string(), screenshot })
}

fn failed(detail: &str) -> Abort {
    Abort::Failed { detail: detail.to_string(), screenshot: "Not Available".to_string() }
}

/// Attaches the resume file. Returns whether it went up and the resume name to record.
fn upload_resume<D: Dom>(dom: &D, modal: &D::Element, path: &Path) -> DomResult<(bool, String)> {
    let Ok(absolute) = std::fs::canonicalize(path) else {
        debug!(path = %path.display(), "resume file not found, keeping previous resume");
        return Ok((false, PREVIOUS_RESUME.to_string()));
    };
    let Some(input) = dom::find_first(dom, Some(modal), selectors::RESUME_INPUT)? else {
        return Ok((false, PREVIOUS_RESUME.to_string()));
    };
    match dom.type_text(&input, &absolute.to_string_lossy()) {
        Ok(()) => {
            let name = absolute
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| PREVIOUS_RESUME.to_string());
            info!(resume = %name, "uploaded resume");
            Ok((true, name))
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(error = %e, "resume upload failed");
            Ok((false, PREVIOUS_RESUME.to_string()))
        }
    }
}

fn follow_company<D: Dom>(dom: &D, modal: &D::Element, follow: bool) -> DomResult<()> {
    if let Some(checkbox) = dom::find_first(dom, Some(modal), selectors::FOLLOW_CHECKBOX)? {
        if dom.is_selected(&checkbox)? != follow {
            if let Some(label) = dom::find_first(dom, Some(modal), selectors::FOLLOW_LABEL)? {
                dom::click_with_fallback(dom, &label)?;
            }
        }
    }
    Ok(())
}

pub fn discard<D: Dom>(dom: &D) -> DomResult<()> {
    dom.press_key(Key::Escape)?;
    match dom::wait_and_click(dom, None, selectors::DISCARD_BUTTON, WAIT) {
        Ok(_) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(error = %e, "could not confirm discarding the application");
            Ok(())
        }
    }
}

pub fn daily_limit_reached<D: Dom>(dom: &D) -> DomResult<bool> {
    Ok(dom::find_text(dom, None, selectors::INLINE_FEEDBACK)?
        .is_some_and(|text| text.contains(DAILY_LIMIT)))
}

pub fn external_apply<D: Dom>(dom: &D, close_tabs: bool) -> DomResult<ExternalOutcome> {
    match collect_external_link(dom, close_tabs) {
        Ok(link) => {
            info!(link = %link, "got the external application link");
            Ok(ExternalOutcome::Collected { link })
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(error = %e, "failed to collect external application link");
            if let Err(e) = dom.switch_to_main_window() {
                if e.is_fatal() {
                    return Err(e);
                }
            }
            Ok(ExternalOutcome::Failed { detail: e.to_string() })
        }
    }
}

fn collect_external_link<D: Dom>(dom: &D, close_tabs: bool) -> DomResult<String> {
    let Some(button) = dom::wait_for(dom, None, selectors::APPLY_BUTTON, WAIT)? else {
        return Err(DomError::Other("apply button not found".to_string()));
    };
    dom::click_with_fallback(dom, &button)?;
    dom::wait_and_click(dom, None, selectors::CONTINUE_BUTTON, SHORT_WAIT)?;

    let opened_tab = dom.window_count()? > 1;
    dom.switch_to_newest_window()?;
    let link = dom.current_url()?;
    if close_tabs && opened_tab {
        dom.close_current_window()?;
    }
    dom.switch_to_main_window()?;
    Ok(link)
}
