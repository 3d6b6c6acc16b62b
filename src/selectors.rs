use crate::dom::{Locator, css, xp};

// --- Session ---

pub const LOGIN_FIELDS: &[Locator] = &[
    xp("//input[@id='username' or @name='session_key']"),
    xp("//input[@name='session_password']"),
];

pub const SIGNED_OUT_CONTROLS: &[Locator] = &[
    xp("//a[normalize-space()='Sign in' or normalize-space()='Join now']"),
    xp("//button[@type='submit' and contains(., 'Sign in')]"),
];

pub const PROFILE_MENU: &[Locator] = &[xp("//button[contains(@aria-label, 'Me')]")];

pub const LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const FEED_URL: &str = "https://www.linkedin.com/feed/";

// --- Results list ---

pub const JOB_CARDS: &[Locator] = &[
    xp("//li[@data-occludable-job-id]"),
    xp("//li[contains(@class,'jobs-search-results__list-item') and .//a[contains(@href,'/jobs/view/')]]"),
    xp("//div[contains(@class,'job-card-container') and .//a[contains(@href,'/jobs/view/')]]"),
    xp("//li[.//a[contains(@href,'/jobs/view/')]]"),
];

pub const CARD_LINK: &[Locator] = &[xp(".//a[contains(@href,'/jobs/view/')][1]"), css("a")];

pub const CARD_TITLE: &[Locator] = &[xp(".//*[contains(@class,'job-card-list__title')][1]")];

/// "Company · City, Country (Remote)"
pub const CARD_SUBTITLE: &[Locator] = &[css(".artdeco-entity-lockup__subtitle")];

pub const CARD_COMPANY: &[Locator] =
    &[xp(".//*[contains(@class,'job-card-container__primary-description')][1]")];

pub const CARD_LOCATION: &[Locator] =
    &[xp(".//*[contains(@class,'job-card-container__metadata-item')][1]")];

pub const CARD_STATE: &[Locator] = &[css(".job-card-container__footer-job-state")];

pub const CARD_ID_ATTRS: &[&str] = &["data-occludable-job-id", "data-job-id"];

pub const PAGINATION: &[Locator] = &[
    css(".jobs-search-pagination__pages"),
    css(".artdeco-pagination"),
    css(".artdeco-pagination__pages"),
];

pub const ACTIVE_PAGE: &[Locator] =
    &[xp(".//button[contains(@class, 'active') or @aria-current='true']")];

pub fn page_button(page: u32) -> Vec<Locator> {
    vec![Locator::xpath(format!(
        "//button[@aria-label='Page {page}' or @data-test-pagination-page-btn='{page}']"
    ))]
}

// --- Job details pane ---

pub const TOP_CARD: &[Locator] = &[
    css(".job-details-jobs-unified-top-card__primary-description-container"),
    css(".job-details-jobs-unified-top-card__primary-description"),
    css(".jobs-unified-top-card__primary-description"),
    css(".jobs-details__main-content"),
];

pub const POSTED_AGO: &[Locator] = &[xp(".//span[contains(normalize-space(), ' ago')]")];

pub const ABOUT_COMPANY: &[Locator] = &[css(".jobs-company__box")];

pub const DESCRIPTION: &[Locator] = &[css(".jobs-box__html-content"), css(".jobs-description__content")];

pub const HIRER_CARD: &[Locator] = &[css(".hirer-card__hirer-information")];
pub const HIRER_LINK: &[Locator] = &[css("a")];
pub const HIRER_NAME: &[Locator] = &[css("span")];

/// Present once an application for this job has been sent.
pub const APPLIED_LINK: &[Locator] = &[css(".jobs-s-apply__application-link")];

pub const EASY_APPLY_BUTTON: &[Locator] = &[
    xp(".//button[contains(@class,'jobs-apply-button') and (contains(@aria-label, 'Easy') or contains(., 'Easy'))]"),
    xp(".//button[contains(@class,'jobs-apply-button') and (contains(@aria-label, 'Solicitud') or contains(., 'Solicitud'))]"),
];

pub const APPLY_BUTTON: &[Locator] = &[xp(
    ".//button[contains(@class,'jobs-apply-button') and contains(@class, 'artdeco-button--3')]",
)];

pub const INLINE_FEEDBACK: &[Locator] = &[css(".artdeco-inline-feedback__message")];

// --- Easy Apply dialog ---

pub const EASY_APPLY_MODAL: &[Locator] = &[css(".jobs-easy-apply-modal"), xp("//div[@role='dialog']")];

pub const FORM_ELEMENTS: &[Locator] = &[xp(".//div[@data-test-form-element]")];

pub const FIELD_SELECT: &[Locator] = &[css("select")];
pub const FIELD_SELECT_LABEL: &[Locator] = &[xp(".//label//span"), css("label")];
pub const FIELD_OPTION: &[Locator] = &[css("option")];

pub const FIELD_RADIO: &[Locator] =
    &[xp(".//fieldset[@data-test-form-builder-radio-button-form-component='true']")];
pub const FIELD_RADIO_LABEL: &[Locator] = &[
    xp(".//span[@data-test-form-builder-radio-button-form-component__title]//*[contains(@class,'visually-hidden')]"),
    xp(".//span[@data-test-form-builder-radio-button-form-component__title]"),
];
pub const FIELD_RADIO_INPUT: &[Locator] = &[css("input")];

pub fn label_for(id: &str) -> Vec<Locator> {
    vec![Locator::xpath(format!(".//label[@for=\"{id}\"]"))]
}

pub const FIELD_TEXT: &[Locator] = &[xp(".//input[@type='text']")];
pub const FIELD_TEXT_LABEL: &[Locator] = &[
    xp(".//label[@for]//*[contains(@class,'visually-hidden')]"),
    xp(".//label[@for]"),
];

pub const FIELD_TEXTAREA: &[Locator] = &[css("textarea")];
pub const FIELD_TEXTAREA_LABEL: &[Locator] = &[xp(".//label[@for]")];

pub const FIELD_CHECKBOX: &[Locator] = &[xp(".//input[@type='checkbox']")];
pub const FIELD_CHECKBOX_LABEL: &[Locator] = &[xp(".//span[@class='visually-hidden']")];
pub const FIELD_CHECKBOX_OPTION: &[Locator] = &[xp(".//label[@for]")];

pub const TODAY_BUTTON: &[Locator] = &[xp("//button[contains(@aria-label, 'This is today')]")];

pub const RESUME_INPUT: &[Locator] = &[xp(".//input[@name='file']")];

/// A `<span>` whose whole text is `text`, the way the dialog renders its buttons.
pub fn span_button(text: &str) -> Vec<Locator> {
    vec![Locator::xpath(format!(".//span[normalize-space(.)=\"{text}\"]"))]
}

pub const REVIEW_BUTTON: &[Locator] = &[xp(".//span[normalize-space(.)=\"Review\"]")];
pub const NEXT_BUTTON: &[Locator] = &[xp(".//button[contains(span, \"Next\")]")];
pub const SUBMIT_BUTTON: &[Locator] = &[xp(".//span[normalize-space(.)=\"Submit application\"]")];
pub const DONE_BUTTON: &[Locator] = &[xp(".//span[normalize-space(.)=\"Done\"]")];
pub const DISCARD_BUTTON: &[Locator] = &[xp(".//span[normalize-space(.)=\"Discard\"]")];
pub const CONTINUE_BUTTON: &[Locator] = &[xp(".//span[normalize-space(.)=\"Continue\"]")];

pub const FOLLOW_CHECKBOX: &[Locator] =
    &[xp(".//input[@id='follow-company-checkbox' and @type='checkbox']")];
pub const FOLLOW_LABEL: &[Locator] = &[xp(".//label[@for='follow-company-checkbox']")];

// --- Filters panel ---

pub const ALL_FILTERS_BUTTON: &[Locator] = &[xp(
    "//button[normalize-space()='All filters' or normalize-space()='Todos los filtros' or contains(translate(@aria-label, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'filter') or contains(translate(@aria-label, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'filtro')]",
)];

pub const FILTER_CANDIDATES: &[Locator] =
    &[xp(".//*[self::span or self::button or self::label or self::div or self::input]")];

pub const SWITCH_CANDIDATES: &[Locator] =
    &[xp(".//*[self::label or self::span or self::div or self::button]")];

pub const CLICKABLE_ANCESTOR: &[Locator] =
    &[xp("./ancestor::*[self::button or self::label or self::a or @role='button'][1]")];

pub const SWITCH_ROW: &[Locator] =
    &[xp("./ancestor::*[self::li or self::div or self::fieldset or self::label][1]")];

pub const SWITCH_INPUT: &[Locator] = &[xp(".//input[@role='switch' or @type='checkbox']")];

pub const SHOW_RESULTS_BUTTON: &[Locator] = &[xp(
    "//button[contains(translate(@aria-label, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'apply current filters to show') or contains(translate(@aria-label, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'mostrar resultados')]",
)];

pub const FILTER_PANEL: &[Locator] = &[
    css(".artdeco-modal.search-reusables__side-panel"),
    xp("//div[@role='dialog']"),
];

pub const JOB_VIEW_URL: &str = "https://www.linkedin.com/jobs/view/";
pub const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";
