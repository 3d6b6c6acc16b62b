use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{self, TextGenerator};
use crate::answers::classifier::{self, Category, FieldClassifier, Suggestion};
use crate::answers::options::{self, PLACEHOLDER, Pick};
use crate::dom::{self, Dom, DomResult, Key};
use crate::models::{FieldKind, Question, QuestionSet, UNKNOWN};
use crate::selectors;
use crate::state::RunState;

const AUTOCOMPLETE_WAIT: Duration = Duration::from_secs(2);

pub struct FormAnswerer<'a> {
    pub classifier: FieldClassifier<'a>,
    pub generator: Option<&'a dyn TextGenerator>,
    pub job_description: Option<&'a str>,
    pub user_information: &'a str,
    pub overwrite: bool,
}

impl<'a> FormAnswerer<'a> {
    pub fn answer_all<D: Dom>(
        &self,
        dom: &D,
        modal: &D::Element,
        state: &mut RunState,
        questions: &mut QuestionSet,
    ) -> DomResult<()> {
        for field in dom::find_all_first(dom, Some(modal), selectors::FORM_ELEMENTS)? {
            let answered = if let Some(select) = dom::find_first(dom, Some(&field), selectors::FIELD_SELECT)? {
                self.answer_select(dom, &field, &select, state)?
            } else if let Some(radio) = dom::find_first(dom, Some(&field), selectors::FIELD_RADIO)? {
                self.answer_radio(dom, &radio, state)?
            } else if let Some(input) = dom::find_first(dom, Some(&field), selectors::FIELD_TEXT)? {
                self.answer_text(dom, &field, &input, state)?
            } else if let Some(area) = dom::find_first(dom, Some(&field), selectors::FIELD_TEXTAREA)? {
                self.answer_textarea(dom, &field, &area, state)?
            } else if let Some(checkbox) = dom::find_first(dom, Some(&field), selectors::FIELD_CHECKBOX)? {
                self.answer_checkbox(dom, &field, &checkbox)?
            } else {
                debug!("form element with no known input");
                continue;
            };
            questions.insert(answered);
        }

        if let Some(today) = dom::find_first(dom, None, selectors::TODAY_BUTTON)? {
            dom::click_with_fallback(dom, &today)?;
        }
        Ok(())
    }

    fn ask_ai(&self, label: &str, kind: FieldKind, options: Option<&[String]>) -> Option<String> {
        let generator = self.generator?;
        match ai::answer_question(
            generator,
            label,
            kind,
            options,
            self.job_description,
            self.user_information,
        ) {
            Ok(answer) => {
                info!(question = label, answer = %answer, "AI answered");
                Some(answer)
            }
            Err(e) => {
                warn!(question = label, error = %e, "failed to get AI answer");
                None
            }
        }
    }

    fn answer_select<D: Dom>(
        &self,
        dom: &D,
        field: &D::Element,
        select: &D::Element,
        state: &mut RunState,
    ) -> DomResult<Question> {
        let label = label_text(dom, field, selectors::FIELD_SELECT_LABEL)?;
        let option_elements = dom::find_all_first(dom, Some(select), selectors::FIELD_OPTION)?;
        let mut options = Vec::with_capacity(option_elements.len());
        let mut selected = None;
        for option in &option_elements {
            let text = dom.text(option)?.trim().to_string();
            let value = dom.attr(option, "value")?.unwrap_or_default();
            if selected.is_none() && dom.is_selected(option)? {
                selected = Some(text.clone());
            }
            options.push((text, value));
        }
        let selected = selected.unwrap_or_else(|| PLACEHOLDER.to_string());
        let texts: Vec<String> = options.iter().map(|(t, _)| t.clone()).collect();

        let phone_code = classifier::is_phone_code_label(&label);
        let listed = if phone_code {
            "\"List of phone country codes\"".to_string()
        } else {
            texts.iter().map(|t| format!("\"{}\"", t)).collect::<Vec<_>>().join(", ")
        };
        let question_label = format!("{} [ {} ]", label, listed);

        let code = self.classifier.value(Category::PhoneCountryCode);
        let should_answer = self.overwrite
            || selected == PLACEHOLDER
            || (phone_code && !selected.contains(code));
        let mut answer = selected.clone();

        if should_answer {
            let wanted = match self.classifier.suggest(&label, FieldKind::Select) {
                Suggestion::Keep => None,
                Suggestion::Value { category: Category::PhoneCountryCode, value } => {
                    match options::pick_phone_code(&value, &options) {
                        Some(i) => {
                            dom.click(&option_elements[i])?;
                            answer = texts[i].clone();
                            None
                        }
                        None => Some(value),
                    }
                }
                Suggestion::Value { value, .. } => Some(value),
                Suggestion::NeedsAi => Some(
                    self.ask_ai(&label, FieldKind::Select, Some(&texts))
                        .unwrap_or_else(|| "Yes".to_string()),
                ),
            };
            if let Some(wanted) = wanted {
                match options::pick(&wanted, &texts) {
                    Some(pick) => {
                        if pick.is_fallback() {
                            warn!(
                                question = %label,
                                wanted = %wanted,
                                "no option resembles the answer, answering randomly"
                            );
                            state.record_random(&question_label, FieldKind::Select);
                        }
                        dom.click(&option_elements[pick.index()])?;
                        answer = texts[pick.index()].clone();
                    }
                    None => warn!(question = %label, "dropdown has no options to choose from"),
                }
            }
        }

        Ok(Question {
            label: question_label,
            answer,
            kind: FieldKind::Select,
            previous: Some(selected),
        })
    }

    fn answer_radio<D: Dom>(&self, dom: &D, radio: &D::Element, state: &mut RunState) -> DomResult<Question> {
        let label = label_text(dom, radio, selectors::FIELD_RADIO_LABEL)?;
        let inputs = dom::find_all_first(dom, Some(radio), selectors::FIELD_RADIO_INPUT)?;

        let mut texts = Vec::with_capacity(inputs.len());
        let mut described = Vec::with_capacity(inputs.len());
        let mut option_labels = Vec::with_capacity(inputs.len());
        let mut previous = None;
        for input in &inputs {
            let id = dom.attr(input, "id")?.unwrap_or_default();
            let option_label = dom::find_first(dom, Some(radio), &selectors::label_for(&id))?;
            let text = match &option_label {
                Some(l) => dom.text(l)?.trim().to_string(),
                None => UNKNOWN.to_string(),
            };
            let value = dom.attr(input, "value")?.unwrap_or_default();
            let description = format!("\"{}\"<{}>", text, value);
            if dom.is_selected(input)? {
                previous = Some(description.clone());
            }
            texts.push(text);
            described.push(description);
            option_labels.push(option_label);
        }
        let question_label = format!("{} [ {} ]", label, described.join(", "));

        let answer = match &previous {
            Some(prev) if !self.overwrite => prev.clone(),
            _ => {
                let wanted = match self.classifier.suggest(&label, FieldKind::Radio) {
                    Suggestion::Value { value, .. } => value,
                    Suggestion::Keep | Suggestion::NeedsAi => self
                        .ask_ai(&label, FieldKind::Radio, Some(&texts))
                        .unwrap_or_else(|| "Yes".to_string()),
                };
                match options::pick(&wanted, &texts) {
                    Some(pick) => {
                        let i = pick.index();
                        let target = option_labels[i].as_ref().unwrap_or(&inputs[i]);
                        dom::click_with_fallback(dom, target)?;
                        match pick {
                            Pick::Fallback(_) => {
                                warn!(question = %label, wanted = %wanted, "no radio option resembles the answer, answering randomly");
                                state.record_random(&question_label, FieldKind::Radio);
                                described[i].clone()
                            }
                            Pick::Fuzzy(_) if wanted == "Decline" => format!("Decline ({})", described[i]),
                            _ => described[i].clone(),
                        }
                    }
                    None => {
                        warn!(question = %label, "radio group has no options");
                        UNKNOWN.to_string()
                    }
                }
            }
        };

        Ok(Question { label: question_label, answer, kind: FieldKind::Radio, previous })
    }

    fn answer_text<D: Dom>(
        &self,
        dom: &D,
        field: &D::Element,
        input: &D::Element,
        state: &mut RunState,
    ) -> DomResult<Question> {
        let label = label_text(dom, field, selectors::FIELD_TEXT_LABEL)?;
        let previous = dom.prop(input, "value")?.unwrap_or_default();

        if previous.is_empty() || self.overwrite {
            let (answer, autocomplete) = match self.classifier.suggest(&label, FieldKind::Text) {
                Suggestion::Value { category, value } => (value, category.autocompletes()),
                Suggestion::Keep | Suggestion::NeedsAi => {
                    let answer = self.ask_ai(&label, FieldKind::Text, None).unwrap_or_else(|| {
                        state.record_random(&label, FieldKind::Text);
                        self.classifier.value(Category::YearsOfExperience).to_string()
                    });
                    (answer, false)
                }
            };
            dom.clear(input)?;
            dom.type_text(input, &answer)?;
            if autocomplete {
                dom.pause(AUTOCOMPLETE_WAIT);
                dom.press_key(Key::ArrowDown)?;
                dom.press_key(Key::Enter)?;
            }
        }

        let value = dom.prop(input, "value")?.unwrap_or_default();
        Ok(Question {
            label,
            answer: value,
            kind: FieldKind::Text,
            previous: (!previous.is_empty()).then_some(previous),
        })
    }

    fn answer_textarea<D: Dom>(
        &self,
        dom: &D,
        field: &D::Element,
        area: &D::Element,
        state: &mut RunState,
    ) -> DomResult<Question> {
        let label = label_text(dom, field, selectors::FIELD_TEXTAREA_LABEL)?;
        let previous = dom.prop(area, "value")?.unwrap_or_default();

        if previous.is_empty() || self.overwrite {
            let answer = match self.classifier.suggest(&label, FieldKind::Textarea) {
                Suggestion::Value { value, .. } => value,
                Suggestion::Keep | Suggestion::NeedsAi => self
                    .ask_ai(&label, FieldKind::Textarea, None)
                    .unwrap_or_else(|| {
                        state.record_random(&label, FieldKind::Textarea);
                        String::new()
                    }),
            };
            dom.clear(area)?;
            dom.type_text(area, &answer)?;
        }

        let value = dom.prop(area, "value")?.unwrap_or_default();
        Ok(Question {
            label,
            answer: value,
            kind: FieldKind::Textarea,
            previous: (!previous.is_empty()).then_some(previous),
        })
    }

    fn answer_checkbox<D: Dom>(&self, dom: &D, field: &D::Element, checkbox: &D::Element) -> DomResult<Question> {
        let label = label_text(dom, field, selectors::FIELD_CHECKBOX_LABEL)?;
        // Several boxes per question are possible; only the first is handled.
        let option = dom::find_text(dom, Some(field), selectors::FIELD_CHECKBOX_OPTION)?
            .unwrap_or_else(|| UNKNOWN.to_string());
        let was_checked = dom.is_selected(checkbox)?;
        let mut checked = was_checked;
        if !was_checked {
            match dom::click_with_fallback(dom, checkbox) {
                Ok(()) => checked = true,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(question = %label, error = %e, "checkbox click failed"),
            }
        }
        Ok(Question {
            label: format!("{} ([X] {})", label, option),
            answer: checked.to_string(),
            kind: FieldKind::Checkbox,
            previous: Some(was_checked.to_string()),
        })
    }
}

fn label_text<D: Dom>(dom: &D, scope: &D::Element, strategies: &[crate::dom::Locator]) -> DomResult<String> {
    Ok(dom::find_text(dom, Some(scope), strategies)?
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::answers::profile::Profile;
    use crate::testing::{FakeDom, NodeId, StubGenerator};

    fn profile() -> Profile {
        Profile {
            years_of_experience: "6".to_string(),
            phone_number: "5550100".to_string(),
            phone_country_code: "+91".to_string(),
            require_visa: "No".to_string(),
            gender: "Decline".to_string(),
            ..Default::default()
        }
    }

    fn answerer<'a>(profile: &'a Profile, generator: Option<&'a dyn TextGenerator>) -> FormAnswerer<'a> {
        FormAnswerer {
            classifier: FieldClassifier::new(profile, "Remote"),
            generator,
            job_description: Some("Build things"),
            user_information: "",
            overwrite: false,
        }
    }

    fn modal_with(dom: &FakeDom, fields: &[NodeId]) -> NodeId {
        let modal = dom.node("div", "");
        dom.on_first(Some(modal), selectors::FORM_ELEMENTS, fields);
        modal
    }

    fn text_field(dom: &FakeDom, label: &str, value: &str) -> (NodeId, NodeId) {
        let field = dom.node("div", "");
        let input = dom.node("input", "");
        let label = dom.node("label", label);
        if !value.is_empty() {
            dom.set_attr(input, "value", value);
        }
        dom.on_first(Some(field), selectors::FIELD_TEXT, &[input]);
        dom.on_first(Some(field), selectors::FIELD_TEXT_LABEL, &[label]);
        (field, input)
    }

    fn select_field(dom: &FakeDom, label: &str, options: &[&str]) -> (NodeId, Vec<NodeId>) {
        let field = dom.node("div", "");
        let select = dom.node("select", "");
        let label = dom.node("span", label);
        let ids: Vec<NodeId> = options
            .iter()
            .map(|text| {
                let id = dom.node("option", text);
                dom.set_attr(id, "value", text);
                id
            })
            .collect();
        dom.set_selected(ids[0], true);
        dom.on_first(Some(field), selectors::FIELD_SELECT, &[select]);
        dom.on_first(Some(field), selectors::FIELD_SELECT_LABEL, &[label]);
        dom.on_first(Some(select), selectors::FIELD_OPTION, &ids);
        (field, ids)
    }

    #[test]
    fn test_text_field_from_profile() {
        let dom = FakeDom::new();
        let (field, input) = text_field(&dom, "Years of experience", "");
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();

        assert_eq!(dom.value(input), "6");
        let q = questions.iter().next().unwrap();
        assert_eq!(q.label, "Years of experience");
        assert_eq!(q.answer, "6");
        assert_eq!(q.previous, None);
        assert!(state.randomly_answered.is_empty());
    }

    #[test]
    fn test_text_field_keeps_previous_answer() {
        let dom = FakeDom::new();
        let (field, input) = text_field(&dom, "Mobile phone number", "12345");
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.value(input), "12345");

        let mut overwrite = answerer(&profile, None);
        overwrite.overwrite = true;
        overwrite.answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.value(input), "5550100");
    }

    #[test]
    fn test_unknown_text_field_uses_ai_then_fallback() {
        let dom = FakeDom::new();
        let (field, input) = text_field(&dom, "Favourite crate", "");
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        let stub = StubGenerator::replying(&[Some("serde")]);
        answerer(&profile, Some(&stub)).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.value(input), "serde");
        assert!(state.randomly_answered.is_empty());

        let (field, input) = text_field(&dom, "Favourite crate", "");
        let modal = modal_with(&dom, &[field]);
        let failing = StubGenerator::replying(&[None]);
        answerer(&profile, Some(&failing)).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.value(input), "6");
        assert!(state.randomly_answered.contains(&("Favourite crate".to_string(), FieldKind::Text)));
    }

    #[test]
    fn test_city_field_confirms_autocomplete() {
        let dom = FakeDom::new();
        let (field, input) = text_field(&dom, "City", "");
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.value(input), "Remote");
        assert_eq!(dom.keys(), vec![Key::ArrowDown, Key::Enter]);
    }

    #[test]
    fn test_select_decline_matches_phrase() {
        let dom = FakeDom::new();
        let (field, ids) = select_field(
            &dom,
            "Gender",
            &["Select an option", "Male", "Female", "I don't wish to answer"],
        );
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.clicks_on(ids[3]), 1);
        let q = questions.iter().next().unwrap();
        assert_eq!(q.answer, "I don't wish to answer");
        assert_eq!(q.previous.as_deref(), Some("Select an option"));
        assert!(q.label.starts_with("Gender [ \"Select an option\""));
    }

    #[test]
    fn test_select_random_fallback_is_recorded() {
        let dom = FakeDom::new();
        let (field, ids) = select_field(&dom, "Favourite colour", &["Select an option", "Red", "Green"]);
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        let clicked = ids[1..].iter().filter(|id| dom.clicks_on(**id) == 1).count();
        assert_eq!(clicked, 1);
        assert_eq!(state.randomly_answered.len(), 1);
        assert_eq!(dom.clicks_on(ids[0]), 0);
    }

    #[test]
    fn test_phone_code_select_by_digits() {
        let dom = FakeDom::new();
        let (field, ids) = select_field(
            &dom,
            "Phone country code",
            &["United States (+1)", "India (+91)"],
        );
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.clicks_on(ids[1]), 1);
        let q = questions.iter().next().unwrap();
        assert_eq!(q.answer, "India (+91)");
        assert!(q.label.contains("List of phone country codes"));
    }

    #[test]
    fn test_radio_visa_answer() {
        let dom = FakeDom::new();
        let field = dom.node("div", "");
        let radio = dom.node("fieldset", "");
        let title = dom.node("span", "Will you now or in the future require sponsorship?");
        let yes = dom.node("input", "");
        let no = dom.node("input", "");
        dom.set_attr(yes, "id", "r-yes");
        dom.set_attr(yes, "value", "Yes");
        dom.set_attr(no, "id", "r-no");
        dom.set_attr(no, "value", "No");
        let yes_label = dom.node("label", "Yes");
        let no_label = dom.node("label", "No");
        dom.on_first(Some(field), selectors::FIELD_RADIO, &[radio]);
        dom.on_first(Some(radio), selectors::FIELD_RADIO_LABEL, &[title]);
        dom.on_first(Some(radio), selectors::FIELD_RADIO_INPUT, &[yes, no]);
        dom.on_first(Some(radio), &selectors::label_for("r-yes"), &[yes_label]);
        dom.on_first(Some(radio), &selectors::label_for("r-no"), &[no_label]);
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        answerer(&profile, None).answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert_eq!(dom.clicks_on(no_label), 1);
        let q = questions.iter().next().unwrap();
        assert_eq!(q.answer, "\"No\"<No>");
        assert_eq!(q.previous, None);
    }

    #[test]
    fn test_checkbox_gets_checked_once() {
        let dom = FakeDom::new();
        let field = dom.node("div", "");
        let checkbox = dom.node("input", "");
        dom.set_attr(checkbox, "type", "checkbox");
        let label = dom.node("span", "Terms");
        let option = dom.node("label", "I agree");
        dom.on_first(Some(field), selectors::FIELD_CHECKBOX, &[checkbox]);
        dom.on_first(Some(field), selectors::FIELD_CHECKBOX_LABEL, &[label]);
        dom.on_first(Some(field), selectors::FIELD_CHECKBOX_OPTION, &[option]);
        let modal = modal_with(&dom, &[field]);
        let profile = profile();
        let mut state = RunState::new(HashSet::new());
        let mut questions = QuestionSet::new();

        let answerer = answerer(&profile, None);
        answerer.answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        answerer.answer_all(&dom, &modal, &mut state, &mut questions).unwrap();
        assert!(dom.is_checked(checkbox));
        assert_eq!(dom.clicks_on(checkbox), 1);
        assert!(questions.iter().any(|q| q.label == "Terms ([X] I agree)" && q.answer == "true"));
    }
}
