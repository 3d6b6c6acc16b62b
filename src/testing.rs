//! In-memory stand-ins for the browser, the operator and the AI provider.
//!
//! `FakeDom` does not interpret selectors. Tests register, per
//! `(scope, locator)`, which nodes a lookup returns; anything unregistered
//! finds nothing. Clicks can carry effects (hide/show nodes, navigate, open a
//! window) so multi-step flows can be scripted.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::ai::TextGenerator;
use crate::dom::{Dom, DomError, DomResult, Key, Locator};
use crate::operator::Operator;

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub enum Effect {
    Hide(NodeId),
    Show(NodeId),
    Navigate(String),
    OpenWindow(String),
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    selected: bool,
    hidden: bool,
    on_click: Vec<Effect>,
    click_errors: VecDeque<DomError>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<Node>,
    queries: HashMap<(Option<NodeId>, Locator), Vec<NodeId>>,
    windows: Vec<String>,
    current_window: usize,
    navigations: Vec<String>,
    clicks: Vec<NodeId>,
    native_clicks: Vec<NodeId>,
    keys: Vec<Key>,
    screenshots: Vec<PathBuf>,
    closed_windows: usize,
    redirects: HashMap<String, String>,
    reveals: Vec<(usize, NodeId)>,
}

#[derive(Debug, Default)]
pub struct FakeDom {
    inner: RefCell<Inner>,
}

impl FakeDom {
    pub fn new() -> Self {
        let dom = Self::default();
        dom.inner.borrow_mut().windows.push("about:blank".to_string());
        dom
    }

    pub fn node(&self, tag: &str, text: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        inner.nodes.push(Node {
            tag: tag.to_string(),
            text: text.to_string(),
            ..Default::default()
        });
        inner.nodes.len() - 1
    }

    pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
        self.inner.borrow_mut().nodes[id]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_selected(&self, id: NodeId, selected: bool) {
        self.inner.borrow_mut().nodes[id].selected = selected;
    }

    /// Registers what a lookup of `locator` under `scope` returns.
    pub fn on(&self, scope: Option<NodeId>, locator: &Locator, nodes: &[NodeId]) {
        self.inner
            .borrow_mut()
            .queries
            .insert((scope, locator.clone()), nodes.to_vec());
    }

    /// Registers the same result for the first locator of a strategy list.
    pub fn on_first(&self, scope: Option<NodeId>, strategies: &[Locator], nodes: &[NodeId]) {
        self.on(scope, &strategies[0], nodes);
    }

    pub fn on_click(&self, id: NodeId, effect: Effect) {
        self.inner.borrow_mut().nodes[id].on_click.push(effect);
    }

    pub fn fail_click(&self, id: NodeId, error: DomError) {
        self.inner.borrow_mut().nodes[id].click_errors.push_back(error);
    }

    /// Navigating to `from` lands on `to`.
    pub fn redirect(&self, from: &str, to: &str) {
        self.inner
            .borrow_mut()
            .redirects
            .insert(from.to_string(), to.to_string());
    }

    /// Keeps `id` hidden until the `nth` navigation (1-based) lands.
    pub fn reveal_on_navigation(&self, id: NodeId, nth: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.nodes[id].hidden = true;
        inner.reveals.push((nth, id));
    }

    pub fn set_url(&self, url: &str) {
        let mut inner = self.inner.borrow_mut();
        let current = inner.current_window;
        inner.windows[current] = url.to_string();
    }

    pub fn clicks_on(&self, id: NodeId) -> usize {
        self.inner.borrow().clicks.iter().filter(|c| **c == id).count()
    }

    pub fn native_clicks_on(&self, id: NodeId) -> usize {
        self.inner.borrow().native_clicks.iter().filter(|c| **c == id).count()
    }

    pub fn value(&self, id: NodeId) -> String {
        self.inner.borrow().nodes[id]
            .attrs
            .get("value")
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.inner.borrow().nodes[id].selected
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.borrow().navigations.clone()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.inner.borrow().keys.clone()
    }

    pub fn screenshot_count(&self) -> usize {
        self.inner.borrow().screenshots.len()
    }

    pub fn closed_windows(&self) -> usize {
        self.inner.borrow().closed_windows
    }

    fn apply_click(&self, id: NodeId) -> DomResult<()> {
        let effects = {
            let mut inner = self.inner.borrow_mut();
            if let Some(err) = inner.nodes[id].click_errors.pop_front() {
                return Err(err);
            }
            inner.clicks.push(id);
            let node = &mut inner.nodes[id];
            let is_checkbox = node.attrs.get("type").is_some_and(|t| t == "checkbox");
            if is_checkbox {
                node.selected = !node.selected;
            } else if node.tag == "option" || node.tag == "input" {
                node.selected = true;
            }
            node.on_click.clone()
        };
        self.run_effects(&effects);
        Ok(())
    }

    fn run_effects(&self, effects: &[Effect]) {
        let mut inner = self.inner.borrow_mut();
        for effect in effects {
            match effect {
                Effect::Hide(target) => inner.nodes[*target].hidden = true,
                Effect::Show(target) => inner.nodes[*target].hidden = false,
                Effect::Navigate(url) => {
                    let current = inner.current_window;
                    inner.windows[current] = url.clone();
                    inner.navigations.push(url.clone());
                }
                Effect::OpenWindow(url) => inner.windows.push(url.clone()),
            }
        }
    }
}

impl Dom for FakeDom {
    type Element = NodeId;

    fn find_all(&self, scope: Option<&NodeId>, locator: &Locator) -> DomResult<Vec<NodeId>> {
        let inner = self.inner.borrow();
        Ok(inner
            .queries
            .get(&(scope.copied(), locator.clone()))
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| !inner.nodes[*id].hidden)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn text(&self, element: &NodeId) -> DomResult<String> {
        Ok(self.inner.borrow().nodes[*element].text.clone())
    }

    fn attr(&self, element: &NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self.inner.borrow().nodes[*element].attrs.get(name).cloned())
    }

    fn prop(&self, element: &NodeId, name: &str) -> DomResult<Option<String>> {
        if name == "innerText" {
            return self.text(element).map(Some);
        }
        self.attr(element, name)
    }

    fn tag_name(&self, element: &NodeId) -> DomResult<String> {
        Ok(self.inner.borrow().nodes[*element].tag.clone())
    }

    fn is_selected(&self, element: &NodeId) -> DomResult<bool> {
        Ok(self.inner.borrow().nodes[*element].selected)
    }

    fn click(&self, element: &NodeId) -> DomResult<()> {
        self.apply_click(*element)
    }

    fn native_click(&self, element: &NodeId) -> DomResult<()> {
        self.inner.borrow_mut().native_clicks.push(*element);
        let effects = self.inner.borrow().nodes[*element].on_click.clone();
        self.run_effects(&effects);
        Ok(())
    }

    fn clear(&self, element: &NodeId) -> DomResult<()> {
        self.inner.borrow_mut().nodes[*element]
            .attrs
            .insert("value".to_string(), String::new());
        Ok(())
    }

    fn type_text(&self, element: &NodeId, text: &str) -> DomResult<()> {
        let mut inner = self.inner.borrow_mut();
        let value = inner.nodes[*element]
            .attrs
            .entry("value".to_string())
            .or_default();
        value.push_str(text);
        Ok(())
    }

    fn scroll_into_view(&self, _element: &NodeId) -> DomResult<()> {
        Ok(())
    }

    fn press_key(&self, key: Key) -> DomResult<()> {
        self.inner.borrow_mut().keys.push(key);
        Ok(())
    }

    fn current_url(&self) -> DomResult<String> {
        let inner = self.inner.borrow();
        Ok(inner.windows[inner.current_window].clone())
    }

    fn navigate(&self, url: &str) -> DomResult<()> {
        let mut inner = self.inner.borrow_mut();
        let landed = inner.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        let current = inner.current_window;
        inner.windows[current] = landed;
        inner.navigations.push(url.to_string());
        let count = inner.navigations.len();
        let due: Vec<NodeId> = inner.reveals.iter().filter(|(nth, _)| *nth == count).map(|(_, id)| *id).collect();
        for id in due {
            inner.nodes[id].hidden = false;
        }
        Ok(())
    }

    fn screenshot(&self, path: &Path) -> DomResult<()> {
        self.inner.borrow_mut().screenshots.push(path.to_path_buf());
        Ok(())
    }

    fn window_count(&self) -> DomResult<usize> {
        Ok(self.inner.borrow().windows.len())
    }

    fn switch_to_newest_window(&self) -> DomResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.current_window = inner.windows.len() - 1;
        Ok(())
    }

    fn close_current_window(&self) -> DomResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.current_window == 0 {
            return Err(DomError::SessionLost("closed the main window".into()));
        }
        let current = inner.current_window;
        inner.windows.remove(current);
        inner.current_window = 0;
        inner.closed_windows += 1;
        Ok(())
    }

    fn switch_to_main_window(&self) -> DomResult<()> {
        self.inner.borrow_mut().current_window = 0;
        Ok(())
    }

    fn pause(&self, _duration: Duration) {}
}

// --- Operator ---

/// Answers confirmations from a queue; alerts are recorded.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: RefCell<VecDeque<usize>>,
    alerts: RefCell<Vec<String>>,
    confirms: RefCell<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[usize]) -> Self {
        let operator = Self::default();
        operator.answers.borrow_mut().extend(answers.iter().copied());
        operator
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn alert(&self, title: &str, _message: &str) {
        self.alerts.borrow_mut().push(title.to_string());
    }

    fn confirm(&self, title: &str, _message: &str, choices: &[&str]) -> usize {
        self.confirms.borrow_mut().push(title.to_string());
        let answer = self.answers.borrow_mut().pop_front().unwrap_or(choices.len() - 1);
        answer.min(choices.len() - 1)
    }
}

// --- Text generation ---

/// Returns canned responses in order; `None` entries fail.
#[derive(Debug, Default)]
pub struct StubGenerator {
    responses: RefCell<VecDeque<Option<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(responses: &[Option<&str>]) -> Self {
        let stub = Self::default();
        stub.responses
            .borrow_mut()
            .extend(responses.iter().map(|r| r.map(str::to_string)));
        stub
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl TextGenerator for StubGenerator {
    fn generate(&self, prompt: &str, _context: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.responses.borrow_mut().pop_front().flatten() {
            Some(text) => Ok(text),
            None => Err(anyhow!("stub generator has no response")),
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
