//! Scripted in-memory `Driver` for exercising UiActions without a browser

#![allow(dead_code)]

use async_trait::async_trait;
use cedar_qa_e2e::actions::VISIBLE_ONLY;
use cedar_qa_e2e::{BoundingBox, DialogAction, Driver, E2eError, E2eResult, SelectBy, WaitState};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub visible: bool,
    pub checked: bool,
    pub text: String,
    pub value: String,
    pub bounding_box: Option<BoundingBox>,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self { visible: true, ..Default::default() }
    }

    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    elements: HashMap<String, FakeElement>,
    /// Selectors matching several elements, in document order
    groups: HashMap<String, Vec<FakeElement>>,
    /// Scripted `wait_for` outcomes per selector, consumed front to back
    waits: HashMap<String, VecDeque<bool>>,
    /// Scripted `all_text_contents` results, consumed front to back
    option_lists: VecDeque<Vec<String>>,
    last_options: Vec<String>,
    last_typed: Option<String>,
    /// When set, choosing an option leaves this value in the input
    sticky_value: Option<String>,
    dialog: Option<DialogAction>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, selector: &str, element: FakeElement) -> Self {
        self.state.lock().elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_matches(self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.state.lock().groups.insert(selector.to_string(), elements);
        self
    }

    pub fn insert(&self, selector: &str, element: FakeElement) {
        self.state.lock().elements.insert(selector.to_string(), element);
    }

    pub fn script_waits(&self, selector: &str, outcomes: &[bool]) {
        self.state
            .lock()
            .waits
            .insert(selector.to_string(), outcomes.iter().copied().collect());
    }

    pub fn script_options(&self, lists: Vec<Vec<&str>>) {
        self.state.lock().option_lists = lists
            .into_iter()
            .map(|l| l.into_iter().map(str::to_string).collect())
            .collect();
    }

    pub fn stick_value(&self, value: &str) {
        self.state.lock().sticky_value = Some(value.to_string());
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state.lock().elements.get(selector).map(|e| e.value.clone())
    }

    pub fn dialog(&self) -> Option<DialogAction> {
        self.state.lock().dialog
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }

    /// Elements `selector` resolves to, honouring a trailing visibility filter
    fn matching(&self, selector: &str) -> Vec<FakeElement> {
        let (key, visible_only) = split_filter(selector);
        let state = self.state.lock();
        let candidates = match state.groups.get(key) {
            Some(group) => group.clone(),
            None => state.elements.get(key).cloned().into_iter().collect(),
        };
        candidates
            .into_iter()
            .filter(|e| !visible_only || e.visible)
            .collect()
    }

    fn with_existing<T>(
        &self,
        selector: &str,
        f: impl FnOnce(&mut FakeElement) -> T,
    ) -> E2eResult<T> {
        let (key, visible_only) = split_filter(selector);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let element = match state.groups.get_mut(key) {
            Some(group) => group.iter_mut().find(|e| !visible_only || e.visible),
            None => state
                .elements
                .get_mut(key)
                .filter(|e| !visible_only || e.visible),
        };
        match element {
            Some(element) => Ok(f(element)),
            None => Err(E2eError::Playwright(format!("no element for {}", selector))),
        }
    }
}

/// Strip the visible-only filter the dropdown helpers append
pub fn unfiltered(selector: &str) -> &str {
    split_filter(selector).0
}

fn split_filter(selector: &str) -> (&str, bool) {
    match selector.strip_suffix(VISIBLE_ONLY) {
        Some(base) => (base, true),
        None => (selector, false),
    }
}

fn nth_index(selector: &str) -> Option<usize> {
    selector.rsplit_once(" >> nth=").and_then(|(_, i)| i.parse().ok())
}

#[async_trait]
impl Driver for FakeDriver {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(format!("goto:{}", url));
        self.state.lock().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> E2eResult<()> {
        self.record("wait_for_load".to_string());
        Ok(())
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        Ok(self.matching(selector).len())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        Ok(self.matching(selector).first().map_or(false, |e| e.visible))
    }

    async fn is_checked(&self, selector: &str) -> E2eResult<bool> {
        self.with_existing(selector, |e| e.checked)
    }

    async fn wait_for(&self, selector: &str, state: WaitState, _timeout: Duration) -> E2eResult<()> {
        self.record(format!("wait_for:{}:{}", selector, state.as_str()));
        let mut guard = self.state.lock();
        let scripted = guard.waits.get_mut(selector).and_then(|q| q.pop_front());
        let reached = match scripted {
            Some(outcome) => outcome,
            None => {
                let element = guard.elements.get(selector);
                match state {
                    WaitState::Visible => element.map(|e| e.visible).unwrap_or(false),
                    WaitState::Hidden => element.map(|e| !e.visible).unwrap_or(true),
                    WaitState::Attached => element.is_some(),
                    WaitState::Detached => element.is_none(),
                }
            }
        };
        if reached {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!("{} to be {}", selector, state.as_str())))
        }
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("click:{}", selector));
        if let Some(index) = nth_index(selector) {
            let mut state = self.state.lock();
            let chosen = match &state.sticky_value {
                Some(value) => value.clone(),
                None => state.last_options.get(index).cloned().unwrap_or_default(),
            };
            if let Some(input) = state.last_typed.clone() {
                if let Some(element) = state.elements.get_mut(&input) {
                    element.value = chosen;
                }
            }
            return Ok(());
        }
        self.with_existing(selector, |e| e.checked = !e.checked)
    }

    async fn double_click(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("double_click:{}", selector));
        self.with_existing(selector, |_| ())
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.record(format!("fill:{}={}", selector, value));
        self.with_existing(selector, |e| e.value = value.to_string())
    }

    async fn clear(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("clear:{}", selector));
        self.with_existing(selector, |e| e.value.clear())
    }

    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.record(format!("type:{}={}", selector, text));
        self.with_existing(selector, |e| e.value.push_str(text))?;
        self.state.lock().last_typed = Some(selector.to_string());
        Ok(())
    }

    async fn press(&self, key: &str) -> E2eResult<()> {
        self.record(format!("press:{}", key));
        Ok(())
    }

    async fn select_option(&self, selector: &str, by: &SelectBy) -> E2eResult<()> {
        self.record(format!("select:{}={:?}", selector, by));
        self.with_existing(selector, |_| ())
    }

    async fn check(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("check:{}", selector));
        self.with_existing(selector, |e| e.checked = true)
    }

    async fn uncheck(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("uncheck:{}", selector));
        self.with_existing(selector, |e| e.checked = false)
    }

    async fn scroll_into_view(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("scroll:{}", selector));
        self.with_existing(selector, |_| ())
    }

    async fn drag_and_drop(&self, source: &str, target: &str) -> E2eResult<()> {
        self.record(format!("drag:{}->{}", source, target));
        Ok(())
    }

    /// Like Playwright, a missing element times out rather than yielding `None`
    async fn bounding_box(&self, selector: &str) -> E2eResult<Option<BoundingBox>> {
        match self.state.lock().elements.get(selector) {
            Some(e) => Ok(e.bounding_box),
            None => Err(E2eError::Timeout(format!(
                "bounding_box: locator.boundingBox: Timeout 10000ms exceeded waiting for {}",
                selector
            ))),
        }
    }

    async fn mouse_move(&self, x: f64, y: f64) -> E2eResult<()> {
        self.record(format!("mouse_move:{},{}", x, y));
        Ok(())
    }

    async fn mouse_down(&self) -> E2eResult<()> {
        self.record("mouse_down".to_string());
        Ok(())
    }

    async fn mouse_up(&self) -> E2eResult<()> {
        self.record("mouse_up".to_string());
        Ok(())
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> E2eResult<()> {
        self.record(format!("set_input_files:{}={}", selector, path.display()));
        self.with_existing(selector, |_| ())
    }

    async fn input_value(&self, selector: &str) -> E2eResult<String> {
        self.record(format!("input_value:{}", selector));
        self.with_existing(selector, |e| e.value.clone())
    }

    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>> {
        self.with_existing(selector, |e| Some(e.text.clone()))
    }

    async fn all_text_contents(&self, selector: &str) -> E2eResult<Vec<String>> {
        self.record(format!("all_text_contents:{}", selector));
        let mut state = self.state.lock();
        let options = match state.option_lists.len() {
            0 => state.last_options.clone(),
            1 => state.option_lists[0].clone(),
            _ => state.option_lists.pop_front().unwrap_or_default(),
        };
        state.last_options = options.clone();
        Ok(options)
    }

    /// Only element functions that reset the visibility styles reveal the element
    async fn eval_on_selector(&self, selector: &str, script: &str) -> E2eResult<serde_json::Value> {
        self.record(format!("eval:{}", selector));
        let reveals = script.trim_start().starts_with("(el) =>")
            && script.contains("el.style.display = 'block'")
            && script.contains("el.style.visibility = 'visible'");
        self.with_existing(selector, |e| e.visible |= reveals)?;
        Ok(serde_json::Value::Bool(reveals))
    }

    async fn on_next_dialog(&self, action: DialogAction) -> E2eResult<()> {
        self.state.lock().dialog = Some(action);
        Ok(())
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> E2eResult<()> {
        self.record(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Token handed out by [`spawn_dev_browser_service`]
pub const DEV_TOKEN: &str = "dev_browser_tok_e2e";

/// Number of `/v1/dev_browser` requests served so far
#[derive(Debug, Default)]
pub struct TokenRequests(AtomicUsize);

impl TokenRequests {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve `POST /v1/dev_browser` on an ephemeral port, returning its base URL
pub async fn spawn_dev_browser_service() -> (String, Arc<TokenRequests>) {
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn dev_browser(State(requests): State<Arc<TokenRequests>>) -> Json<serde_json::Value> {
        requests.0.fetch_add(1, Ordering::SeqCst);
        Json(serde_json::json!({ "token": DEV_TOKEN }))
    }

    let requests = Arc::new(TokenRequests::default());
    let router = Router::new()
        .route("/v1/dev_browser", post(dev_browser))
        .with_state(requests.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), requests)
}
