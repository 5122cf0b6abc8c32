//! Browser driver capability
//!
//! [`Driver`] is the seam between what a test wants to find (selectors) and
//! how the browser is driven. Element operations act on the first element
//! matching the selector. Selectors use Playwright syntax (CSS, XPath,
//! `text=`, `>> nth=N`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// How to pick an option from a native `<select>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectBy {
    Value(String),
    Index(usize),
    Label(String),
}

/// What to do with the next JavaScript dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogAction {
    #[default]
    Accept,
    Dismiss,
}

impl DialogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogAction::Accept => "accept",
            DialogAction::Dismiss => "dismiss",
        }
    }
}

/// Element position in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Browser automation capability used by [`crate::actions::UiActions`]
#[async_trait]
pub trait Driver: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    async fn wait_for_load(&self, timeout: Duration) -> E2eResult<()>;

    /// Number of elements matching the selector
    async fn count(&self, selector: &str) -> E2eResult<usize>;

    async fn is_visible(&self, selector: &str) -> E2eResult<bool>;

    async fn is_checked(&self, selector: &str) -> E2eResult<bool>;

    /// Wait for the first match to reach `state`. Returns
    /// [`crate::E2eError::Timeout`] when the timeout elapses.
    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn click(&self, selector: &str) -> E2eResult<()>;

    async fn double_click(&self, selector: &str) -> E2eResult<()>;

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()>;

    async fn clear(&self, selector: &str) -> E2eResult<()>;

    /// Type text key by key
    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()>;

    async fn press(&self, key: &str) -> E2eResult<()>;

    async fn select_option(&self, selector: &str, by: &SelectBy) -> E2eResult<()>;

    async fn check(&self, selector: &str) -> E2eResult<()>;

    async fn uncheck(&self, selector: &str) -> E2eResult<()>;

    async fn scroll_into_view(&self, selector: &str) -> E2eResult<()>;

    async fn drag_and_drop(&self, source: &str, target: &str) -> E2eResult<()>;

    async fn bounding_box(&self, selector: &str) -> E2eResult<Option<BoundingBox>>;

    async fn mouse_move(&self, x: f64, y: f64) -> E2eResult<()>;

    async fn mouse_down(&self) -> E2eResult<()>;

    async fn mouse_up(&self) -> E2eResult<()>;

    async fn set_input_files(&self, selector: &str, path: &Path) -> E2eResult<()>;

    async fn input_value(&self, selector: &str) -> E2eResult<String>;

    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>>;

    /// Text of every element matching the selector, in document order
    async fn all_text_contents(&self, selector: &str) -> E2eResult<Vec<String>>;

    /// Evaluate `script` (a JS function expression) with the first match as
    /// its argument
    async fn eval_on_selector(&self, selector: &str, script: &str) -> E2eResult<serde_json::Value>;

    /// Register how the next dialog is handled
    async fn on_next_dialog(&self, action: DialogAction) -> E2eResult<()>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()>;

    async fn close(&self) -> E2eResult<()>;
}

/// Selector addressing the `index`-th match of `selector`
pub fn nth(selector: &str, index: usize) -> String {
    format!("{} >> nth={}", selector, index)
}
