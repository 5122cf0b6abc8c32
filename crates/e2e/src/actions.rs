//! UI action layer
//!
//! [`UiActions`] wraps element interactions with a step annotation, a
//! presence check and, for composite widgets, bounded retry. Everything else
//! is a single attempt whose error goes straight back to the caller.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::autocomplete::{Autocomplete, AutocompleteOptions};
use crate::driver::{DialogAction, Driver, SelectBy, WaitState};
use crate::error::{E2eError, E2eResult};

/// Default timeout for [`UiActions::wait_for_element`]
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for [`UiActions::upload_file`]
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// How long text/URL assertions keep polling
pub const ASSERT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long dropdown discovery keeps probing
pub const DROPDOWN_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const NOTIFICATION_DIALOG: &str = "[role=\"dialog\"]";

const FORCE_VISIBLE_JS: &str = "(el) => { \
    el.style.display = 'block'; \
    el.style.visibility = 'visible'; \
    el.style.opacity = '1'; \
    return true; }";

/// Target state for a toggle switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    On,
    Off,
}

/// Narrows a selector to its visible matches, so hidden duplicates rendered
/// ahead of the real popup are skipped
pub const VISIBLE_ONLY: &str = " >> visible=true";

/// Listbox containers tried, in order, after typing into an autocomplete
pub fn listbox_selectors() -> Vec<String> {
    [
        "[role=\"listbox\"]",
        ".MuiAutocomplete-listbox",
        ".MuiAutocomplete-popper ul",
        "ul[role=\"presentation\"]",
    ]
    .iter()
    .map(|base| format!("{}{}", base, VISIBLE_ONLY))
    .collect()
}

/// Option selectors tried, in order, to find `text` in an open dropdown
pub fn option_selectors(text: &str) -> Vec<String> {
    let quoted = text.replace('"', "\\\"");
    [
        format!("[role=\"option\"]:has-text(\"{}\")", quoted),
        format!("li.MuiAutocomplete-option:has-text(\"{}\")", quoted),
        format!("[role=\"listbox\"] li:has-text(\"{}\")", quoted),
        format!("text=\"{}\"", quoted),
    ]
    .into_iter()
    .map(|base| base + VISIBLE_ONLY)
    .collect()
}

pub struct UiActions {
    driver: Arc<dyn Driver>,
}

impl UiActions {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Fail with `ElementNotFound` unless at least one element matches
    async fn resolve_first(&self, selector: &str) -> E2eResult<()> {
        if self.driver.count(selector).await? == 0 {
            return Err(E2eError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Navigating to {}", url));
        async {
            info!("Navigating to {}", url);
            self.driver.goto(url).await
        }
        .instrument(span)
        .await
    }

    pub async fn wait_for_page_load(&self) -> E2eResult<()> {
        self.driver.wait_for_load(PAGE_LOAD_TIMEOUT).await
    }

    pub async fn validate_page_url(&self, url: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Validating that the URL is {}", url));
        async {
            let deadline = Instant::now() + ASSERT_TIMEOUT;
            loop {
                let current = self.driver.current_url().await?;
                if current == url {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(E2eError::AssertionFailed(format!(
                        "expected URL {} but page is at {}",
                        url, current
                    )));
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        .instrument(span)
        .await
    }

    pub async fn validate_element_text(&self, selector: &str, expected: &str) -> E2eResult<()> {
        let span = info_span!(
            "step",
            description = %format!("Validating that {} contains text '{}'", selector, expected)
        );
        async {
            let deadline = Instant::now() + ASSERT_TIMEOUT;
            loop {
                let text = if self.driver.count(selector).await? > 0 {
                    self.driver.text_content(selector).await?.unwrap_or_default()
                } else {
                    String::new()
                };
                if text.contains(expected) {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(E2eError::AssertionFailed(format!(
                        "{} does not contain '{}' (text: '{}')",
                        selector, expected, text
                    )));
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        .instrument(span)
        .await
    }

    pub async fn validate_title(&self, selector: &str, title: &str) -> E2eResult<()> {
        self.validate_element_text(selector, title).await
    }

    pub async fn click(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Clicking the '{}' element", selector));
        async {
            info!("Clicking the '{}' element", selector);
            self.resolve_first(selector).await?;
            self.driver.click(selector).await
        }
        .instrument(span)
        .await
    }

    pub async fn double_click(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Double-clicking the '{}' element", selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.double_click(selector).await
        }
        .instrument(span)
        .await
    }

    /// Fill a field. A `None` value is skipped with a warning.
    pub async fn fill(&self, selector: &str, value: Option<&str>) -> E2eResult<()> {
        let Some(value) = value else {
            warn!("Trying to fill '{}' with an undefined value. Skipping.", selector);
            return Ok(());
        };
        let span = info_span!("step", description = %format!("Filling '{}' into the '{}' element", value, selector));
        async {
            info!("Filling '{}' into the '{}' element", value, selector);
            self.resolve_first(selector).await?;
            self.driver.fill(selector, value).await
        }
        .instrument(span)
        .await
    }

    pub async fn clear(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Clearing text from the '{}' element", selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.clear(selector).await
        }
        .instrument(span)
        .await
    }

    pub async fn select_by_value(&self, selector: &str, value: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Selecting option with value '{}' from '{}'", value, selector));
        async {
            self.resolve_first(selector).await?;
            self.driver
                .select_option(selector, &SelectBy::Value(value.to_string()))
                .await
        }
        .instrument(span)
        .await
    }

    pub async fn select_by_index(&self, selector: &str, index: usize) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Selecting option at index '{}' from '{}'", index, selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.select_option(selector, &SelectBy::Index(index)).await
        }
        .instrument(span)
        .await
    }

    /// Click the switch only if it is not already in `state`
    pub async fn toggle_switch(&self, selector: &str, state: SwitchState) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Toggling switch '{}' to '{:?}'", selector, state));
        async {
            self.resolve_first(selector).await?;
            let checked = self.driver.is_checked(selector).await?;
            let wanted = state == SwitchState::On;
            if checked != wanted {
                self.driver.click(selector).await?;
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    pub async fn check(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Selecting checkbox '{}'", selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.check(selector).await
        }
        .instrument(span)
        .await
    }

    pub async fn uncheck(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Unselecting checkbox '{}'", selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.uncheck(selector).await
        }
        .instrument(span)
        .await
    }

    pub async fn select_radio(&self, selector: &str) -> E2eResult<()> {
        self.check(selector).await
    }

    /// Decide how the next JavaScript dialog is answered
    pub async fn handle_dialog(&self, action: DialogAction) -> E2eResult<()> {
        info!("Handling dialog: {}", action.as_str());
        self.driver.on_next_dialog(action).await
    }

    pub async fn scroll_into_view(&self, selector: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Scrolling to element '{}'", selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.scroll_into_view(selector).await
        }
        .instrument(span)
        .await
    }

    pub async fn press_key(&self, key: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Pressing the '{}' key on the keyboard", key));
        self.driver.press(key).instrument(span).await
    }

    pub async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        self.resolve_first(selector).await?;
        self.driver.is_visible(selector).await
    }

    pub async fn input_value(&self, selector: &str) -> E2eResult<String> {
        self.resolve_first(selector).await?;
        self.driver.input_value(selector).await
    }

    /// Wait until the element is attached to the DOM
    pub async fn wait_for_element(&self, selector: &str, timeout: Option<Duration>) -> E2eResult<()> {
        let timeout = timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT);
        self.wait_for_state(selector, WaitState::Attached, timeout).await
    }

    async fn wait_for_state(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<()> {
        match self.driver.wait_for(selector, state, timeout).await {
            Err(E2eError::Timeout(_)) => Err(E2eError::ElementWaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            other => other,
        }
    }

    pub async fn drag_and_drop(&self, source: &str, target: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Dragging element '{}' to '{}'", source, target));
        async {
            self.resolve_first(source).await?;
            self.resolve_first(target).await?;
            self.driver.drag_and_drop(source, target).await
        }
        .instrument(span)
        .await
    }

    /// Drag the element from its center to `(box.x + dx, box.y + dy)`
    pub async fn drag_and_drop_by_offset(&self, source: &str, dx: f64, dy: f64) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Dragging element '{}' by ({}, {})", source, dx, dy));
        async {
            self.resolve_first(source).await?;
            let bounds = self.driver.bounding_box(source).await?.ok_or_else(|| {
                E2eError::ElementNotFound {
                    selector: source.to_string(),
                }
            })?;

            let (start_x, start_y) = bounds.center();
            let target_x = bounds.x + dx;
            let target_y = bounds.y + dy;
            debug!("Dragging from ({}, {}) to ({}, {})", start_x, start_y, target_x, target_y);

            self.driver.mouse_move(start_x, start_y).await?;
            self.driver.mouse_down().await?;
            self.driver.mouse_move(target_x, target_y).await?;
            self.driver.mouse_up().await
        }
        .instrument(span)
        .await
    }

    /// Set a file on a (possibly hidden) file input
    pub async fn upload_file(
        &self,
        selector: &str,
        path: &Path,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        let timeout = timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT);
        let span = info_span!("step", description = %format!("Uploading '{}' via '{}'", path.display(), selector));
        async {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(E2eError::FileNotFound(path.to_path_buf()));
            }

            self.wait_for_state(selector, WaitState::Attached, timeout).await?;

            if !self.driver.is_visible(selector).await? {
                debug!("File input {} is hidden; forcing it visible", selector);
                self.driver.eval_on_selector(selector, FORCE_VISIBLE_JS).await?;
            }

            self.driver.set_input_files(selector, path).await?;
            info!("File set on {}: {}", selector, path.display());

            self.check_upload_visible(path).await;
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Best-effort: warn if the uploaded file name is not shown on the page
    async fn check_upload_visible(&self, path: &Path) {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            return;
        };
        match self.driver.count(&format!("text={}", file_name)).await {
            Ok(n) if n > 0 => debug!("Uploaded file name '{}' is visible", file_name),
            Ok(_) => warn!("Uploaded file name '{}' is not visible on the page", file_name),
            Err(e) => warn!("Could not verify upload of '{}': {}", file_name, e),
        }
    }

    /// Set an autocomplete input to `value`, retrying per `options`
    pub async fn set_mui_autocomplete_value(
        &self,
        selector: &str,
        value: &str,
        options: &AutocompleteOptions,
    ) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Setting autocomplete '{}' to '{}'", selector, value));
        async {
            self.resolve_first(selector).await?;
            Autocomplete::new(self.driver.as_ref(), selector, value, options)
                .run()
                .await
                .map(|_| ())
        }
        .instrument(span)
        .await
    }

    /// First selector that matches at least one visible element
    async fn first_visible(&self, selectors: &[String], timeout: Duration) -> E2eResult<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            for selector in selectors {
                if self.driver.count(selector).await? > 0 && self.driver.is_visible(selector).await? {
                    return Ok(Some(selector.clone()));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Click the dropdown option showing `text`
    pub async fn select_dropdown_option(&self, text: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Selecting dropdown option '{}'", text));
        async {
            let candidates = option_selectors(text);
            let found = self.first_visible(&candidates, DROPDOWN_SEARCH_TIMEOUT).await?;
            let Some(selector) = found else {
                return Err(E2eError::DropdownNotFound {
                    target: text.to_string(),
                });
            };
            debug!("Option '{}' found via {}", text, selector);
            self.driver.click(&selector).await
        }
        .instrument(span)
        .await
    }

    /// Type into an autocomplete input and pick the matching option
    pub async fn select_mui_autocomplete(&self, selector: &str, value: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Selecting '{}' in autocomplete '{}'", value, selector));
        async {
            self.resolve_first(selector).await?;
            self.driver.click(selector).await?;
            self.driver.fill(selector, value).await?;

            let listbox = self
                .first_visible(&listbox_selectors(), DROPDOWN_SEARCH_TIMEOUT)
                .await?;
            if listbox.is_none() {
                return Err(E2eError::DropdownNotFound {
                    target: selector.to_string(),
                });
            }

            self.select_dropdown_option(value).await
        }
        .instrument(span)
        .await
    }

    /// Assert the notification dialog shows `title` and `message`
    pub async fn verify_notification_dialog(&self, title: &str, message: &str) -> E2eResult<()> {
        let span = info_span!("step", description = %format!("Verifying notification dialog '{}'", title));
        async {
            self.wait_for_state(NOTIFICATION_DIALOG, WaitState::Visible, DEFAULT_WAIT_TIMEOUT)
                .await?;
            let text = self
                .driver
                .text_content(NOTIFICATION_DIALOG)
                .await?
                .unwrap_or_default();

            for expected in [title, message] {
                if !text.contains(expected) {
                    return Err(E2eError::AssertionFailed(format!(
                        "notification dialog does not contain '{}' (text: '{}')",
                        expected, text
                    )));
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}
