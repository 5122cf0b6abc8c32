//! Scenario runner: one fresh browser per scenario, steps through UiActions

use cedar_qa_api::{AuthClient, AuthSettings};
use cedar_qa_common::{datagen, Configuration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::actions::{UiActions, ASSERT_TIMEOUT};
use crate::autocomplete::AutocompleteOptions;
use crate::driver::{Driver, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::pages;
use crate::playwright::{PlaywrightConfig, PlaywrightDriver};
use crate::spec::{TestSpec, TestStep};

pub const RANDOM_EMAIL: &str = "random_email";
pub const RANDOM_PASSWORD: &str = "random_password";
/// Fetched from the auth service only when a scenario refers to it
pub const DEV_BROWSER_TOKEN: &str = "dev_browser_token";

/// Result of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl TestResult {
    fn errored(name: &str, error: &E2eError) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            error: Some(error.to_string()),
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// `${...}` and `@page.field` expansion for one scenario run.
///
/// `random_email` and `random_password` are generated once per run so every
/// step of a scenario sees the same values. `dev_browser_token` is filled in
/// by the runner before the first step when the scenario uses it.
#[derive(Debug, Clone)]
pub struct Placeholders {
    configuration: Configuration,
    generated: HashMap<&'static str, String>,
}

impl Placeholders {
    pub fn new(configuration: Configuration) -> Self {
        let mut generated = HashMap::new();
        generated.insert(RANDOM_EMAIL, datagen::create_random_email());
        generated.insert(RANDOM_PASSWORD, datagen::create_random_password());
        Self { configuration, generated }
    }

    /// Add a value that configuration keys still override
    pub fn insert_generated(&mut self, key: &'static str, value: String) {
        self.generated.insert(key, value);
    }

    pub fn generated(&self, key: &str) -> Option<&str> {
        self.generated.get(key).map(String::as_str)
    }

    /// Substitute placeholders; unknown ones are left as written
    pub fn expand(&self, text: &str) -> String {
        self.configuration
            .interpolate_with(text, |key| self.generated.get(key).cloned())
    }

    /// Expand and resolve `@page.field` references
    pub fn selector(&self, text: &str) -> E2eResult<String> {
        pages::resolve_selector(&self.expand(text))
    }
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    /// Values for `${key}` placeholders
    pub configuration: Configuration,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Auth-service keys for `${dev_browser_token}`
    pub auth: Option<AuthSettings>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            configuration: Configuration::default(),
            specs_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            auth: None,
        }
    }
}

/// Scenario runner
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run scenarios filtered by tag and/or name substring
    pub async fn run_matching(
        &self,
        tag: Option<&str>,
        name: Option<&str>,
    ) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        let mut selected: Vec<&TestSpec> = specs.iter().collect();
        if let Some(tag) = tag {
            selected = TestSpec::filter_by_tag(selected, tag);
        }
        if let Some(name) = name {
            selected = TestSpec::filter_by_name(selected, name);
        }
        Ok(self.run_specs(&selected).await)
    }

    /// Run a list of scenarios sequentially
    pub async fn run_specs(&self, specs: &[&TestSpec]) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());

        info!("Running {} test(s)...", specs.len());

        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => TestResult::errored(&spec.name, &e),
            };
            log_result(&result);
            results.push(result);
        }

        let suite = TestSuiteResult::from_results(results, start.elapsed().as_millis() as u64);
        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        suite
    }

    /// Launch a fresh browser sized for `spec`, run it, then close the browser
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let mut pw_config = self.config.playwright.clone();
        pw_config.viewport_width = spec.viewport.width;
        pw_config.viewport_height = spec.viewport.height;

        let driver: Arc<dyn Driver> = Arc::new(PlaywrightDriver::launch(pw_config).await?);
        let result = self.run_spec_with(driver.clone(), spec).await;

        if let Err(e) = driver.close().await {
            warn!("Failed to close browser after {}: {}", spec.name, e);
        }
        Ok(result)
    }

    /// Run `spec` against any driver, stopping at the first failed step
    pub async fn run_spec_with(&self, driver: Arc<dyn Driver>, spec: &TestSpec) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        let actions = UiActions::new(driver);
        let mut placeholders = Placeholders::new(self.config.configuration.clone());
        if let Err(e) = self.fetch_dev_browser_token(&mut placeholders, spec).await {
            error!("Could not get a dev browser token for {}: {}", spec.name, e);
            return TestResult {
                name: spec.name.clone(),
                success: false,
                duration_ms: start.elapsed().as_millis() as u64,
                steps: vec![],
                error: Some(format!("dev browser token: {}", e)),
            };
        }
        let mut steps = Vec::with_capacity(spec.steps.len());
        let mut test_error = None;

        for step in &spec.steps {
            let step_start = Instant::now();
            let outcome = self.execute_step(&actions, &placeholders, spec, step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(screenshot_path) => steps.push(StepResult {
                    step: step.describe(),
                    success: true,
                    duration_ms,
                    error: None,
                    screenshot_path,
                }),
                Err(e) => {
                    let message = format!("{}: {}", step.describe(), e);
                    steps.push(StepResult {
                        step: step.describe(),
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                        screenshot_path: None,
                    });
                    test_error = Some(message);
                    break;
                }
            }
        }

        TestResult {
            name: spec.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: test_error,
        }
    }

    async fn fetch_dev_browser_token(&self, ph: &mut Placeholders, spec: &TestSpec) -> E2eResult<()> {
        if ph.configuration.get(DEV_BROWSER_TOKEN).is_some() || !spec.references(DEV_BROWSER_TOKEN) {
            return Ok(());
        }
        let settings = self.config.auth.as_ref().ok_or_else(|| {
            cedar_qa_api::ApiError::AuthConfig(
                "scenario needs a dev browser token but no auth service keys are set".to_string(),
            )
        })?;
        let token = AuthClient::new(settings)?.dev_browser_token().await?;
        ph.insert_generated(DEV_BROWSER_TOKEN, token);
        Ok(())
    }

    async fn execute_step(
        &self,
        actions: &UiActions,
        ph: &Placeholders,
        spec: &TestSpec,
        step: &TestStep,
    ) -> E2eResult<Option<PathBuf>> {
        match step {
            TestStep::Navigate { url, wait_for_selector } => {
                actions.goto(&ph.expand(url)).await?;
                actions.wait_for_page_load().await?;
                if let Some(selector) = wait_for_selector {
                    actions.wait_for_element(&ph.selector(selector)?, None).await?;
                }
            }
            TestStep::Click { selector } => actions.click(&ph.selector(selector)?).await?,
            TestStep::DoubleClick { selector } => {
                actions.double_click(&ph.selector(selector)?).await?
            }
            TestStep::Fill { selector, value } => {
                let value = value.as_deref().map(|v| ph.expand(v));
                actions.fill(&ph.selector(selector)?, value.as_deref()).await?
            }
            TestStep::Clear { selector } => actions.clear(&ph.selector(selector)?).await?,
            TestStep::Select { selector, value, index } => {
                let selector = ph.selector(selector)?;
                match (value, index) {
                    (Some(value), _) => actions.select_by_value(&selector, &ph.expand(value)).await?,
                    (None, Some(index)) => actions.select_by_index(&selector, *index).await?,
                    (None, None) => {
                        return Err(E2eError::SpecParse(format!(
                            "select on {} needs a value or an index",
                            selector
                        )))
                    }
                }
            }
            TestStep::Check { selector } => actions.check(&ph.selector(selector)?).await?,
            TestStep::Uncheck { selector } => actions.uncheck(&ph.selector(selector)?).await?,
            TestStep::Toggle { selector, state } => {
                actions.toggle_switch(&ph.selector(selector)?, *state).await?
            }
            TestStep::Scroll { selector } => {
                actions.scroll_into_view(&ph.selector(selector)?).await?
            }
            TestStep::Press { key } => actions.press_key(&ph.expand(key)).await?,
            TestStep::Wait { selector, timeout_ms } => {
                actions
                    .wait_for_element(&ph.selector(selector)?, Some(Duration::from_millis(*timeout_ms)))
                    .await?
            }
            TestStep::Sleep { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            TestStep::Drag { source, target } => {
                actions
                    .drag_and_drop(&ph.selector(source)?, &ph.selector(target)?)
                    .await?
            }
            TestStep::DragBy { selector, dx, dy } => {
                actions
                    .drag_and_drop_by_offset(&ph.selector(selector)?, *dx, *dy)
                    .await?
            }
            TestStep::Upload { selector, path, timeout_ms } => {
                let path = PathBuf::from(ph.expand(&path.to_string_lossy()));
                actions
                    .upload_file(
                        &ph.selector(selector)?,
                        &path,
                        timeout_ms.map(Duration::from_millis),
                    )
                    .await?
            }
            TestStep::Autocomplete { selector, value, max_retries, backoff_ms } => {
                let mut options = AutocompleteOptions::default();
                if let Some(max_retries) = max_retries {
                    options.max_retries = *max_retries;
                }
                if let Some(backoff_ms) = backoff_ms {
                    options.backoff = Duration::from_millis(*backoff_ms);
                }
                actions
                    .set_mui_autocomplete_value(&ph.selector(selector)?, &ph.expand(value), &options)
                    .await?
            }
            TestStep::SelectOption { selector, text } => {
                let text = ph.expand(text);
                match selector {
                    Some(selector) => {
                        actions.select_mui_autocomplete(&ph.selector(selector)?, &text).await?
                    }
                    None => actions.select_dropdown_option(&text).await?,
                }
            }
            TestStep::AssertText { selector, contains } => {
                actions
                    .validate_element_text(&ph.selector(selector)?, &ph.expand(contains))
                    .await?
            }
            TestStep::AssertUrl { url } => actions.validate_page_url(&ph.expand(url)).await?,
            TestStep::AssertVisible { selector, visible } => {
                let selector = ph.selector(selector)?;
                let state = if *visible { WaitState::Visible } else { WaitState::Hidden };
                match actions.driver().wait_for(&selector, state, ASSERT_TIMEOUT).await {
                    Err(E2eError::Timeout(_)) => {
                        return Err(E2eError::AssertionFailed(format!(
                            "{} expected to be {}",
                            selector,
                            state.as_str()
                        )))
                    }
                    other => other?,
                }
            }
            TestStep::Dialog { response } => actions.handle_dialog(*response).await?,
            TestStep::Notification { title, message } => {
                actions
                    .verify_notification_dialog(&ph.expand(title), &ph.expand(message))
                    .await?
            }
            TestStep::Screenshot { name, full_page } => {
                let path = self
                    .config
                    .playwright
                    .screenshot_dir
                    .join(format!("{}.png", ph.expand(name)));
                actions.driver().screenshot(&path, *full_page).await?;
                return Ok(Some(path));
            }
            TestStep::Log { message } => info!("[{}] {}", spec.name, ph.expand(message)),
        }
        Ok(None)
    }

    /// Write results as `test-results.json` under the output directory
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.output_dir, results)
    }
}

fn log_result(result: &TestResult) {
    if result.success {
        info!("✓ {} ({} ms)", result.name, result.duration_ms);
    } else {
        error!(
            "✗ {} - {}",
            result.name,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
