//! Declarative YAML scenario specification
//!
//! Strings may contain `${key}` placeholders (configuration keys,
//! `random_email`, `random_password`); selectors may be written
//! `@page.field`. Both are expanded by the runner just before each step.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::actions::SwitchState;
use crate::driver::DialogAction;
use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step; each maps onto one UI action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative URLs are joined to the base URL)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    Click {
        selector: String,
    },

    DoubleClick {
        selector: String,
    },

    /// Fill an input; a missing value is skipped with a warning
    Fill {
        selector: String,
        #[serde(default)]
        value: Option<String>,
    },

    Clear {
        selector: String,
    },

    /// Pick a native `<select>` option by value or by index
    Select {
        selector: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },

    Check {
        selector: String,
    },

    Uncheck {
        selector: String,
    },

    Toggle {
        selector: String,
        state: SwitchState,
    },

    Scroll {
        selector: String,
    },

    Press {
        key: String,
    },

    /// Wait for an element to attach
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    Drag {
        source: String,
        target: String,
    },

    /// Drag by an offset relative to the element's top-left corner
    DragBy {
        selector: String,
        dx: f64,
        dy: f64,
    },

    Upload {
        selector: String,
        path: PathBuf,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Set an autocomplete input with retry
    Autocomplete {
        selector: String,
        value: String,
        #[serde(default)]
        max_retries: Option<u32>,
        #[serde(default)]
        backoff_ms: Option<u64>,
    },

    /// Pick an option from an open dropdown, or type into `selector` first
    SelectOption {
        #[serde(default)]
        selector: Option<String>,
        text: String,
    },

    AssertText {
        selector: String,
        contains: String,
    },

    AssertUrl {
        url: String,
    },

    AssertVisible {
        selector: String,
        #[serde(default = "default_true")]
        visible: bool,
    },

    /// Decide how the next JavaScript dialog is answered
    Dialog {
        #[serde(default)]
        response: DialogAction,
    },

    Notification {
        title: String,
        message: String,
    },

    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl TestStep {
    /// Short label used in results and logs
    pub fn describe(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate {}", url),
            TestStep::Click { selector } => format!("click {}", selector),
            TestStep::DoubleClick { selector } => format!("double_click {}", selector),
            TestStep::Fill { selector, .. } => format!("fill {}", selector),
            TestStep::Clear { selector } => format!("clear {}", selector),
            TestStep::Select { selector, .. } => format!("select {}", selector),
            TestStep::Check { selector } => format!("check {}", selector),
            TestStep::Uncheck { selector } => format!("uncheck {}", selector),
            TestStep::Toggle { selector, state } => format!("toggle {} {:?}", selector, state),
            TestStep::Scroll { selector } => format!("scroll {}", selector),
            TestStep::Press { key } => format!("press {}", key),
            TestStep::Wait { selector, .. } => format!("wait {}", selector),
            TestStep::Sleep { ms } => format!("sleep {}ms", ms),
            TestStep::Drag { source, target } => format!("drag {} -> {}", source, target),
            TestStep::DragBy { selector, dx, dy } => format!("drag_by {} ({}, {})", selector, dx, dy),
            TestStep::Upload { selector, path, .. } => {
                format!("upload {} -> {}", path.display(), selector)
            }
            TestStep::Autocomplete { selector, value, .. } => {
                format!("autocomplete {} = {}", selector, value)
            }
            TestStep::SelectOption { text, .. } => format!("select_option {}", text),
            TestStep::AssertText { selector, contains } => {
                format!("assert_text {} ~ {}", selector, contains)
            }
            TestStep::AssertUrl { url } => format!("assert_url {}", url),
            TestStep::AssertVisible { selector, visible } => {
                format!("assert_visible {} = {}", selector, visible)
            }
            TestStep::Dialog { response } => format!("dialog {}", response.as_str()),
            TestStep::Notification { title, .. } => format!("notification {}", title),
            TestStep::Screenshot { name, .. } => format!("screenshot {}", name),
            TestStep::Log { message } => format!("log {}", message),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            TestStep::Select { value: None, index: None, selector } => {
                Err(format!("select on {} needs a value or an index", selector))
            }
            TestStep::Select { value: Some(_), index: Some(_), selector } => {
                Err(format!("select on {} takes a value or an index, not both", selector))
            }
            _ => Ok(()),
        }
    }
}

impl TestSpec {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("{} has no steps", self.name)));
        }
        for (i, step) in self.steps.iter().enumerate() {
            step.validate()
                .map_err(|e| E2eError::SpecParse(format!("{} step {}: {}", self.name, i + 1, e)))?;
        }
        Ok(())
    }

    /// Load all scenarios under a directory, sorted by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    pub fn filter_by_tag<'a>(specs: impl IntoIterator<Item = &'a Self>, tag: &str) -> Vec<&'a Self> {
        specs.into_iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Scenarios whose name contains `pattern`
    pub fn filter_by_name<'a>(specs: impl IntoIterator<Item = &'a Self>, pattern: &str) -> Vec<&'a Self> {
        specs.into_iter().filter(|s| s.name.contains(pattern)).collect()
    }

    /// Whether any step mentions the `${key}` placeholder
    pub fn references(&self, key: &str) -> bool {
        let placeholder = format!("${{{}}}", key);
        serde_json::to_string(&self.steps).map_or(false, |steps| steps.contains(&placeholder))
    }
}
