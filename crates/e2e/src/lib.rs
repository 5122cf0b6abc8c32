//! Cedar QA browser automation
//!
//! This crate provides the UI side of the harness:
//! - A [`Driver`] capability trait, implemented over Playwright by a
//!   long-lived node bridge process
//! - [`UiActions`], element interactions with presence checks, waits and
//!   bounded retry for autocomplete inputs
//! - Selector tables for the applications under test
//! - Declarative YAML scenarios and a runner that executes them
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TestRunner                             │
//! │    ├── TestSpec::load_all(dir) -> [TestSpec]                │
//! │    ├── PlaywrightDriver::launch() per scenario              │
//! │    └── run_spec_with(driver, spec) -> TestResult            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UiActions (Arc<dyn Driver>)                                │
//! │    ├── click / fill / select / toggle / drag / upload ...   │
//! │    └── set_mui_autocomplete_value -> AutocompleteState      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pages::resolve("@page.field") -> selector                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Driver (trait)  <──  PlaywrightDriver (node bridge, JSON)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod autocomplete;
pub mod driver;
pub mod error;
pub mod pages;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use actions::{SwitchState, UiActions};
pub use autocomplete::{AttemptFailure, AutocompleteOptions, AutocompleteState};
pub use driver::{BoundingBox, DialogAction, Driver, SelectBy, WaitState};
pub use error::{E2eError, E2eResult};
pub use playwright::{Browser, PlaywrightConfig, PlaywrightDriver};
pub use runner::{RunnerConfig, TestResult, TestRunner, TestSuiteResult};
pub use spec::{TestSpec, TestStep};
