//! UI Scenario Commands

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cedar_qa_api::AuthSettings;
use cedar_qa_e2e::{Browser, PlaywrightConfig, RunnerConfig, TestResult, TestRunner};

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Directory holding scenario YAML files
    #[arg(long, default_value = "scenarios")]
    pub specs: PathBuf,

    /// Only run scenarios carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only run scenarios whose name contains this text
    #[arg(long)]
    pub name: Option<String>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    pub browser: Browser,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Base URL for relative navigations; scenarios normally use absolute `${...}` URLs
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for test-results.json and screenshots
    #[arg(long, default_value = "test-results")]
    pub output: PathBuf,
}

#[derive(Serialize)]
pub struct ResultDisplay {
    pub name: String,
    pub success: bool,
    pub steps: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl From<&TestResult> for ResultDisplay {
    fn from(result: &TestResult) -> Self {
        Self {
            name: result.name.clone(),
            success: result.success,
            steps: result.steps.len(),
            duration_ms: result.duration_ms,
            error: result.error.clone(),
        }
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Passed", "Steps", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.success { "✓" } else { "✗" }.to_string(),
            self.steps.to_string(),
            format!("{}ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Runner settings for the given arguments and configuration file
pub fn runner_config(args: &RunArgs, config_path: &Path) -> Result<RunnerConfig> {
    let configuration = super::load_configuration(config_path)?;
    let playwright = PlaywrightConfig {
        base_url: args.base_url.clone().unwrap_or_default(),
        screenshot_dir: args.output.join("screenshots"),
        browser: args.browser,
        headless: !args.headed,
        ..PlaywrightConfig::default()
    };

    Ok(RunnerConfig {
        playwright,
        configuration,
        specs_dir: args.specs.clone(),
        output_dir: args.output.clone(),
        auth: auth_settings(),
    })
}

/// Auth-service keys from the environment, if both are set
fn auth_settings() -> Option<AuthSettings> {
    match AuthSettings::from_env() {
        Ok(settings) => Some(settings),
        Err(e) => {
            debug!("Dev browser tokens unavailable: {}", e);
            None
        }
    }
}

pub async fn execute(args: RunArgs, config_path: &Path, format: OutputFormat) -> Result<bool> {
    let runner = TestRunner::new(runner_config(&args, config_path)?);
    info!("Loading scenarios from {}", args.specs.display());

    let suite = runner
        .run_matching(args.tag.as_deref(), args.name.as_deref())
        .await?;
    let report = runner.write_results(&suite)?;

    let rows: Vec<ResultDisplay> = suite.results.iter().map(ResultDisplay::from).collect();
    print_list(&rows, format)?;
    print_info(&format!(
        "{} passed, {} failed; results written to {}",
        suite.passed,
        suite.failed,
        report.display()
    ));

    Ok(suite.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> RunArgs {
        RunArgs {
            specs: PathBuf::from("scenarios"),
            tag: None,
            name: None,
            browser: Browser::Chromium,
            headed: false,
            base_url: None,
            output: PathBuf::from("test-results"),
        }
    }

    fn config_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"AdminApp_url": "https://admin.example", "username": "qa"}}"#).unwrap();
        file
    }

    #[test]
    fn test_runner_config_from_args() {
        let file = config_file();
        let args = RunArgs {
            specs: PathBuf::from("scenarios/admin"),
            browser: Browser::Firefox,
            headed: true,
            base_url: Some("https://client.example".to_string()),
            output: PathBuf::from("out"),
            ..args()
        };

        let config = runner_config(&args, file.path()).unwrap();
        assert_eq!(config.playwright.base_url, "https://client.example");
        assert_eq!(config.playwright.browser, Browser::Firefox);
        assert!(!config.playwright.headless);
        assert_eq!(config.playwright.screenshot_dir, PathBuf::from("out/screenshots"));
        assert_eq!(config.specs_dir, PathBuf::from("scenarios/admin"));
        assert_eq!(config.configuration.get("username"), Some("qa"));
    }

    #[test]
    fn test_base_url_is_not_taken_from_any_app_url() {
        let file = config_file();
        let config = runner_config(&args(), file.path()).unwrap();
        assert_eq!(config.playwright.base_url, "");
    }

    #[test]
    fn test_missing_configuration_is_an_error() {
        assert!(runner_config(&args(), Path::new("/nonexistent/Configuration.json")).is_err());
    }
}
