//! Retrying value selection for MUI-style autocomplete inputs
//!
//! One attempt walks Typing -> AwaitingDropdown -> Selecting -> Verifying.
//! Each of the last three can fail in its own way ([`AttemptFailure`]); a
//! failure either starts the next attempt after a fixed backoff or, once
//! `max_retries` attempts are spent, ends in [`AutocompleteState::Exhausted`].

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::driver::{nth, Driver, WaitState};
use crate::error::{E2eError, E2eResult};

pub const LISTBOX_SELECTOR: &str = "[role=\"listbox\"]";
pub const OPTION_SELECTOR: &str = "[role=\"option\"]";

#[derive(Debug, Clone)]
pub struct AutocompleteOptions {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Pause between attempts
    pub backoff: Duration,
    /// How long to wait for the listbox after typing
    pub dropdown_timeout: Duration,
    pub listbox_selector: String,
    pub option_selector: String,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(1),
            dropdown_timeout: Duration::from_secs(5),
            listbox_selector: LISTBOX_SELECTOR.to_string(),
            option_selector: OPTION_SELECTOR.to_string(),
        }
    }
}

/// Why an attempt did not end with the value selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    DropdownNeverAppeared,
    OptionNeverMatched { offered: Vec<String> },
    ValueNeverVerified { observed: String },
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::DropdownNeverAppeared => f.write_str("dropdown never appeared"),
            AttemptFailure::OptionNeverMatched { offered } => {
                write!(f, "no option matched (offered: {})", offered.join(", "))
            }
            AttemptFailure::ValueNeverVerified { observed } => {
                write!(f, "input value not verified (observed: '{}')", observed)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutocompleteState {
    Typing { attempt: u32 },
    AwaitingDropdown { attempt: u32 },
    Selecting { attempt: u32 },
    Verifying { attempt: u32 },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32, failure: AttemptFailure },
}

impl AutocompleteState {
    pub fn start() -> Self {
        AutocompleteState::Typing { attempt: 1 }
    }

    pub fn attempt(&self) -> u32 {
        match self {
            AutocompleteState::Typing { attempt }
            | AutocompleteState::AwaitingDropdown { attempt }
            | AutocompleteState::Selecting { attempt }
            | AutocompleteState::Verifying { attempt } => *attempt,
            AutocompleteState::Succeeded { attempts }
            | AutocompleteState::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AutocompleteState::Succeeded { .. } | AutocompleteState::Exhausted { .. }
        )
    }

    /// State after `attempt` failed
    pub fn after_failure(attempt: u32, max_retries: u32, failure: AttemptFailure) -> Self {
        if attempt < max_retries.max(1) {
            AutocompleteState::Typing { attempt: attempt + 1 }
        } else {
            AutocompleteState::Exhausted { attempts: attempt, failure }
        }
    }
}

/// Index of the first option whose text contains `value`
pub fn match_option(options: &[String], value: &str) -> Option<usize> {
    options.iter().position(|text| text.contains(value))
}

pub fn value_matches(observed: &str, expected: &str) -> bool {
    observed.contains(expected)
}

/// Drives the state machine for one input against a driver
pub struct Autocomplete<'a> {
    driver: &'a dyn Driver,
    selector: &'a str,
    value: &'a str,
    options: &'a AutocompleteOptions,
}

impl<'a> Autocomplete<'a> {
    pub fn new(
        driver: &'a dyn Driver,
        selector: &'a str,
        value: &'a str,
        options: &'a AutocompleteOptions,
    ) -> Self {
        Self { driver, selector, value, options }
    }

    fn fail(&self, attempt: u32, failure: AttemptFailure) -> AutocompleteState {
        warn!(
            "Attempt {}/{} to set '{}' on {} failed: {}",
            attempt, self.options.max_retries, self.value, self.selector, failure
        );
        AutocompleteState::after_failure(attempt, self.options.max_retries, failure)
    }

    /// Advance one non-terminal state
    pub async fn step(&self, state: &AutocompleteState) -> E2eResult<AutocompleteState> {
        let next = match *state {
            AutocompleteState::Typing { attempt } => {
                self.driver.click(self.selector).await?;
                self.driver.clear(self.selector).await?;
                self.driver.type_text(self.selector, self.value).await?;
                AutocompleteState::AwaitingDropdown { attempt }
            }
            AutocompleteState::AwaitingDropdown { attempt } => {
                match self
                    .driver
                    .wait_for(
                        &self.options.listbox_selector,
                        WaitState::Visible,
                        self.options.dropdown_timeout,
                    )
                    .await
                {
                    Ok(()) => AutocompleteState::Selecting { attempt },
                    Err(E2eError::Timeout(_)) => {
                        self.fail(attempt, AttemptFailure::DropdownNeverAppeared)
                    }
                    Err(e) => return Err(e),
                }
            }
            AutocompleteState::Selecting { attempt } => {
                let offered = self
                    .driver
                    .all_text_contents(&self.options.option_selector)
                    .await?;
                match match_option(&offered, self.value) {
                    Some(index) => {
                        debug!("Selecting option {} ('{}')", index, offered[index]);
                        self.driver
                            .click(&nth(&self.options.option_selector, index))
                            .await?;
                        AutocompleteState::Verifying { attempt }
                    }
                    None => self.fail(attempt, AttemptFailure::OptionNeverMatched { offered }),
                }
            }
            AutocompleteState::Verifying { attempt } => {
                let observed = self.driver.input_value(self.selector).await?;
                if value_matches(&observed, self.value) {
                    AutocompleteState::Succeeded { attempts: attempt }
                } else {
                    self.fail(attempt, AttemptFailure::ValueNeverVerified { observed })
                }
            }
            AutocompleteState::Succeeded { .. } | AutocompleteState::Exhausted { .. } => {
                state.clone()
            }
        };
        Ok(next)
    }

    /// Run to a terminal state. Returns the number of attempts used.
    pub async fn run(&self) -> E2eResult<u32> {
        let mut state = AutocompleteState::start();

        loop {
            let next = self.step(&state).await?;

            match &next {
                AutocompleteState::Succeeded { attempts } => {
                    info!("Set '{}' on {} after {} attempt(s)", self.value, self.selector, attempts);
                    return Ok(*attempts);
                }
                AutocompleteState::Exhausted { attempts, failure } => {
                    let last_observed = match failure {
                        AttemptFailure::ValueNeverVerified { observed } => observed.clone(),
                        _ => self
                            .driver
                            .input_value(self.selector)
                            .await
                            .unwrap_or_else(|e| {
                                warn!("Could not read final value of {}: {}", self.selector, e);
                                String::new()
                            }),
                    };
                    return Err(E2eError::AutocompleteSelection {
                        selector: self.selector.to_string(),
                        expected: self.value.to_string(),
                        attempts: *attempts,
                        last_observed,
                        failure: failure.clone(),
                    });
                }
                AutocompleteState::Typing { attempt } if *attempt > state.attempt() => {
                    tokio::time::sleep(self.options.backoff).await;
                }
                _ => {}
            }

            state = next;
        }
    }
}
