//! Prompting capability for commands and the reconciler.
//!
//! Business logic only ever sees the [`Prompter`] trait, so the
//! reconciliation flow can run against scripted answers in tests and in
//! CI while the terminal implementation uses dialoguer.

use std::io::IsTerminal;

use dialoguer::{Confirm, Password};

use crate::error::{CliError, CliResult};

/// Confirmation and secret entry.
pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> CliResult<bool>;

    /// Ask for a value that must not be echoed or persisted.
    fn secret(&self, prompt: &str) -> CliResult<String>;
}

/// Checks if both stdin and stdout are connected to a terminal.
///
/// Returns `true` if running in an interactive TTY environment,
/// `false` if running in a pipe or CI environment.
pub fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Requires an interactive terminal, returning an error if not available.
pub fn require_interactive() -> CliResult<()> {
    if !is_interactive_terminal() {
        return Err(CliError::Validation(
            "Interactive confirmation requires a terminal.\n\
             Use --auto-approve for scripting.\n\
             Run with --help for all options."
                .into(),
        ));
    }
    Ok(())
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> CliResult<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(CliError::from)
    }

    fn secret(&self, prompt: &str) -> CliResult<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(CliError::from)
    }
}

/// Answers every confirmation with yes; secrets are still asked.
#[derive(Debug, Clone)]
pub struct AutoApprove<P> {
    inner: P,
}

impl<P> AutoApprove<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Prompter> Prompter for AutoApprove<P> {
    fn confirm(&self, prompt: &str, _default: bool) -> CliResult<bool> {
        tracing::debug!(prompt, "Auto-approved");
        Ok(true)
    }

    fn secret(&self, prompt: &str) -> CliResult<String> {
        self.inner.secret(prompt)
    }
}

/// Used without a terminal: confirmations take their default and secrets
/// cannot be obtained.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn confirm(&self, prompt: &str, default: bool) -> CliResult<bool> {
        tracing::debug!(prompt, default, "No terminal; using default answer");
        Ok(default)
    }

    fn secret(&self, prompt: &str) -> CliResult<String> {
        Err(CliError::InputError(format!(
            "'{prompt}' needs a terminal to be answered"
        )))
    }
}

/// Pick the prompter for this invocation.
pub fn prompter_for(auto_approve: bool) -> Box<dyn Prompter> {
    match (auto_approve, is_interactive_terminal()) {
        (true, true) => Box::new(AutoApprove::new(TerminalPrompter)),
        (true, false) => Box::new(AutoApprove::new(NonInteractive)),
        (false, true) => Box::new(TerminalPrompter),
        (false, false) => Box::new(NonInteractive),
    }
}
