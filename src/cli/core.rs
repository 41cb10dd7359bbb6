use std::io;

use chrono::NaiveDate;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    core::LedgerManager,
    errors::LedgerError,
    ledger::{month_key, parse_date},
};

use super::{
    commands::{self, CommandDefinition, CommandRegistry},
    output,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("{0}")]
    Input(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl CommandError {
    pub(crate) fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("usage: {usage}"))
    }
}

pub type CommandResult = Result<(), CommandError>;

pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub ledger: LedgerManager,
    pub config: Config,
    /// Active month key used by month-scoped commands.
    pub month: String,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        crate::init(config.log_filter.as_deref());
        let ledger = LedgerManager::open(&config, manager.base_dir());
        Ok(Self::with_ledger(mode, ledger, config))
    }

    pub fn with_ledger(mode: CliMode, ledger: LedgerManager, config: Config) -> Self {
        Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            month: ledger.current_month(),
            ledger,
            config,
            last_command: None,
            running: true,
        }
    }

    /// Command named by `input`, or by a unique prefix of it.
    pub fn command(&self, input: &str) -> Option<&CommandDefinition> {
        self.registry.resolve(input)
    }

    pub fn prompt(&self) -> String {
        format!("ledger [{}]> ", self.month)
    }

    pub fn format_amount(&self, amount: f64) -> String {
        self.config.format_amount(amount)
    }

    /// Today when the active month is the current one, otherwise the first
    /// day of the active month.
    pub fn default_date(&self) -> NaiveDate {
        let today = self.ledger.clock().today();
        if month_key(today) == self.month {
            return today;
        }
        parse_date(&format!("{}-01", self.month)).unwrap_or(today)
    }

    pub(crate) fn dispatch(
        &mut self,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.command(raw).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::handle_line(self, line)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(best) = self.closest_command(input) {
            output::info(format!("Suggestion: `{best}`?"));
        }
    }

    pub(crate) fn closest_command(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            CommandError::Core(LedgerError::NotPersisted { source, .. }) => {
                output::warning(format!("Change kept for this session but not saved: {source}"));
            }
            other => output::error(other),
        }
    }
}
