pub mod entries;
pub mod learning;
pub mod month;
pub mod system;
pub mod transfer;

use crate::{
    cli::core::{CommandError, CommandResult, ShellContext},
    transfer::parse_csv_amount,
};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(month::definitions());
    commands.extend(entries::definitions());
    commands.extend(learning::definitions());
    commands.extend(transfer::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// What the arguments of a command refer to, used for tab completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    None,
    /// `YYYY-MM` keys already in the ledger.
    Month,
    /// Categories of the active month.
    Category,
    /// Category groups of the active month.
    Group,
    /// Descriptions seen before.
    Description,
    /// Export kinds plus `csv`.
    ExportKind,
    /// Names of other commands.
    Command,
}

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
    pub args: ArgKind,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
            args: ArgKind::None,
        }
    }

    pub const fn completing(mut self, args: ArgKind) -> Self {
        self.args = args;
        self
    }
}

/// Commands in help order. Lookup accepts a full name or any prefix that
/// names exactly one command, so `pred` runs `predict`.
pub struct CommandRegistry {
    commands: Vec<CommandDefinition>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<CommandDefinition>) -> Self {
        Self { commands }
    }

    pub fn resolve(&self, input: &str) -> Option<&CommandDefinition> {
        let input = input.to_lowercase();
        if let Some(exact) = self.commands.iter().find(|command| command.name == input) {
            return Some(exact);
        }
        let mut matches = self
            .commands
            .iter()
            .filter(|command| !input.is_empty() && command.name.starts_with(&input));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|command| command.name)
    }

    /// Command names starting with `prefix`, sorted.
    pub fn names_starting_with(&self, prefix: &str) -> Vec<&'static str> {
        let prefix = prefix.to_lowercase();
        let mut names: Vec<_> = self
            .names()
            .filter(|name| name.starts_with(&prefix))
            .collect();
        names.sort_unstable();
        names
    }
}

/// Parses a user-typed amount; currency symbols and separators are allowed.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    parse_csv_amount(raw)
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{raw}` is not an amount")))
}

/// Splits `--flag value` out of `args`.
pub(crate) fn take_option<'a>(
    args: &[&'a str],
    flag: &str,
) -> Result<(Option<String>, Vec<&'a str>), CommandError> {
    let mut value = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == flag {
            let next = iter
                .next()
                .ok_or_else(|| CommandError::InvalidArguments(format!("`{flag}` needs a value")))?;
            value = Some(next.to_string());
        } else {
            rest.push(*arg);
        }
    }
    Ok((value, rest))
}
