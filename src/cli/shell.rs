use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    history::DefaultHistory,
    Cmd, Context as ReadlineContext, Editor, Helper, Highlighter, Hinter, KeyEvent, Validator,
};

use crate::{
    cli::{
        commands::{self, ArgKind, CommandRegistry},
        core::{CliError, CliMode, CommandError, LoopControl, ShellContext},
        output,
    },
    core::LedgerManager,
    ledger::BudgetState,
    transfer::TransferKind,
};

/// Set to run commands from stdin without an interactive prompt.
pub const SCRIPT_ENV: &str = "BUDGET_LEDGER_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        output::set_color_enabled(false);
    }

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context, io::stdin().lock()),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<LedgerCompleter, DefaultHistory>::new()?;
    editor.set_helper(Some(LedgerCompleter::new(context.ledger.clone())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands. Tab completes months, categories and descriptions.");

    while context.running {
        if let Some(helper) = editor.helper_mut() {
            helper.month.clone_from(&context.month);
        }
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.trim()).ok();
                match handle_line(context, &line) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err),
                }
            }
            Err(ReadlineError::Interrupted) => output::info("Use `exit` to leave the shell."),
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Runs one command per input line. Failed lines are reported with their
/// line number and the run continues; the run as a whole fails if any did.
pub(crate) fn run_script<R: BufRead>(context: &mut ShellContext, input: R) -> Result<(), CliError> {
    let mut failed = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                output::warning(format!("line {}: {}", index + 1, line.trim()));
                context.report_error(err);
                failed.push(index + 1);
            }
        }
    }
    if failed.is_empty() {
        return Ok(());
    }
    let lines: Vec<String> = failed.iter().map(usize::to_string).collect();
    Err(CliError::Input(format!(
        "{} script line(s) failed: {}",
        failed.len(),
        lines.join(", ")
    )))
}

/// Splits `line` shell-style (quotes group words, `#` starts a comment) and
/// runs the command it names.
pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = shell_words::split(line)
        .map_err(|err| CommandError::InvalidArguments(format!("cannot parse line: {err}")))?;
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    let control = context.dispatch(raw, &args)?;
    if let LoopControl::Exit = control {
        context.running = false;
    }
    Ok(control)
}

/// Tab completion backed by the live ledger: command names first, then
/// months, categories, groups or descriptions depending on the command.
#[derive(Helper, Hinter, Highlighter, Validator)]
struct LedgerCompleter {
    registry: CommandRegistry,
    ledger: LedgerManager,
    month: String,
}

impl LedgerCompleter {
    fn new(ledger: LedgerManager) -> Self {
        Self {
            registry: CommandRegistry::new(commands::all_definitions()),
            month: ledger.current_month(),
            ledger,
        }
    }
}

impl Completer for LedgerCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let snapshot = self.ledger.snapshot();
        let (start, candidates) =
            completion_candidates(&self.registry, &snapshot, &self.month, &line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: quote_if_needed(&candidate),
            })
            .collect();
        Ok((start, pairs))
    }
}

/// Start of the word under the cursor and the values it may complete to.
pub(crate) fn completion_candidates(
    registry: &CommandRegistry,
    state: &BudgetState,
    month: &str,
    before_cursor: &str,
) -> (usize, Vec<String>) {
    let start = before_cursor
        .rfind(char::is_whitespace)
        .map_or(0, |idx| idx + 1);
    let word = &before_cursor[start..];
    let previous: Vec<&str> = before_cursor[..start].split_whitespace().collect();

    let Some((command, args)) = previous.split_first() else {
        let names = registry.names_starting_with(word);
        return (start, names.into_iter().map(str::to_string).collect());
    };
    let kind = match (args.last(), registry.resolve(command)) {
        (Some(&"--category"), _) => ArgKind::Category,
        (Some(_), _) | (None, None) => ArgKind::None,
        (None, Some(definition)) => definition.args,
    };
    (start, values_for(kind, registry, state, month, word))
}

fn values_for(
    kind: ArgKind,
    registry: &CommandRegistry,
    state: &BudgetState,
    month: &str,
    word: &str,
) -> Vec<String> {
    let needle = word.trim_start_matches('"').to_lowercase();
    let matches = |value: &str| value.to_lowercase().starts_with(&needle);
    let mut values: Vec<String> = match kind {
        ArgKind::None => Vec::new(),
        ArgKind::Month => state
            .months
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(month))
            .filter(|key| matches(key))
            .map(str::to_string)
            .collect(),
        ArgKind::Category => state
            .category_names(month)
            .into_iter()
            .filter(|name| matches(name))
            .collect(),
        ArgKind::Group => state
            .month(month)
            .map(|entry| {
                entry
                    .categories
                    .values()
                    .map(|category| category.group.clone())
                    .filter(|group| matches(group))
                    .collect()
            })
            .unwrap_or_default(),
        ArgKind::Description => state
            .desc_list
            .iter()
            .filter(|desc| matches(desc))
            .cloned()
            .collect(),
        ArgKind::ExportKind => [
            TransferKind::All,
            TransferKind::Categories,
            TransferKind::Prediction,
            TransferKind::Transactions,
        ]
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once("csv".to_string()))
        .filter(|kind| matches(kind))
        .collect(),
        ArgKind::Command => registry
            .names_starting_with(&needle)
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    if kind != ArgKind::Description {
        values.sort();
    }
    values.dedup();
    values
}

fn quote_if_needed(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BudgetMonth, Category};

    fn state() -> BudgetState {
        let mut july = BudgetMonth::default();
        july.categories
            .insert("Food".into(), Category::new("Living", 200.0));
        july.categories
            .insert("Fuel".into(), Category::new("Travel", 80.0));
        july.categories
            .insert("Rent".into(), Category::new("Living", 900.0));
        let mut state = BudgetState::default();
        state.months.insert("2024-06".into(), BudgetMonth::default());
        state.months.insert("2024-07".into(), july);
        state.desc_list = vec!["Tesco Metro".into(), "Shell".into(), "tesco".into()];
        state
    }

    fn complete(line: &str) -> (usize, Vec<String>) {
        let registry = CommandRegistry::new(commands::all_definitions());
        completion_candidates(&registry, &state(), "2024-07", line)
    }

    #[test]
    fn first_word_completes_command_names() {
        assert_eq!(complete("no"), (0, vec!["note".into(), "notes".into()]));
        assert_eq!(complete("help pre").1, vec!["predict"]);
    }

    #[test]
    fn arguments_complete_from_the_ledger() {
        assert_eq!(complete("month 2024-0").1, vec!["2024-06", "2024-07"]);
        assert_eq!(complete("budget f"), (7, vec!["Food".into(), "Fuel".into()]));
        assert_eq!(complete("collapse ").1, vec!["Living", "Travel"]);
        assert_eq!(complete("add 12 --category R").1, vec!["Rent"]);
        assert_eq!(complete("suggest tes").1, vec!["Tesco Metro", "tesco"]);
        assert_eq!(complete("export c").1, vec!["categories", "csv"]);
    }

    #[test]
    fn later_arguments_and_unknown_commands_complete_nothing() {
        assert!(complete("month 2024-07 2024").1.is_empty());
        assert!(complete("frobnicate 20").1.is_empty());
    }

    #[test]
    fn multi_word_candidates_are_quoted() {
        assert_eq!(quote_if_needed("Tesco Metro"), "\"Tesco Metro\"");
        assert_eq!(quote_if_needed("Shell"), "Shell");
    }
}
