use crate::cli::commands::{parse_amount, take_option, ArgKind, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

const CATEGORIZE_USAGE: &str = "categorize <description...> [--amount <amount>]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "suggest",
            "Autocomplete a description from ones seen before",
            "suggest <prefix...>",
            cmd_suggest,
        )
        .completing(ArgKind::Description),
        CommandDefinition::new(
            "categorize",
            "Predict the category of a description in the active month",
            CATEGORIZE_USAGE,
            cmd_categorize,
        )
        .completing(ArgKind::Description),
        CommandDefinition::new(
            "pin",
            "Always map a description to a category",
            "pin <description> <category>",
            cmd_pin,
        )
        .completing(ArgKind::Description),
    ]
}

fn cmd_suggest(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let prefix = args.join(" ");
    if prefix.trim().is_empty() {
        return Err(CommandError::usage("suggest <prefix...>"));
    }
    let suggestions = context
        .ledger
        .descriptions()
        .suggest_with_limit(&prefix, context.config.suggestion_limit);
    if suggestions.is_empty() {
        output::info(format!("No descriptions start with `{prefix}`."));
    }
    for suggestion in suggestions {
        output::info(format!("  {suggestion}"));
    }
    Ok(())
}

fn cmd_categorize(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (amount, words) = take_option(args, "--amount")?;
    let desc = words.join(" ");
    if desc.trim().is_empty() {
        return Err(CommandError::usage(CATEGORIZE_USAGE));
    }
    let amount = amount.as_deref().map(parse_amount).transpose()?;
    match context.ledger.predict_category(&context.month, &desc, amount) {
        Some(category) => output::info(format!("{desc} -> {category}")),
        None => output::info(format!("No category known for `{desc}` in {}.", context.month)),
    }
    Ok(())
}

fn cmd_pin(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [desc, category] = args else {
        return Err(CommandError::usage("pin <description> <category>"));
    };
    context.ledger.categories().pin_mapping(desc, category)?;
    output::success(format!("`{desc}` now maps to {category}"));
    Ok(())
}
