use chrono::DateTime;

use crate::cli::commands::{parse_amount, take_option, ArgKind, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::ledger::{month_key, parse_date, Transaction};

const ADD_USAGE: &str = "add <amount> <description...> [--category <name>] [--date YYYY-MM-DD]";
const NOTE_USAGE: &str = "note <title> [text...] | note rm <id>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "add",
            "Record a transaction, predicting its category when omitted",
            ADD_USAGE,
            cmd_add,
        )
        .completing(ArgKind::Description),
        CommandDefinition::new(
            "remove",
            "Remove a transaction from the active month",
            "remove <transaction-id>",
            cmd_remove,
        ),
        CommandDefinition::new("note", "Add or remove a note", NOTE_USAGE, cmd_note),
        CommandDefinition::new("notes", "List notes, newest first", "notes", cmd_notes),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (category, args) = take_option(args, "--category")?;
    let (date, args) = take_option(&args, "--date")?;
    let [amount, desc @ ..] = args.as_slice() else {
        return Err(CommandError::usage(ADD_USAGE));
    };
    if desc.is_empty() {
        return Err(CommandError::usage(ADD_USAGE));
    }
    let amount = parse_amount(amount)?;
    let desc = desc.join(" ");
    let date = match date {
        Some(raw) => parse_date(&raw)
            .ok_or_else(|| CommandError::InvalidArguments(format!("invalid date `{raw}`")))?,
        None => context.default_date(),
    };

    let category = match category {
        Some(category) => category,
        None => {
            let month = context.ledger.months().ensure_month(&month_key(date))?;
            let known: Vec<&str> = month.categories.keys().map(String::as_str).collect();
            context
                .ledger
                .categories()
                .predict(&desc, &known, Some(amount))
                .unwrap_or_default()
        }
    };

    let booked = context
        .ledger
        .months()
        .add_transaction(Transaction::new(date, desc, amount, category))?;
    let label = if booked.category.is_empty() {
        "uncategorised"
    } else {
        booked.category.as_str()
    };
    output::success(format!(
        "Added {} {} [{label}] on {} ({})",
        booked.desc,
        context.format_amount(booked.amount),
        booked.date,
        booked.id
    ));
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(CommandError::usage("remove <transaction-id>"));
    };
    context
        .ledger
        .months()
        .remove_transaction(&context.month, id)?;
    output::success(format!("Removed transaction {id}"));
    Ok(())
}

fn cmd_note(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        ["rm", id] => {
            let id: i64 = id
                .parse()
                .map_err(|_| CommandError::InvalidArguments(format!("`{id}` is not a note id")))?;
            context.ledger.months().remove_note(id)?;
            output::success(format!("Removed note {id}"));
        }
        [title, text @ ..] => {
            let note = context.ledger.months().add_note(title, &text.join(" "))?;
            output::success(format!("Added note {} ({})", note.desc, note.id));
        }
        [] => return Err(CommandError::usage(NOTE_USAGE)),
    }
    Ok(())
}

fn cmd_notes(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = context.ledger.snapshot();
    if snapshot.notes.is_empty() {
        output::info("No notes.");
        return Ok(());
    }
    output::section("Notes");
    for note in &snapshot.notes {
        let when = DateTime::from_timestamp_millis(note.time)
            .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        output::info(format!("  #{:<3} {when}  {}", note.id, note.desc));
        if !note.data.is_empty() {
            output::info(format!("        {}", note.data));
        }
    }
    Ok(())
}
