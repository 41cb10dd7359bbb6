use std::{fs, fs::File, io::BufReader, path::Path};

use crate::cli::commands::{ArgKind, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::transfer::{write_csv_transactions, ImportPayload, TransferKind};
use crate::utils::persistence::write_atomic;

const EXPORT_USAGE: &str = "export <transactions|categories|prediction|all|csv> [file]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "export",
            "Export ledger data as JSON (or the active month as CSV)",
            EXPORT_USAGE,
            cmd_export,
        )
        .completing(ArgKind::ExportKind),
        CommandDefinition::new(
            "import",
            "Merge a JSON export into the ledger",
            "import <file>",
            cmd_import,
        ),
        CommandDefinition::new(
            "import-csv",
            "Import transactions from a Date,Description,Category,Amount CSV",
            "import-csv <file>",
            cmd_import_csv,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (kind, target) = match args {
        [kind] => (*kind, None),
        [kind, file] => (*kind, Some(Path::new(file))),
        _ => return Err(CommandError::usage(EXPORT_USAGE)),
    };

    let payload = if kind.eq_ignore_ascii_case("csv") {
        let snapshot = context.ledger.snapshot();
        let transactions = snapshot
            .month(&context.month)
            .map(|month| month.transactions.as_slice())
            .unwrap_or_default();
        let mut buffer = Vec::new();
        write_csv_transactions(&mut buffer, transactions)?;
        buffer
    } else {
        let kind: TransferKind = kind.parse()?;
        let month = kind.needs_month().then_some(context.month.as_str());
        context.ledger.export(kind, month)?.into_bytes()
    };

    match target {
        Some(path) => {
            write_atomic(path, &payload)?;
            output::success(format!("Exported {kind} to {}", path.display()));
        }
        None => println!("{}", String::from_utf8_lossy(&payload).trim_end()),
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [file] = args else {
        return Err(CommandError::usage("import <file>"));
    };
    let json = fs::read_to_string(file)?;
    let payload = ImportPayload::parse(&json)?;
    let kind = payload.kind();
    let month = kind.needs_month().then_some(context.month.as_str());
    payload.apply(context.ledger.store(), month)?;
    match month {
        Some(month) => output::success(format!("Imported {kind} into {month}")),
        None => output::success(format!("Imported {kind}")),
    }
    Ok(())
}

fn cmd_import_csv(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [file] = args else {
        return Err(CommandError::usage("import-csv <file>"));
    };
    let reader = BufReader::new(File::open(file)?);
    let report = context.ledger.import_csv(reader)?;
    output::success(format!(
        "Imported {} transaction(s), {} duplicate(s), {} skipped row(s)",
        report.imported,
        report.duplicates,
        report.skipped.len()
    ));
    for row in &report.skipped {
        output::warning(format!("  line {}: {}", row.line, row.reason));
    }
    if !report.months.is_empty() {
        let months: Vec<&str> = report.months.iter().map(String::as_str).collect();
        output::info(format!("  Months touched: {}", months.join(", ")));
    }
    Ok(())
}
