use std::collections::BTreeMap;

use crate::cli::commands::{parse_amount, ArgKind, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::MonthTotals;
use crate::ledger::{Category, DEFAULT_GROUP};

const INCOME_USAGE: &str = "income <name> <amount> | income rm <id>";
const BUDGET_USAGE: &str = "budget <category> <amount> [group] | budget rm <category>";
const COLLAPSE_USAGE: &str = "collapse <group> [on|off]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "month",
            "Show or switch the active month",
            "month [YYYY-MM]",
            cmd_month,
        )
        .completing(ArgKind::Month),
        CommandDefinition::new(
            "show",
            "Summarise a month by category group",
            "show [YYYY-MM]",
            cmd_show,
        )
        .completing(ArgKind::Month),
        CommandDefinition::new("income", "Add or remove an income line", INCOME_USAGE, cmd_income),
        CommandDefinition::new(
            "budget",
            "Set or remove a category budget",
            BUDGET_USAGE,
            cmd_budget,
        )
        .completing(ArgKind::Category),
        CommandDefinition::new(
            "collapse",
            "Collapse or expand a group in `show`",
            COLLAPSE_USAGE,
            cmd_collapse,
        )
        .completing(ArgKind::Group),
        CommandDefinition::new(
            "predict",
            "Predict month-end spend and leftover",
            "predict [YYYY-MM]",
            cmd_predict,
        )
        .completing(ArgKind::Month),
    ]
}

fn cmd_month(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(key) = args.first() else {
        output::info(format!("Active month: {}", context.month));
        return Ok(());
    };
    let month = context.ledger.months().ensure_month(key)?;
    context.month = key.to_string();
    output::success(format!(
        "Active month is now {key} ({} categories)",
        month.categories.len()
    ));
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args.first().copied().unwrap_or(&context.month).to_string();
    let snapshot = context.ledger.snapshot();
    let Some(month) = snapshot.month(&key) else {
        output::warning(format!("No data for {key}. Use `month {key}` to start it."));
        return Ok(());
    };
    let money = |amount: f64| context.format_amount(amount);

    let totals = MonthTotals::of(month);
    output::section(&key);
    output::info(format!("  Income   : {}", money(totals.income)));
    output::info(format!("  Budgeted : {}", money(totals.budgeted)));
    output::info(format!("  Spent    : {}", money(totals.spent)));
    output::info(format!("  Leftover : {}", money(totals.leftover)));

    let mut groups: BTreeMap<&str, Vec<(&str, &Category)>> = BTreeMap::new();
    for (name, category) in &month.categories {
        groups
            .entry(category.group.as_str())
            .or_default()
            .push((name.as_str(), category));
    }
    for (group, entries) in groups {
        let budget: f64 = entries.iter().map(|(_, category)| category.budget).sum();
        let spent: f64 = entries.iter().map(|(name, _)| month.spent_in(name)).sum();
        let collapsed = snapshot.ui.is_collapsed(&key, group);
        let marker = if collapsed { "+" } else { "-" };
        output::info(format!(
            "  [{marker}] {group:<16} {} / {}",
            money(spent),
            money(budget)
        ));
        if collapsed {
            continue;
        }
        for (name, category) in entries {
            output::info(format!(
                "      {name:<14} {} / {}",
                money(month.spent_in(name)),
                money(category.budget)
            ));
        }
    }

    if !month.incomes.is_empty() {
        output::info("  Incomes:");
        for income in &month.incomes {
            output::info(format!(
                "    {:<18} {}  ({})",
                income.name,
                money(income.amount),
                income.id
            ));
        }
    }

    if !month.transactions.is_empty() {
        let mut transactions: Vec<_> = month.transactions.iter().collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date));
        output::info("  Transactions:");
        for txn in transactions {
            let category = if txn.category.is_empty() {
                "-"
            } else {
                txn.category.as_str()
            };
            output::info(format!(
                "    {}  {:<20} {:<12} {:>10}  ({})",
                txn.date,
                txn.desc,
                category,
                money(txn.amount),
                txn.id
            ));
        }
    }
    Ok(())
}

fn cmd_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let months = context.ledger.months();
    match args {
        ["rm", id] => {
            months.remove_income(&context.month, id)?;
            output::success(format!("Removed income {id}"));
        }
        [name, amount] => {
            let income = months.add_income(&context.month, name, parse_amount(amount)?)?;
            output::success(format!(
                "Added income {} {} ({})",
                income.name,
                context.format_amount(income.amount),
                income.id
            ));
        }
        _ => return Err(CommandError::usage(INCOME_USAGE)),
    }
    Ok(())
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let months = context.ledger.months();
    match args {
        ["rm", name] => {
            months.remove_category(&context.month, name)?;
            output::success(format!("Removed category {name}"));
        }
        [name, amount, group @ ..] => {
            let group = if group.is_empty() {
                DEFAULT_GROUP.to_string()
            } else {
                group.join(" ")
            };
            let budget = parse_amount(amount)?;
            months.set_category(&context.month, name, &group, budget)?;
            output::success(format!(
                "Budget for {name} ({group}) set to {}",
                context.format_amount(budget)
            ));
        }
        _ => return Err(CommandError::usage(BUDGET_USAGE)),
    }
    Ok(())
}

fn cmd_collapse(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (group, collapsed) = match args {
        [group] | [group, "on"] => (*group, true),
        [group, "off"] => (*group, false),
        _ => return Err(CommandError::usage(COLLAPSE_USAGE)),
    };
    context
        .ledger
        .months()
        .set_collapsed(&context.month, group, collapsed)?;
    let state = if collapsed { "collapsed" } else { "expanded" };
    output::success(format!("{group} {state}"));
    Ok(())
}

fn cmd_predict(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args.first().copied().unwrap_or(&context.month).to_string();
    let Some(prediction) = context.ledger.predict_balance(&key) else {
        output::warning(format!("No data for {key}."));
        return Ok(());
    };
    let money = |amount: f64| context.format_amount(amount);
    output::section(format!("Prediction {key}"));
    output::info(format!("  Income             : {}", money(prediction.incomes_total)));
    output::info(format!("  Spent so far       : {}", money(prediction.spent_so_far)));
    output::info(format!("  Predicted spend    : {}", money(prediction.predicted_spend)));
    output::info(format!("  Predicted leftover : {}", money(prediction.predicted_leftover)));
    let basis = match prediction.remainder_used_day {
        Some(day) => format!(
            "history at day {day}, {} sample(s)",
            prediction.sample_size
        ),
        None => "no history".to_string(),
    };
    output::info(format!(
        "  Observed up to day {} ({basis})",
        prediction.observation_day
    ));
    Ok(())
}
