//! Command dispatch

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, ExpenseArgs, MemberArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ExpenseId, MemberId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::store::{ExpenseFilter, MemberFilter};
use crate::util::format::format_amount;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(command) => {
            let container = load_container(cli)?;
            match command {
                Commands::Balances => cmd_balances(&container),
                Commands::Settle => cmd_settle(&container),
                Commands::Members(args) => cmd_members(&container, args),
                Commands::Expenses(args) => cmd_expenses(&container, args),
                Commands::Info => cmd_info(&container),
                Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
            }
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".to_string(),
        )),
    }
}

fn current_dir() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

fn load_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(current_dir().as_deref())?;
    let path = cli
        .session
        .clone()
        .or_else(|| settings.session_file.clone())
        .ok_or_else(|| {
            CliError::Usage(
                "no session file: pass --session or set session_file in the config".to_string(),
            )
        })?;
    debug!("load_container: session={}", path.display());
    Ok(ServiceContainer::load(settings, &path)?)
}

fn money(container: &ServiceContainer, value: f64) -> String {
    let settings = &container.settings;
    format_amount(value, settings.precision, &settings.currency_symbol)
}

fn member_name(container: &ServiceContainer, id: MemberId) -> String {
    container
        .store
        .member(id)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn resolve_names(container: &ServiceContainer, names: &[String]) -> CliResult<Vec<MemberId>> {
    names
        .iter()
        .map(|name| {
            container
                .store
                .member_by_name(name)
                .map(|m| m.id)
                .ok_or_else(|| CliError::InvalidArgs(format!("unknown member '{name}'")))
        })
        .collect()
}

#[instrument(skip(container))]
fn cmd_balances(container: &ServiceContainer) -> CliResult<()> {
    let sheet = container.ledger().compute_balances()?;
    let tolerance = container.settings.tolerance;

    output::header(&format!("Balances: {}", container.store.session().name));
    for (id, entry) in sheet.iter() {
        let Some(member) = container.store.member(id) else {
            continue;
        };
        let balance = format!("{:>14}", money(container, entry.balance));
        let status = if member.active { "" } else { " (inactive)" };
        output::detail(&format!(
            "{:<20} paid {:>14}  balance {}{}",
            member.name,
            money(container, entry.paid),
            output::signed(&balance, entry.balance, tolerance),
            status
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_settle(container: &ServiceContainer) -> CliResult<()> {
    let plan = container.ledger().compute_settlement()?;

    if plan.transfers.is_empty() && plan.unsettled.is_empty() {
        output::success("Nothing to settle");
        return Ok(());
    }

    output::header(&format!("Settlement: {}", container.store.session().name));
    for t in &plan.transfers {
        output::transfer(
            &member_name(container, t.from),
            &member_name(container, t.to),
            &money(container, t.amount),
        );
    }

    // Left over because the counterpart is inactive
    for &(id, amount) in &plan.unsettled {
        let name = member_name(container, id);
        let owed = money(container, amount.abs());
        if amount > 0.0 {
            output::warning(&format!("{name} is still owed {owed} by inactive members"));
        } else {
            output::warning(&format!("{name} still owes {owed} to inactive members"));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_members(container: &ServiceContainer, args: &MemberArgs) -> CliResult<()> {
    let filter = MemberFilter {
        names: args.names.clone(),
        ids: args.ids.iter().map(|&id| MemberId(id)).collect(),
        weights: args.weights.clone(),
        include_inactive: args.all,
    };
    let mut members = container.store.find_members(&filter);

    if args.above.is_some() || args.below.is_some() {
        let sheet = container.ledger().compute_balances()?;
        let above = args.above.map(|x| sheet.above(x));
        let below = args.below.map(|x| sheet.below(x));
        members.retain(|m| {
            above.as_ref().map_or(true, |ids| ids.contains(&m.id))
                && below.as_ref().map_or(true, |ids| ids.contains(&m.id))
        });
    }

    for member in members {
        let status = if member.active { "" } else { " (inactive)" };
        output::info(&format!(
            "{:<5} {:<20} weight {}{}",
            member.id.to_string(),
            member.name,
            member.weight,
            status
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_expenses(container: &ServiceContainer, args: &ExpenseArgs) -> CliResult<()> {
    if let (Some(min), Some(max)) = (args.min, args.max) {
        if min >= max {
            return Err(CliError::InvalidArgs(format!(
                "--min ({min}) must be smaller than --max ({max})"
            )));
        }
    }
    let filter = ExpenseFilter {
        names: args.names.clone(),
        ids: args.ids.iter().map(|&id| ExpenseId(id)).collect(),
        value_above: args.min,
        value_below: args.max,
        payers: resolve_names(container, &args.payers)?,
        participants: resolve_names(container, &args.participants)?,
        include_inactive: args.all,
    };

    for expense in container.store.find_expenses(&filter) {
        let shared_by = expense
            .participants
            .iter()
            .map(|&id| member_name(container, id))
            .join(", ");
        let status = if expense.active { "" } else { " (inactive)" };
        output::info(&format!(
            "{:<5} {:<24} {:>14}  paid by {}, shared by {}{}",
            expense.id.to_string(),
            expense.name,
            money(container, expense.value),
            member_name(container, expense.payer),
            shared_by,
            status
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_info(container: &ServiceContainer) -> CliResult<()> {
    let store = &container.store;
    let session = store.session();
    let all_members = store.find_members(&MemberFilter {
        include_inactive: true,
        ..Default::default()
    });
    let all_expenses = store.find_expenses(&ExpenseFilter {
        include_inactive: true,
        ..Default::default()
    });
    let active_members = all_members.iter().filter(|m| m.active).count();
    let active_expenses = all_expenses.iter().filter(|e| e.active).collect::<Vec<_>>();
    let total: f64 = active_expenses.iter().map(|e| e.value).sum();

    output::header(&session.name);
    if !session.description.is_empty() {
        output::detail(&session.description);
    }
    output::detail(&format!(
        "created:  {}",
        session.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if !session.tags.is_empty() {
        output::detail(&format!("tags:     {}", session.tags.iter().join(", ")));
    }
    output::detail(&format!(
        "members:  {} active / {} total",
        active_members,
        all_members.len()
    ));
    output::detail(&format!(
        "expenses: {} active / {} total, {} spent",
        active_expenses.len(),
        all_expenses.len(),
        money(container, total)
    ));
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(current_dir().as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::warning("no global config directory on this platform"),
            }
            if let Some(dir) = current_dir() {
                output::info(&format!("local:  {}", local_config_path(&dir).display()));
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
