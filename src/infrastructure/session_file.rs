//! Session file loading (read-only TOML input)
//!
//! ```toml
//! name = "Trip"
//! description = "Beach weekend"
//! tags = ["beach"]
//!
//! [[members]]
//! name = "Ana"
//! weight = 2.0
//!
//! [[expenses]]
//! name = "Dinner"
//! value = 120.0
//! payer = "Ana"
//! participants = ["Ana", "Bia"]   # default: every active member
//! ```
//!
//! Members are referenced by name and names must be unique within the file.
//! Records marked `active = false` are soft-deleted after all expenses are in,
//! so historical expenses may still reference them.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{MemberId, Session};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::store::{NewExpense, NewMember, SessionStore};

fn default_weight() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionDocument {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    members: Vec<MemberEntry>,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemberEntry {
    name: String,
    #[serde(default = "default_weight")]
    weight: f64,
    description: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpenseEntry {
    name: String,
    value: f64,
    payer: String,
    participants: Option<Vec<String>>,
    description: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
}

/// Read and parse a session file.
#[instrument(level = "debug")]
pub fn load_session(path: &Path) -> InfraResult<SessionStore> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read session file {}", path.display()), e))?;
    parse_session(&content).map_err(|e| match e {
        InfraError::SessionFormat { message, .. } => InfraError::SessionFormat {
            source_name: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Build a store from session file content.
pub fn parse_session(content: &str) -> InfraResult<SessionStore> {
    let document: SessionDocument =
        toml::from_str(content).map_err(|e| format_error(e.to_string()))?;

    let mut session = Session::new(document.name, document.description);
    for tag in document.tags {
        session.add_tag(tag);
    }
    let mut store = SessionStore::new(session);

    let mut ids: HashMap<String, MemberId> = HashMap::new();
    for entry in &document.members {
        if ids.contains_key(&entry.name) {
            return Err(format_error(format!("duplicate member name '{}'", entry.name)));
        }
        let mut new = NewMember::new(entry.name.clone()).weight(entry.weight);
        if let Some(description) = &entry.description {
            new = new.description(description.clone());
        }
        let id = store.add_member(new)?;
        ids.insert(entry.name.clone(), id);
    }

    let lookup = |name: &str, expense: &str| {
        ids.get(name).copied().ok_or_else(|| {
            format_error(format!("expense '{expense}' references unknown member '{name}'"))
        })
    };
    let everyone: Vec<MemberId> = document
        .members
        .iter()
        .filter(|m| m.active)
        .filter_map(|m| ids.get(&m.name).copied())
        .collect();

    let mut inactive_expenses = Vec::new();
    for entry in &document.expenses {
        let payer = lookup(&entry.payer, &entry.name)?;
        let participants = match &entry.participants {
            Some(names) => names
                .iter()
                .map(|n| lookup(n, &entry.name))
                .collect::<InfraResult<Vec<_>>>()?,
            None => everyone.clone(),
        };
        let mut new = NewExpense::new(entry.name.clone(), entry.value, payer, participants);
        if let Some(description) = &entry.description {
            new = new.description(description.clone());
        }
        let id = store.add_expense(new)?;
        if !entry.active {
            inactive_expenses.push(id);
        }
    }

    for id in inactive_expenses {
        store.deactivate_expense(id)?;
    }
    for entry in document.members.iter().filter(|m| !m.active) {
        if let Some(&id) = ids.get(&entry.name) {
            store.deactivate_member(id)?;
        }
    }

    debug!(
        "parse_session: {} members, {} expenses",
        document.members.len(),
        document.expenses.len()
    );
    Ok(store)
}

fn format_error(message: String) -> InfraError {
    InfraError::SessionFormat {
        source_name: "<input>".to_string(),
        message,
    }
}
