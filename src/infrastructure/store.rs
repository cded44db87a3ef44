//! In-memory record store for one session
//!
//! Members and expenses live in id-ordered maps. Removal is a soft delete
//! (`active = false`), updates keep the id and bump `version`, and every
//! mutation is appended to an audit log. Ids are handed out monotonically and
//! never reused.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::domain::{
    DomainError, DomainResult, Expense, ExpenseId, Member, MemberId, Session,
};
use crate::infrastructure::traits::RecordStore;

/// Record an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Member(MemberId),
    Expense(ExpenseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    Deactivated,
}

/// One mutation of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub record: RecordRef,
    pub action: AuditAction,
    /// Record version after the mutation
    pub version: u32,
}

/// Input for [`SessionStore::add_member`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub weight: f64,
    pub description: Option<String>,
}

impl NewMember {
    /// Member with the default weight of 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            description: None,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fields to change in [`SessionStore::update_member`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub description: Option<String>,
}

/// Input for [`SessionStore::add_expense`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub name: String,
    pub value: f64,
    pub payer: MemberId,
    pub participants: BTreeSet<MemberId>,
    pub description: Option<String>,
}

impl NewExpense {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        payer: MemberId,
        participants: impl IntoIterator<Item = MemberId>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            payer,
            participants: participants.into_iter().collect(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fields to change in [`SessionStore::update_expense`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub payer: Option<MemberId>,
    pub participants: Option<BTreeSet<MemberId>>,
    pub description: Option<String>,
}

/// Member lookup predicates. Empty lists do not constrain; all given predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub names: Vec<String>,
    pub ids: Vec<MemberId>,
    pub weights: Vec<f64>,
    pub include_inactive: bool,
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        (self.include_inactive || member.active)
            && (self.names.is_empty() || self.names.contains(&member.name))
            && (self.ids.is_empty() || self.ids.contains(&member.id))
            && (self.weights.is_empty() || self.weights.contains(&member.weight))
    }
}

/// Expense lookup predicates. Empty lists do not constrain; all given predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub names: Vec<String>,
    pub ids: Vec<ExpenseId>,
    /// Exclusive lower bound on value
    pub value_above: Option<f64>,
    /// Exclusive upper bound on value
    pub value_below: Option<f64>,
    pub payers: Vec<MemberId>,
    /// Matches expenses shared by any of these members
    pub participants: Vec<MemberId>,
    pub include_inactive: bool,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        (self.include_inactive || expense.active)
            && (self.names.is_empty() || self.names.contains(&expense.name))
            && (self.ids.is_empty() || self.ids.contains(&expense.id))
            && self.value_above.map_or(true, |min| expense.value > min)
            && self.value_below.map_or(true, |max| expense.value < max)
            && (self.payers.is_empty() || self.payers.contains(&expense.payer))
            && (self.participants.is_empty()
                || self
                    .participants
                    .iter()
                    .any(|m| expense.participants.contains(m)))
    }
}

/// Records of a single session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Session,
    members: BTreeMap<MemberId, Member>,
    expenses: BTreeMap<ExpenseId, Expense>,
    next_member_id: u32,
    next_expense_id: u32,
    audit: Vec<AuditEntry>,
}

impl SessionStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            members: BTreeMap::new(),
            expenses: BTreeMap::new(),
            next_member_id: 1,
            next_expense_id: 1,
            audit: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Mutations in the order they happened.
    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit
    }

    // ------------------------------------------------------------
    // Members
    // ------------------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    pub fn add_member(&mut self, new: NewMember) -> DomainResult<MemberId> {
        validate_member(&new.name, new.weight)?;

        let id = MemberId(self.next_member_id);
        self.next_member_id += 1;
        self.members.insert(
            id,
            Member {
                id,
                name: new.name,
                weight: new.weight,
                description: new.description,
                active: true,
                version: 1,
            },
        );
        self.log(RecordRef::Member(id), AuditAction::Created, 1);
        debug!("add_member: {}", id);
        Ok(id)
    }

    /// Edit a member in place, keeping its id. Soft-deleted members may be edited too.
    #[instrument(level = "debug", skip(self))]
    pub fn update_member(&mut self, id: MemberId, update: MemberUpdate) -> DomainResult<&Member> {
        let current = self.members.get(&id).ok_or(DomainError::UnknownMember(id))?;
        let name = update.name.unwrap_or_else(|| current.name.clone());
        let weight = update.weight.unwrap_or(current.weight);
        validate_member(&name, weight)?;

        let member = self
            .members
            .get_mut(&id)
            .ok_or(DomainError::UnknownMember(id))?;
        member.name = name;
        member.weight = weight;
        if update.description.is_some() {
            member.description = update.description;
        }
        member.version += 1;
        let version = member.version;

        self.log(RecordRef::Member(id), AuditAction::Updated, version);
        self.members.get(&id).ok_or(DomainError::UnknownMember(id))
    }

    /// Soft delete: the member keeps its history but joins no new expenses.
    #[instrument(level = "debug", skip(self))]
    pub fn deactivate_member(&mut self, id: MemberId) -> DomainResult<()> {
        let member = self
            .members
            .get_mut(&id)
            .ok_or(DomainError::UnknownMember(id))?;
        if !member.active {
            return Ok(());
        }
        member.active = false;
        let version = member.version;
        self.log(RecordRef::Member(id), AuditAction::Deactivated, version);
        Ok(())
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// First member with this name, active ones preferred.
    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        let mut named = self.members.values().filter(|m| m.name == name);
        let first = named.clone().next();
        named.find(|m| m.active).or(first)
    }

    pub fn find_members(&self, filter: &MemberFilter) -> Vec<&Member> {
        self.members.values().filter(|m| filter.matches(m)).collect()
    }

    // ------------------------------------------------------------
    // Expenses
    // ------------------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    pub fn add_expense(&mut self, new: NewExpense) -> DomainResult<ExpenseId> {
        self.validate_expense(&new.name, new.value, new.payer, &new.participants, None)?;

        let id = ExpenseId(self.next_expense_id);
        self.next_expense_id += 1;
        self.expenses.insert(
            id,
            Expense {
                id,
                name: new.name,
                value: new.value,
                payer: new.payer,
                participants: new.participants,
                description: new.description,
                active: true,
                version: 1,
            },
        );
        self.log(RecordRef::Expense(id), AuditAction::Created, 1);
        debug!("add_expense: {}", id);
        Ok(id)
    }

    /// Edit an expense in place, keeping its id.
    ///
    /// Members already on the expense stay valid even if soft-deleted since;
    /// newly referenced members must be active.
    #[instrument(level = "debug", skip(self))]
    pub fn update_expense(
        &mut self,
        id: ExpenseId,
        update: ExpenseUpdate,
    ) -> DomainResult<&Expense> {
        let current = self
            .expenses
            .get(&id)
            .ok_or(DomainError::ExpenseNotFound(id))?;
        let name = update.name.unwrap_or_else(|| current.name.clone());
        let value = update.value.unwrap_or(current.value);
        let payer = update.payer.unwrap_or(current.payer);
        let participants = update
            .participants
            .unwrap_or_else(|| current.participants.clone());
        self.validate_expense(&name, value, payer, &participants, Some(current))?;

        let expense = self
            .expenses
            .get_mut(&id)
            .ok_or(DomainError::ExpenseNotFound(id))?;
        expense.name = name;
        expense.value = value;
        expense.payer = payer;
        expense.participants = participants;
        if update.description.is_some() {
            expense.description = update.description;
        }
        expense.version += 1;
        let version = expense.version;

        self.log(RecordRef::Expense(id), AuditAction::Updated, version);
        self.expenses.get(&id).ok_or(DomainError::ExpenseNotFound(id))
    }

    /// Soft delete: the expense no longer affects any balance.
    #[instrument(level = "debug", skip(self))]
    pub fn deactivate_expense(&mut self, id: ExpenseId) -> DomainResult<()> {
        let expense = self
            .expenses
            .get_mut(&id)
            .ok_or(DomainError::ExpenseNotFound(id))?;
        if !expense.active {
            return Ok(());
        }
        expense.active = false;
        let version = expense.version;
        self.log(RecordRef::Expense(id), AuditAction::Deactivated, version);
        Ok(())
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.get(&id)
    }

    pub fn find_expenses(&self, filter: &ExpenseFilter) -> Vec<&Expense> {
        self.expenses.values().filter(|e| filter.matches(e)).collect()
    }

    fn validate_expense(
        &self,
        name: &str,
        value: f64,
        payer: MemberId,
        participants: &BTreeSet<MemberId>,
        previous: Option<&Expense>,
    ) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidExpense {
                message: "name must not be empty".to_string(),
            });
        }
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::InvalidExpense {
                message: format!("'{name}' has non-positive value {value}"),
            });
        }
        if participants.is_empty() {
            return Err(DomainError::InvalidExpense {
                message: format!("'{name}' has no participants"),
            });
        }

        for &id in std::iter::once(&payer).chain(participants.iter()) {
            let member = self.members.get(&id).ok_or(DomainError::UnknownMember(id))?;
            let already_referenced = previous.is_some_and(|e| e.involves(id));
            if !member.active && !already_referenced {
                return Err(DomainError::InvalidExpense {
                    message: format!("'{name}' references inactive member {id}"),
                });
            }
        }
        Ok(())
    }

    fn log(&mut self, record: RecordRef, action: AuditAction, version: u32) {
        self.audit.push(AuditEntry {
            at: Utc::now(),
            record,
            action,
            version,
        });
    }
}

fn validate_member(name: &str, weight: f64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidMember {
            message: "name must not be empty".to_string(),
        });
    }
    if !weight.is_finite() || weight < 0.0 {
        return Err(DomainError::InvalidMember {
            message: format!("'{name}' has invalid weight {weight}"),
        });
    }
    Ok(())
}

impl RecordStore for SessionStore {
    fn list_members(&self) -> Vec<Member> {
        self.members.values().cloned().collect()
    }

    fn list_active_members(&self) -> Vec<Member> {
        self.members.values().filter(|m| m.active).cloned().collect()
    }

    fn list_active_expenses(&self) -> Vec<Expense> {
        self.expenses.values().filter(|e| e.active).cloned().collect()
    }

    fn resolve_member(&self, id: MemberId) -> DomainResult<Member> {
        self.members
            .get(&id)
            .cloned()
            .ok_or(DomainError::UnknownMember(id))
    }
}
