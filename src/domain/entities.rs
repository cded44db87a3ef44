//! Domain entities: core data structures

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::util::format::format_amount;

/// Identity of a member within a session. Never reused, even after soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of an expense within a session. Never reused, even after soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(pub u32);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Bounded expense-sharing event.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl Session {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Add a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

/// Participant with a cost-sharing weight.
///
/// Paid totals and balances are not stored here: they are derived
/// on demand by the ledger (see [`crate::domain::BalanceSheet`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Relative share multiplier (default 1)
    pub weight: f64,
    pub description: Option<String>,
    /// `false` once soft-deleted
    pub active: bool,
    /// Incremented on every update, starts at 1
    pub version: u32,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Shared cost with one payer and a set of participants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub value: f64,
    /// Member who fronted the money (need not participate)
    pub payer: MemberId,
    /// Members sharing the cost, ordered by id
    pub participants: BTreeSet<MemberId>,
    pub description: Option<String>,
    pub active: bool,
    pub version: u32,
}

impl Expense {
    /// Whether the member paid for or shares this expense.
    pub fn involves(&self, member: MemberId) -> bool {
        self.payer == member || self.participants.contains(&member)
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, format_amount(self.value, 2, "$"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(value: f64) -> Expense {
        Expense {
            id: ExpenseId(1),
            name: "Dinner".to_string(),
            value,
            payer: MemberId(1),
            participants: [MemberId(2), MemberId(3)].into_iter().collect(),
            description: None,
            active: true,
            version: 1,
        }
    }

    #[test]
    fn given_expense_when_displayed_then_shows_name_and_grouped_value() {
        assert_eq!(expense(1234.5).to_string(), "Dinner: $1,234.50");
    }

    #[test]
    fn given_payer_outside_participants_when_checking_involvement_then_payer_counts() {
        let e = expense(10.0);
        assert!(e.involves(MemberId(1)));
        assert!(e.involves(MemberId(3)));
        assert!(!e.involves(MemberId(4)));
    }

    #[test]
    fn given_member_when_displayed_then_shows_name() {
        let member = Member {
            id: MemberId(2),
            name: "Bia".to_string(),
            weight: 1.0,
            description: None,
            active: true,
            version: 1,
        };
        assert_eq!(member.to_string(), "Bia");
        assert_eq!(member.id.to_string(), "#2");
    }

    #[test]
    fn given_duplicate_tag_when_adding_then_kept_once() {
        let mut session = Session::new("Trip", "");
        session.add_tag("beach");
        session.add_tag("beach");
        assert_eq!(session.tags, vec!["beach".to_string()]);
    }
}
