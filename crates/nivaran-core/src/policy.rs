//! The Access Policy — a pure decision function gating every grievance read
//! and write.
//!
//! Every restricted operation in the HTTP layer calls [`can_access`] (or
//! applies [`list_scope`] as a query predicate) before touching the store.
//! The store itself does not enforce authorization.

use uuid::Uuid;

use crate::{
  account::{Account, Role},
  grievance::Grievance,
};

/// A restricted operation on a single grievance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  View,
  UpdateStatus,
  Assign,
  Comment,
  Attach,
}

/// The query predicate for listing operations, derived from the actor alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
  /// Superadmin: no filter.
  All,
  /// Privileged role: only grievances whose category key is in the set.
  Categories(Vec<String>),
  /// Citizen: only grievances owned by this account.
  Owner(Uuid),
  /// Privileged role with no managed categories: nothing (fail-closed).
  Nothing,
}

/// Decide whether `actor` may perform `op` on `grievance`.
///
/// - `superadmin` — always allowed.
/// - `official`/`staff`/`admin` — allowed only if the grievance's category
///   key is in the actor's managed set; an empty set denies everything.
/// - `citizen` — allowed only to view or attach to their own grievances.
pub fn can_access(actor: &Account, op: Operation, grievance: &Grievance) -> bool {
  match actor.role {
    Role::Superadmin => true,
    Role::Official | Role::Staff | Role::Admin => actor
      .managed_categories
      .iter()
      .any(|key| *key == grievance.category.key),
    Role::Citizen => {
      matches!(op, Operation::View | Operation::Attach)
        && grievance.user_id == Some(actor.account_id)
    }
  }
}

/// Derive the listing filter for `actor`. Applied by the store as a query
/// predicate rather than a per-row [`can_access`] check.
pub fn list_scope(actor: &Account) -> ListScope {
  match actor.role {
    Role::Superadmin => ListScope::All,
    Role::Official | Role::Staff | Role::Admin => {
      if actor.managed_categories.is_empty() {
        ListScope::Nothing
      } else {
        ListScope::Categories(actor.managed_categories.clone())
      }
    }
    Role::Citizen => ListScope::Owner(actor.account_id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grievance::{CategoryRef, Priority, Status, SubmitterSnapshot};
  use chrono::{NaiveDate, Utc};

  fn account(role: Role, managed: &[&str]) -> Account {
    let now = Utc::now();
    Account {
      account_id:             Uuid::new_v4(),
      first_name:             "Asha".into(),
      middle_name:            None,
      last_name:              "Rao".into(),
      gender:                 crate::account::Gender::Female,
      dob:                    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
      primary_contact:        "+15550001".into(),
      secondary_contact:      None,
      email:                  "asha@example.com".into(),
      password_hash:          String::new(),
      role,
      department:             None,
      managed_categories:     managed.iter().map(|s| s.to_string()).collect(),
      push_token:             None,
      is_active:              true,
      is_phone_verified:      false,
      password_reset_otp:     None,
      phone_verification_otp: None,
      created_at:             now,
      updated_at:             now,
    }
  }

  fn grievance(category_key: &str, owner: Option<Uuid>) -> Grievance {
    let now = Utc::now();
    Grievance {
      grievance_id: "PGS-TEST-0001".into(),
      user_id:      owner,
      created_by:   SubmitterSnapshot::anonymous(),
      category:     CategoryRef {
        key:  category_key.into(),
        name: category_key.into(),
      },
      title:        "t".into(),
      description:  "d".into(),
      attachments:  vec![],
      status:       Status::Submitted,
      priority:     Priority::Medium,
      location:     None,
      assigned_to:  None,
      is_anonymous: owner.is_none(),
      created_at:   now,
      updated_at:   now,
    }
  }

  #[test]
  fn superadmin_is_always_allowed() {
    let actor = account(Role::Superadmin, &[]);
    let g = grievance("water", None);
    for op in [
      Operation::View,
      Operation::UpdateStatus,
      Operation::Assign,
      Operation::Comment,
      Operation::Attach,
    ] {
      assert!(can_access(&actor, op, &g));
    }
  }

  #[test]
  fn official_limited_to_managed_categories() {
    let actor = account(Role::Official, &["water"]);
    assert!(can_access(&actor, Operation::View, &grievance("water", None)));
    assert!(!can_access(
      &actor,
      Operation::View,
      &grievance("electricity", None)
    ));
  }

  #[test]
  fn official_with_empty_set_is_denied_everything() {
    let actor = account(Role::Official, &[]);
    assert!(!can_access(&actor, Operation::View, &grievance("water", None)));
    assert_eq!(list_scope(&actor), ListScope::Nothing);
  }

  #[test]
  fn staff_and_admin_use_the_category_rule() {
    for role in [Role::Staff, Role::Admin] {
      let actor = account(role, &["roads"]);
      assert!(can_access(&actor, Operation::Comment, &grievance("roads", None)));
      assert!(!can_access(&actor, Operation::Comment, &grievance("water", None)));
    }
  }

  #[test]
  fn citizen_sees_only_own_grievances() {
    let actor = account(Role::Citizen, &[]);
    let own = grievance("water", Some(actor.account_id));
    let other = grievance("water", Some(Uuid::new_v4()));
    assert!(can_access(&actor, Operation::View, &own));
    assert!(!can_access(&actor, Operation::View, &other));
    assert_eq!(list_scope(&actor), ListScope::Owner(actor.account_id));
  }

  #[test]
  fn citizen_cannot_triage_even_their_own() {
    let actor = account(Role::Citizen, &[]);
    let own = grievance("water", Some(actor.account_id));
    assert!(!can_access(&actor, Operation::UpdateStatus, &own));
    assert!(!can_access(&actor, Operation::Assign, &own));
  }

  #[test]
  fn superadmin_scope_is_unfiltered() {
    assert_eq!(list_scope(&account(Role::Superadmin, &[])), ListScope::All);
    assert_eq!(
      list_scope(&account(Role::Official, &["water"])),
      ListScope::Categories(vec!["water".into()])
    );
  }
}
