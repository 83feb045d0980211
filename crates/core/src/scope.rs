//! Access scoping.
//!
//! Administrators see everything. Members see projects and users of the
//! institutions in their accessible set, and only their own vote history.

use std::cmp::Ordering;

use govboard_common::{AppError, AppResult};
use govboard_db::{
    entities::{
        institution::{self, InstitutionStatus},
        user,
    },
    repositories::InstitutionScope,
};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// What the requesting identity may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessScope {
    /// Caller id.
    pub user_id: String,
    /// Whether the caller holds the admin role.
    pub is_admin: bool,
    /// Institution names the caller may view. Ignored for admins.
    pub accessible: Vec<String>,
}

impl AccessScope {
    /// Scope of an authenticated user.
    #[must_use]
    pub fn for_user(user: &user::Model) -> Self {
        Self {
            user_id: user.id.clone(),
            is_admin: user.is_admin(),
            accessible: user.accessible_institution_names(),
        }
    }

    /// Fail with `Forbidden` unless the caller is an administrator.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Institution predicate for project and user listings.
    #[must_use]
    pub fn institutions(&self) -> InstitutionScope {
        if self.is_admin {
            InstitutionScope::All
        } else {
            InstitutionScope::Only(self.accessible.clone())
        }
    }

    /// Whether rows owned by `institution` are visible.
    #[must_use]
    pub fn can_see_institution(&self, institution: &str) -> bool {
        self.is_admin || self.accessible.iter().any(|name| name == institution)
    }

    /// Voter restriction for vote history; `None` means all voters.
    #[must_use]
    pub fn history_voter(&self) -> Option<&str> {
        if self.is_admin {
            None
        } else {
            Some(&self.user_id)
        }
    }
}

/// Names for an institution picker.
///
/// Only active institutions are offered. The headquarters comes first and is
/// dropped entirely for non-admins; the rest follow in accent-insensitive
/// alphabetical order.
#[must_use]
pub fn picker_names(
    institutions: &[institution::Model],
    scope: &AccessScope,
    headquarters: &str,
) -> Vec<String> {
    let mut names: Vec<&str> = institutions
        .iter()
        .filter(|i| i.status == InstitutionStatus::Active)
        .map(|i| i.name.as_str())
        .filter(|name| scope.is_admin || *name != headquarters)
        .collect();

    names.sort_by(|a, b| compare_institution_names(a, b, headquarters));
    names.dedup();
    names.into_iter().map(str::to_string).collect()
}

/// Headquarters first, then [`collation_key`] order with the raw name as tiebreak.
#[must_use]
pub fn compare_institution_names(a: &str, b: &str, headquarters: &str) -> Ordering {
    match (a == headquarters, b == headquarters) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => collation_key(a)
            .cmp(&collation_key(b))
            .then_with(|| a.cmp(b)),
    }
}

/// Sort key that ignores case and diacritics ("Évora" sorts with "Evora").
#[must_use]
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
