//! Per-project vote aggregate.
//!
//! The aggregate holds at most one entry per voter. Counts are always
//! recomputed from the membership map, never adjusted in place.

use std::collections::BTreeMap;

use govboard_common::{AppError, AppResult};
use govboard_db::entities::{
    project,
    vote_record::{self, VoteType},
};
use serde::{Deserialize, Serialize};

/// A single voter's current vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVote {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    pub user_name: String,
}

/// Vote tally of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAggregate {
    /// Number of `up` entries.
    pub up: i32,
    /// Number of `down` entries.
    pub down: i32,
    /// Voter id to current vote.
    pub user_votes: BTreeMap<String, UserVote>,
}

impl VoteAggregate {
    /// Read the aggregate stored on a project.
    ///
    /// Counts are recomputed from the stored map rather than trusted.
    pub fn from_project(project: &project::Model) -> AppResult<Self> {
        let user_votes: BTreeMap<String, UserVote> = if project.user_votes.is_null() {
            BTreeMap::new()
        } else {
            serde_json::from_value(project.user_votes.clone()).map_err(|e| {
                AppError::Internal(format!("Malformed vote map on project {}: {e}", project.id))
            })?
        };

        let mut aggregate = Self {
            up: 0,
            down: 0,
            user_votes,
        };
        aggregate.recount();
        Ok(aggregate)
    }

    /// Rebuild from ledger rows; the latest row per voter wins.
    ///
    /// `records` must be ordered oldest first.
    #[must_use]
    pub fn from_ledger(records: &[vote_record::Model]) -> Self {
        let mut aggregate = Self::default();
        for record in records {
            aggregate.user_votes.insert(
                record.user_id.clone(),
                UserVote {
                    vote_type: record.vote_type,
                    user_name: record.user_name.clone(),
                },
            );
        }
        aggregate.recount();
        aggregate
    }

    /// Record `user_id`'s vote, replacing any earlier one.
    pub fn apply(&mut self, user_id: &str, user_name: &str, vote_type: VoteType) {
        self.user_votes.insert(
            user_id.to_string(),
            UserVote {
                vote_type,
                user_name: user_name.to_string(),
            },
        );
        self.recount();
    }

    fn recount(&mut self) {
        let up = self
            .user_votes
            .values()
            .filter(|v| v.vote_type == VoteType::Up)
            .count();
        self.up = up as i32;
        self.down = (self.user_votes.len() - up) as i32;
    }

    /// Membership map as stored in the `user_votes` column.
    pub fn user_votes_json(&self) -> AppResult<serde_json::Value> {
        serde_json::to_value(&self.user_votes)
            .map_err(|e| AppError::Internal(format!("Failed to encode vote map: {e}")))
    }

    /// Names of voters whose current vote is `vote_type`, sorted.
    #[must_use]
    pub fn voter_names(&self, vote_type: VoteType) -> Vec<String> {
        let mut names: Vec<String> = self
            .user_votes
            .values()
            .filter(|v| v.vote_type == vote_type)
            .map(|v| v.user_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether the counts stored on `project` disagree with this aggregate.
    #[must_use]
    pub fn differs_from(&self, project: &project::Model) -> bool {
        self.up != project.votes_up
            || self.down != project.votes_down
            || !matches!(
                Self::from_project(project),
                Ok(stored) if stored.user_votes == self.user_votes
            )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use govboard_db::entities::vote_record::VoteItemType;
    use serde_json::json;

    fn record(id: &str, user_id: &str, vote_type: VoteType, offset: i64) -> vote_record::Model {
        vote_record::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_id.to_uppercase(),
            user_avatar: None,
            item_id: "p1".to_string(),
            item_name: "Road repair".to_string(),
            item_type: VoteItemType::Project,
            vote_type,
            institution: "North".to_string(),
            created_at: (Utc::now() + Duration::seconds(offset)).into(),
        }
    }

    #[test]
    fn test_revote_keeps_one_entry() {
        let mut aggregate = VoteAggregate::default();
        aggregate.apply("u2", "Bia", VoteType::Up);
        assert_eq!((aggregate.up, aggregate.down), (1, 0));

        aggregate.apply("u2", "Bia", VoteType::Down);
        assert_eq!((aggregate.up, aggregate.down), (0, 1));
        assert_eq!(aggregate.user_votes.len(), 1);
    }

    #[test]
    fn test_counts_match_map() {
        let mut aggregate = VoteAggregate::default();
        for (i, vote) in [VoteType::Up, VoteType::Down, VoteType::Up, VoteType::Up]
            .into_iter()
            .enumerate()
        {
            aggregate.apply(&format!("u{i}"), "n", vote);
        }
        aggregate.apply("u1", "n", VoteType::Up);

        assert_eq!(aggregate.up, 4);
        assert_eq!(aggregate.down, 0);
        assert_eq!(
            (aggregate.up + aggregate.down) as usize,
            aggregate.user_votes.len()
        );
    }

    #[test]
    fn test_from_ledger_latest_wins() {
        let records = [
            record("v1", "u1", VoteType::Up, 0),
            record("v2", "u2", VoteType::Up, 1),
            record("v3", "u1", VoteType::Down, 2),
        ];

        let aggregate = VoteAggregate::from_ledger(&records);
        assert_eq!((aggregate.up, aggregate.down), (1, 1));
        assert_eq!(aggregate.user_votes["u1"].vote_type, VoteType::Down);
    }

    #[test]
    fn test_json_shape() {
        let mut aggregate = VoteAggregate::default();
        aggregate.apply("u1", "Ana", VoteType::Up);

        assert_eq!(
            aggregate.user_votes_json().unwrap(),
            json!({"u1": {"type": "up", "userName": "Ana"}})
        );
    }

    #[test]
    fn test_from_project_recounts() {
        let project = project::Model {
            id: "p1".to_string(),
            user_id: "admin".to_string(),
            institution: "North".to_string(),
            name: "Road repair".to_string(),
            status: project::ProjectStatus::Planned,
            progress: 0,
            description: None,
            responsible_name: None,
            config_name: None,
            start_date: None,
            end_date: None,
            // Stale counters
            votes_up: 5,
            votes_down: 5,
            user_votes: json!({
                "u1": {"type": "up", "userName": "Ana"},
                "u2": {"type": "down", "userName": "Bia"}
            }),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let aggregate = VoteAggregate::from_project(&project).unwrap();
        assert_eq!((aggregate.up, aggregate.down), (1, 1));
        assert!(aggregate.differs_from(&project));
        assert_eq!(aggregate.voter_names(VoteType::Up), vec!["Ana"]);
        assert_eq!(aggregate.voter_names(VoteType::Down), vec!["Bia"]);
    }
}
