use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::matching::matcher::{match_postings, SkillQuery};
use crate::models::posting::JobRecord;

/// Saved skill phrases per user, e.g. `{"user_1": ["data science", "ai"]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPreferences(pub BTreeMap<String, Vec<String>>);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAlert {
    pub user: String,
    pub matches: Vec<JobRecord>,
}

/// One alert per user, in user-name order, using the same matching rule as queries.
pub fn build_alerts(records: &[JobRecord], preferences: &UserPreferences) -> Vec<UserAlert> {
    preferences
        .0
        .iter()
        .map(|(user, phrases)| {
            let query = SkillQuery::from_phrases(phrases);
            UserAlert {
                user: user.clone(),
                matches: match_postings(records, &query).into_iter().cloned().collect(),
            }
        })
        .collect()
}

/// Plain-text digest for one user.
pub fn render_digest(alert: &UserAlert) -> String {
    if alert.matches.is_empty() {
        return format!("No new jobs for {} in preferred categories.\n", alert.user);
    }
    let mut out = format!(
        "Hi {},\nFound {} jobs matching your preferred skills:\n",
        alert.user,
        alert.matches.len()
    );
    for job in &alert.matches {
        let _ = writeln!(out, "- {} at {} in {}", job.title, job.company, job.location);
    }
    out
}
