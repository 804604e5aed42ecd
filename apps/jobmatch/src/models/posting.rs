#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::clustering::tokenizer::normalize_skills;

/// Column names of the persisted Job Store, in file order.
pub const STORE_COLUMNS: [&str; 6] = ["Title", "Company", "Location", "Date", "Skills", "Cluster"];

/// A posting as produced by the scraper, before normalization and clustering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
}

impl RawPosting {
    /// Skill text lower-cased and trimmed; missing text becomes "".
    pub fn normalized_skills(&self) -> String {
        normalize_skills(self.skills.as_deref())
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.company, &self.location)
    }
}

/// `(title, company, location)`: the identity used to de-duplicate postings
/// across scrapes. Two distinct reposts with the same triple collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub title: String,
    pub company: String,
    pub location: String,
}

impl DedupKey {
    pub fn new(title: &str, company: &str, location: &str) -> Self {
        Self {
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
        }
    }
}

/// A normalized, cluster-labeled posting: one row of the Job Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Empty when the scraper reported no date.
    pub date: String,
    /// Normalized skill text (lower-case, trimmed).
    pub skills: String,
    pub cluster: u32,
}

impl JobRecord {
    pub fn from_raw(raw: RawPosting, cluster: u32) -> Self {
        let skills = raw.normalized_skills();
        Self {
            title: raw.title,
            company: raw.company,
            location: raw.location,
            date: raw.date.unwrap_or_default(),
            skills,
            cluster,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.company, &self.location)
    }
}
