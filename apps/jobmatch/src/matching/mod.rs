// Skill-phrase matching against the persisted store, plus per-user alert
// digests built on the same rule. Delivery of alerts is not handled here.

pub mod alerts;
pub mod matcher;

pub use matcher::{match_postings, SkillQuery};
