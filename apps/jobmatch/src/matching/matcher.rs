//! Skill matching. A posting matches when any query phrase occurs as a
//! substring of its normalized skill text.
//!
//! Matching is by substring, not token: `"ai"` matches `"ai"` as a
//! skill and also `"pain management"`. Short phrases will over-match.

use serde::{Deserialize, Serialize};

use crate::models::posting::JobRecord;

/// Normalized user skill phrases: lower-cased, trimmed, never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillQuery {
    phrases: Vec<String>,
}

impl SkillQuery {
    /// Parses comma-separated user input, e.g. `"Python, Machine Learning"`.
    pub fn parse(input: &str) -> Self {
        Self::from_phrases(input.split(','))
    }

    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn matches(&self, skills: &str) -> bool {
        let skills = skills.to_lowercase();
        self.phrases.iter().any(|p| skills.contains(p.as_str()))
    }
}

/// Returns the matching records in store order. An empty query matches nothing.
pub fn match_postings<'a>(records: &'a [JobRecord], query: &SkillQuery) -> Vec<&'a JobRecord> {
    records.iter().filter(|r| query.matches(&r.skills)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, skills: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            date: String::new(),
            skills: skills.to_string(),
            cluster: 0,
        }
    }

    #[test]
    fn test_parse_normalizes_and_drops_blanks() {
        let query = SkillQuery::parse("Python, Machine Learning,, ");
        assert_eq!(query.phrases(), &["python", "machine learning"]);
    }

    #[test]
    fn test_ai_matches_exact_token() {
        let records = vec![record("DS", "data science, ai, python")];
        let query = SkillQuery::parse("ai");
        assert_eq!(match_postings(&records, &query).len(), 1);
    }

    #[test]
    fn test_ai_matches_inside_longer_token() {
        // substring policy: "ai" inside "pain management" counts as a match
        let records = vec![record("Nurse", "pain management")];
        let query = SkillQuery::parse("ai");
        assert_eq!(match_postings(&records, &query).len(), 1);
    }

    #[test]
    fn test_any_phrase_is_enough() {
        let records = vec![
            record("A", "python, sql"),
            record("B", "sales, crm"),
            record("C", "cooking"),
        ];
        let query = SkillQuery::parse("sql, crm");
        let titles: Vec<&str> = match_postings(&records, &query)
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let records = vec![record("A", "Python, SQL")];
        let query = SkillQuery::parse("PYTHON");
        assert_eq!(match_postings(&records, &query).len(), 1);
    }

    #[test]
    fn test_empty_store_returns_empty() {
        let query = SkillQuery::parse("python, sql");
        assert!(match_postings(&[], &query).is_empty());
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let records = vec![record("A", "python")];
        let query = SkillQuery::parse(" , ");
        assert!(query.is_empty());
        assert!(match_postings(&records, &query).is_empty());
    }

    #[test]
    fn test_result_is_pure_function_of_inputs() {
        let records = vec![record("A", "python"), record("B", "rust")];
        let query = SkillQuery::parse("python");
        assert_eq!(
            match_postings(&records, &query),
            match_postings(&records, &query)
        );
    }
}
