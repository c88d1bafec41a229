//! Topic extraction
//!
//! Tags a message with the profile skills, projects and coarse categories it
//! mentions. Advisory only: the tags steer fallback replies and never affect
//! validation.

use crate::profile::ProfileContext;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Experience,
    Education,
    Projects,
    Skills,
    Contact,
    Ai,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Experience,
        Category::Education,
        Category::Projects,
        Category::Skills,
        Category::Contact,
        Category::Ai,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Experience => "experience",
            Category::Education => "education",
            Category::Projects => "projects",
            Category::Skills => "skills",
            Category::Contact => "contact",
            Category::Ai => "ai",
        }
    }

    /// Keywords for the group. A trailing `*` matches any word starting with
    /// the stem; everything else must match a whole word or phrase.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Experience => &[
                "experience*", "work*", "job*", "career*", "compan*", "employ*", "role*",
                "position*",
            ],
            Category::Education => &[
                "educat*", "degree*", "universit*", "college*", "school*", "stud*", "graduat*",
            ],
            Category::Projects => &["project*", "built", "build*", "portfolio*", "app", "apps"],
            Category::Skills => &[
                "skill*", "tech", "technolog*", "stack*", "language*", "framework*", "tool*",
                "expert*",
            ],
            Category::Contact => &[
                "contact*", "email*", "e-mail", "reach", "hire", "hiring", "linkedin", "github",
                "get in touch",
            ],
            Category::Ai => &[
                "ai", "artificial intelligence", "machine learning", "ml", "llm*", "neural",
                "deep learning", "gpt", "gemini",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    Skill(String),
    Project(String),
    Category(Category),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Skill(name) => write!(f, "skill:{}", name),
            Topic::Project(name) => write!(f, "project:{}", name),
            Topic::Category(category) => write!(f, "category:{}", category.as_str()),
        }
    }
}

/// Scan `message` for profile skills, project names and keyword categories.
///
/// Skills and projects are plain case-insensitive substring hits, so
/// "reactjs" tags React. Category keywords are matched as whole words.
pub fn extract_topics(message: &str, profile: &ProfileContext) -> BTreeSet<Topic> {
    let text = message.to_lowercase();
    let mut topics = BTreeSet::new();

    for skill in &profile.skills {
        if text.contains(&skill.to_lowercase()) {
            topics.insert(Topic::Skill(skill.clone()));
        }
    }

    for project in &profile.projects {
        if text.contains(&project.name.to_lowercase()) {
            topics.insert(Topic::Project(project.name.clone()));
        }
    }

    for category in Category::ALL {
        if contains_any(&text, category.keywords()) {
            topics.insert(Topic::Category(category));
        }
    }

    topics
}

/// True if any keyword (see [`Category::keywords`] syntax) occurs in `text`
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| contains_term(text, keyword))
}

/// Whole-word search of a lowercase `term` inside lowercase `text`.
///
/// Edges made of punctuation (`c++`, `.net`) are not boundary-checked; a
/// trailing `*` turns the term into a prefix match.
pub fn contains_term(text: &str, term: &str) -> bool {
    let (term, stem) = match term.strip_suffix('*') {
        Some(stem) => (stem, true),
        None => (term, false),
    };
    if term.is_empty() {
        return false;
    }

    let check_start = term.chars().next().is_some_and(char::is_alphanumeric);
    let check_end = !stem && term.chars().last().is_some_and(char::is_alphanumeric);

    text.match_indices(term).any(|(idx, _)| {
        let before_ok = !check_start
            || !text[..idx].chars().next_back().is_some_and(char::is_alphanumeric);
        let after_ok = !check_end
            || !text[idx + term.len()..].chars().next().is_some_and(char::is_alphanumeric);
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;

    fn profile() -> ProfileContext {
        Profile::builtin().unwrap().context()
    }

    fn tags(message: &str) -> Vec<String> {
        extract_topics(message, &profile())
            .into_iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_skill_and_project_tags() {
        let tags = tags("How did you use rust in ledgerline?");
        assert!(tags.contains(&"skill:Rust".to_string()));
        assert!(tags.contains(&"project:Ledgerline".to_string()));
    }

    #[test]
    fn test_category_tags() {
        assert_eq!(tags("What are your skills?"), vec!["category:skills"]);
        assert!(tags("Where did you study?").contains(&"category:education".to_string()));
        assert!(tags("Can I email you?").contains(&"category:contact".to_string()));
    }

    #[test]
    fn test_skills_match_inside_words() {
        let found = tags("Are you into reactjs and pythonic code?");
        assert!(found.contains(&"skill:React".to_string()));
        assert!(found.contains(&"skill:Python".to_string()));

        let found = tags("Do you run postgresql in production?");
        assert!(found.contains(&"skill:PostgreSQL".to_string()));
        assert!(found.contains(&"skill:SQL".to_string()));
    }

    #[test]
    fn test_category_keywords_need_word_boundaries() {
        // "email" contains "ai"
        let found = tags("Can I email you?");
        assert!(!found.contains(&"category:ai".to_string()));
    }

    #[test]
    fn test_punctuated_terms() {
        assert!(contains_term("i love next.js a lot", "next.js"));
        assert!(contains_term("c++ is fine", "c++"));
        assert!(!contains_term("nextjs", "next.js"));
    }

    #[test]
    fn test_stems() {
        assert!(contains_term("your projects", "project*"));
        assert!(!contains_term("your projects", "project"));
        assert!(!contains_term("subproject", "project*"));
    }

    #[test]
    fn test_no_topics() {
        assert!(tags("Nice weather today").is_empty());
    }
}
