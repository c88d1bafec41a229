use super::{Education, Experience, Profile};

/// Contact channels, flattened for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub period: Option<String>,
    pub link: Option<String>,
}

/// Read-only view of the profile consumed by the template responder, the
/// topic extractor and the system prompt builder.
#[derive(Debug, Clone)]
pub struct ProfileContext {
    pub name: String,
    pub role: String,
    pub location: String,
    pub skills: Vec<String>,
    pub skill_groups: Vec<(String, Vec<String>)>,
    pub projects: Vec<ProjectSummary>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub contact: ContactInfo,
    pub personality: String,
    pub summary: String,
    pub goals: Option<String>,
}

impl ProfileContext {
    pub fn from_profile(profile: &Profile) -> Self {
        let skills = profile
            .skills
            .iter()
            .flat_map(|group| group.items.iter().cloned())
            .collect();

        Self {
            name: profile.name.clone(),
            role: profile.role.clone(),
            location: profile.location.clone(),
            skills,
            skill_groups: profile
                .skills
                .iter()
                .map(|g| (g.category.clone(), g.items.clone()))
                .collect(),
            projects: profile
                .projects
                .iter()
                .map(|p| ProjectSummary {
                    name: p.name.clone(),
                    description: p.description.clone(),
                    technologies: p.technologies.clone(),
                    period: p.period.clone(),
                    link: p.link.clone(),
                })
                .collect(),
            education: profile.education.clone(),
            experience: profile.experience.clone(),
            contact: ContactInfo {
                email: profile.contact.email.clone(),
                github: profile.contact.github.clone(),
                linkedin: profile.contact.linkedin.clone(),
                website: profile.contact.website.clone(),
            },
            personality: profile.personality.clone(),
            summary: profile.summary.clone(),
            goals: profile.goals.clone(),
        }
    }

    /// First name, for casual replies
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Most recent work history entry (listed first)
    pub fn current_role(&self) -> Option<&Experience> {
        self.experience.first()
    }

    /// Projects listing `skill` among their technologies
    pub fn projects_using(&self, skill: &str) -> Vec<&ProjectSummary> {
        self.projects
            .iter()
            .filter(|p| p.technologies.iter().any(|t| t.eq_ignore_ascii_case(skill)))
            .collect()
    }

    pub fn project(&self, name: &str) -> Option<&ProjectSummary> {
        self.projects.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Skills filed under an AI/ML-looking category
    pub fn ai_skills(&self) -> Vec<&str> {
        self.skill_groups
            .iter()
            .filter(|(category, _)| {
                let c = category.to_lowercase();
                c.contains("machine learning")
                    || c
                        .split(|ch: char| !ch.is_alphanumeric())
                        .any(|word| word == "ai" || word == "ml")
            })
            .flat_map(|(_, items)| items.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ProfileContext {
        Profile::builtin().unwrap().context()
    }

    #[test]
    fn test_skills_flattened_in_order() {
        let ctx = context();
        assert_eq!(ctx.skills.first().map(String::as_str), Some("Rust"));
        assert!(ctx.skills.iter().any(|s| s == "PyTorch"));
    }

    #[test]
    fn test_projects_using() {
        let ctx = context();
        let names: Vec<_> = ctx.projects_using("postgresql").iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["TrailMapper", "Ledgerline"]);
    }

    #[test]
    fn test_ai_skills() {
        let ctx = context();
        assert!(ctx.ai_skills().contains(&"LangChain"));
        assert!(!ctx.ai_skills().contains(&"Rust"));
    }

    #[test]
    fn test_first_name() {
        assert_eq!(context().first_name(), "Jordan");
    }
}
