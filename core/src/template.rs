//! Template responses
//!
//! Canned replies rendered from the profile when the remote model is
//! unavailable. Rules are checked in order and the first match wins, so more
//! specific rules (a named project) sit ahead of generic ones (any project).
//! Output depends only on the message and the profile.

use crate::profile::{Profile, ProfileContext};
use crate::topics::{contains_any, extract_topics, Category, Topic};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A message prepared for rule matching
pub struct Query<'a> {
    pub text: String,
    pub topics: BTreeSet<Topic>,
    pub profile: &'a ProfileContext,
}

impl Query<'_> {
    fn has(&self, category: Category) -> bool {
        self.topics.contains(&Topic::Category(category))
    }

    /// Mentioned projects, in profile order
    fn projects(&self) -> Vec<&str> {
        self.profile
            .projects
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| self.topics.contains(&Topic::Project(name.to_string())))
            .collect()
    }

    /// Mentioned skills, in profile order
    fn skills(&self) -> Vec<&str> {
        self.profile
            .skills
            .iter()
            .map(String::as_str)
            .filter(|name| self.topics.contains(&Topic::Skill(name.to_string())))
            .collect()
    }
}

pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Query) -> bool,
    pub render: fn(&Query) -> String,
}

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "howdy", "greetings", "good morning", "good afternoon",
    "good evening",
];
const LOCATION_WORDS: &[&str] = &[
    "where", "location", "located", "based", "live", "lives", "city", "country", "relocat*",
];
const GOAL_WORDS: &[&str] = &[
    "goal*", "future", "plan*", "next", "aspir*", "ambition*", "looking for", "five years",
];

/// Rules in priority order
pub const RULES: &[Rule] = &[
    Rule {
        name: "greeting",
        matches: |q| contains_any(&q.text, GREETINGS),
        render: render_greeting,
    },
    Rule {
        name: "skills",
        matches: |q| q.has(Category::Skills),
        render: render_skills,
    },
    Rule {
        name: "project_detail",
        matches: |q| !q.projects().is_empty(),
        render: render_project_detail,
    },
    Rule {
        name: "projects",
        matches: |q| q.has(Category::Projects),
        render: render_projects,
    },
    Rule {
        name: "experience",
        matches: |q| q.has(Category::Experience),
        render: render_experience,
    },
    Rule {
        name: "contact",
        matches: |q| q.has(Category::Contact),
        render: render_contact,
    },
    Rule {
        name: "education",
        matches: |q| q.has(Category::Education),
        render: render_education,
    },
    Rule {
        name: "ai",
        matches: |q| q.has(Category::Ai),
        render: render_ai,
    },
    Rule {
        name: "location",
        matches: |q| contains_any(&q.text, LOCATION_WORDS),
        render: render_location,
    },
    Rule {
        name: "technology",
        matches: |q| !q.skills().is_empty(),
        render: render_technology,
    },
    Rule {
        name: "goals",
        matches: |q| contains_any(&q.text, GOAL_WORDS),
        render: render_goals,
    },
];

/// Generates fallback replies from the static profile
#[derive(Clone)]
pub struct TemplateResponder {
    profile: Arc<Profile>,
}

impl TemplateResponder {
    pub fn new(profile: Arc<Profile>) -> Self {
        Self { profile }
    }

    pub fn respond(&self, message: &str) -> String {
        self.respond_with_rule(message).1
    }

    /// Reply plus the name of the rule that produced it (`default` if none)
    pub fn respond_with_rule(&self, message: &str) -> (&'static str, String) {
        let profile = self.profile.context();
        let query = Query {
            text: message.to_lowercase(),
            topics: extract_topics(message, &profile),
            profile: &profile,
        };

        for rule in RULES {
            if (rule.matches)(&query) {
                return (rule.name, (rule.render)(&query));
            }
        }
        ("default", render_default(&query))
    }
}

fn render_greeting(q: &Query) -> String {
    let p = q.profile;
    format!(
        "Hi there! I'm {}, a {} based in {}. Feel free to ask me about my skills, projects, \
         experience, or how to get in touch.",
        p.name, p.role, p.location
    )
}

fn render_skills(q: &Query) -> String {
    let p = q.profile;
    let groups: Vec<String> = p
        .skill_groups
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(category, items)| format!("{} ({})", category, items.join(", ")))
        .collect();

    if groups.is_empty() {
        return "I work across a broad range of technologies. Ask me about a specific one and \
                I'll tell you how I use it."
            .to_string();
    }

    format!(
        "My toolkit spans a few areas: {}. I like picking the right tool for the problem rather \
         than forcing one stack everywhere.",
        groups.join("; ")
    )
}

fn render_project_detail(q: &Query) -> String {
    let name = q.projects()[0];
    let Some(project) = q.profile.project(name) else {
        return render_projects(q);
    };

    let mut reply = format!("{} is {}", project.name, sentence(&project.description));
    if !project.technologies.is_empty() {
        reply.push_str(&format!(" I built it with {}", join_list(&project.technologies)));
        match &project.period {
            Some(period) => reply.push_str(&format!(" ({}).", period)),
            None => reply.push('.'),
        }
    }
    if let Some(link) = &project.link {
        reply.push_str(&format!(" You can check it out at {}.", link));
    }
    reply
}

fn render_projects(q: &Query) -> String {
    let p = q.profile;
    if p.projects.is_empty() {
        return format!(
            "I'm working on some new projects right now. Reach out at {} if you'd like a preview!",
            p.contact.email
        );
    }

    let names: Vec<String> = p.projects.iter().map(|p| p.name.clone()).collect();
    let first = &p.projects[0];
    format!(
        "Some projects I'm proud of include {}. {} is a good place to start: it's {} Ask me about \
         any of them and I'll tell you how I built it.",
        join_list(&names),
        first.name,
        sentence(&first.description)
    )
}

fn render_experience(q: &Query) -> String {
    let p = q.profile;
    let Some(current) = p.current_role() else {
        return sentence(&p.summary);
    };

    let mut reply = format!(
        "I'm currently a {} at {} ({})",
        current.title, current.company, current.period
    );
    match current.highlights.first() {
        Some(highlight) => reply.push_str(&format!(", where I {}.", trim_period(highlight))),
        None => reply.push('.'),
    }
    if let Some(previous) = p.experience.get(1) {
        reply.push_str(&format!(
            " Before that, I was a {} at {} ({}).",
            previous.title, previous.company, previous.period
        ));
    }
    reply
}

fn render_contact(q: &Query) -> String {
    let c = &q.profile.contact;
    let mut reply = format!("The best way to reach me is by email at {}.", c.email);

    let others: Vec<String> = [
        c.github.as_ref().map(|g| format!("GitHub ({})", g)),
        c.linkedin.as_ref().map(|l| format!("LinkedIn ({})", l)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !others.is_empty() {
        reply.push_str(&format!(" You can also find me on {}.", join_list(&others)));
    }
    reply.push_str(" I'd love to hear from you!");
    reply
}

fn render_education(q: &Query) -> String {
    let p = q.profile;
    let Some(school) = p.education.first() else {
        return "Most of what I know comes from hands-on work and a lot of reading. I'm always \
                learning something new."
            .to_string();
    };

    let mut reply = format!(
        "I earned my {} from {} ({})",
        school.degree, school.institution, school.period
    );
    match &school.notes {
        Some(notes) => reply.push_str(&format!(", with a {}.", trim_period(notes))),
        None => reply.push('.'),
    }
    reply
}

fn render_ai(q: &Query) -> String {
    let p = q.profile;
    let ai_skills = p.ai_skills();
    let mut reply = "I'm genuinely excited about AI and machine learning.".to_string();

    if !ai_skills.is_empty() {
        let skills: Vec<String> = ai_skills.iter().map(|s| s.to_string()).collect();
        reply.push_str(&format!(" I've worked hands-on with {}", join_list(&skills)));

        let projects: Vec<String> = p
            .projects
            .iter()
            .filter(|project| {
                project
                    .technologies
                    .iter()
                    .any(|t| ai_skills.iter().any(|s| s.eq_ignore_ascii_case(t)))
            })
            .map(|project| project.name.clone())
            .collect();
        if projects.is_empty() {
            reply.push('.');
        } else {
            reply.push_str(&format!(", most recently on {}.", join_list(&projects)));
        }
    }

    reply.push_str(" This chat assistant is one of my experiments with large language models, too!");
    reply
}

fn render_location(q: &Query) -> String {
    format!(
        "I'm based in {}. I'm open to remote work and happy to collaborate across time zones.",
        q.profile.location
    )
}

fn render_technology(q: &Query) -> String {
    let skill = q.skills()[0];
    let projects: Vec<String> = q
        .profile
        .projects_using(skill)
        .iter()
        .map(|p| p.name.clone())
        .collect();

    if projects.is_empty() {
        format!(
            "{} is part of my everyday toolkit, and I keep finding new ways to use it well.",
            skill
        )
    } else {
        format!(
            "{} is one of my go-to tools. I've used it in {}, and I'm always looking for ways to \
             push it further.",
            skill,
            join_list(&projects)
        )
    }
}

fn render_goals(q: &Query) -> String {
    let p = q.profile;
    match &p.goals {
        Some(goals) => format!("Looking ahead, I'm focused on {}.", trim_period(goals)),
        None => "I'm always looking to grow, learn new technologies, and work on meaningful \
                 projects."
            .to_string(),
    }
}

fn render_default(q: &Query) -> String {
    format!(
        "Thanks for your question! I'm {}, and I'm happy to chat about my skills, projects, work \
         experience, or education. What would you like to know?",
        q.profile.first_name()
    )
}

/// "a", "a and b", "a, b, and c"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

fn trim_period(text: &str) -> &str {
    text.trim().trim_end_matches('.')
}

fn sentence(text: &str) -> String {
    format!("{}.", trim_period(text))
}
