use serde::Serialize;

/// A fixed roleplay context the learner can practice in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub context: &'static str,
    pub system_prompt: &'static str,
}

pub static SCENARIOS: [Scenario; 3] = [
    Scenario {
        id: "school",
        title: "School Conversation",
        description: "Practice talking with teachers and classmates",
        context: "You are in a school setting",
        system_prompt: "You are a friendly English tutor helping a student practice school conversations. Keep responses simple, encouraging, and age-appropriate. Ask questions about classes, homework, friends, and school activities. Correct pronunciation gently when needed.",
    },
    Scenario {
        id: "store",
        title: "Store Shopping",
        description: "Learn how to shop and ask for help",
        context: "You are in a store",
        system_prompt: "You are a helpful store clerk teaching a student how to shop in English. Help them practice asking for items, prices, and directions in the store. Use simple vocabulary and be patient with their responses.",
    },
    Scenario {
        id: "home",
        title: "Home & Family",
        description: "Talk about daily life and family",
        context: "You are at home",
        system_prompt: "You are a friendly family member helping someone practice English conversations about home life. Discuss daily routines, family activities, chores, and meals. Keep the conversation warm and supportive.",
    },
];

impl Scenario {
    pub fn find(id: &str) -> Option<&'static Scenario> {
        SCENARIOS.iter().find(|s| s.id == id)
    }

    pub fn all() -> &'static [Scenario] {
        &SCENARIOS
    }

    /// Greeting spoken when the scenario starts. Built locally, no model call.
    pub fn welcome_message(&self) -> String {
        format!(
            "Great! Let's practice {}. {}. I'll help you practice speaking naturally. Let's begin!",
            self.title.to_lowercase(),
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_scenarios_only() {
        assert_eq!(Scenario::find("store").map(|s| s.title), Some("Store Shopping"));
        assert!(Scenario::find("spaceship").is_none());
        assert!(Scenario::find("School").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = SCENARIOS.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), SCENARIOS.len());
    }

    #[test]
    fn welcome_uses_lowercased_title_and_description() {
        let home = Scenario::find("home").unwrap();
        assert_eq!(
            home.welcome_message(),
            "Great! Let's practice home & family. Talk about daily life and family. I'll help you practice speaking naturally. Let's begin!"
        );
    }
}
