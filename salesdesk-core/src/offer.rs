use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOffer {
    pub product_name: String,
    pub price: String,
    pub margin: String,
    pub description: String,
}

impl Default for SalesOffer {
    fn default() -> Self {
        Self {
            product_name: "Premium CRM Suite".into(),
            price: "$299/month".into(),
            margin: "65%".into(),
            description: "Complete customer relationship management solution with AI insights"
                .into(),
        }
    }
}

/// What the voice agent is told to do on a call.
///
/// `instructions` carries the active prompt; the rest is static persona data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub instructions: String,
    pub personality: String,
    pub goals: Vec<String>,
}

impl AgentConfig {
    pub fn from_profile(profile: &AgentProfile, instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            personality: profile.personality.clone(),
            goals: profile.goals.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub personality: String,
    pub goals: Vec<String>,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            personality: "Professional, confident, solution-oriented".into(),
            goals: vec![
                "Identify customer pain points".into(),
                "Present value propositions clearly".into(),
                "Handle objections effectively".into(),
                "Guide toward purchase decision".into(),
            ],
        }
    }
}
