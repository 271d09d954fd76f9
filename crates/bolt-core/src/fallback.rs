//! Canned Fallback Replies
//!
//! Used whenever the knowledge backend is disconnected or fails. Topic
//! selection is a plain substring match on the lowercased message.

use serde::{Deserialize, Serialize};

/// Union topic detected in a member's message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Safety,
    Grievance,
    Benefits,
    Contract,
    General,
}

impl Topic {
    const KEYWORDS: [(Self, &'static [&'static str]); 4] = [
        (Self::Safety, &["safety", "osha", "hazard"]),
        (Self::Grievance, &["grievance", "complaint", "dispute"]),
        (Self::Benefits, &["benefits", "healthcare", "insurance"]),
        (Self::Contract, &["contract", "wages", "overtime"]),
    ];

    /// Detect the first matching topic, in safety → grievance → benefits → contract order
    pub fn detect(message: &str) -> Self {
        let lower = message.to_lowercase();

        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map_or(Self::General, |(topic, _)| *topic)
    }
}

/// Offline reply for a member's message
pub fn fallback_reply(message: &str) -> &'static str {
    match Topic::detect(message) {
        Topic::Safety => SAFETY,
        Topic::Grievance => GRIEVANCE,
        Topic::Benefits => BENEFITS,
        Topic::Contract => CONTRACT,
        Topic::General => GENERAL,
    }
}

/// Shown when the chat endpoint itself fails
pub const TECHNICAL_DIFFICULTIES: &str = "I'm experiencing technical difficulties. For immediate union assistance, please contact your steward or union office directly.";

const SAFETY: &str = "I'm currently experiencing connectivity issues, but here's essential safety information: Always follow OSHA regulations, report hazards immediately to your supervisor and union steward, use proper PPE, and never perform unsafe work. For detailed safety protocols, contact your union safety representative or try again shortly.";

const GRIEVANCE: &str = "I'm temporarily offline, but here's basic grievance guidance: Document the issue with dates and witnesses, contact your union steward within the contract timeframe, and follow the formal grievance procedure outlined in your collective bargaining agreement. Your steward can provide immediate assistance.";

const BENEFITS: &str = "I'm experiencing technical difficulties, but basic benefit information: Union members typically have comprehensive healthcare, dental, vision, retirement plans, and paid time off. Contact your benefits administrator or union office for specific details about your coverage and enrollment.";

const CONTRACT: &str = "I'm currently offline, but here's basic contract information: Your collective bargaining agreement covers wages, overtime pay, working conditions, and job security. Contact your union steward for specific contract questions or to request a copy of your current agreement.";

const GENERAL: &str = "I'm temporarily experiencing connectivity issues with the knowledge base. For immediate assistance with union matters, please contact your union steward or the union office directly. I'll be back online shortly to provide detailed guidance on safety, grievances, benefits, contracts, and training.";
