//! Internal Knowledge Base
//!
//! In-process backend answering from a fixed union knowledge set. It is
//! always reachable, which makes it the default backend when no Pinecone
//! credentials are deployed.

use async_trait::async_trait;
use bolt_core::{
    backend::{Answer, ConnectionStatus, KnowledgeBackend},
    error::Result,
    message::ChatMessage,
    tokens::TokenUsage,
};

/// Assistant id reported by the internal backend
pub const ASSISTANT_ID: &str = "deepseek-r1-agent";

const SIGNATURE: &str = "*Response generated using DeepSeek R1 with internal document analysis.*";

/// Internal DeepSeek knowledge base
#[derive(Debug, Default)]
pub struct InternalKnowledgeBase;

impl InternalKnowledgeBase {
    pub const fn new() -> Self {
        Self
    }

    fn article(query: &str) -> &'static str {
        let lower = query.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(&["safety", "osha", "hazard"]) {
            SAFETY
        } else if mentions(&["grievance", "complaint", "dispute"]) {
            GRIEVANCE
        } else if mentions(&["contract", "agreement", "benefits"]) {
            CONTRACT
        } else {
            GENERAL
        }
    }
}

#[async_trait]
impl KnowledgeBackend for InternalKnowledgeBase {
    fn name(&self) -> &str {
        "internal"
    }

    fn assistant_id(&self) -> &str {
        ASSISTANT_ID
    }

    async fn test_connection(&self) -> Result<ConnectionStatus> {
        Ok(ConnectionStatus::connected(ASSISTANT_ID, 0))
    }

    async fn query(&self, query: &str, context: &[ChatMessage]) -> Result<Answer> {
        tracing::debug!(query_len = query.len(), context_items = context.len(), "Answering from internal knowledge base");

        let text = format!("{}\n\n{SIGNATURE}", Self::article(query));
        let usage = TokenUsage::for_exchange(query, context, &text);

        Ok(Answer { text, usage })
    }
}

const SAFETY: &str = "**Workplace Safety Guidelines (DeepSeek R1 Analysis):**

• **OSHA Compliance**: All workplaces must follow OSHA safety standards and regulations
• **Right to Safe Workplace**: You have the legal right to a safe work environment free from recognized hazards
• **PPE Requirements**: Employers must provide necessary protective equipment at no cost to workers
• **Hazard Reporting**: Report unsafe conditions immediately to your supervisor and union steward
• **Safety Training**: Mandatory safety training must be provided for all job functions and equipment
• **Accident Reporting**: All workplace injuries must be reported within 24 hours to management and union
• **Safety Committees**: Union members participate in joint labor-management safety committees
• **Refusal Rights**: You can refuse unsafe work without retaliation under OSHA Section 11(c)

**Emergency Contacts:**
- Union Safety Representative: Available 24/7 for safety concerns
- OSHA Hotline: 1-800-321-OSHA (6742)
- Emergency Services: 911

**Next Steps:** Contact your union steward immediately for any safety concerns or to file a safety complaint.";

const GRIEVANCE: &str = "**Union Grievance Procedure (DeepSeek R1 Analysis):**

**Step 1: Informal Resolution (5 business days)**
• Discuss the issue with your immediate supervisor
• Document the conversation with date, time, and witnesses present
• Union steward may assist in informal discussion

**Step 2: Formal Written Grievance (10 business days)**
• File written grievance with union steward assistance
• Include specific contract violations and requested remedy
• Management has 10 business days to respond in writing

**Step 3: Union-Management Meeting (15 business days)**
• Union representatives meet with higher management
• Present evidence and witness statements
• Seek resolution through negotiation

**Step 4: Arbitration (if needed)**
• Independent arbitrator makes binding decision
• Union covers arbitration costs for valid grievances
• Final and binding resolution

**Important Rights:**
- Right to union representation at all disciplinary meetings
- Protection against retaliation for filing grievances
- Right to have steward present during investigations
- Access to relevant documents and information

**Time Limits:** Grievances must be filed within the timeframes specified in your contract. Contact your union steward immediately as time limits are strict and cannot be extended.";

const CONTRACT: &str = "**Union Contract Information (DeepSeek R1 Analysis):**

**Key Contract Provisions:**
• **Wages**: Current wage scales and progression schedules
• **Benefits**: Health insurance, retirement, vacation, sick leave
• **Working Conditions**: Hours, overtime, shift differentials
• **Job Security**: Layoff procedures, recall rights, seniority systems
• **Grievance Process**: Step-by-step dispute resolution procedures

**Recent Contract Updates:**
• Wage increases negotiated for current term
• Enhanced safety protocols implemented
• Improved healthcare coverage options
• Additional paid time off provisions

**How to Access Full Contract:**
• Contact your union steward for physical copy
• Access digital version through union website
• Review specific sections during union meetings

**Questions About Your Contract:**
• Speak with your union steward for clarification
• Attend monthly union meetings for updates
• Contact union office for detailed explanations";

const GENERAL: &str = "**UnionBolt AI Assistant (DeepSeek R1):**

I'm here to help with your union-related questions and workplace concerns. I can provide information about:

• **Safety & OSHA Compliance**
• **Grievance Procedures**
• **Contract Information**
• **Workers' Rights**
• **Benefits & Compensation**
• **Workplace Policies**

For specific questions about your situation, please provide more details about what you'd like to know. I'll analyze your query using our internal document storage and DeepSeek R1 processing to provide the most accurate and helpful information.

**Need immediate assistance?** Contact your union steward or call the union office during business hours.";

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_connected() {
        let kb = InternalKnowledgeBase::new();
        let status = kb.test_connection().await.unwrap();
        assert!(status.connected);
        assert_eq!(status.assistant_id, "deepseek-r1-agent");
    }

    #[tokio::test]
    async fn test_topic_articles() {
        let kb = InternalKnowledgeBase::new();

        let safety = kb.query("Is this hazard reportable?", &[]).await.unwrap();
        assert!(safety.text.starts_with("**Workplace Safety Guidelines"));
        assert!(safety.text.ends_with(SIGNATURE));

        let benefits = kb.query("what benefits do I have", &[]).await.unwrap();
        assert!(benefits.text.starts_with("**Union Contract Information"));

        let general = kb.query("hello", &[]).await.unwrap();
        assert!(general.text.starts_with("**UnionBolt AI Assistant"));
    }

    #[tokio::test]
    async fn test_usage_counts_context() {
        let kb = InternalKnowledgeBase::new();
        let context = vec![ChatMessage::user("x".repeat(40))];

        let bare = kb.query("hello", &[]).await.unwrap();
        let with_context = kb.query("hello", &context).await.unwrap();
        assert!(with_context.usage.prompt > bare.usage.prompt);
        assert_eq!(with_context.usage.total, with_context.usage.prompt + with_context.usage.completion);
    }
}
