use std::str::FromStr;

/// Backend agent personas the chat endpoint can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Agent {
    #[default]
    AgentFramework,
    ResearchAgent,
    CodingWizard,
    DralphSoftwareConsultant,
    KaiburrCrystalBall,
    GenAiSalesGuru,
    MedicalBillingAgent,
    NoToolsAgent,
}

impl Agent {
    /// Name sent to the backend as `chat_agent`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::AgentFramework => "AgentFramework",
            Agent::ResearchAgent => "research_agent",
            Agent::CodingWizard => "CodingWizard",
            Agent::DralphSoftwareConsultant => "DralphSoftwareConsultant",
            Agent::KaiburrCrystalBall => "KaiburrCrystalBall",
            Agent::GenAiSalesGuru => "GenAISalesGuru",
            Agent::MedicalBillingAgent => "medical_billing_agent",
            Agent::NoToolsAgent => "no_tools_agent",
        }
    }

    pub fn all() -> Vec<Agent> {
        vec![
            Agent::AgentFramework,
            Agent::ResearchAgent,
            Agent::CodingWizard,
            Agent::DralphSoftwareConsultant,
            Agent::KaiburrCrystalBall,
            Agent::GenAiSalesGuru,
            Agent::MedicalBillingAgent,
            Agent::NoToolsAgent,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent: {0}")]
pub struct UnknownAgent(pub String);

impl FromStr for Agent {
    type Err = UnknownAgent;

    /// Exact-match lookup; backend names are case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|agent| agent.as_str() == s)
            .ok_or_else(|| UnknownAgent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_agent_framework() {
        assert_eq!(Agent::default(), Agent::AgentFramework);
        assert_eq!(Agent::default().as_str(), "AgentFramework");
    }

    #[test]
    fn test_parse_matches_backend_names() {
        assert_eq!("research_agent".parse::<Agent>(), Ok(Agent::ResearchAgent));
        assert_eq!("GenAISalesGuru".parse::<Agent>(), Ok(Agent::GenAiSalesGuru));
        assert_eq!(
            "codingwizard".parse::<Agent>(),
            Err(UnknownAgent("codingwizard".to_string()))
        );
        assert!("".parse::<Agent>().is_err());
    }

    #[test]
    fn test_all_round_trips_names() {
        let agents = Agent::all();
        assert_eq!(agents.len(), 8);
        for agent in agents {
            assert_eq!(agent.as_str().parse::<Agent>(), Ok(agent));
        }
    }
}
