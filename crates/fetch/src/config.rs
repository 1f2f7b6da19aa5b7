use std::time::Duration;

/// Configuration for the remote collaborators. Explicit and passed in, so
/// pacing and endpoints never live in ambient global state.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// GitHub repository slug holding the landing-zone module
    pub github_repo: String,

    /// Repository path of the archetype definition library
    pub archetype_dir: String,

    /// Repository path of the assignment document library
    pub assignment_dir: String,

    /// AzAdvertizer base URL
    pub advertizer_base: String,

    /// Minimum interval between GitHub requests
    pub github_min_interval: Duration,

    /// Minimum interval between AzAdvertizer requests
    pub advertizer_min_interval: Duration,

    /// Per-request timeout
    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            github_repo: "Azure/terraform-azurerm-caf-enterprise-scale".to_string(),
            archetype_dir: "modules/archetypes/lib/archetype_definitions".to_string(),
            assignment_dir: "modules/archetypes/lib/policy_assignments".to_string(),
            advertizer_base: "https://www.azadvertizer.net".to_string(),
            github_min_interval: Duration::from_millis(100),
            advertizer_min_interval: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
            user_agent: "policy-catalog/0.1".to_string(),
        }
    }
}
