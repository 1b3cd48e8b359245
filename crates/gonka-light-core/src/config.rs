use serde::{Deserialize, Serialize};

/// Verification settings, passed explicitly to whoever verifies.
/// Nothing in this crate reads the environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Verify the ICS23 inclusion proof before using a participants response.
    /// Only consulted by endpoint extraction; the custody walk always verifies.
    pub verify_proofs: bool,
    /// Require more than 2/3 of the validator set's voting power to have signed
    /// each commit, in addition to every supplied signature being valid.
    pub require_quorum: bool,
    /// Upper bound on how many epochs the custody walk may step back.
    pub max_epochs: Option<u64>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verify_proofs: true,
            require_quorum: true,
            max_epochs: None,
        }
    }
}

impl VerifierConfig {
    pub fn with_max_epochs(mut self, max_epochs: u64) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }

    pub fn without_quorum(mut self) -> Self {
        self.require_quorum = false;
        self
    }

    /// Parse a JSON config document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
