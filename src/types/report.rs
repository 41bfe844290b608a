use std::fmt;
use std::time::Duration;

use super::error::ActionError;
use super::fact::Fact;
use super::fired::FiredRule;

/// Outcome of one rule-set pass over one fact.
///
/// Returned by [`RuleEngine::apply_rules_detailed()`](crate::RuleEngine::apply_rules_detailed).
/// When an action failed and the object was restored, `fact` holds the input
/// unchanged, `error` holds the failure, and `fired` lists the rules that had
/// already fired before it.
#[derive(Debug, Clone)]
#[must_use]
pub struct FactReport {
    fact: Fact,
    fired: Vec<FiredRule>,
    error: Option<ActionError>,
    duration: Duration,
}

impl FactReport {
    pub(crate) fn new(
        fact: Fact,
        fired: Vec<FiredRule>,
        error: Option<ActionError>,
        duration: Duration,
    ) -> Self {
        Self {
            fact,
            fired,
            error,
            duration,
        }
    }

    /// The fact after the pass.
    #[must_use]
    pub fn fact(&self) -> &Fact {
        &self.fact
    }

    #[must_use]
    pub fn into_fact(self) -> Fact {
        self.fact
    }

    /// Rules whose actions were applied, in application order.
    #[must_use]
    pub fn fired(&self) -> &[FiredRule] {
        &self.fired
    }

    #[must_use]
    pub fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }

    /// Wall-clock duration of the pass.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for FactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fired: Vec<String> = self.fired.iter().map(ToString::to_string).collect();
        write!(f, "fired: [{}]", fired.join(", "))?;
        if let Some(err) = &self.error {
            write!(f, ", error: {err}")?;
        }
        write!(f, ", duration: {:?}", self.duration)
    }
}
