use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{EngineConfig, MatchStrategy};
use crate::pass::{run_naive, run_network};
use crate::store::RuleSetStore;
use crate::{Fact, FactReport, MatchNetwork, RuleGridError, RuleSet};

/// Applies the rule sets stored for a class to batches of objects.
///
/// When several rule sets are stored for a class, each one makes its own pass
/// over the input objects. The result holds one object per (rule set, input
/// object), grouped by rule set in stored order. A class with no rule sets
/// returns the input unchanged.
#[derive(Debug)]
pub struct RuleEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: RuleSetStore> RuleEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate every rule against every object.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGridError::Store`] if loading fails, or
    /// [`RuleGridError::Action`] under [`ActionErrorPolicy::FailBatch`](crate::ActionErrorPolicy::FailBatch).
    pub async fn apply_rules(
        &self,
        class_name: &str,
        facts: Vec<Fact>,
    ) -> Result<Vec<Fact>, RuleGridError> {
        Ok(into_facts(self.apply_rules_detailed(class_name, facts).await?))
    }

    /// Like [`apply_rules`](Self::apply_rules), reporting which rules fired on
    /// each object and any action failure.
    ///
    /// # Errors
    ///
    /// See [`apply_rules`](Self::apply_rules).
    pub async fn apply_rules_detailed(
        &self,
        class_name: &str,
        facts: Vec<Fact>,
    ) -> Result<Vec<FactReport>, RuleGridError> {
        let rule_sets = self.store.load(class_name).await?;
        if rule_sets.is_empty() {
            return Ok(unchanged(facts));
        }

        debug!(class = class_name, rule_sets = rule_sets.len(), objects = facts.len(), "applying rules");
        let mut reports = Vec::with_capacity(rule_sets.len() * facts.len());
        for rule_set in &rule_sets {
            reports.extend(run_naive(rule_set, &facts, &self.config)?);
        }
        Ok(reports)
    }

    /// Match objects through a [`MatchNetwork`] built for this call.
    ///
    /// Rule sets are registered one at a time and the objects are matched
    /// after each registration, so the pass for a later rule set also applies
    /// the matching rules of every rule set registered before it.
    ///
    /// # Errors
    ///
    /// See [`apply_rules`](Self::apply_rules).
    pub async fn apply_rules_via_network(
        &self,
        class_name: &str,
        facts: Vec<Fact>,
    ) -> Result<Vec<Fact>, RuleGridError> {
        let rule_sets = self.store.load(class_name).await?;
        if rule_sets.is_empty() {
            return Ok(facts);
        }

        let mut network = MatchNetwork::new();
        let mut reports = Vec::with_capacity(rule_sets.len() * facts.len());
        for rule_set in rule_sets {
            network.add_rule_set(rule_set);
            reports.extend(run_network(&network, &facts, &self.config)?);
        }
        debug!(
            class = class_name,
            nodes = network.node_count(),
            rules = network.rule_count(),
            "network pass complete"
        );
        Ok(into_facts(reports))
    }

    /// Apply rules through the path chosen by [`EngineConfig::default_strategy`].
    ///
    /// # Errors
    ///
    /// See [`apply_rules`](Self::apply_rules).
    pub async fn apply(&self, class_name: &str, facts: Vec<Fact>) -> Result<Vec<Fact>, RuleGridError> {
        match self.config.default_strategy {
            MatchStrategy::Naive => self.apply_rules(class_name, facts).await,
            MatchStrategy::Network => self.apply_rules_via_network(class_name, facts).await,
        }
    }

    /// Compile one tabular document and store it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGridError::EmptyUpload`] for blank input,
    /// [`RuleGridError::Load`] for a malformed document, and
    /// [`RuleGridError::Store`] if saving fails.
    pub async fn upload_rule_set(&self, document: &[u8]) -> Result<Arc<RuleSet>, RuleGridError> {
        let rule_set = Arc::new(compile_upload(document)?);
        self.save(Arc::clone(&rule_set)).await?;
        Ok(rule_set)
    }

    /// Compile several documents, storing them only if all of them compile.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGridError::EmptyUpload`] when `documents` is empty or any
    /// document is blank, and otherwise as [`upload_rule_set`](Self::upload_rule_set).
    pub async fn upload_rule_sets<D: AsRef<[u8]>>(
        &self,
        documents: &[D],
    ) -> Result<Vec<Arc<RuleSet>>, RuleGridError> {
        if documents.is_empty() {
            return Err(RuleGridError::EmptyUpload);
        }
        let rule_sets = documents
            .iter()
            .map(|doc| compile_upload(doc.as_ref()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        for rule_set in &rule_sets {
            self.save(Arc::clone(rule_set)).await?;
        }
        Ok(rule_sets)
    }

    /// Encode every rule set stored for `class_name` as a binary snapshot, in
    /// stored order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGridError::Store`] if loading fails and
    /// [`RuleGridError::Serialize`] if a rule set cannot be encoded.
    #[cfg(feature = "binary-cache")]
    pub async fn export_snapshots(&self, class_name: &str) -> Result<Vec<Vec<u8>>, RuleGridError> {
        let rule_sets = self.store.load(class_name).await?;
        let snapshots = rule_sets
            .iter()
            .map(|rule_set| rule_set.to_bytes())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(class = class_name, snapshots = snapshots.len(), "exported snapshots");
        Ok(snapshots)
    }

    /// Restore a rule set from a binary snapshot and store it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGridError::Deserialize`] for a rejected snapshot and
    /// [`RuleGridError::Store`] if saving fails.
    #[cfg(feature = "binary-cache")]
    pub async fn upload_snapshot(&self, bytes: &[u8]) -> Result<Arc<RuleSet>, RuleGridError> {
        let rule_set = Arc::new(RuleSet::from_bytes(bytes)?);
        self.save(Arc::clone(&rule_set)).await?;
        Ok(rule_set)
    }

    async fn save(&self, rule_set: Arc<RuleSet>) -> Result<(), RuleGridError> {
        let id = rule_set.id().to_owned();
        let class = rule_set.metadata().class_key().to_owned();
        let rules = rule_set.rules().len();
        self.store.save(rule_set).await?;
        info!(rule_set = %id, class = %class, rules, "rule set uploaded");
        Ok(())
    }
}

fn compile_upload(document: &[u8]) -> Result<RuleSet, RuleGridError> {
    if document.iter().all(u8::is_ascii_whitespace) {
        return Err(RuleGridError::EmptyUpload);
    }
    Ok(RuleSet::from_json_slice(document)?)
}

fn unchanged(facts: Vec<Fact>) -> Vec<FactReport> {
    facts
        .into_iter()
        .map(|fact| FactReport::new(fact, Vec::new(), None, std::time::Duration::ZERO))
        .collect()
}

fn into_facts(reports: Vec<FactReport>) -> Vec<Fact> {
    reports.into_iter().map(FactReport::into_fact).collect()
}
