//! Reinforcement-learning seat.
//!
//! Every call to the policy is recorded in an [`EpisodeTree`]; outcomes
//! reported by the table resolve the matching leaves. At the end of each
//! round the finished episode is flushed into [`TrainingBuffers`], and every
//! `retrain_every` rounds the network is refit on everything gathered so far.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::buffers::TrainingBuffers;
use crate::cards::{Hand, HandId};
use crate::episode::{EpisodeTree, NodeId};
use crate::error::{BlackjackError, BlackjackResult};
use crate::network::MultilayerPerceptron;
use crate::payout::{InsuranceSettlement, Outcome};
use crate::policy::{observe, Action, QPolicy, NUM_ACTIONS, NUM_FEATURES};
use crate::strategy::{Strategy, TableView};
use crate::trainer::{train, TrainConfig, TrainReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub hidden_layers: Vec<usize>,
    pub train: TrainConfig,
    /// Rounds between refits.
    pub retrain_every: usize,
    /// Rewards are divided by this before the logistic squash.
    pub reward_scale: f64,
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            hidden_layers: vec![30],
            train: TrainConfig::default(),
            retrain_every: 100,
            reward_scale: 25.0,
            seed: None,
        }
    }
}

/// Everything needed to resume learning in a later session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    pub network: MultilayerPerceptron,
    pub buffers: TrainingBuffers,
    pub rounds: usize,
}

impl LearnerSnapshot {
    pub fn save(&self, path: &Path) -> BlackjackResult<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        log::info!("saved learner snapshot to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> BlackjackResult<LearnerSnapshot> {
        let snapshot: LearnerSnapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
        snapshot.network.validate()?;
        if snapshot.network.num_features() != Some(NUM_FEATURES) {
            return Err(BlackjackError::DimensionMismatch {
                expected: NUM_FEATURES,
                got: snapshot.network.num_features().unwrap_or(0),
            });
        }
        log::info!(
            "loaded learner snapshot from {} ({} rounds, {} examples)",
            path.display(),
            snapshot.rounds,
            snapshot.buffers.len()
        );
        Ok(snapshot)
    }
}

pub struct ReinforcementLearner {
    name: String,
    network: MultilayerPerceptron,
    tree: EpisodeTree,
    buffers: TrainingBuffers,
    /// Current episode node of every live hand.
    current: HashMap<HandId, NodeId>,
    config: LearnerConfig,
    rng: StdRng,
    rounds: usize,
    last_report: Option<TrainReport>,
}

impl ReinforcementLearner {
    /// A learner with a freshly initialized network.
    pub fn new(name: &str, config: LearnerConfig) -> BlackjackResult<ReinforcementLearner> {
        let mut rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut network = MultilayerPerceptron::new(&config.hidden_layers);
        network.initialize(NUM_FEATURES, NUM_ACTIONS, &mut rng)?;
        Ok(ReinforcementLearner::assemble(name, network, TrainingBuffers::new(), 0, config, rng))
    }

    /// A learner acting with an existing network.
    pub fn with_network(
        name: &str,
        network: MultilayerPerceptron,
        config: LearnerConfig,
    ) -> BlackjackResult<ReinforcementLearner> {
        QPolicy::new(&network)?;
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(ReinforcementLearner::assemble(name, network, TrainingBuffers::new(), 0, config, rng))
    }

    pub fn from_snapshot(
        name: &str,
        snapshot: LearnerSnapshot,
        config: LearnerConfig,
    ) -> BlackjackResult<ReinforcementLearner> {
        let mut learner = ReinforcementLearner::with_network(name, snapshot.network, config)?;
        learner.buffers = snapshot.buffers;
        learner.rounds = snapshot.rounds;
        Ok(learner)
    }

    fn assemble(
        name: &str,
        network: MultilayerPerceptron,
        buffers: TrainingBuffers,
        rounds: usize,
        config: LearnerConfig,
        rng: StdRng,
    ) -> ReinforcementLearner {
        ReinforcementLearner {
            name: name.to_string(),
            network,
            tree: EpisodeTree::new(),
            buffers,
            current: HashMap::new(),
            config,
            rng,
            rounds,
            last_report: None,
        }
    }

    pub fn snapshot(&self) -> LearnerSnapshot {
        LearnerSnapshot {
            network: self.network.clone(),
            buffers: self.buffers.clone(),
            rounds: self.rounds,
        }
    }

    pub fn network(&self) -> &MultilayerPerceptron {
        &self.network
    }

    pub fn buffers(&self) -> &TrainingBuffers {
        &self.buffers
    }

    pub fn tree(&self) -> &EpisodeTree {
        &self.tree
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn last_report(&self) -> Option<&TrainReport> {
        self.last_report.as_ref()
    }

    /// Refit the network on every buffered decision.
    pub fn learn(&mut self) -> BlackjackResult<TrainReport> {
        let x = self.buffers.features();
        let y = self.buffers.targets(self.config.reward_scale)?;
        let report = train(&mut self.network, &x, &y, &self.config.train, &mut self.rng)?;
        log::info!(
            "{}: refit on {} decisions after {} rounds, score {:.4}",
            self.name,
            self.buffers.len(),
            self.rounds,
            report.score
        );
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Episode node currently standing for `hand`. The opening hand starts
    /// at the root; split hands are registered by `on_split`.
    fn node_for(&self, hand: HandId) -> BlackjackResult<NodeId> {
        match self.current.get(&hand) {
            Some(&node) => Ok(node),
            None if hand == 0 => Ok(self.tree.root()),
            None => Err(BlackjackError::InvariantViolation(format!(
                "hand {} has no episode node",
                hand
            ))),
        }
    }
}

impl Strategy for ReinforcementLearner {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_bet(&mut self, minimum_bet: u32, _true_count: f64, chips: u32) -> BlackjackResult<Option<u32>> {
        Ok((chips >= minimum_bet).then_some(minimum_bet))
    }

    fn decide(&mut self, hand: &Hand, view: &TableView, _allowed: &[Action]) -> BlackjackResult<Action> {
        let policy = QPolicy::new(&self.network)?;
        let state = observe(hand, view.upcard, false);
        let decision = policy.select_action(&state)?;
        let at = self.node_for(hand.id)?;
        let node = self.tree.record_decision(at, state, &decision)?;
        self.current.insert(hand.id, node);
        log::debug!("{}: {:?} -> {}", self.name, state, decision.action()?);
        decision.action()
    }

    fn insurance(&mut self, hand: &Hand, view: &TableView) -> BlackjackResult<bool> {
        let policy = QPolicy::new(&self.network)?;
        let state = observe(hand, view.upcard, true);
        let decision = policy.insurance(&state, &mut self.rng)?;
        let at = self.node_for(hand.id)?;
        let node = self.tree.record_decision(at, state, &decision)?;
        self.current.insert(hand.id, node);
        Ok(decision.action()? == Action::Hit)
    }

    fn on_insurance_refused(&mut self, hand: &Hand, _price: u32) -> BlackjackResult<()> {
        let at = self.node_for(hand.id)?;
        self.tree.amend_action(at, Action::Stand.index())
    }

    fn on_split(&mut self, parent: HandId, children: [HandId; 2]) -> BlackjackResult<()> {
        let at = self.node_for(parent)?;
        let [left, right] = self.tree.split(at)?;
        self.current.remove(&parent);
        self.current.insert(children[0], left);
        self.current.insert(children[1], right);
        Ok(())
    }

    fn on_outcome(&mut self, hand: &Hand, outcome: Outcome) -> BlackjackResult<()> {
        let at = self.node_for(hand.id)?;
        self.tree.resolve(at, outcome.reward(hand.bet))
    }

    fn on_insurance_settled(&mut self, settlement: InsuranceSettlement) -> BlackjackResult<()> {
        match settlement.reward() {
            Some(credit) => self.tree.settle_insurance(credit),
            None => Ok(()),
        }
    }

    fn on_round_end(&mut self, _chips: u32) -> BlackjackResult<()> {
        self.current.clear();
        if self.tree.is_empty() {
            return Ok(());
        }
        self.tree.flush(&mut self.buffers)?;
        self.rounds += 1;
        let due = self.config.retrain_every > 0 && self.rounds % self.config.retrain_every == 0;
        if due && self.buffers.len() >= self.config.train.batch_size {
            self.learn()?;
        }
        Ok(())
    }
}
