use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
    types::{NodeId, Tick},
};
use serde::{Deserialize, Serialize};

/// How the initially infected nodes are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SeedSet {
    /// These exact nodes start infected.
    Nodes(Vec<NodeId>),
    /// This share of the population starts infected, drawn uniformly.
    Fraction(f64),
}

impl Default for SeedSet {
    fn default() -> Self {
        Self::Nodes(Vec::new())
    }
}

impl SeedSet {
    /// Resolve to a sorted, duplicate-free node list for a graph of
    /// `node_count` nodes. Only `Fraction` consumes draws from `rng`.
    pub fn resolve(&self, node_count: usize, rng: &mut SimRng) -> SimResult<Vec<NodeId>> {
        let mut nodes = match self {
            Self::Nodes(nodes) => {
                if let Some(&bad) = nodes.iter().find(|&&n| n >= node_count) {
                    return Err(SimError::InvalidParameter {
                        name:   "initial_infected",
                        value:  bad as f64,
                        reason: "seed node is outside the graph",
                    });
                }
                nodes.clone()
            }
            Self::Fraction(share) => {
                check_probability("initial_infected", *share)?;
                let count = (node_count as f64 * share) as usize;
                let mut population = rng.shuffle((0..node_count).collect::<Vec<_>>());
                population.truncate(count);
                population
            }
        };
        nodes.sort_unstable();
        nodes.dedup();
        Ok(nodes)
    }
}

/// Immutable run configuration, fixed at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Per-step probability that a node infects itself (SIRS `x`).
    #[serde(default)]
    pub spontaneous_infection: f64,
    /// Per-contact infection probability (SI `p`).
    #[serde(default)]
    pub transmission_probability: f64,
    /// Amount `risk` climbs back towards 1.0 each step (SIRS).
    #[serde(default = "default_recovery_rate")]
    pub recovery_rate: f64,
    pub max_steps: Tick,
    #[serde(default)]
    pub initial_infected: SeedSet,
    pub seed: u64,
}

fn default_recovery_rate() -> f64 {
    0.01
}

impl SimParams {
    /// Load from a JSON file.
    /// In tests, use SimParams::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let params: SimParams = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        params.validate()?;
        Ok(params)
    }

    /// Hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            spontaneous_infection:    0.001,
            transmission_probability: 0.01,
            recovery_rate:            0.01,
            max_steps:                500,
            initial_infected:         SeedSet::Nodes(vec![0]),
            seed:                     42,
        }
    }

    /// Checks every probability lies in [0, 1]. Model-specific rules
    /// (e.g. a positive recovery rate) are checked by the model.
    pub fn validate(&self) -> SimResult<()> {
        check_probability("spontaneous_infection", self.spontaneous_infection)?;
        check_probability("transmission_probability", self.transmission_probability)?;
        if !self.recovery_rate.is_finite() || self.recovery_rate < 0.0 {
            return Err(SimError::InvalidParameter {
                name:   "recovery_rate",
                value:  self.recovery_rate,
                reason: "must be a finite, non-negative number",
            });
        }
        if let SeedSet::Fraction(share) = self.initial_infected {
            check_probability("initial_infected", share)?;
        }
        Ok(())
    }
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "probability must lie in [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        SimParams::default_test().validate().unwrap();
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let params = SimParams {
            transmission_probability: 1.5,
            ..SimParams::default_test()
        };
        match params.validate() {
            Err(SimError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "transmission_probability")
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn nan_probability_is_rejected() {
        let params = SimParams {
            spontaneous_infection: f64::NAN,
            ..SimParams::default_test()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn explicit_seed_nodes_are_sorted_and_deduplicated() {
        let mut rng = SimRng::new(1);
        let nodes = SeedSet::Nodes(vec![4, 1, 4]).resolve(5, &mut rng).unwrap();
        assert_eq!(nodes, vec![1, 4]);
    }

    #[test]
    fn seed_node_outside_graph_is_rejected() {
        let mut rng = SimRng::new(1);
        assert!(SeedSet::Nodes(vec![5]).resolve(5, &mut rng).is_err());
    }

    #[test]
    fn fraction_picks_expected_count() {
        let mut rng = SimRng::new(1);
        let nodes = SeedSet::Fraction(0.25).resolve(100, &mut rng).unwrap();
        assert_eq!(nodes.len(), 25);
        assert!(nodes.iter().all(|&n| n < 100));
    }

    #[test]
    fn params_parse_from_json() {
        let json = r#"{
            "transmission_probability": 0.2,
            "max_steps": 10,
            "initial_infected": { "kind": "fraction", "value": 0.1 },
            "seed": 7
        }"#;
        let params: SimParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.transmission_probability, 0.2);
        assert_eq!(params.spontaneous_infection, 0.0);
        assert_eq!(params.recovery_rate, 0.01);
        assert_eq!(params.initial_infected, SeedSet::Fraction(0.1));
    }
}
