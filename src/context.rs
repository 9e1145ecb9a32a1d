//! The passive configuration record handed to the driver.
//!
//! `Context` carries no behavior beyond constructing the child contexts the
//! recursive-bipartitioning driver needs; it is a plain public-field record,
//! the way `coupe`'s own `KMeans`/`MultiJagged` option structs are.

use crate::error::Error;
use crate::Weight;
use std::str::FromStr;

/// The objective minimized by the partitioner: `Cut` (number of hyperedges
/// split across blocks), `Km1` (sum over hyperedges of `connectivity - 1`),
/// `Soed` (sum of external degrees), or `ProcessMapping` (connectivity
/// weighted by distance on a target communication topology).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Cut,
    /// connectivity − 1
    Km1,
    /// sum of external degrees
    Soed,
    ProcessMapping,
}

impl Objective {
    /// Whether this objective wants `cut_net_splitting = true` when
    /// [`crate::Hypergraph::extract`] is called by the driver.
    pub fn cut_net_splitting(self) -> bool {
        matches!(self, Objective::Km1)
    }
}

impl FromStr for Objective {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cut" => Ok(Objective::Cut),
            "km1" => Ok(Objective::Km1),
            "soed" => Ok(Objective::Soed),
            "process_mapping" => Ok(Objective::ProcessMapping),
            _ => Err(Error::UnknownObjective(s.to_owned())),
        }
    }
}

/// Which driver handles top-level partitioning.
///
/// This crate implements only [`Mode::RecursiveBipartitioning`]; the other
/// variants are recognized (their binding strings are part of this crate's
/// public contract) but delegate to out-of-scope external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    RecursiveBipartitioning,
    Direct,
    DeepMultilevel,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rb" => Ok(Mode::RecursiveBipartitioning),
            "direct" => Ok(Mode::Direct),
            "deep" => Ok(Mode::DeepMultilevel),
            _ => Err(Error::UnknownMode(s.to_owned())),
        }
    }
}

/// Gates whether the driver emits its per-level `tracing` spans.
///
/// `Main` partitioning calls are logged at every recursion level;
/// `InitialPartitioning` calls are made in bulk by the external
/// initial-partitioner and would otherwise flood the trace, so the driver
/// suppresses its spans in that mode. This is the only effect of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionType {
    Main,
    InitialPartitioning,
}

/// The per-block weight targets used once the adaptive-ε formula is bypassed.
#[derive(Debug, Clone, Default)]
pub struct IndividualPartWeights {
    pub perfect_balance: Vec<Weight>,
    pub max: Vec<Weight>,
}

/// A passive record describing how many blocks to produce, under what
/// balance tolerance, optimizing what objective, with how much parallelism.
#[derive(Debug, Clone)]
pub struct Context {
    pub k: u32,
    pub epsilon: f64,
    pub objective: Objective,
    pub mode: Mode,
    pub partition_type: PartitionType,
    pub threads: usize,
    pub degree_of_parallelism: f64,
    pub perfect_balance_part_weights: Vec<Weight>,
    pub max_part_weights: Vec<Weight>,
    pub individual_part_weights: Option<IndividualPartWeights>,
}

impl Context {
    /// A contract check on the fields the driver relies on directly: `k`
    /// must allow at least one bisection, and `epsilon` must be a tolerance
    /// in `[0, 1)`. The recursion itself only asserts `k1 - k0 >= 2` at each
    /// level; this checks the top-level entry point once.
    pub fn validate(&self) -> Result<(), Error> {
        if self.k < 2 {
            return Err(Error::InvalidContext("k must be >= 2"));
        }
        if !(0.0..1.0).contains(&self.epsilon) {
            return Err(Error::InvalidContext("epsilon must be in [0, 1)"));
        }
        Ok(())
    }

    pub fn use_individual_part_weights(&self) -> bool {
        self.individual_part_weights.is_some()
    }

    /// Builds the bisection `Context` passed to the external
    /// `multilevel::partition` collaborator: always `k = 2`, same objective,
    /// mode and thread count as `self`.
    pub fn bisection_context(&self) -> Context {
        Context {
            k: 2,
            epsilon: self.epsilon,
            objective: self.objective,
            mode: self.mode,
            partition_type: self.partition_type,
            threads: self.threads,
            degree_of_parallelism: self.degree_of_parallelism,
            perfect_balance_part_weights: Vec::new(),
            max_part_weights: Vec::new(),
            individual_part_weights: None,
        }
    }

    /// Builds a child `Context` for `recurse_block`: `rb_k = k1 - k0` blocks,
    /// balance targets restricted to `[k0, k1)`, parallelism scaled by
    /// `parallelism`.
    pub fn child_context(&self, k0: usize, k1: usize, parallelism: f64) -> Context {
        let rb_k = (k1 - k0) as u32;
        let individual_part_weights = self.individual_part_weights.as_ref().map(|w| {
            IndividualPartWeights {
                perfect_balance: w
                    .perfect_balance
                    .get(k0..k1)
                    .map(<[Weight]>::to_vec)
                    .unwrap_or_default(),
                max: w.max.get(k0..k1).map(<[Weight]>::to_vec).unwrap_or_default(),
            }
        });
        Context {
            k: rb_k,
            epsilon: self.epsilon,
            objective: self.objective,
            mode: self.mode,
            partition_type: self.partition_type,
            threads: self.threads,
            degree_of_parallelism: self.degree_of_parallelism * parallelism,
            perfect_balance_part_weights: self
                .perfect_balance_part_weights
                .get(k0..k1)
                .map(<[Weight]>::to_vec)
                .unwrap_or_default(),
            max_part_weights: self
                .max_part_weights
                .get(k0..k1)
                .map(<[Weight]>::to_vec)
                .unwrap_or_default(),
            individual_part_weights,
        }
    }

    /// `ceil(total_weight / k)`, the "perfect" per-block weight a balanced
    /// `k`-way partition would have if weight divided evenly.
    pub fn perfect_balance_weight(total_weight: Weight, k: u32) -> Weight {
        (total_weight + k as Weight - 1) / k as Weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_binding_strings() {
        assert_eq!(Mode::from_str("rb").unwrap(), Mode::RecursiveBipartitioning);
        assert_eq!(Mode::from_str("direct").unwrap(), Mode::Direct);
        assert_eq!(Mode::from_str("deep").unwrap(), Mode::DeepMultilevel);
        assert!(Mode::from_str("bogus").is_err());
    }

    #[test]
    fn objective_parses_all_variants() {
        assert_eq!(Objective::from_str("cut").unwrap(), Objective::Cut);
        assert_eq!(Objective::from_str("km1").unwrap(), Objective::Km1);
        assert_eq!(Objective::from_str("soed").unwrap(), Objective::Soed);
        assert_eq!(
            Objective::from_str("process_mapping").unwrap(),
            Objective::ProcessMapping
        );
        assert!(Objective::from_str("bogus").is_err());
    }

    #[test]
    fn km1_is_the_only_cut_net_splitting_objective() {
        assert!(Objective::Km1.cut_net_splitting());
        assert!(!Objective::Cut.cut_net_splitting());
        assert!(!Objective::Soed.cut_net_splitting());
        assert!(!Objective::ProcessMapping.cut_net_splitting());
    }

    #[test]
    fn validate_rejects_degenerate_k_and_epsilon() {
        let mut ctx = Context {
            k: 1,
            epsilon: 0.03,
            objective: Objective::Cut,
            mode: Mode::RecursiveBipartitioning,
            partition_type: PartitionType::Main,
            threads: 1,
            degree_of_parallelism: 1.0,
            perfect_balance_part_weights: vec![],
            max_part_weights: vec![],
            individual_part_weights: None,
        };
        assert!(ctx.validate().is_err());
        ctx.k = 4;
        ctx.epsilon = 1.0;
        assert!(ctx.validate().is_err());
        ctx.epsilon = 0.03;
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn child_context_tolerates_a_shorter_max_array() {
        // `max_part_weights` is carried but not consumed by the
        // individual-part-weights formula (see DESIGN.md), so callers are
        // expected to be able to leave it empty even though
        // `perfect_balance` is fully populated.
        let ctx = Context {
            k: 4,
            epsilon: 0.03,
            objective: Objective::Cut,
            mode: Mode::RecursiveBipartitioning,
            partition_type: PartitionType::Main,
            threads: 1,
            degree_of_parallelism: 1.0,
            perfect_balance_part_weights: vec![],
            max_part_weights: vec![],
            individual_part_weights: Some(IndividualPartWeights {
                perfect_balance: vec![38, 37, 13, 12],
                max: vec![],
            }),
        };

        let child = ctx.child_context(0, 2, 0.5);
        let individual = child.individual_part_weights.unwrap();
        assert_eq!(individual.perfect_balance, vec![38, 37]);
        assert!(individual.max.is_empty());
    }
}
