//! The recursive-bipartitioning driver (`spec.md` §4.2).
//!
//! `partition` repeatedly calls the external [`Bisector`] to split a block
//! into two, then recurses independently on each half via `rayon::join`.
//! Balance targets for each bisection are derived either from the adaptive-ε
//! formula (the default) or, when the caller supplies
//! [`Context::individual_part_weights`], from per-block target weights
//! directly.

use crate::context::Context;
use crate::error::Error;
use crate::hypergraph::Hypergraph;
use crate::multilevel::Bisector;
use crate::partitioned_hypergraph::{BlockId, PartitionedHypergraph};
use crate::Result;
use crate::Weight;

/// The fixed parameters of the original call, carried unchanged through
/// every recursion level so the adaptive-ε formula always compares the
/// current sub-problem against the *original* `(W, k, ε)`, not its immediate
/// parent's.
struct OriginalProblem {
    total_weight: Weight,
    k: u32,
    epsilon: f64,
}

/// Allocates a fresh [`PartitionedHypergraph`] for `hg` and partitions it
/// into `ctx.k` blocks.
pub fn partition<'hg, B: Bisector>(
    hg: &'hg Hypergraph,
    ctx: &Context,
    bisector: &B,
) -> Result<PartitionedHypergraph<'hg>> {
    let phg = PartitionedHypergraph::new(hg, ctx.k);
    partition_in_place(&phg, ctx, bisector)?;
    Ok(phg)
}

/// Partitions an existing, freshly allocated [`PartitionedHypergraph`] into
/// `ctx.k` blocks in place.
pub fn partition_in_place<B: Bisector>(
    phg: &PartitionedHypergraph,
    ctx: &Context,
    bisector: &B,
) -> Result<()> {
    ctx.validate()?;
    let original = OriginalProblem {
        total_weight: phg.hypergraph().total_weight(),
        k: ctx.k,
        epsilon: ctx.epsilon,
    };
    recurse(phg, ctx, &original, bisector)
}

/// Bisects `phg` (all of it, since `recurse` is always entered with a fresh
/// `[0, ctx.k)` local block numbering) and recurses on each half.
///
/// `ctx.k >= 2` is a precondition: the caller (either [`partition_in_place`]
/// or [`recurse_block`]) never calls this with a 1-block sub-problem, since a
/// single block needs no further bisection.
fn recurse<B: Bisector>(
    phg: &PartitionedHypergraph,
    ctx: &Context,
    original: &OriginalProblem,
    bisector: &B,
) -> Result<()> {
    assert!(ctx.k >= 2, "recurse called with a 1-block sub-problem");

    let b_ctx = setup_bisection_context(phg.hypergraph(), ctx, original);
    let bip = bisector.partition(phg.hypergraph(), &b_ctx);
    if bip.k() != 2 {
        return Err(Error::BisectorContractViolation {
            expected: 2,
            actual: bip.k(),
        });
    }

    let k = ctx.k;
    let b0: BlockId = 0;
    let b1: BlockId = ceil_div(k, 2);

    phg.do_parallel_for_all_nodes(|v| {
        let target = if bip.part_id(v) == 0 { b0 } else { b1 };
        phg.set_only_node_part(v, target);
    });
    phg.initialize_partition();

    let rb_k0 = ceil_div(k, 2);
    let rb_k1 = k / 2;

    if rb_k0 >= 2 && rb_k1 >= 2 {
        let (r0, r1) = rayon::join(
            || recurse_block(phg, ctx, b0, 0, rb_k0 as usize, original, 0.5, bisector),
            || {
                recurse_block(
                    phg,
                    ctx,
                    b1,
                    rb_k0 as usize,
                    (rb_k0 + rb_k1) as usize,
                    original,
                    0.5,
                    bisector,
                )
            },
        );
        r0?;
        r1?;
    } else if rb_k0 >= 2 {
        recurse_block(phg, ctx, b0, 0, rb_k0 as usize, original, 1.0, bisector)?;
    }

    Ok(())
}

/// Extracts the sub-hypergraph of `block`, recurses on it independently, and
/// copies the result back into `phg` with every local block id offset by
/// `block` (which, by construction, always equals `k0` in the parent's own
/// local numbering).
///
/// `(k0, k1)` index into `ctx`'s own balance-weight arrays — the slice of
/// the original per-block targets this sub-tree is responsible for — not
/// into any global block numbering.
fn recurse_block<B: Bisector>(
    phg: &PartitionedHypergraph,
    ctx: &Context,
    block: BlockId,
    k0: usize,
    k1: usize,
    original: &OriginalProblem,
    parallelism: f64,
    bisector: &B,
) -> Result<()> {
    let rb_ctx = ctx.child_context(k0, k1, parallelism);
    let cut_net_splitting = ctx.objective.cut_net_splitting();
    let (sub_hg, mapping) = phg.extract(block, cut_net_splitting, true);

    let sub_phg = PartitionedHypergraph::new(&sub_hg, rb_ctx.k);
    recurse(&sub_phg, &rb_ctx, original, bisector)?;

    phg.do_parallel_for_all_nodes(|v| {
        if let Some(sub_v) = mapping[v] {
            let new_block = block + sub_phg.part_id(sub_v);
            if new_block != block {
                phg.change_node_part(v, block, new_block);
            }
        }
    });

    Ok(())
}

/// Builds the `k = 2` [`Context`] handed to the external bisector: per-side
/// balance targets come from either the explicit `M[]` per-block weights
/// (when the caller supplied them) or the adaptive-ε formula (`spec.md`
/// §4.2), which shrinks the tolerance geometrically so that after
/// `ceil(log2 k)` levels of bisection the compounded imbalance still meets
/// the original `ε`.
fn setup_bisection_context(hg: &Hypergraph, ctx: &Context, original: &OriginalProblem) -> Context {
    let mut b_ctx = ctx.bisection_context();
    let w = hg.total_weight();
    let k = ctx.k;
    let half0 = ceil_div(k, 2) as usize;

    if let Some(individual) = &ctx.individual_part_weights {
        let m = &individual.perfect_balance;
        let sum_m: Weight = m.iter().sum();
        let f = if sum_m == 0 { 0.0 } else { w as f64 / sum_m as f64 };
        let s0: Weight = m[..half0].iter().map(|&mi| (f * mi as f64).ceil() as Weight).sum();
        let s1: Weight = m[half0..].iter().map(|&mi| (f * mi as f64).ceil() as Weight).sum();
        let eps_prime = adaptive_epsilon_from_ratio(sum_m as f64, (s0 + s1) as f64, k);
        b_ctx.perfect_balance_part_weights = vec![s0, s1];
        b_ctx.max_part_weights = vec![
            scale_up(s0, eps_prime),
            scale_up(s1, eps_prime),
        ];
    } else if w == 0 {
        b_ctx.perfect_balance_part_weights = vec![0, 0];
        b_ctx.max_part_weights = vec![0, 0];
    } else {
        let perfect_w0 = Context::perfect_balance_weight(original.total_weight, original.k);
        let perfect_w = Context::perfect_balance_weight(w, k);
        let base = (perfect_w0 as f64 / perfect_w as f64) * (1.0 + original.epsilon);
        let eps_prime = shrink_epsilon(base, k);

        let k_side0 = half0 as f64;
        let k_side1 = (k / 2) as f64;
        let perfect0 = ((k_side0 / k as f64) * w as f64).ceil() as Weight;
        let perfect1 = ((k_side1 / k as f64) * w as f64).ceil() as Weight;
        b_ctx.perfect_balance_part_weights = vec![perfect0, perfect1];
        b_ctx.max_part_weights = vec![scale_up(perfect0, eps_prime), scale_up(perfect1, eps_prime)];
    }

    b_ctx
}

fn adaptive_epsilon_from_ratio(sum_m: f64, total_assigned: f64, k: u32) -> f64 {
    let base = if total_assigned == 0.0 { 1.0 } else { sum_m / total_assigned };
    shrink_epsilon(base, k)
}

/// `clamp(base^(1 / ceil(log2 k)) - 1, 0, 0.99)`.
fn shrink_epsilon(base: f64, k: u32) -> f64 {
    let levels = (k as f64).log2().ceil().max(1.0);
    (base.powf(1.0 / levels) - 1.0).clamp(0.0, 0.99)
}

fn scale_up(weight: Weight, epsilon: f64) -> Weight {
    ((1.0 + epsilon) * weight as f64).round() as Weight
}

fn ceil_div(k: u32, d: u32) -> u32 {
    (k + d - 1) / d
}
