use approx::assert_abs_diff_eq;
use sprs::{CsMat, TriMat};

use crate::engine::{Measure, SimilarityEngine, DECAY_FACTOR};
use crate::error::SimError;
use crate::tests::test_helpers::{cycle3, graph_from_edges, init_logging, shared_parent};

#[test]
fn test_initial_matrix_is_scaled_identity() {
    let engine = SimilarityEngine::new(Measure::SimRank, cycle3()).unwrap();
    let s = engine.matrix();

    assert_eq!(engine.iteration(), 0);
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 - DECAY_FACTOR } else { 0.0 };
            assert_abs_diff_eq!(s.get(i, j), expected, epsilon = 1e-15);
        }
    }
}

// Scenario A: a 3-cycle has single in-neighbors and no shared neighbors, so
// one pure-propagation iteration leaves every off-diagonal at 0; Q is a
// permutation matrix, so the diagonal is δ·(1−δ) + (1−δ) = 0.36.
#[test]
fn test_simrank_three_cycle_first_iteration() {
    init_logging();
    let mut engine = SimilarityEngine::new(Measure::SimRank, cycle3()).unwrap();
    let s = engine.step();

    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 0.36 } else { 0.0 };
            assert_abs_diff_eq!(s.get(i, j), expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_simrank_three_cycle_second_iteration() {
    let mut engine = SimilarityEngine::new(Measure::SimRank, cycle3()).unwrap();
    engine.step();
    engine.step();
    let s = engine.matrix();

    // S₂ = δ·0.36·I + 0.2·I on the permutation graph.
    assert_eq!(engine.iteration(), 2);
    for i in 0..3 {
        assert_abs_diff_eq!(s.get(i, i), 0.488, epsilon = 1e-12);
    }
}

// Scenario B: identical singleton in-neighbor sets; with alpha = 1 the
// first iteration is the Jaccard term at full weight.
#[test]
fn test_jacsim_full_jaccard_weight() {
    let mut engine =
        SimilarityEngine::new(Measure::JacSim { alpha: 1.0 }, shared_parent()).unwrap();
    let s = engine.step();

    assert_abs_diff_eq!(s.get(0, 1), 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(1, 0), 0.8, epsilon = 1e-12);
    // identity_scale = 1 − δ·α = 0.2; node 2 has no Jaccard partner.
    assert_abs_diff_eq!(s.get(0, 0), 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(2, 2), 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(0, 2), 0.0, epsilon = 1e-12);
}

// Hand-computed blend pinning the Extra-term arithmetic. On the shared-parent
// graph with α = 0.5: S₀ = 0.6·I, propagation gives 0.6 at (0,0), (0,1) and
// (1,1), the pair (0,1) over-counts by exactly S₀[2,2] = 0.6, so
// S₁[0,1] = δ·(0.5·1 + 0.5·(0.6 − 0.6)) = 0.4 and
// S₁[0,0] = 0.6 + δ·0.5·0.6 = 0.84.
#[test]
fn test_jacsim_extra_term_blend() {
    let mut engine =
        SimilarityEngine::new(Measure::JacSim { alpha: 0.5 }, shared_parent()).unwrap();
    let s = engine.step();

    assert_abs_diff_eq!(s.get(0, 1), 0.4, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(1, 0), 0.4, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(0, 0), 0.84, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(1, 1), 0.84, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(2, 2), 0.6, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(0, 2), 0.0, epsilon = 1e-12);
}

#[test]
fn test_simrank_star_three_cycle() {
    let mut engine = SimilarityEngine::new(Measure::SimRankStar, cycle3()).unwrap();
    let s = engine.step();

    // T = S₀·Q = 0.2·Q, so (T + Tᵀ)/2 puts 0.1 on every edge of the cycle
    // and δ scales it to 0.08.
    assert_abs_diff_eq!(s.get(0, 1), 0.08, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(1, 0), 0.08, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(1, 2), 0.08, epsilon = 1e-12);
    assert_abs_diff_eq!(s.get(0, 0), 0.2, epsilon = 1e-12);
}

#[test]
fn test_jprank_beta_one_matches_jacsim() {
    let alpha = 0.5;
    let mut jacsim =
        SimilarityEngine::new(Measure::JacSim { alpha }, shared_parent()).unwrap();
    let mut jprank = SimilarityEngine::new(
        Measure::JpRank { alpha_in: alpha, alpha_out: 0.0, beta: 1.0 },
        shared_parent(),
    )
    .unwrap();

    for _ in 0..3 {
        jacsim.step();
        jprank.step();
    }

    let n = jacsim.nnodes();
    for i in 0..n {
        for j in 0..n {
            assert_abs_diff_eq!(
                jacsim.matrix().get(i, j),
                jprank.matrix().get(i, j),
                epsilon = 1e-14
            );
        }
    }
}

#[test]
fn test_jprank_both_directions_stays_symmetric() {
    let graph = graph_from_edges(&[(0, 2), (1, 2), (2, 0), (2, 1), (0, 1)]);
    let mut engine = SimilarityEngine::new(
        Measure::JpRank { alpha_in: 0.3, alpha_out: 0.2, beta: 0.5 },
        graph,
    )
    .unwrap();

    engine.step();
    let s = engine.step();
    for i in 0..3 {
        for j in 0..3 {
            assert_abs_diff_eq!(s.get(i, j), s.get(j, i), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_parameter_validation() {
    assert!(matches!(
        SimilarityEngine::new(Measure::JacSim { alpha: 1.5 }, shared_parent()),
        Err(SimError::Parameter(_))
    ));
    assert!(matches!(
        SimilarityEngine::new(
            Measure::JpRank { alpha_in: 0.2, alpha_out: -0.1, beta: 0.5 },
            shared_parent()
        ),
        Err(SimError::Parameter(_))
    ));
}

#[test]
fn test_zero_iterations_rejected() {
    let mut engine = SimilarityEngine::new(Measure::SimRank, cycle3()).unwrap();
    let result = engine.run(0, |_, _| Ok(()));
    assert!(matches!(result, Err(SimError::Parameter(_))));
}

#[test]
fn test_dimension_mismatch_detected() {
    let mut graph = cycle3();
    let shrunk: CsMat<f64> = TriMat::new((2, 2)).to_csr();
    graph.adj_in = shrunk;

    let result = SimilarityEngine::new(Measure::SimRank, graph);
    assert!(matches!(result, Err(SimError::Dimension(_))));
}

#[test]
fn test_file_stems_encode_parameters() {
    assert_eq!(Measure::SimRank.file_stem(30, 1), "SimRank_Top30_IT_1");
    assert_eq!(Measure::SimRankStar.file_stem(30, 4), "SRS_Top30_IT_4");
    assert_eq!(
        Measure::JacSim { alpha: 0.1 }.file_stem(30, 2),
        "JacSim_A_1_Top30_IT_2"
    );
    assert_eq!(
        Measure::JpRank { alpha_in: 0.3, alpha_out: 0.2, beta: 0.5 }.file_stem(10, 1),
        "JPRank_AIN_3_AOUT_2_B_5_Top10_IT_1"
    );
}
