use factorec::metrics::{auc, mse};
use factorec::optim::{bpr_loss, hinge_loss, mse_loss};

#[test]
fn auc_is_one_for_perfect_separation() {
    assert_eq!(auc(&[2.0, 3.0, 4.0], &[0.0, 1.0, -1.0]), 1.0);
}

#[test]
fn auc_is_half_on_ties() {
    assert_eq!(auc(&[1.0, 1.0], &[1.0, 1.0]), 0.5);
}

#[test]
fn mse_of_exact_predictions_is_zero() {
    assert_eq!(mse(&[1.0, -2.0], &[1.0, -2.0]), 0.0);
    assert!((mse(&[1.0, 3.0], &[0.0, 1.0]) - 2.5).abs() < 1e-6);
}

#[test]
fn mse_loss_gradient_points_toward_targets() {
    let (loss, grad) = mse_loss(&[2.0, -1.0], &[1.0, -1.0]);
    assert!((loss - 0.5).abs() < 1e-6);
    assert!(grad[0] > 0.0);
    assert_eq!(grad[1], 0.0);
}

#[test]
fn hinge_loss_is_zero_beyond_the_margin() {
    let (loss, dpos, dneg) = hinge_loss(&[3.0], &[1.0]);
    assert_eq!(loss, 0.0);
    assert_eq!(dpos[0], 0.0);
    assert_eq!(dneg[0], 0.0);

    let (loss, dpos, dneg) = hinge_loss(&[1.0], &[1.0]);
    assert!((loss - 1.0).abs() < 1e-6);
    assert!(dpos[0] < 0.0 && dneg[0] > 0.0);
}

#[test]
fn bpr_loss_pushes_positives_above_negatives() {
    let (loss, dpos, dneg) = bpr_loss(&[0.0], &[0.0]);
    assert!((loss - std::f32::consts::LN_2).abs() < 1e-3);
    assert!(dpos[0] < 0.0 && dneg[0] > 0.0);

    // A well-separated pair contributes almost nothing.
    let (separated, _, _) = bpr_loss(&[10.0], &[-10.0]);
    assert!(separated < 1e-3);
}
