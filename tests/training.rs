use factorec::config::TrainConfig;
use factorec::layers::EmbeddingT;
use factorec::math::Matrix;
use factorec::models::{Hyperparameters, MatrixFactorization};
use factorec::optim::{self, Adam};
use factorec::train;
use factorec::weights::load_model;
use std::fs;

#[test]
fn adam_training_reduces_mse_loss() {
    let hparams = Hyperparameters {
        embedding_dim: 8,
        dropout_p: 0.0,
        sparse: false,
        y_range: None,
    };
    let mut model = MatrixFactorization::new(4, 4, hparams);
    let mut emb_opt = Adam::new(0.05, 0.0);
    let mut bias_opt = Adam::new(0.05, 0.0);

    // Checkerboard ratings, learnable with a handful of factors.
    let mut users = Vec::new();
    let mut items = Vec::new();
    let mut ratings = Vec::new();
    for u in 0..4usize {
        for i in 0..4usize {
            users.push(u);
            items.push(i);
            ratings.push(if (u + i) % 2 == 0 { 1.0 } else { -1.0 });
        }
    }

    let initial = {
        let preds = model.forward(&users, &items);
        optim::mse_loss(&preds, &ratings).0
    };
    let mut last = initial;
    for _ in 0..200 {
        model.zero_grad();
        let preds = model.forward_train(&users, &items);
        let (loss, dpred) = optim::mse_loss(&preds, &ratings);
        model.backward(&dpred);
        emb_opt.step(&mut model.embedding_parameters());
        bias_opt.step(&mut model.bias_parameters());
        last = loss;
    }
    assert!(
        last < initial * 0.5,
        "loss did not improve: {initial} -> {last}"
    );
}

#[test]
fn sparse_and_dense_sgd_updates_match_without_weight_decay() {
    let w = Matrix::from_vec(4, 2, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    let mut dense = EmbeddingT::from_weights(w.clone(), false);
    let mut sparse = EmbeddingT::from_weights(w, true);
    for e in [&mut dense, &mut sparse] {
        e.accumulate(1, &[0.5, -0.5]);
        e.accumulate(3, &[1.0, 1.0]);
        e.accumulate(3, &[-0.25, 0.0]);
        e.sgd_step(0.1, 0.0);
    }
    assert_eq!(dense.w, sparse.w);
}

#[test]
fn train_run_writes_a_loadable_checkpoint() {
    let dir = std::env::temp_dir().join("factorec_train_run_test");
    fs::create_dir_all(&dir).unwrap();
    let data_path = dir.join("interactions.csv");
    let mut csv = String::new();
    for u in 0..6usize {
        for i in 0..5usize {
            if (u + i) % 2 == 0 {
                csv.push_str(&format!("{u},{i}\n"));
            }
        }
    }
    fs::write(&data_path, csv).unwrap();

    let config = TrainConfig {
        data: data_path.to_str().unwrap().to_string(),
        epochs: 2,
        batch_size: 8,
        embedding_dim: 4,
        loss: "bpr".to_string(),
        val_fraction: 0.2,
        checkpoint: dir.join("model.json").to_str().unwrap().to_string(),
        log_dir: Some(dir.join("runs").to_str().unwrap().to_string()),
        experiment: Some("test".to_string()),
        ..TrainConfig::default()
    };
    train::run(&config).unwrap();

    let model = load_model(&config.checkpoint).unwrap();
    assert_eq!(model.num_users(), 6);
    assert_eq!(model.num_items(), 5);
    assert!(dir.join("runs").join("test").join("metrics.jsonl").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_loss_is_rejected() {
    let config = TrainConfig {
        loss: "poisson".to_string(),
        ..TrainConfig::default()
    };
    assert!(train::run(&config).is_err());
}
