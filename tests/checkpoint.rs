use factorec::models::{Hyperparameters, MatrixFactorization};
use factorec::weights::{load_model, save_model};

#[test]
fn save_then_load_reproduces_predictions() {
    let hparams = Hyperparameters {
        embedding_dim: 6,
        dropout_p: 0.2,
        sparse: false,
        y_range: Some((1.0, 5.0)),
    };
    let model = MatrixFactorization::new(7, 11, hparams);
    let users = [0, 2, 6, 6, 3];
    let items = [10, 0, 5, 5, 7];
    let before = model.forward(&users, &items);

    let path = std::env::temp_dir().join("factorec_checkpoint_test.json");
    let path = path.to_str().unwrap();
    save_model(path, &model).unwrap();
    let restored = load_model(path).unwrap();
    let _ = std::fs::remove_file(path);

    assert_eq!(restored.num_users(), 7);
    assert_eq!(restored.num_items(), 11);
    assert_eq!(restored.hparams.y_range, Some((1.0, 5.0)));
    assert_eq!(restored.hparams.embedding_dim, 6);
    assert_eq!(before, restored.forward(&users, &items));
}

#[test]
fn saved_model_serves_recommendations_and_similarities() {
    use factorec::math::Matrix;
    use factorec::predict::{similar_items, top_k_for_user};

    let mut model = MatrixFactorization::new(2, 4, Hyperparameters::default());
    let dim = model.hparams.embedding_dim;
    // Item 3 duplicates item 1; item 0 points the opposite way.
    let mut items = Matrix::zeros(4, dim);
    items.set(0, 0, -1.0);
    items.set(1, 0, 1.0);
    items.set(2, 1, 1.0);
    items.set(3, 0, 1.0);
    model.item_embeddings.w = items;
    let mut users = Matrix::zeros(2, dim);
    users.set(0, 0, 1.0);
    model.user_embeddings.w = users;

    let path = std::env::temp_dir().join("factorec_predict_test.json");
    let path = path.to_str().unwrap();
    save_model(path, &model).unwrap();

    let top = top_k_for_user(path, 0, 2).unwrap();
    assert_eq!(top.len(), 2);
    let top_items: Vec<usize> = top.iter().map(|&(i, _)| i).collect();
    assert!(top_items.contains(&1) && top_items.contains(&3));

    let similar = similar_items(path, 1, 2).unwrap();
    let _ = std::fs::remove_file(path);
    assert_eq!(similar[0].0, 3);
    assert!((similar[0].1 - 1.0).abs() < 1e-6);
    assert!(!similar.iter().any(|&(i, _)| i == 1));
}

#[test]
fn load_of_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("factorec_no_such_checkpoint.json");
    assert!(load_model(path.to_str().unwrap()).is_err());
}
