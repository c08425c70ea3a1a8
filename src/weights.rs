use crate::layers::EmbeddingT;
use crate::math::Matrix;
use crate::models::{Hyperparameters, MatrixFactorization};
use serde::{Deserialize, Serialize};
use std::{fs, io};

/// On-disk layout of a model checkpoint: the hyperparameters plus all
/// four parameter tables.  User/item counts are recovered from the table
/// shapes, so loading needs no construction arguments.
#[derive(Serialize, Deserialize)]
pub struct ModelJson {
    pub hparams: Hyperparameters,
    pub user_embeddings: Vec<Vec<f32>>,
    pub item_embeddings: Vec<Vec<f32>>,
    pub user_biases: Vec<f32>,
    pub item_biases: Vec<f32>,
}

/// Convert a [`Matrix`] into a 2-D `Vec` for serialisation.
pub fn matrix_to_vec2(m: &Matrix) -> Vec<Vec<f32>> {
    (0..m.rows)
        .map(|r| (0..m.cols).map(|c| m.get(r, c)).collect())
        .collect()
}

/// Convert a 2-D `Vec` into a [`Matrix`].
pub fn vec2_to_matrix(rows: &[Vec<f32>]) -> Matrix {
    if rows.is_empty() || rows[0].is_empty() {
        return Matrix::zeros(0, 0);
    }
    let r = rows.len();
    let c = rows[0].len();
    let mut mat = Matrix::zeros(r, c);
    for (i, row) in rows.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            mat.set(i, j, val);
        }
    }
    mat
}

pub fn save_model(path: &str, model: &MatrixFactorization) -> Result<(), io::Error> {
    let json = ModelJson {
        hparams: model.hparams.clone(),
        user_embeddings: matrix_to_vec2(&model.user_embeddings.w),
        item_embeddings: matrix_to_vec2(&model.item_embeddings.w),
        user_biases: model.user_biases.w.data.clone(),
        item_biases: model.item_biases.w.data.clone(),
    };
    let txt = serde_json::to_string(&json).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, txt)?;
    println!("Saved model to {}", path);
    Ok(())
}

pub fn load_model(path: &str) -> Result<MatrixFactorization, io::Error> {
    let txt = fs::read_to_string(path)?;
    let json: ModelJson =
        serde_json::from_str(&txt).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let num_users = json.user_embeddings.len();
    let num_items = json.item_embeddings.len();
    if json.user_biases.len() != num_users || json.item_biases.len() != num_items {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "bias lengths do not match embedding table sizes",
        ));
    }

    let sparse = json.hparams.sparse;
    let mut model = MatrixFactorization::new(num_users, num_items, json.hparams);
    model.user_embeddings = EmbeddingT::from_weights(vec2_to_matrix(&json.user_embeddings), sparse);
    model.item_embeddings = EmbeddingT::from_weights(vec2_to_matrix(&json.item_embeddings), sparse);
    model.user_biases =
        EmbeddingT::from_weights(Matrix::from_vec(num_users, 1, json.user_biases), sparse);
    model.item_biases =
        EmbeddingT::from_weights(Matrix::from_vec(num_items, 1, json.item_biases), sparse);
    println!("Loaded model from {}", path);
    Ok(model)
}
