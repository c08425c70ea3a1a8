pub mod matrix_factorization;

pub use matrix_factorization::{Hyperparameters, MatrixFactorization};
