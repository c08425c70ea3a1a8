pub mod dataloader;
pub mod interactions;

pub use dataloader::DataLoader;
pub use interactions::{Interaction, Interactions};
