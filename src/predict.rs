use crate::math;
use crate::weights::load_model;
use std::io;

/// Rank every item for `user` and return the `k` best `(item, score)`
/// pairs.
pub fn top_k_for_user(path: &str, user: usize, k: usize) -> io::Result<Vec<(usize, f32)>> {
    let model = load_model(path)?;
    let n = model.num_items();
    let users = vec![user; n];
    let items: Vec<usize> = (0..n).collect();
    let scores = model.forward(&users, &items);
    let mut ranked: Vec<(usize, f32)> = items.into_iter().zip(scores).collect();
    ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    Ok(ranked)
}

/// The `k` nearest neighbours of `item` by cosine similarity over the
/// extracted item embeddings, the item itself excluded.
pub fn similar_items(path: &str, item: usize, k: usize) -> io::Result<Vec<(usize, f32)>> {
    let model = load_model(path)?;
    let emb = model.item_embedding_matrix();
    let query = emb.row(item);
    let mut ranked: Vec<(usize, f32)> = (0..emb.rows)
        .filter(|&other| other != item)
        .map(|other| (other, math::cosine(query, emb.row(other))))
        .collect();
    ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    Ok(ranked)
}

pub fn run(path: &str, user: usize, k: usize) -> io::Result<()> {
    for (item, score) in top_k_for_user(path, user, k)? {
        println!("{item}\t{score:.4}");
    }
    Ok(())
}

pub fn run_similar(path: &str, item: usize, k: usize) -> io::Result<()> {
    for (other, sim) in similar_items(path, item, k)? {
        println!("{other}\t{sim:.4}");
    }
    Ok(())
}
