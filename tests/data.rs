use factorec::data::{DataLoader, Interactions};
use factorec::rng::rng_from_env;
use std::fs;

#[test]
fn dataloader_covers_every_sample_once() {
    let mut rng = rng_from_env();
    let data: Vec<usize> = (0..10).collect();
    let batches: Vec<Vec<usize>> = DataLoader::new(data, 3, true, &mut rng).collect();
    let lens: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(lens, vec![3, 3, 3, 1]);
    let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<usize>>());
}

#[test]
fn dataloader_preserves_order_without_shuffle() {
    let mut rng = rng_from_env();
    let batches: Vec<Vec<usize>> = DataLoader::new(vec![5, 6, 7, 8], 2, false, &mut rng).collect();
    assert_eq!(batches, vec![vec![5, 6], vec![7, 8]]);
}

#[test]
fn interactions_from_csv_parses_counts_and_ratings() {
    let path = std::env::temp_dir().join("factorec_data_test.csv");
    fs::write(&path, "0,0,5.0\n1,2\n").unwrap();
    let interactions = Interactions::from_csv(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(interactions.len(), 2);
    assert_eq!(interactions.num_users(), 2);
    assert_eq!(interactions.num_items(), 3);
    assert_eq!(interactions.samples()[0].rating, 5.0);
    // Missing rating column means implicit feedback.
    assert_eq!(interactions.samples()[1].rating, 1.0);
}

#[test]
fn malformed_csv_row_is_an_error() {
    let path = std::env::temp_dir().join("factorec_bad_data_test.csv");
    fs::write(&path, "0,0\nnot,numbers\n").unwrap();
    let result = Interactions::from_csv(&path);
    let _ = fs::remove_file(&path);
    assert!(result.is_err());
}

#[test]
fn split_keeps_full_id_space_on_both_halves() {
    let path = std::env::temp_dir().join("factorec_split_test.csv");
    fs::write(&path, "0,0\n1,1\n2,2\n3,3\n").unwrap();
    let interactions = Interactions::from_csv(&path).unwrap();
    let _ = fs::remove_file(&path);

    let mut rng = rng_from_env();
    let (train, val) = interactions.split(0.25, &mut rng);
    assert_eq!(train.len(), 3);
    assert_eq!(val.len(), 1);
    assert_eq!(train.num_users(), 4);
    assert_eq!(val.num_users(), 4);
    assert_eq!(val.num_items(), 4);
}
