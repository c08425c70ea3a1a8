use factorec::config::TrainConfig;
use factorec::{predict, train};

use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <mode> [...]", args[0]);
        eprintln!("Modes: train [config] | predict <model> <user> [k] | similar <model> <item> [k]");
        return;
    }

    let mode = args[1].as_str();
    let result = match mode {
        "train" => {
            let config = match args.get(2) {
                Some(path) => TrainConfig::from_path(path).unwrap_or_else(|| {
                    eprintln!("could not parse {path}, using defaults");
                    TrainConfig::default()
                }),
                None => TrainConfig::default(),
            };
            train::run(&config)
        }
        "predict" => {
            let path = args.get(2).map(|s| s.as_str()).unwrap_or("model.json");
            let user = parse_id(args.get(3), "user");
            let k = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(10);
            predict::run(path, user, k)
        }
        "similar" => {
            let path = args.get(2).map(|s| s.as_str()).unwrap_or("model.json");
            let item = parse_id(args.get(3), "item");
            let k = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(10);
            predict::run_similar(path, item, k)
        }
        _ => {
            eprintln!("Unknown mode {}", mode);
            return;
        }
    };
    if let Err(e) = result {
        eprintln!("{mode} failed: {e}");
        std::process::exit(1);
    }
}

fn parse_id(arg: Option<&String>, what: &str) -> usize {
    match arg.and_then(|s| s.parse().ok()) {
        Some(id) => id,
        None => {
            eprintln!("provide a numeric {what} id");
            std::process::exit(2);
        }
    }
}
