use crate::config::TrainConfig;
use crate::data::{DataLoader, Interactions};
use crate::logging::{Callback, CallbackSignal, EarlyStopping, Logger, MetricRecord};
use crate::metrics;
use crate::models::{Hyperparameters, MatrixFactorization};
use crate::optim::{
    self, Adam, ConstantLr, CosineLr, LearningRateSchedule, LossKind, LrScheduleConfig, Optimizer,
    PlateauLr, StepLr, SGD,
};
use crate::rng::rng_from_env;
use crate::weights::save_model;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::Rng;
use std::io;

fn make_optimizer(name: &str, lr: f32, weight_decay: f32) -> io::Result<Box<dyn Optimizer>> {
    match name {
        "adam" => Ok(Box::new(Adam::new(lr, weight_decay))),
        "sgd" => Ok(Box::new(SGD::new(lr, weight_decay))),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown optimizer {name:?}"),
        )),
    }
}

/// Train a matrix factorization model according to `config`.
///
/// Loads interactions, splits off a validation set, then runs the
/// epoch/batch loop: training forward, loss gradient, backward, optimizer
/// step(s).  The best model by validation loss is checkpointed; early
/// stopping and the learning-rate schedule both watch the same value.
pub fn run(config: &TrainConfig) -> io::Result<()> {
    let loss_kind = LossKind::parse(&config.loss).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown loss {:?}", config.loss),
        )
    })?;

    let interactions = Interactions::from_csv(&config.data)?;
    if interactions.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no interactions in {}", config.data),
        ));
    }
    let num_users = interactions.num_users();
    let num_items = interactions.num_items();

    let mut rng = rng_from_env();
    let (train_set, val_set) = interactions.split(config.val_fraction, &mut rng);

    let hparams = Hyperparameters {
        embedding_dim: config.embedding_dim,
        dropout_p: config.dropout_p,
        sparse: config.sparse,
        y_range: config.y_range,
    };
    let mut model = MatrixFactorization::new(num_users, num_items, hparams);

    let base_lr = config.lr;
    let bias_base_lr = config.bias_lr.unwrap_or(config.lr);
    let mut emb_opt = make_optimizer(&config.optimizer, base_lr, config.weight_decay)?;
    let mut bias_opt = match &config.bias_optimizer {
        Some(name) => Some(make_optimizer(name, bias_base_lr, config.weight_decay)?),
        None => None,
    };

    let mut schedule: Option<Box<dyn LearningRateSchedule>> = None;
    let mut plateau: Option<PlateauLr> = None;
    match config.lr_schedule {
        LrScheduleConfig::Constant => schedule = Some(Box::new(ConstantLr::new(base_lr))),
        LrScheduleConfig::Step { step_size, gamma } => {
            schedule = Some(Box::new(StepLr::new(base_lr, step_size, gamma)))
        }
        LrScheduleConfig::Cosine { max_steps } => {
            schedule = Some(Box::new(CosineLr::new(base_lr, max_steps)))
        }
        LrScheduleConfig::Plateau { factor, patience } => {
            plateau = Some(PlateauLr::new(base_lr, factor, patience))
        }
    }

    let mut logger = Logger::new(config.log_dir.clone(), config.experiment.clone())?;
    let mut callbacks: Vec<Box<dyn Callback>> = vec![Box::new(EarlyStopping::new(config.patience))];
    for c in callbacks.iter_mut() {
        c.on_train_begin();
    }

    let pb = ProgressBar::new(config.epochs as u64);
    let mut best_val: Option<f32> = None;
    let mut step = 0usize;
    let mut stop = false;

    'epochs: for epoch in 0..config.epochs {
        for c in callbacks.iter_mut() {
            c.on_epoch_begin(epoch);
        }

        let loader = DataLoader::new(
            train_set.samples().to_vec(),
            config.batch_size,
            true,
            &mut rng,
        );
        let mut epoch_loss = 0.0f32;
        let mut batches = 0.0f32;
        for batch in loader {
            if let Some(s) = &schedule {
                let lr = s.next_lr(step);
                emb_opt.set_lr(lr);
                if let Some(b) = bias_opt.as_mut() {
                    b.set_lr(bias_base_lr * lr / base_lr);
                }
            }
            step += 1;

            let users: Vec<usize> = batch.iter().map(|s| s.user).collect();
            let items: Vec<usize> = batch.iter().map(|s| s.item).collect();

            model.zero_grad();
            let loss = if loss_kind.pairwise() {
                // Positives and sampled negatives run as one batch so the
                // backward cache is written exactly once.
                let negatives: Vec<usize> =
                    (0..users.len()).map(|_| rng.gen_range(0..num_items)).collect();
                let mut all_users = users.clone();
                all_users.extend_from_slice(&users);
                let mut all_items = items.clone();
                all_items.extend_from_slice(&negatives);
                let preds = model.forward_train(&all_users, &all_items);
                let (pos, neg) = preds.split_at(users.len());
                let (loss, dpos, mut dneg) = match loss_kind {
                    LossKind::Hinge => optim::hinge_loss(pos, neg),
                    LossKind::Bpr => optim::bpr_loss(pos, neg),
                    LossKind::Mse => unreachable!(),
                };
                let mut dscore = dpos;
                dscore.append(&mut dneg);
                model.backward(&dscore);
                loss
            } else {
                let ratings: Vec<f32> = batch.iter().map(|s| s.rating).collect();
                let preds = model.forward_train(&users, &items);
                let (loss, dpred) = optim::mse_loss(&preds, &ratings);
                model.backward(&dpred);
                loss
            };

            emb_opt.step(&mut model.embedding_parameters());
            match bias_opt.as_mut() {
                Some(b) => b.step(&mut model.bias_parameters()),
                None => emb_opt.step(&mut model.bias_parameters()),
            }

            epoch_loss += loss;
            batches += 1.0;
            let record = MetricRecord {
                epoch,
                step,
                loss,
                auc: 0.0,
                lr: emb_opt.lr(),
                kind: "train",
            };
            logger.log(&record);
            for c in callbacks.iter_mut() {
                if let CallbackSignal::Stop = c.on_batch_end(&record) {
                    stop = true;
                    break 'epochs;
                }
            }
        }
        let train_loss = epoch_loss / batches.max(1.0);

        if val_set.is_empty() {
            save_model(&config.checkpoint, &model)?;
            pb.set_message(format!("epoch {epoch} loss {train_loss:.4}"));
            pb.inc(1);
            continue;
        }

        let (val_loss, val_auc) = evaluate(&model, &val_set, loss_kind, num_items, &mut rng);
        let record = MetricRecord {
            epoch,
            step,
            loss: val_loss,
            auc: val_auc,
            lr: emb_opt.lr(),
            kind: "val",
        };
        logger.log(&record);

        if best_val.map_or(true, |b| val_loss < b) {
            best_val = Some(val_loss);
            save_model(&config.checkpoint, &model)?;
        }

        if let Some(p) = plateau.as_mut() {
            let lr = p.observe(val_loss);
            emb_opt.set_lr(lr);
            if let Some(b) = bias_opt.as_mut() {
                b.set_lr(bias_base_lr * lr / base_lr);
            }
        }

        pb.set_message(format!(
            "epoch {epoch} loss {train_loss:.4} val {val_loss:.4} auc {val_auc:.4}"
        ));
        pb.inc(1);

        for c in callbacks.iter_mut() {
            if let CallbackSignal::Stop = c.on_epoch_end(&record) {
                stop = true;
                break 'epochs;
            }
        }
    }
    if stop {
        pb.abandon_with_message("stopped early");
    } else {
        pb.finish_with_message("training done");
    }
    for c in callbacks.iter_mut() {
        c.on_train_end();
    }
    Ok(())
}

/// Validation loss and sampled ranking AUC on held-out interactions.
fn evaluate(
    model: &MatrixFactorization,
    val: &Interactions,
    loss_kind: LossKind,
    num_items: usize,
    rng: &mut StdRng,
) -> (f32, f32) {
    let users: Vec<usize> = val.samples().iter().map(|s| s.user).collect();
    let items: Vec<usize> = val.samples().iter().map(|s| s.item).collect();
    let preds = model.forward(&users, &items);

    let negatives: Vec<usize> = (0..users.len()).map(|_| rng.gen_range(0..num_items)).collect();
    let neg_preds = model.forward(&users, &negatives);

    let loss = match loss_kind {
        LossKind::Mse => {
            let ratings: Vec<f32> = val.samples().iter().map(|s| s.rating).collect();
            metrics::mse(&preds, &ratings)
        }
        LossKind::Hinge => optim::hinge_loss(&preds, &neg_preds).0,
        LossKind::Bpr => optim::bpr_loss(&preds, &neg_preds).0,
    };
    (loss, metrics::auc(&preds, &neg_preds))
}
