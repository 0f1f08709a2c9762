use sentiment_head::data::csv::parse_csv;
use sentiment_head::layers::dense::Dense;
use sentiment_head::train::{prepare_datasets, run_training};
use sentiment_head::{
    BasicNormalizer, ClassifierHead, EmbeddingDataset, Error, HashingEmbedder, LabelTable, LoopOptions, Matrix,
    SavedModel, TrainConfig, TrainingSession, train_loop,
};

fn two_point_dataset() -> EmbeddingDataset {
    EmbeddingDataset::new(vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0, 1.0]], vec![2, 0])
        .expect("dataset")
}

fn two_point_config() -> TrainConfig {
    TrainConfig {
        embedding_dim: 4,
        hidden_dim: 2,
        dropout_prob: 0.0,
        batch_size: 2,
        learning_rate: 0.01,
        num_epochs: 50,
        ..TrainConfig::default()
    }
}

fn memorizes(config: TrainConfig, ds: &EmbeddingDataset) -> bool {
    let mut session = TrainingSession::new(config).expect("session");
    let reports = train_loop(&mut session, ds, ds, &LoopOptions::default()).expect("run");
    reports.last().is_some_and(|r| r.train_acc == 1.0 && r.eval_acc == 1.0)
}

#[test]
fn memorizes_two_linearly_separable_points() {
    let ds = two_point_dataset();
    let mut session = TrainingSession::new(two_point_config()).expect("session");

    let reports = train_loop(&mut session, &ds, &ds, &LoopOptions::default()).expect("run");

    assert_eq!(reports.len(), 50);
    let last = reports.last().expect("report");
    assert_eq!(last.train_acc, 1.0);
    assert_eq!(last.eval_acc, 1.0);
    assert!(last.train_loss < reports[0].train_loss);
}

#[test]
fn memorization_holds_across_seeds() {
    // Two ReLU units can both start dead on both points, so a few seeds
    // are expected to miss.
    let ds = two_point_dataset();
    let hits = (0..50)
        .filter(|&seed| memorizes(TrainConfig { random_seed: seed, ..two_point_config() }, &ds))
        .count();
    assert!(hits >= 40, "only {hits}/50 seeds memorized both points");
}

#[test]
fn an_epoch_over_a_non_degenerate_batch_moves_parameters() {
    let ds = two_point_dataset();
    let config = TrainConfig { num_epochs: 1, ..two_point_config() };
    let mut session = TrainingSession::new(config).expect("session");
    let before = session.head().clone();
    let mut loader = session.train_loader(&ds).expect("loader");
    let metrics = session.train_epoch(&mut loader).expect("epoch");
    assert_ne!(session.head(), &before);
    assert!(metrics.loss >= 0.0);
}

#[test]
fn numeric_overflow_aborts_the_run_and_names_the_epoch() {
    let ds = two_point_dataset();
    let hidden = Dense { weights: Matrix::from_data(vec![vec![1e308; 2]; 4]), biases: Matrix::zeros(1, 2) };
    let output = Dense { weights: Matrix::from_data(vec![vec![1e308; 3]; 2]), biases: Matrix::zeros(1, 3) };
    let head = ClassifierHead::from_layers(hidden, output, 0.0).expect("head");
    let mut session = TrainingSession::with_head(two_point_config(), head).expect("session");

    match train_loop(&mut session, &ds, &ds, &LoopOptions::default()) {
        Err(Error::EpochAborted { epoch, completed, source }) => {
            assert_eq!(epoch, 1);
            assert!(completed.is_empty());
            assert!(matches!(*source, Error::NumericInstability { batch: 0, .. }));
        }
        other => panic!("expected an aborted epoch, got {other:?}"),
    }
}

const TWEETS: &str = "\
text,sentiment
\"@airline thank you, the crew was amazing!\",positive
Loved the smooth flight and friendly staff,positive
great service and an early arrival,positive
best airline experience in years,positive
wonderful crew and comfy seats,positive
my bag is lost again. terrible,negative
\"delayed 4 hours, no explanation\",negative
rude gate agent and a broken seat,negative
worst customer service ever,negative
cancelled flight and no refund,negative
what time does boarding start,neutral
is there wifi on the flight to denver,neutral
flight 123 departs from gate b4,neutral
do you fly to boston on sundays,neutral
checking in online now,neutral
";

#[test]
fn csv_to_saved_model_to_prediction() {
    let labels = LabelTable::sentiment();
    let records = parse_csv(TWEETS, &labels).expect("csv");
    assert_eq!(records.len(), 15);

    let config = TrainConfig {
        embedding_dim: 64,
        hidden_dim: 16,
        batch_size: 4,
        num_epochs: 20,
        learning_rate: 0.01,
        test_fraction: 0.2,
        random_seed: 17,
        ..TrainConfig::default()
    };
    let embedder = HashingEmbedder::new(config.embedding_dim).expect("embedder");
    let (train, test) = prepare_datasets(records, &config, &BasicNormalizer, &embedder).expect("split");
    assert_eq!((train.len(), test.len()), (12, 3));

    let outcome = run_training(config, &train, &test, &LoopOptions::default()).expect("run");
    assert_eq!(outcome.reports.len(), 20);
    assert!(outcome.reports.iter().enumerate().all(|(i, r)| r.epoch == i + 1));

    let path = std::env::temp_dir().join(format!("sentiment-head-e2e-{}.json", std::process::id()));
    outcome.model.save_json(&path).expect("save");
    let loaded = SavedModel::load_json(&path).expect("load");
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, outcome.model);

    let before = outcome.model.clone().into_service().expect("service");
    let after = loaded.into_service().expect("service");
    for text in ["the crew was amazing", "lost my bag", "gate b4?", ""] {
        let p = after.predict(text).expect("prediction");
        assert!(labels.index_of(&p.label).is_some());
        assert_eq!(p, before.predict(text).expect("prediction"));
    }
}

#[test]
fn same_seed_reproduces_the_metrics_stream() {
    let labels = LabelTable::sentiment();
    let config = TrainConfig {
        embedding_dim: 32,
        hidden_dim: 8,
        batch_size: 4,
        num_epochs: 5,
        random_seed: 3,
        ..TrainConfig::default()
    };
    let embedder = HashingEmbedder::new(32).expect("embedder");
    let run = || {
        let records = parse_csv(TWEETS, &labels).expect("csv");
        let (train, test) = prepare_datasets(records, &config, &BasicNormalizer, &embedder).expect("split");
        run_training(config.clone(), &train, &test, &LoopOptions::default()).expect("run").reports
    };
    assert_eq!(run(), run());
}
