//! Integration test: database to saved model

use disaster_triage::evaluation::category_reports;
use disaster_triage::export::{load_model, save_model};
use disaster_triage::optimizer::{GridSearchCV, ParamGrid};
use disaster_triage::training::{train_test_split, PipelineConfig, TriagePipeline};
use disaster_triage::utils::{LoaderConfig, MessageLoader};
use rusqlite::{params, Connection};
use std::path::Path;
use tempfile::tempdir;

const MESSAGES: [(&str, i64, i64); 10] = [
    ("We need clean drinking water in Leogane", 1, 0),
    ("No water since the earthquake, please help", 1, 0),
    ("Water trucks have not arrived at the camp", 1, 0),
    ("Children are thirsty, we need water", 1, 0),
    ("Send bottled water to Carrefour", 1, 0),
    ("The hospital is full of injured people", 0, 1),
    ("Many injured people need medical care", 0, 1),
    ("Doctors needed for the injured in Jacmel", 0, 1),
    ("Medical supplies for injured victims please", 0, 1),
    ("Injured man needs a doctor urgently", 0, 1),
];

fn create_database(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE message_table (
            id INTEGER PRIMARY KEY,
            message TEXT,
            original TEXT,
            genre TEXT,
            water INTEGER,
            medical_help INTEGER
        );",
    )
    .unwrap();

    for (i, (message, water, medical)) in MESSAGES.iter().enumerate() {
        conn.execute(
            "INSERT INTO message_table VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![i as i64, message, message, "direct", water, medical],
        )
        .unwrap();
    }
}

fn loader() -> MessageLoader {
    MessageLoader::new(LoaderConfig::default().with_label_range("water", "medical_help"))
}

fn small_config() -> PipelineConfig {
    PipelineConfig::default().with_n_estimators(10).with_random_state(42)
}

#[test]
fn test_toy_database_predict_shape() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("toy.db");
    create_database(&db);

    let corpus = loader().load(&db).unwrap();
    assert_eq!(corpus.labels.dim(), (10, 2));

    let mut search = GridSearchCV::new(small_config(), ParamGrid::default())
        .with_category_names(corpus.category_names.clone());
    let model = search.fit(&corpus.messages, &corpus.labels).unwrap();

    let predictions = model.predict(&corpus.messages).unwrap();
    assert_eq!(predictions.dim(), (10, 2));
    assert!(predictions.iter().all(|&v| v == 0.0 || v == 1.0));
    assert_eq!(model.category_names(), &["water", "medical_help"]);
    assert_eq!(search.results().len(), 2);
}

#[test]
fn test_split_train_evaluate() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("toy.db");
    create_database(&db);

    let corpus = loader().load(&db).unwrap();
    let (train_idx, test_idx) = train_test_split(corpus.len(), 0.2, Some(1)).unwrap();
    assert_eq!(train_idx.len(), 8);
    assert_eq!(test_idx.len(), 2);

    let train = corpus.select(&train_idx);
    let test = corpus.select(&test_idx);

    let mut pipeline =
        TriagePipeline::new(small_config()).with_category_names(corpus.category_names.clone());
    pipeline.fit(&train.messages, &train.labels).unwrap();

    let predicted = pipeline.predict(&test.messages).unwrap();
    let reports = category_reports(&test.labels, &predicted, &corpus.category_names).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.report.support == 2));
}

#[test]
fn test_saved_model_predicts_identically() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("toy.db");
    let model_path = dir.path().join("classifier.bin");
    create_database(&db);

    let corpus = loader().load(&db).unwrap();
    let mut pipeline = TriagePipeline::new(small_config().with_ngram_range(1, 2))
        .with_category_names(corpus.category_names.clone());
    pipeline.fit(&corpus.messages, &corpus.labels).unwrap();

    save_model(&pipeline, &model_path).unwrap();
    let restored = load_model(&model_path).unwrap();

    let sample = vec![
        "water please".to_string(),
        "injured doctor".to_string(),
        "nothing relevant here".to_string(),
    ];
    assert_eq!(restored.predict(&sample).unwrap(), pipeline.predict(&sample).unwrap());
    assert_eq!(restored.config(), pipeline.config());
}

#[test]
fn test_seeded_training_is_reproducible() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("toy.db");
    create_database(&db);
    let corpus = loader().load(&db).unwrap();

    let fit = || {
        let mut pipeline = TriagePipeline::new(small_config());
        pipeline.fit(&corpus.messages, &corpus.labels).unwrap();
        pipeline.predict(&corpus.messages).unwrap()
    };

    assert_eq!(fit(), fit());
}
