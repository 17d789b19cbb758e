use pageguard::message::{read_frame, write_frame};
use pageguard::model::Silent;
use pageguard::{AnalysisMode, LabeledText, ModelConfig, Response, TrainConfig, TrainingPipeline};
use pageguard_host::cli::host_cmd::build_analyzer;
use pageguard_host::config::GuardConfig;
use pageguard_host::host::{serve, HostStats};
use std::path::Path;

fn train_tiny_model(dir: &Path) {
    let mut rows = Vec::new();
    for i in 0..40 {
        let (text, label) = if i % 2 == 0 {
            ("vile nasty rotten words", 1)
        } else {
            ("sunny gentle lovely garden", 0)
        };
        rows.push(LabeledText {
            text: text.to_string(),
            label,
        });
    }
    let config = TrainConfig {
        epochs: 80,
        learning_rate: 0.01,
        batch_size: 8,
        ..TrainConfig::default()
    };
    TrainingPipeline::new(ModelConfig::default(), config)
        .train_rows(&rows, dir, &mut Silent)
        .unwrap();
}

async fn session(
    config: &GuardConfig,
    mode: AnalysisMode,
    texts: &[&str],
) -> (HostStats, Vec<Response>) {
    let mut input = Vec::new();
    for text in texts {
        let body = serde_json::json!({ "action": "analyze", "text": text }).to_string();
        write_frame(&mut input, body.as_bytes()).await.unwrap();
    }

    let analyzer = build_analyzer(config, None, Some(mode));
    let mut reader: &[u8] = &input;
    let mut output = Vec::new();
    let stats = serve(&mut reader, &mut output, &analyzer).await.unwrap();

    let mut replies = Vec::new();
    let mut out: &[u8] = &output;
    while let Some(frame) = read_frame(&mut out).await.unwrap() {
        replies.push(serde_json::from_slice(&frame).unwrap());
    }
    (stats, replies)
}

#[tokio::test]
async fn keyword_session_uses_configured_keywords() {
    let config = GuardConfig::parse("keywords = [\"Scam\"]").unwrap();
    let (stats, replies) = session(
        &config,
        AnalysisMode::Keywords,
        &["this is a SCAM", "I hate mondays"],
    )
    .await;

    assert_eq!(stats.answered, 2);
    assert_eq!(stats.harmful, 1);
    assert!(replies[0].is_harmful);
    assert_eq!(replies[0].matched, vec!["scam"]);
    assert!(!replies[1].is_harmful);
}

#[tokio::test]
async fn model_session_scores_with_trained_model() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("model");
    train_tiny_model(&model_dir);

    let config = GuardConfig {
        model_dir: Some(model_dir),
        ..GuardConfig::default()
    };
    let (stats, replies) = session(
        &config,
        AnalysisMode::Model,
        &["rotten vile words", "a lovely sunny garden"],
    )
    .await;

    assert_eq!(stats.received, 2);
    assert!(replies[0].is_harmful);
    assert!(!replies[1].is_harmful);
    assert!(replies[0].score.unwrap() > 0.5);
}

#[tokio::test]
async fn missing_model_answers_neutral() {
    let dir = tempfile::tempdir().unwrap();
    let config = GuardConfig {
        model_dir: Some(dir.path().join("absent")),
        ..GuardConfig::default()
    };
    let (_, replies) = session(&config, AnalysisMode::Model, &["anything at all"]).await;
    assert!(!replies[0].is_harmful);
    assert_eq!(replies[0].score, Some(0.5));
}
