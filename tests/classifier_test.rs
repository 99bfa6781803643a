use emotive::{BuiltinModel, ClassifierError, EmotionClassifier, EmotionScorer, ModelManager};
use std::sync::Arc;
use std::thread;

const MODEL: BuiltinModel = BuiltinModel::DistilBertEmotion;

// These tests need the model in the local cache; run `emotive --text hi` once to fetch it.
fn setup_test_classifier() -> Option<EmotionClassifier> {
    let manager = ModelManager::new_default().ok()?;
    if !manager.is_model_downloaded(MODEL) {
        eprintln!("DistilBERT emotion model not downloaded, skipping");
        return None;
    }
    Some(
        EmotionClassifier::builder()
            .with_model_from(&manager, MODEL)
            .expect("Failed to load model")
            .build()
            .expect("Failed to create classifier"),
    )
}

#[test]
fn test_happy_text_is_joy() -> Result<(), Box<dyn std::error::Error>> {
    let Some(classifier) = setup_test_classifier() else { return Ok(()) };
    let scorer = EmotionScorer::new(classifier);

    let analysis = scorer.analyze("I am so happy today!")?;
    assert_eq!(analysis.dominant.label, "joy");
    assert!(analysis.dominant.score > 0.5);
    Ok(())
}

#[test]
fn test_scores_cover_every_label() -> Result<(), Box<dyn std::error::Error>> {
    let Some(classifier) = setup_test_classifier() else { return Ok(()) };
    let labels = classifier.info().labels;

    let scores = classifier.classify("My dog ran away and I miss him terribly.")?;
    let scored: Vec<&str> = scores.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(scored, labels.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));

    let total: f32 = scores.iter().map(|s| s.score).sum();
    assert!((total - 1.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_classification_is_repeatable() -> Result<(), Box<dyn std::error::Error>> {
    let Some(classifier) = setup_test_classifier() else { return Ok(()) };
    let first = classifier.classify("That noise in the basement scared me.")?;
    let second = classifier.classify("That noise in the basement scared me.")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_empty_text_rejected() {
    let Some(classifier) = setup_test_classifier() else { return };
    assert!(matches!(classifier.classify(""), Err(ClassifierError::ValidationError(_))));
}

#[test]
fn test_long_text_is_truncated() -> Result<(), Box<dyn std::error::Error>> {
    let Some(classifier) = setup_test_classifier() else { return Ok(()) };
    let very_long_text = "today was wonderful and I loved every minute of it ".repeat(200);

    let token_count = classifier.count_tokens(&very_long_text)?;
    assert_eq!(token_count, 512, "Expected tokenizer to truncate at 512 tokens");
    assert!(classifier.classify(&very_long_text).is_ok());
    Ok(())
}

#[test]
fn test_thread_safety() {
    let Some(classifier) = setup_test_classifier() else { return };
    let classifier = Arc::new(classifier);
    let mut handles = vec![];

    for _ in 0..3 {
        let classifier = Arc::clone(&classifier);
        handles.push(thread::spawn(move || {
            let result = classifier.classify("test text");
            assert!(result.is_ok());
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_classifier_info() {
    let Some(classifier) = setup_test_classifier() else { return };
    let info = classifier.info();
    assert_eq!(info.num_labels, 6);
    assert_eq!(info.max_sequence_length, 512);
    for label in ["sadness", "joy", "love", "anger", "fear", "surprise"] {
        assert!(info.labels.iter().any(|l| l == label), "missing label {}", label);
    }
}
