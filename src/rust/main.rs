use emotive::{
    scorer::global, AppConfig, Args, BuiltinModel, EmotionClassifier, EmotionModel, ModelManager,
    ScoreError,
};
use emotive::web::{self, AppState};
use log::info;
use clap::Parser;
use std::time::Instant;

const MODEL: BuiltinModel = BuiltinModel::DistilBertEmotion;

async fn ensure_model_downloaded(manager: &ModelManager, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(MODEL)?;
    }

    manager.ensure_model_downloaded(MODEL).await?;
    Ok(())
}

fn print_analysis(text: &str) -> anyhow::Result<()> {
    let scorer = global::get().ok_or_else(|| anyhow::anyhow!("scorer not initialized"))?;

    match scorer.analyze(text) {
        Ok(analysis) => {
            print!("{}", analysis.report());
            Ok(())
        }
        Err(ScoreError::EmptyInput) => {
            eprintln!("{}", ScoreError::EmptyInput);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emotive::init_logger();
    let config = AppConfig::from_args(Args::parse());

    let manager = ModelManager::new(&config.models_dir)?;
    ensure_model_downloaded(&manager, config.fresh).await?;

    let start_time = Instant::now();
    info!("Loading emotion classifier...");
    let classifier = EmotionClassifier::builder()
        .with_runtime_config(config.runtime.clone())
        .with_model_from(&manager, MODEL)?
        .build()?;
    info!(
        "Classifier loaded in {:.2?} with labels {:?}",
        start_time.elapsed(),
        classifier.labels()
    );

    let scorer = global::init(Box::new(classifier))?;

    if let Some(text) = config.text.as_deref() {
        return print_analysis(text);
    }

    web::serve(config.addr, AppState::new(scorer)).await?;
    Ok(())
}
