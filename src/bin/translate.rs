use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;
use translation_engine::{EngineConfig, HttpTranslator, TranslationEngine, TranslationRequest};

/// One-shot translation from the command line.
///
/// Usage: translate <target_lang> <text> [source_lang]
///
/// Provider endpoint and engine tuning come from the environment (see
/// `EngineConfig::from_env`); the result is printed as JSON on stdout.
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_engine=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: translate <target_lang> <text> [source_lang]");
    }
    let target_lang = &args[0];
    let text = &args[1];
    let source_lang = args.get(2);

    let config = EngineConfig::from_env()?;
    let provider = Arc::new(HttpTranslator::new(
        config.provider_url.clone(),
        config.provider_api_key.clone(),
    ));
    let engine = TranslationEngine::new(config, provider)?;

    info!(%target_lang, "translating");
    let mut request = TranslationRequest::new(text.clone(), target_lang.clone());
    if let Some(source) = source_lang {
        request = request.with_source(source.clone());
    }

    let result = engine.translate(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        bail!(
            "translation failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}
