//! Contextual Agency CLI
//!
//! Reads field names from stdin, one per line, and prints how each would be
//! rendered. Compares the keyword rules with the language model by default.

use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use contextual_agency::utils::{init_logging, logging::DEFAULT_FILTER};
use contextual_agency::{ClassifierOrchestrator, EngineConfig, FieldDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Rules,
    Compare,
    Generative,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONTEXTUAL_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("contextual.yaml"));
    let (config, source) = EngineConfig::load_with_source(&config_path)?;
    let config = config.apply_env()?;
    let _log_guard = init_logging(DEFAULT_FILTER, config.log_dir.as_deref())?;
    info!(target: "contextual::core", "Config {}", source);

    let orchestrator = ClassifierOrchestrator::new(config.rules_classifier(), config.generative_classifier()?);
    info!(
        target: "contextual::core",
        "Engine ready (model: {}, geo policy: {:?}, max turns: {:?})",
        config.provider.model,
        config.geo_policy,
        config.max_turns
    );

    println!("\n{}", "═".repeat(60));
    println!("Contextual Agency v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));
    println!("Commands: 'quit' | 'rules' | 'compare' | 'generative'\n");

    let mut mode = if orchestrator.generative_available() { Mode::Compare } else { Mode::Rules };
    let mut reported_unavailable = false;

    loop {
        print!("field> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "rules" => {
                mode = Mode::Rules;
                println!("Mode: rules\n");
                continue;
            }
            "compare" => {
                mode = Mode::Compare;
                println!("Mode: compare\n");
                continue;
            }
            "generative" => {
                mode = Mode::Generative;
                println!("Mode: generative\n");
                continue;
            }
            _ => {}
        }

        let descriptor = FieldDescriptor::new(line);
        match mode {
            Mode::Rules => {
                let timed = orchestrator.run_single(orchestrator.rules(), &descriptor).await?;
                println!("{}", serde_json::to_string_pretty(&timed.decision)?);
                println!("{}\n", timed.log_line(&descriptor.name));
            }
            Mode::Compare => {
                let comparison = orchestrator.compare(&descriptor).await;
                println!("{}", serde_json::to_string_pretty(&comparison)?);
                for timed in comparison.rules.iter().chain(comparison.generative.iter()) {
                    println!("{}", timed.log_line(&descriptor.name));
                }
                println!("{}\n", comparison.summary());
            }
            Mode::Generative => match orchestrator.classify_generative(&descriptor).await {
                Ok(timed) => {
                    println!("{}", serde_json::to_string_pretty(&timed.decision)?);
                    println!("{}\n", timed.log_line(&descriptor.name));
                }
                Err(e) => {
                    println!("Error: {}", e);
                    if let Some(hint) = e.recovery_hint() {
                        println!("Hint: {}", hint);
                    }
                    let decision = orchestrator.classify_rules(&descriptor).await;
                    println!("{}\n", serde_json::to_string_pretty(&decision)?);
                }
            },
        }

        if !reported_unavailable && config.enable_generative && !orchestrator.generative_available() {
            println!("Generative classification unavailable; continuing with rules only.\n");
            reported_unavailable = true;
            mode = Mode::Rules;
        }
    }

    println!("\nGoodbye!\n");
    Ok(())
}
