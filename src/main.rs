use std::{
    fs,
    io::{BufRead, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};

use crivo::{
    bureau::HttpBureauClient,
    classifier::ThresholdClassifier,
    cli::{CliArgs, args_from_env},
    config::Config,
    logging::init_tracing,
    notify::LogNotifier,
    pipeline::{
        ClientInput, OnboardingReply, Orchestrator, PipelineSettings, RunOutcome, SessionHandle,
        StartOutcome,
    },
    retrieval::HttpRetrievalClient,
    store::{JsonFileStore, MemoryStore, StorePort},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = args_from_env()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let _logging_guard = init_tracing(&config.logging)?;

    let input_content = fs::read_to_string(&args.input_path)
        .with_context(|| format!("failed to read {}", args.input_path.display()))?;
    let input: ClientInput = serde_json::from_str(&input_content)
        .with_context(|| format!("failed to parse client input {}", args.input_path.display()))?;

    let store: Arc<dyn StorePort> = match &config.store.state_path {
        Some(path) => {
            let file_store = JsonFileStore::open(path)
                .with_context(|| format!("failed to open state file {}", path.display()))?;
            Arc::new(file_store)
        }
        None => {
            eprintln!("state_path is null; running without persistence");
            Arc::new(MemoryStore::new())
        }
    };
    let bureau = Arc::new(HttpBureauClient::new(
        config.bureau.base_url.clone(),
        Duration::from_millis(config.bureau.timeout_ms),
    ));
    let retrieval = Arc::new(HttpRetrievalClient::new(
        config.retrieval.base_url.clone(),
        config.retrieval.api_key.clone(),
        Duration::from_millis(config.retrieval.timeout_ms),
    ));
    let classifier = Arc::new(ThresholdClassifier::new());
    let notifier = Arc::new(LogNotifier);

    let orchestrator = Orchestrator::new(
        store,
        bureau,
        retrieval,
        classifier,
        notifier,
        PipelineSettings {
            policy_dataset_id: config.retrieval.policy_dataset_id.clone(),
            regulation_dataset_id: config.retrieval.regulation_dataset_id.clone(),
            min_confidence: config.retrieval.min_confidence,
            notify_recipient: config.notify.recipient.clone(),
        },
    );

    let handle = resolve_session(&orchestrator, &args, input).await?;
    match orchestrator.run_to_completion(handle).await {
        RunOutcome::Completed(report) => {
            let document = serde_json::to_string_pretty(&report.report_document)
                .context("failed to render the analysis report")?;
            println!("{document}");
            eprintln!(
                "análise {} concluída: {}",
                report.analysis_id, report.recommendation
            );
            Ok(())
        }
        RunOutcome::Failed(failure) => Err(anyhow!(
            "análise {} falhou na etapa {}: {}",
            failure.run_id,
            failure.stage,
            failure.message
        )),
    }
}

/// Starts the run and, when intake pauses for onboarding, resolves the pause
/// from `--email`/`--phone` or from a stdin prompt.
async fn resolve_session(
    orchestrator: &Orchestrator,
    args: &CliArgs,
    input: ClientInput,
) -> Result<SessionHandle> {
    let non_interactive = args.email.is_some() || args.phone.is_some();
    let mut outcome = orchestrator.start(input).await?;

    loop {
        match outcome {
            StartOutcome::Ready(handle) => return Ok(handle),
            StartOutcome::AwaitingOnboarding {
                session_id,
                message,
            } => {
                let reply = if non_interactive {
                    OnboardingReply::Submit {
                        email: args.email.clone().unwrap_or_default(),
                        phone: args.phone.clone().unwrap_or_default(),
                    }
                } else {
                    prompt_onboarding(&message)?
                };

                outcome = orchestrator.resume_onboarding(session_id, reply).await?;
                if non_interactive {
                    if let StartOutcome::AwaitingOnboarding { message, .. } = &outcome {
                        return Err(anyhow!("cadastro recusado: {message}"));
                    }
                }
            }
        }
    }
}

/// Empty email means the operator is giving up; that becomes a cancel.
fn prompt_onboarding(message: &str) -> Result<OnboardingReply> {
    eprintln!("{message}");
    eprintln!("(email vazio cancela a análise)");

    let email = prompt_line("Email: ")?;
    if email.is_empty() {
        return Ok(OnboardingReply::Cancel);
    }
    let phone = prompt_line("Telefone: ")?;
    Ok(OnboardingReply::Submit { email, phone })
}

fn prompt_line(label: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}").context("failed to write prompt")?;
    stderr.flush().context("failed to flush prompt")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read onboarding reply")?;
    Ok(line.trim().to_string())
}
