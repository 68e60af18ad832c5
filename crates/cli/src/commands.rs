//! Subcommand handlers.

use ak_core::config::loader::{load_config, PROJECT_DIR};
use ak_core::config::models::AppConfig;
use ak_core::credentials::CredentialSource;
use ak_core::emitter::{EventEmitter, EventSink, WriterSink};
use ak_core::engine::{AssessmentEngine, EngineOptions, PipelinePlan, RunReport};
use ak_core::evaluators::EvaluatorFactory;
use ak_core::init::{generate_assess_kit_structure, InitOptions};
use ak_core::registry::{CheckFilter, CheckRegistry};
use ak_protocol::check_models::CheckCategory;
use ak_protocol::request_models::AssessmentRequest;
use ak_server::AppState;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

pub async fn init(root: &Path, force: bool, minimal: bool) -> Result<ExitCode> {
    let written = generate_assess_kit_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!(
        "{} {} in {}",
        "Initialized".green().bold(),
        PROJECT_DIR,
        root.display()
    );
    for path in written {
        println!("  {} {path}", "+".green());
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn checks(root: &Path, only: Option<CheckCategory>) -> Result<ExitCode> {
    let config = load_project(root).await?;
    let registry = CheckRegistry::new(config.checks)?;

    if registry.is_empty() {
        println!(
            "{} no checks found under {}",
            "warning:".yellow().bold(),
            root.join(PROJECT_DIR).join("checks").display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let filter = CheckFilter::all();
    for (category, groups) in registry.enumerate_all(&filter) {
        if only.is_some_and(|only| only != category) {
            continue;
        }
        let count: u64 = groups.values().sum();
        println!("{} ({count})", category.as_str().bold());
        if groups.is_empty() {
            println!("  {}", "no enabled checks".dimmed());
        }
        for (group, items) in groups {
            println!("  {group:<24} {items}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn run(
    root: &Path,
    request_path: &Path,
    output: Option<&Path>,
    plan_only: bool,
) -> Result<ExitCode> {
    let request = read_request(request_path).await?;
    let engine = build_engine(root).await?;

    if plan_only {
        print_plan(&engine.plan(request)?);
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling run");
            interrupt.cancel();
        }
    });

    let report = match output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .wrap_err_with(|| format!("failed to create {}", path.display()))?;
            stream_run(&engine, request, WriterSink::new(file), cancel).await
        }
        None => stream_run(&engine, request, WriterSink::new(tokio::io::stdout()), cancel).await,
    };

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn serve(root: &Path, bind: Option<String>, token: String) -> Result<ExitCode> {
    if token.trim().is_empty() {
        return Err(eyre!("the bearer token must not be empty"));
    }

    let config = load_project(root).await?;
    let bind = bind.unwrap_or_else(|| config.settings.server.bind.clone());
    let assess_timeout = config.settings.server.assess_timeout();
    let engine = engine_from(root, config)?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    let state = AppState::new(Arc::new(engine), token).with_assess_timeout(assess_timeout);

    ak_server::serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
        }
    })
    .await?;
    Ok(ExitCode::SUCCESS)
}

async fn stream_run<S: EventSink>(
    engine: &AssessmentEngine,
    request: AssessmentRequest,
    sink: S,
    cancel: CancellationToken,
) -> RunReport {
    let mut emitter = EventEmitter::new(sink, cancel.clone());
    let report = engine.run(request, &mut emitter, cancel).await;
    tracing::info!(
        run_id = %report.run_id,
        progress = %report.progress,
        events = emitter.emitted(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "run finished"
    );
    report
}

async fn load_project(root: &Path) -> Result<AppConfig> {
    load_config(root)
        .await
        .wrap_err_with(|| format!("failed to load {}", root.join(PROJECT_DIR).display()))
}

async fn build_engine(root: &Path) -> Result<AssessmentEngine> {
    let config = load_project(root).await?;
    engine_from(root, config)
}

fn engine_from(root: &Path, config: AppConfig) -> Result<AssessmentEngine> {
    let AppConfig { settings, checks } = config;
    let registry = CheckRegistry::new(checks)?;
    if registry.is_empty() {
        tracing::warn!("no checks registered; run `assess init` to create the defaults");
    }

    let collaborators = EvaluatorFactory::collaborators(&settings, root)
        .wrap_err("failed to set up collaborators")?;

    Ok(AssessmentEngine::new(Arc::new(registry), collaborators)
        .with_credentials(CredentialSource::from_env_setting(
            settings.credentials_env.as_deref(),
        ))
        .with_options(EngineOptions::from_settings(&settings.stream)))
}

async fn read_request(path: &Path) -> Result<AssessmentRequest> {
    let content = if path == Path::new("-") {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .wrap_err("failed to read the request from stdin")?;
        content
    } else {
        tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).wrap_err("request is not a valid assessment request")
}

fn print_plan(plan: &PipelinePlan) {
    println!("{} ({} units)", "Plan".bold(), plan.total());
    for (index, stage) in plan.stages().iter().enumerate() {
        println!("  {:>2}. {:<40} {}", index + 1, stage.label, stage.units);
    }
}
