use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use autolabo::status::fetch_snapshot;
use autolabo::{
    export, BackendClient, CaptureFormat, Config, DocumentLayout, MicrophoneDevice,
    RecorderController, StatusSnapshot, SystemStatusPoller, WorkflowOrchestrator,
};

#[derive(Parser)]
#[command(
    name = "autolabo",
    version,
    about = "Trasforma registrazioni audio in relazioni di laboratorio strutturate"
)]
struct Cli {
    /// Configuration file (optional; defaults apply when missing)
    #[arg(long, default_value = "config/autolabo")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an audio file and generate a report
    Process {
        /// Audio file to process
        audio: PathBuf,

        #[command(flatten)]
        options: ReportOptions,
    },
    /// Record from the microphone, then transcribe and generate a report
    Record {
        #[command(flatten)]
        options: ReportOptions,
    },
    /// List the report templates the backend offers
    Templates,
    /// Show backend system status
    Status {
        /// Keep polling on the configured interval
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Args)]
struct ReportOptions {
    /// Report template id (default: lab_report)
    #[arg(long)]
    template: Option<String>,

    /// Report title
    #[arg(long)]
    title: Option<String>,

    /// Report author
    #[arg(long)]
    author: Option<String>,

    /// Institution name
    #[arg(long)]
    institution: Option<String>,

    /// Keep filler words in the transcript
    #[arg(long)]
    keep_filler_words: bool,

    /// Run grammar correction on the transcript before the report
    #[arg(long)]
    correct_grammar: bool,

    /// Run filler cleanup on the edited transcript before the report
    #[arg(long)]
    clean_filler: bool,

    /// Directory the document is exported into
    #[arg(long, default_value = ".")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let client = BackendClient::from_config(&config.backend);

    match cli.command {
        Command::Process { audio, options } => {
            run_pipeline(&config, client, Some(audio), options).await
        }
        Command::Record { options } => run_pipeline(&config, client, None, options).await,
        Command::Templates => run_templates(client).await,
        Command::Status { watch } => run_status(&config, client, watch).await,
    }
}

async fn run_pipeline(
    config: &Config,
    client: BackendClient,
    audio: Option<PathBuf>,
    options: ReportOptions,
) -> Result<()> {
    let mut orchestrator = WorkflowOrchestrator::new(client);
    apply_options(&orchestrator, &options).await;

    match audio {
        Some(path) => orchestrator.select_file(&path).await?,
        None => record_audio(config, &orchestrator).await?,
    }

    println!("Trascrizione in corso...");
    orchestrator.process().await?;

    {
        let session = orchestrator.snapshot().await;
        if let Some(transcript) = &session.transcript {
            println!("\nTrascrizione:\n{}\n", transcript);
        }
    }

    if options.clean_filler {
        println!("Rimozione parti inutili...");
        orchestrator.clean_filler().await?;
    }

    if options.correct_grammar {
        println!("Correzione grammatica...");
        orchestrator.correct_grammar().await?;
    }

    println!("Generazione relazione...");
    orchestrator.generate_report().await?;

    let session = orchestrator.snapshot().await;
    let report = session
        .report
        .as_deref()
        .context("report missing after generation")?;

    let layout = DocumentLayout::from(&config.export);
    let path = export::export_report(&session.metadata, report, &options.output, &layout)?;

    if let Some(method) = session.report_method {
        println!("Relazione generata (metodo: {}).", method);
    }
    println!("Relazione esportata in {}", path.display());

    Ok(())
}

async fn record_audio(config: &Config, orchestrator: &WorkflowOrchestrator) -> Result<()> {
    let format = CaptureFormat {
        sample_rate: config.capture.sample_rate,
        channels: config.capture.channels,
    };

    let (completion_tx, completion_rx) = tokio::sync::mpsc::channel(4);
    let intake = orchestrator.spawn_recording_intake(completion_rx);

    let mut recorder = RecorderController::new(MicrophoneDevice::new(format), completion_tx);
    recorder.start().await?;

    println!("Registrazione in corso... premi INVIO per fermare.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    recorder.stop().await?;
    println!("Registrazione completata ({} secondi).", recorder.elapsed_seconds());

    // Dropping the recorder closes the completion channel; the intake task
    // ends once the artifact is in the session.
    drop(recorder);
    let _ = intake.await;

    Ok(())
}

async fn apply_options(orchestrator: &WorkflowOrchestrator, options: &ReportOptions) {
    let session = orchestrator.session();
    let mut session = session.lock().await;

    if let Some(template) = &options.template {
        session.selected_template = template.clone();
    }
    if let Some(title) = &options.title {
        session.metadata.title = title.clone();
    }
    if let Some(author) = &options.author {
        session.metadata.author = author.clone();
    }
    if let Some(institution) = &options.institution {
        session.metadata.institution = institution.clone();
    }
    session.clean_filler_words = !options.keep_filler_words;
}

async fn run_templates(client: BackendClient) -> Result<()> {
    let catalog = client.fetch_templates().await?;

    let mut ids: Vec<_> = catalog.keys().collect();
    ids.sort();

    for id in ids {
        let template = &catalog[id];
        println!("{} {}: {}", template.icon, id, template.name);
        println!("   {}", template.description);
        println!("   Sezioni: {}", template.sections.join(", "));
    }

    Ok(())
}

async fn run_status(config: &Config, client: BackendClient, watch: bool) -> Result<()> {
    if !watch {
        print_snapshot(&fetch_snapshot(&client).await);
        return Ok(());
    }

    let interval = Duration::from_secs(config.status.poll_interval_secs);
    let mut poller = SystemStatusPoller::start(client, interval);
    let mut tick = tokio::time::interval(interval);

    println!("Stato sistema (Ctrl-C per uscire)");
    loop {
        tokio::select! {
            _ = tick.tick() => print_snapshot(&poller.snapshot().await),
            _ = tokio::signal::ctrl_c() => {
                poller.stop();
                break;
            }
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &StatusSnapshot) {
    println!("Backend: {}  |  Ollama: {}", snapshot.backend, snapshot.ollama);
    if let Some(gpu) = &snapshot.gpu_memory {
        println!("Memoria GPU: {}", gpu);
    }
    if let Some(device) = &snapshot.device {
        println!(
            "Dispositivo: {} (CUDA: {})",
            device,
            if snapshot.cuda_available {
                "disponibile"
            } else {
                "non disponibile"
            }
        );
    }
    println!(
        "Whisper: {}",
        if snapshot.whisper_loaded {
            "caricato"
        } else {
            "non caricato"
        }
    );
    if let Some(model) = &snapshot.current_model {
        println!("Modello LLM: {}", model);
    }
}
