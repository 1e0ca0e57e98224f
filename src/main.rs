use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use support_widget::{
    Classification, Classifier, InboundRecord, RenderInstruction, Script, TerminalSink,
    WidgetConfig, replay,
};

/// Support Widget - classify and replay customer-support conversations
#[derive(Parser)]
#[command(name = "support-widget", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify inbound records from a JSON file (one record or an array)
    Classify {
        /// Path to the records file
        file: PathBuf,

        /// Print the HTML markup instead of JSON
        #[arg(long)]
        html: bool,
    },
    /// Run a full session against a scripted transport
    Replay {
        /// Path to the JSON script
        script: PathBuf,

        /// Require a complete connection configuration
        #[arg(long)]
        connect: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,support_widget=info",
        1 => "info,support_widget=debug",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Classify { file, html } => classify(&file, html),
        Command::Replay { script, connect } => replay_script(&script, connect).await,
    }
}

fn classify(path: &Path, html: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let records = match serde_json::from_str(&content)? {
        Value::Array(records) => records,
        single => vec![single],
    };
    tracing::debug!(count = records.len(), "classifying records");

    let classifier = Classifier::new();
    let results: Vec<Classification> = records
        .iter()
        .map(|raw| classifier.classify(&InboundRecord::from_value(raw)))
        .collect();

    if html {
        for instruction in results.iter().filter_map(|c| match c {
            Classification::Render(instruction) => Some(instruction),
            Classification::Suppressed(_) => None,
        }) {
            println!("{}", instruction.to_html());
        }
    } else {
        let described: Vec<Value> = results.iter().map(describe).collect();
        println!("{}", serde_json::to_string_pretty(&described)?);
    }

    Ok(())
}

fn describe(classification: &Classification) -> Value {
    match classification {
        Classification::Suppressed(reason) => json!({ "suppressed": reason.to_string() }),
        Classification::Render(RenderInstruction::AgentBubble {
            text,
            timestamp,
            sender,
        }) => json!({
            "agentBubble": {
                "text": text,
                "timestamp": timestamp.to_rfc3339(),
                "sender": sender.display_name,
                "role": sender.role,
                "isBot": sender.is_bot,
                "avatar": sender.avatar,
            }
        }),
        Classification::Render(RenderInstruction::CustomerBubble { text, timestamp }) => json!({
            "customerBubble": { "text": text, "timestamp": timestamp.to_rfc3339() }
        }),
        Classification::Render(RenderInstruction::SystemNotice { text }) => {
            json!({ "systemNotice": text })
        }
    }
}

async fn replay_script(path: &Path, connect: bool) -> anyhow::Result<()> {
    let config = WidgetConfig::load();
    tracing::debug!(?config, "loaded configuration");

    let script = Script::load(path)?;
    tracing::info!(steps = script.steps.len(), "replaying script");

    let outcome = replay(script, TerminalSink::stdout(), &config, connect).await;
    tracing::info!(
        state = %outcome.state,
        sent = outcome.sent.len(),
        uploads = outcome.uploads.len(),
        widget_open = outcome.widget.open,
        "replay finished"
    );

    if let Some(transcript) = outcome.transcript {
        std::fs::write(&config.transcript_path, transcript)?;
        println!("Transcript saved to {}", config.transcript_path.display());
    }

    Ok(())
}
