use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use stream_console::profile::Profile;

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Command-line client for the stream processing console", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Credential profile (`key=value` lines)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Stream instance, overriding the profile's `spi_name`
    #[arg(short, long)]
    instance: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check console status
    Status,
    /// Manage stream processors
    Processors {
        #[command(subcommand)]
        action: ProcessorAction,
    },
    /// Manage connection registry entries
    Connections {
        #[command(subcommand)]
        action: ConnectionAction,
    },
    /// Manage stream processing instances
    Instances {
        #[command(subcommand)]
        action: InstanceAction,
    },
}

#[derive(Subcommand)]
enum ProcessorAction {
    List,
    Get { name: String },
    Start { name: String },
    Stop { name: String },
    Delete { name: String },
    /// Create a processor from a JSON definition file
    Create { file: PathBuf },
}

#[derive(Subcommand)]
enum ConnectionAction {
    List,
    Get { name: String },
    Delete { name: String },
    /// Create a connection from a JSON definition file
    Create { file: PathBuf },
}

#[derive(Subcommand)]
enum InstanceAction {
    List,
    Delete { name: String },
    /// Create an instance from a JSON definition file
    Create { file: PathBuf },
}

/// One `/api/action` call.
struct ActionCall {
    resource: &'static str,
    operation: &'static str,
    name: Option<String>,
    body: Option<PathBuf>,
}

impl ActionCall {
    fn new(resource: &'static str, operation: &'static str) -> Self {
        Self {
            resource,
            operation,
            name: None,
            body: None,
        }
    }

    fn named(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    fn from_file(mut self, file: PathBuf) -> Self {
        self.body = Some(file);
        self
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let call = match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            return print_response(res).await;
        }
        Commands::Processors { action } => match action {
            ProcessorAction::List => ActionCall::new("processor", "list"),
            ProcessorAction::Get { name } => ActionCall::new("processor", "get").named(name),
            ProcessorAction::Start { name } => ActionCall::new("processor", "start").named(name),
            ProcessorAction::Stop { name } => ActionCall::new("processor", "stop").named(name),
            ProcessorAction::Delete { name } => ActionCall::new("processor", "delete").named(name),
            ProcessorAction::Create { file } => ActionCall::new("processor", "create").from_file(file),
        },
        Commands::Connections { action } => match action {
            ConnectionAction::List => ActionCall::new("connection", "list"),
            ConnectionAction::Get { name } => ActionCall::new("connection", "get").named(name),
            ConnectionAction::Delete { name } => ActionCall::new("connection", "delete").named(name),
            ConnectionAction::Create { file } => ActionCall::new("connection", "create").from_file(file),
        },
        Commands::Instances { action } => match action {
            InstanceAction::List => ActionCall::new("stream_instance", "list"),
            InstanceAction::Delete { name } => ActionCall::new("stream_instance", "delete").named(name),
            InstanceAction::Create { file } => ActionCall::new("stream_instance", "create").from_file(file),
        },
    };

    let Some(profile_path) = cli.profile.as_deref() else {
        eprintln!("Error: --profile is required for this command");
        return Ok(ExitCode::FAILURE);
    };
    let mut profile = Profile::load(profile_path)?;
    if cli.instance.is_some() {
        profile.instance_name = cli.instance;
    }

    let payload = build_payload(&profile, call)?;
    let res = client
        .post(format!("{}/api/action", base))
        .json(&payload)
        .send()
        .await?;
    print_response(res).await
}

fn build_payload(profile: &Profile, call: ActionCall) -> Result<Value, Box<dyn std::error::Error>> {
    let mut payload: Map<String, Value> = profile.to_payload();
    payload.insert("resource".into(), Value::from(call.resource));
    payload.insert("operation".into(), Value::from(call.operation));
    if let Some(name) = call.name {
        payload.insert("resource_name".into(), Value::String(name));
    }
    if let Some(file) = call.body {
        payload.insert("body".into(), read_json(&file)?);
    }
    Ok(Value::Object(payload))
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: console returned status {}", status);
        eprintln!("{}", rendered);
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}
