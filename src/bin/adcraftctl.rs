use axum::body::Bytes;
use clap::{Parser, Subcommand};
use adcraft::service::{executions, templates, IncomingFile};
use adcraft::{AppState, Config};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "adcraftctl", about = "CLI for the AdCraft template catalogue and runs", version)]
struct Cli {
    /// Override SUPABASE_URL
    #[arg(global = true, long)]
    supabase_url: Option<String>,

    /// Override N8N_WEBHOOK_URL
    #[arg(global = true, long)]
    webhook_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Template catalogue commands
    Templates {
        #[command(subcommand)]
        cmd: TemplatesCmd,
    },
    /// Execution records
    Executions {
        #[command(subcommand)]
        cmd: ExecutionsCmd,
    },
    /// Send a product image and templates to the webhook
    Trigger {
        /// Public URL of the product image
        #[arg(long)]
        image_url: String,
        /// Template image URL (repeatable)
        #[arg(long = "template", value_name = "URL", required = true)]
        templates: Vec<String>,
        /// Prompt applied to every template
        #[arg(long)]
        prompt: Option<String>,
        /// Reuse an existing execution row
        #[arg(long)]
        execution_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TemplatesCmd {
    /// List templates, newest first
    List {
        /// Only templates shown to users
        #[arg(long)]
        visible: bool,
        /// Output raw JSON instead of lines
        #[arg(long)]
        json: bool,
    },
    /// Upload template images
    Upload {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Prompt per file, in order (repeatable)
        #[arg(long = "prompt")]
        prompts: Vec<String>,
    },
    /// Replace a template's prompt
    SetPrompt { id: String, prompt: String },
    /// Show or hide a template
    Visibility {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        visible: bool,
    },
    /// Delete templates and their images
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ExecutionsCmd {
    /// Create an empty execution row and print its id
    Create,
    /// Show an execution row
    Show { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    if let Some(url) = &cli.supabase_url {
        std::env::set_var("SUPABASE_URL", url);
    }
    let mut conf = Config::new()?;
    if let Some(url) = cli.webhook_url {
        conf.webhook_url = Some(url);
    }
    let state = AppState::from_config(&conf);

    match cli.command {
        Commands::Templates { cmd } => match cmd {
            TemplatesCmd::List { visible, json } => {
                let list = templates::list(&state, visible).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else {
                    for t in list {
                        let flag = if t.visible() { "" } else { " [hidden]" };
                        println!("{}  {}{}", t.id, t.url.as_deref().unwrap_or("-"), flag);
                    }
                }
                Ok(())
            }
            TemplatesCmd::Upload { files, prompts } => {
                let mut incoming = Vec::with_capacity(files.len());
                for path in files {
                    let bytes = Bytes::from(tokio::fs::read(&path).await?);
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "template.png".to_string());
                    let content_type = content_type_for(&file_name).to_string();
                    incoming.push(IncomingFile { file_name, content_type, bytes });
                }
                for url in templates::upload(&state, incoming, &prompts).await? {
                    println!("{}", url);
                }
                Ok(())
            }
            TemplatesCmd::SetPrompt { id, prompt } => {
                let row = templates::set_prompt(&state, &id, &prompt).await?;
                print_row(row)
            }
            TemplatesCmd::Visibility { id, visible } => {
                let row = templates::set_visibility(&state, &id, visible).await?;
                print_row(row)
            }
            TemplatesCmd::Delete { ids } => {
                let deleted = templates::bulk_delete(&state, &ids).await?;
                for t in &deleted {
                    println!("deleted {} ({})", t.id, t.file_name.as_deref().unwrap_or("-"));
                }
                Ok(())
            }
        },
        Commands::Executions { cmd } => match cmd {
            ExecutionsCmd::Create => {
                let id = executions::create(&state, Value::Null, Value::Null).await?;
                println!("{}", id);
                Ok(())
            }
            ExecutionsCmd::Show { id } => {
                let execution = executions::get(&state, &id).await?;
                println!("{}", serde_json::to_string_pretty(&execution)?);
                Ok(())
            }
        },
        Commands::Trigger { image_url, templates, prompt, execution_id } => {
            let body = json!({
                "templates": templates,
                "userImageUrl": image_url,
                "prompt": prompt,
                "execution_id": execution_id,
            });
            let input = executions::TriggerInput::from_json(&body)?;
            let outcome = executions::trigger(&state, input).await?;
            if let Some(id) = &outcome.execution_id {
                eprintln!("execution {}", id);
            }
            println!("{}", serde_json::to_string_pretty(&outcome.reply.body)?);
            if !outcome.reply.ok() {
                eprintln!("Error: webhook returned {}", outcome.reply.status);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn print_row(row: Option<Value>) -> Result<(), Box<dyn std::error::Error>> {
    match row {
        Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        None => eprintln!("No template matched"),
    }
    Ok(())
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
