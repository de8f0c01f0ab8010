mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::workflow_handlers;

#[derive(Parser)]
#[command(name = "stepchain")]
#[command(version)]
#[command(about = "Run declarative LLM and tool workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow for a user query
    ///
    /// Loads the workflow catalog, executes the named workflow with the
    /// given query, and prints the execution transcript.
    ///
    /// Examples:
    ///   stepchain run content-brief "rust workflow engines"
    ///   stepchain run content-brief "rust engines" --param audience=engineers --json
    Run {
        /// Id of the workflow to run
        workflow_id: String,

        /// The user query driving the run
        query: String,

        /// User identity recorded on the execution
        #[arg(short, long, default_value = "cli-user")]
        user: String,

        /// Conversation id (generated if not given)
        #[arg(long)]
        conversation: Option<String>,

        /// Named parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Directory containing workflow definitions
        #[arg(long)]
        catalog: Option<String>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<String>,

        /// Output the full execution record in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List available workflow definitions
    List {
        /// Directory containing workflow definitions
        #[arg(long)]
        catalog: Option<String>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a workflow definition file
    Validate {
        /// Path to workflow YAML file
        workflow_file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workflow_id,
            query,
            user,
            conversation,
            params,
            catalog,
            config,
            json,
        } => {
            workflow_handlers::handle_run(
                workflow_id,
                query,
                user,
                conversation,
                params,
                catalog,
                config,
                json,
            )
            .await?;
        }
        Commands::List {
            catalog,
            config,
            json,
        } => {
            workflow_handlers::handle_list(catalog, config, json).await?;
        }
        Commands::Validate {
            workflow_file,
            json,
        } => {
            workflow_handlers::handle_validate(workflow_file, json).await?;
        }
    }

    Ok(())
}
