//! neosantara - reconcile, store and share assistant chat messages

mod config;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use neosantara_parts::{
    DocumentIds, ReconcileOptions, Reconciler, Reconciliation, parse_turns, visible_parts,
};
use neosantara_store::{
    ChatRecord, ChatStore, MemoryStore, MessageRow, PostgrestStore, SnippetDraft,
};
use tracing_subscriber::EnvFilter;

/// neosantara - chat message tools
#[derive(Parser, Debug)]
#[command(name = "neosantara")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Access token of the signed-in user (default: SUPABASE_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the turns of an exchange and print the assistant message
    Reconcile {
        /// JSON file with the turns ("-" for stdin)
        input: PathBuf,

        /// Derive artifact ids from content
        #[arg(long)]
        derived_ids: bool,

        /// Only print parts the chat would display
        #[arg(long)]
        visible: bool,

        /// Message group id to attach
        #[arg(long)]
        message_group_id: Option<String>,

        /// Model that produced the exchange
        #[arg(long)]
        model: Option<String>,
    },

    /// Reconcile an exchange and save it as the chat's assistant message
    Save {
        /// JSON file with the turns ("-" for stdin)
        input: PathBuf,

        /// Chat to save into
        #[arg(long)]
        chat_id: String,

        /// Derive artifact ids from content
        #[arg(long)]
        derived_ids: bool,

        /// Message group id to attach
        #[arg(long)]
        message_group_id: Option<String>,

        /// Model that produced the exchange
        #[arg(long)]
        model: Option<String>,

        /// Save into an in-memory store instead of the configured one
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the code artifact of a message in a public chat
    Artifact {
        /// Message id
        message_id: i64,
    },

    /// Make a chat public
    Publish {
        /// Chat id
        #[arg(long)]
        chat_id: String,

        /// Owner of the chat
        #[arg(long)]
        user_id: Option<String>,
    },

    /// List public chats, newest first
    Explore,

    /// Save or fetch code snippets
    #[command(subcommand)]
    Snippet(SnippetCommand),
}

#[derive(Subcommand, Debug)]
enum SnippetCommand {
    /// Save a file as a snippet
    Save {
        /// File with the code ("-" for stdin)
        file: PathBuf,

        /// Language of the code
        #[arg(short, long)]
        language: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Chat the snippet came from
        #[arg(long)]
        chat_id: Option<String>,

        /// Make the snippet visible to everyone
        #[arg(long)]
        public: bool,

        /// Owner of the snippet
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Print a snippet
    Get {
        /// Snippet id
        id: String,

        /// Viewer, for private snippets
        #[arg(long)]
        user_id: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("neosantara=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn reconcile_file(path: &Path, derived_ids: bool) -> anyhow::Result<Reconciliation> {
    let turns = parse_turns(&read_input(path)?)?;
    let options = ReconcileOptions {
        document_ids: if derived_ids {
            DocumentIds::Derived
        } else {
            DocumentIds::Random
        },
    };
    let reconciliation = Reconciler::new(options).reconcile(&turns);

    for anomaly in &reconciliation.anomalies {
        tracing::warn!(?anomaly, "reconciliation anomaly");
    }
    Ok(reconciliation)
}

fn open_store(config: &config::Config, access_token: Option<String>) -> anyhow::Result<PostgrestStore> {
    let url = config
        .supabase_url()
        .context("no store configured: set SUPABASE_URL or [supabase].url")?;
    let key = config
        .supabase_key()
        .context("no store key configured: set SUPABASE_ANON_KEY or [supabase].anon_key")?;

    let store = PostgrestStore::new(url, key);
    let token = access_token.or_else(|| std::env::var("SUPABASE_ACCESS_TOKEN").ok());
    Ok(match token {
        Some(token) => store.with_access_token(token),
        None => store,
    })
}

/// Run the persist path against a throwaway store holding only `chat_id`
async fn dry_run_save(
    chat_id: &str,
    reconciliation: Reconciliation,
    message_group_id: Option<String>,
    model: Option<String>,
) -> neosantara_store::Result<MessageRow> {
    let store = MemoryStore::new();
    store.add_chat(ChatRecord {
        id: chat_id.to_string(),
        user_id: "dry-run".to_string(),
        title: None,
        model: model.clone(),
        public: false,
        created_at: chrono::Utc::now(),
    });
    neosantara_store::save_reconciled(&store, chat_id, reconciliation, message_group_id, model)
        .await
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.init_config {
        let path = config::Config::init().context("error creating config")?;
        println!("Config file created at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    let config = config::Config::load();
    let Some(command) = args.command else {
        anyhow::bail!("no command given (try --help)");
    };

    match command {
        Command::Reconcile {
            input,
            derived_ids,
            visible,
            message_group_id,
            model,
        } => {
            let reconciliation =
                reconcile_file(&input, derived_ids || config.reconcile.derived_ids)?;
            let mut message = reconciliation.into_message(message_group_id, model);
            if visible {
                message.parts = visible_parts(&message.parts, config.show_tool_invocations)
                    .into_iter()
                    .cloned()
                    .collect();
            }
            print_json(&message)?;
        }

        Command::Save {
            input,
            chat_id,
            derived_ids,
            message_group_id,
            model,
            dry_run,
        } => {
            let reconciliation =
                reconcile_file(&input, derived_ids || config.reconcile.derived_ids)?;
            let saved = if dry_run {
                dry_run_save(&chat_id, reconciliation, message_group_id, model).await?
            } else {
                let store = open_store(&config, args.access_token)?;
                neosantara_store::save_reconciled(
                    &store,
                    &chat_id,
                    reconciliation,
                    message_group_id,
                    model,
                )
                .await?
            };
            print_json(&saved)?;
        }

        Command::Artifact { message_id } => {
            let store = open_store(&config, args.access_token)?;
            let shared = neosantara_store::shared_artifact(&store, message_id).await?;
            print_json(&shared)?;
        }

        Command::Publish { chat_id, user_id } => {
            let store = open_store(&config, args.access_token)?;
            neosantara_store::publish_chat(&store, &chat_id, user_id.as_deref()).await?;
            println!("Chat {} is now public", chat_id);
        }

        Command::Explore => {
            let store = open_store(&config, args.access_token)?;
            for chat in store.public_chats().await? {
                let publisher = chat.publisher.display_name.as_deref().unwrap_or("unknown");
                println!(
                    "{}  {}  {}  by {}",
                    chat.created_at.format("%Y-%m-%d %H:%M"),
                    chat.id,
                    chat.title,
                    publisher
                );
            }
        }

        Command::Snippet(SnippetCommand::Save {
            file,
            language,
            title,
            description,
            chat_id,
            public,
            user_id,
        }) => {
            let store = open_store(&config, args.access_token)?;
            let draft = SnippetDraft {
                code_content: read_input(&file)?,
                language,
                title,
                description,
                chat_id,
                is_public: public,
            };
            let id = neosantara_store::save_snippet(&store, user_id.as_deref(), draft).await?;
            println!("{}", id);
        }

        Command::Snippet(SnippetCommand::Get { id, user_id }) => {
            let store = open_store(&config, args.access_token)?;
            let snippet = neosantara_store::fetch_snippet(&store, &id, user_id.as_deref()).await?;
            print_json(&snippet)?;
        }
    }

    Ok(())
}
