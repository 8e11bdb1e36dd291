//! Objectify CLI: manage signing keys and relays, upload images to a
//! Blossom server and compose classified listings.
//!
//! Configuration comes from the environment (see `objectify_core::Config`);
//! keys and relays persist in the settings file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use objectify_blossom::{discover, UploadFlow};
use objectify_cli::{init_tracing, load_listing, load_upload_input, print_json, truncate_string};
use objectify_core::{Config, ListingDraft, Price, Settings};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "objectify", about = "Objectify Nostr listing CLI")]
struct Cli {
    /// Blossom server to upload to (overrides OBJECTIFY_UPLOAD_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage signing keys
    Keys {
        #[command(subcommand)]
        sub: KeyCommands,
    },
    /// Manage the relay list
    Relays {
        #[command(subcommand)]
        sub: RelayCommands,
    },
    /// Upload an image file or data URI and print the result
    Upload {
        /// Path to a file, or a `data:` URI
        input: String,
    },
    /// Compose and inspect classified listings
    Listing {
        #[command(subcommand)]
        sub: ListingCommands,
    },
    /// Find a NIP-96 upload server
    Discover {
        /// Servers to probe (defaults to OBJECTIFY_DISCOVERY_SERVERS)
        servers: Vec<String>,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate and store a new key
    Generate {
        #[arg(long)]
        name: Option<String>,
    },
    /// Store an existing key
    Add {
        /// 64-character hex secret key
        secret: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// List stored keys
    List,
    /// Remove a stored key
    Remove { id: Uuid },
    /// Make a key the active signing key
    Use { id: Uuid },
}

#[derive(Subcommand)]
enum RelayCommands {
    Add { url: String },
    Remove { url: String },
    List,
}

#[derive(Subcommand)]
enum ListingCommands {
    /// Sign a kind 30402 listing and print the event
    Create {
        #[arg(long)]
        title: String,
        /// Markdown description
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Price amount; requires --currency
        #[arg(long, requires = "currency")]
        price: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        /// Billing frequency, e.g. "month"
        #[arg(long)]
        frequency: Option<String>,
        /// Image URL (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
        /// Image file or data URI to upload first (repeatable)
        #[arg(long = "photo")]
        photos: Vec<String>,
        /// Hashtag (repeatable)
        #[arg(long = "tag")]
        hashtags: Vec<String>,
        /// Stable identifier for replacing an earlier listing
        #[arg(long)]
        identifier: Option<String>,
        /// Write the event here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a listing from a signed event file
    Show {
        file: PathBuf,
        /// Include creation time, ids and all tags
        #[arg(long)]
        expanded: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(server) = cli.server {
        config.upload_server = server.trim_end_matches('/').to_string();
        config.validate().context("Invalid --server")?;
    }
    let settings_path = config.settings_path().to_path_buf();
    let mut settings = Settings::load(&settings_path)?;

    match cli.command {
        Commands::Keys { sub } => match sub {
            KeyCommands::Generate { name } => {
                let key = settings.generate_key(name.as_deref())?.clone();
                settings.save(&settings_path)?;
                print_json(&serde_json::json!({ "id": key.id, "name": key.name, "public_key": key.public_key }))?;
            }
            KeyCommands::Add { secret, name } => {
                let key = settings.add_key(secret.trim(), name.as_deref())?.clone();
                settings.save(&settings_path)?;
                print_json(&serde_json::json!({ "id": key.id, "name": key.name, "public_key": key.public_key }))?;
            }
            KeyCommands::List => {
                let keys: Vec<_> = settings
                    .keys
                    .iter()
                    .map(|k| {
                        serde_json::json!({
                            "id": k.id,
                            "name": k.name,
                            "public_key": k.public_key,
                            "active": settings.active_key_id == Some(k.id),
                        })
                    })
                    .collect();
                print_json(&keys)?;
            }
            KeyCommands::Remove { id } => {
                let removed = settings.remove_key(id)?;
                settings.save(&settings_path)?;
                println!("Removed key {} ({})", removed.name, removed.public_key);
            }
            KeyCommands::Use { id } => {
                settings.set_active_key(id)?;
                settings.save(&settings_path)?;
                println!("Active key set to {}", id);
            }
        },
        Commands::Relays { sub } => match sub {
            RelayCommands::Add { url } => {
                if settings.add_relay(&url)? {
                    settings.save(&settings_path)?;
                    println!("Added relay {}", url.trim());
                } else {
                    println!("Relay {} already configured", url.trim());
                }
            }
            RelayCommands::Remove { url } => {
                if settings.remove_relay(&url) {
                    settings.save(&settings_path)?;
                    println!("Removed relay {}", url.trim());
                } else {
                    anyhow::bail!("Relay {} is not configured", url.trim());
                }
            }
            RelayCommands::List => print_json(&settings.relays)?,
        },
        Commands::Upload { input } => {
            let keys = settings.active_keys()?;
            let data_uri = load_upload_input(&input)?;
            tracing::debug!(input = %truncate_string(&input, 64), "Upload requested");

            let result = UploadFlow::from_config(&config)?.run(&data_uri, &keys).await;
            print_json(&result)?;
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Listing { sub } => match sub {
            ListingCommands::Create {
                title,
                content,
                summary,
                location,
                price,
                currency,
                frequency,
                mut images,
                photos,
                hashtags,
                identifier,
                out,
            } => {
                let keys = settings.active_keys()?;

                if !photos.is_empty() {
                    let flow = UploadFlow::from_config(&config)?;
                    for photo in &photos {
                        let data_uri = load_upload_input(photo)?;
                        let result = flow.run(&data_uri, &keys).await;
                        match result.url() {
                            Some(url) => images.push(url.to_string()),
                            None => anyhow::bail!(
                                "Uploading {} failed: {}",
                                truncate_string(photo, 64),
                                result.message().unwrap_or("unknown error")
                            ),
                        }
                    }
                }

                let price = match (price, currency) {
                    (Some(amount), Some(currency)) => Some(Price {
                        amount,
                        currency,
                        frequency,
                    }),
                    _ => None,
                };

                let draft = ListingDraft {
                    identifier,
                    title,
                    content,
                    summary,
                    location,
                    price,
                    images,
                    hashtags,
                };
                let unsigned = draft.into_unsigned(keys.public_key(), chrono::Utc::now().timestamp())?;
                let event = keys.sign_event(unsigned)?;
                let json = serde_json::to_string_pretty(&event).context("Serialize event")?;

                match out {
                    Some(path) => {
                        std::fs::write(&path, json)
                            .with_context(|| format!("Write {}", path.display()))?;
                        println!("Listing {} written to {}", event.id(), path.display());
                    }
                    None => println!("{}", json),
                }
            }
            ListingCommands::Show { file, expanded } => {
                let listing = load_listing(&file)?;
                for line in listing.summary_lines(expanded) {
                    println!("{}", line);
                }
            }
        },
        Commands::Discover { servers } => {
            let servers = if servers.is_empty() {
                config.discovery_servers.clone()
            } else {
                servers
            };
            let timeout = Duration::from_secs(config.http_timeout_secs);
            let found = discover(&servers, timeout).await?;
            print_json(&found)?;
        }
    }

    Ok(())
}
