mod cache;
mod config;
mod display;
mod launcher;
mod library;
mod picker;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use markdex_client::HttpClient;
use markdex_core::{
    find_by_hash_prefix, join_query, normalize_prefix, Bookmark, CreateBookmarkRequest,
    FilterQuery, MarkdexError,
};

use crate::cache::DiskCache;
use crate::display::truncate;
use crate::launcher::Delivery;
use crate::library::Library;
use crate::picker::{PickOptions, Picker};

#[derive(Parser)]
#[command(
    name = "markdex",
    version,
    about = "Markdex CLI - list, search, add and open your bookmarks"
)]
struct Cli {
    /// API base URL (overrides config)
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookmarks (optionally filtered by search query or tag)
    List {
        /// Search words, e.g. `markdex list rust async`
        words: Vec<String>,

        /// Search query (takes precedence over positional words)
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,

        /// Bypass local cache
        #[arg(long)]
        no_cache: bool,
    },

    /// AI-powered natural language bookmark search
    Search {
        /// Natural-language query
        #[arg(required = true)]
        query: Vec<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new bookmark (AI-assisted or manual)
    Add {
        /// URL to bookmark
        url: String,

        /// Let the server enrich missing details with AI
        #[arg(long)]
        ai: bool,

        /// Title (manual mode, or override AI)
        #[arg(short = 'T', long)]
        title: Option<String>,

        /// Tag(s), repeatable or comma-separated
        #[arg(short = 't', long = "tag", value_delimiter = ',')]
        tags: Vec<String>,

        /// Description (manual mode, or override AI)
        #[arg(short, long)]
        description: Option<String>,

        /// Source file (e.g. inbox.md)
        #[arg(short = 'f', long)]
        source_file: Option<String>,

        /// Output the created bookmark as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a bookmark by its hash prefix (first 3+ chars)
    Open {
        /// Hash prefix
        hash_prefix: String,

        /// Bypass local cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Fuzzy-pick bookmarks via fzf; Enter opens the selection
    Pick {
        /// Seed for the fuzzy filter (client-side only)
        initial_query: Option<String>,

        /// Server-side search query before fuzzy picking
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Allow selecting multiple bookmarks
        #[arg(long)]
        multi: bool,

        /// Copy the first selected URL to the clipboard instead of opening
        #[arg(long)]
        copy: bool,

        /// Bypass local cache
        #[arg(long)]
        no_cache: bool,

        /// fzf binary name or path
        #[arg(long = "fzf", default_value = picker::DEFAULT_PROGRAM)]
        fzf: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version info
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration values (`--api <url>`, `--user <id>`)
    Set {
        /// User identifier sent with usage tracking
        #[arg(long)]
        user: Option<String>,
    },

    /// Show current configuration
    Show,

    /// Print config file path
    Path,
}

/// Per-invocation settings and backends, resolved once and handed to the
/// command handlers.
struct Session {
    user_id: String,
    client: HttpClient,
    cache: DiskCache,
}

impl Session {
    fn connect(api_override: Option<String>) -> Result<Self> {
        let cfg = config::load_config()?;
        let api_base = api_override
            .filter(|a| !a.trim().is_empty())
            .or(cfg.api_base)
            .filter(|a| !a.trim().is_empty())
            .ok_or(MarkdexError::ConfigMissing)?;
        Ok(Self {
            user_id: cfg.user_id,
            client: HttpClient::new(&api_base),
            cache: DiskCache::new(),
        })
    }

    fn library(&self) -> Library<'_> {
        Library::new(&self.client, &self.cache)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = cli.api;

    match cli.command {
        Commands::List {
            words,
            search,
            tag,
            json,
            no_cache,
        } => {
            let search = search.or_else(|| (!words.is_empty()).then(|| words.join(" ")));
            let session = Session::connect(api)?;
            cmd_list(&session, &FilterQuery::new(search, tag), json, no_cache)
        }
        Commands::Search { query, json } => {
            let query = join_query(&query)?;
            let session = Session::connect(api)?;
            cmd_search(&session, &query, json)
        }
        Commands::Add {
            url,
            ai,
            title,
            tags,
            description,
            source_file,
            json,
        } => {
            let request = CreateBookmarkRequest {
                url: url.trim().to_string(),
                ai,
                title: title.unwrap_or_default(),
                tags: tags
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
                description: description.unwrap_or_default(),
                source_file: source_file.unwrap_or_default(),
            };
            request.validate()?;
            let session = Session::connect(api)?;
            cmd_add(&session, &request, json)
        }
        Commands::Open {
            hash_prefix,
            no_cache,
        } => {
            let prefix = normalize_prefix(&hash_prefix)?;
            let session = Session::connect(api)?;
            cmd_open(&session, &prefix, no_cache)
        }
        Commands::Pick {
            initial_query,
            search,
            tag,
            multi,
            copy,
            no_cache,
            fzf,
        } => {
            let options = PickOptions {
                initial_query,
                multi,
            };
            let session = Session::connect(api)?;
            cmd_pick(
                &session,
                &fzf,
                &options,
                &FilterQuery::new(search, tag),
                copy,
                no_cache,
            )
        }
        Commands::Config { command } => cmd_config(command, api),
        Commands::Version => {
            println!("markdex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Bookmark commands
// ---------------------------------------------------------------------------

fn cmd_list(session: &Session, filter: &FilterQuery, json: bool, no_cache: bool) -> Result<()> {
    let items = session.library().list(filter, no_cache)?;
    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No matching entries found.");
        return Ok(());
    }
    for b in &items {
        print_bookmark_row(b);
    }
    Ok(())
}

fn cmd_search(session: &Session, query: &str, json: bool) -> Result<()> {
    let items = session.library().search_ai(query)?;
    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No matching entries found.");
        return Ok(());
    }
    for (i, b) in items.iter().enumerate() {
        println!("{:>3}  {:<40}  {}", i + 1, truncate(&b.title, 40), b.url);
    }
    Ok(())
}

fn cmd_add(session: &Session, request: &CreateBookmarkRequest, json: bool) -> Result<()> {
    let created = session.library().create(request)?;
    if json {
        return print_json(&created);
    }
    println!(
        "Added {} ({}) tags=[{}]",
        created.title,
        created.hash,
        created.tags.join(", ")
    );
    Ok(())
}

fn cmd_open(session: &Session, prefix: &str, no_cache: bool) -> Result<()> {
    let library = session.library();
    let items = library.list(&FilterQuery::unfiltered(), no_cache)?;
    let bookmark = find_by_hash_prefix(&items, prefix)?;
    library.record_usage(&bookmark, &session.user_id);
    launcher::open_url(&bookmark.url)
}

fn cmd_pick(
    session: &Session,
    fzf: &str,
    options: &PickOptions,
    filter: &FilterQuery,
    copy: bool,
    no_cache: bool,
) -> Result<()> {
    let picker = Picker::locate(fzf, options)?;
    let Some(chosen) =
        picker::pick(&session.library(), &picker, filter, no_cache, &session.user_id)?
    else {
        println!("No matching entries found.");
        return Ok(());
    };
    if let Delivery::Copied(url) = launcher::deliver(
        &chosen,
        copy,
        launcher::open_url,
        launcher::copy_to_clipboard,
    )? {
        println!("Copied {url}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config(command: ConfigCommands, api: Option<String>) -> Result<()> {
    match command {
        ConfigCommands::Set { user } => {
            let mut cfg = config::load_config()?;
            if let Some(api) = api {
                cfg.api_base = Some(api.trim_end_matches('/').to_string());
            }
            if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
                cfg.user_id = user;
            }
            let path = config::save_config(&cfg)?;
            println!("Saved config to {}", path.display());
        }
        ConfigCommands::Show => {
            let cfg = config::load_config()?;
            println!("Config: {}", config::show_config_path());
            println!();
            println!(
                "  api_base = {}",
                cfg.api_base.as_deref().unwrap_or("(not set)")
            );
            println!("  user_id = {}", cfg.user_id);
            println!();
            println!("Cache: {}", DiskCache::new().path().display());
        }
        ConfigCommands::Path => match config::config_path() {
            Some(p) => println!("{}", p.display()),
            None => bail!("no config path could be resolved"),
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_bookmark_row(b: &Bookmark) {
    println!(
        "{:<7}  {:<47} {}",
        b.short_hash(),
        truncate(&b.title, 40),
        b.tags.join(",")
    );
}
