//! blog-posts - command-line entry point for managing blog posts
//!
//! Composition root only: resolves configuration, installs logging, opens
//! the database and forwards each subcommand to `PostService`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use blog_common::config::{load_config, resolve_config_path, resolve_database_path};
use blog_common::db::init_database;
use blog_posts::{Post, PostInput, PostService, SearchQuery};

/// Command-line arguments for blog-posts
#[derive(Parser, Debug)]
#[command(name = "blog-posts")]
#[command(about = "Create, edit, publish and search blog posts")]
#[command(version)]
struct Cli {
    /// Config file (default: $BLOG_CONFIG or <config_dir>/blog/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (default: $BLOG_DATABASE, config, or platform data dir)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new unpublished post
    Create(PostArgs),
    /// Replace the content and tags of an existing post
    Update {
        id: Uuid,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Publish a draft
    Publish { id: Uuid },
    /// Return a published post to draft
    Unpublish { id: Uuid },
    /// List posts, newest first
    List {
        /// Include unpublished posts
        #[arg(long)]
        all: bool,
        /// Only posts with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Print JSON instead of one line per post
        #[arg(long)]
        json: bool,
    },
    /// Show one post
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// List every known tag
    Tags,
}

#[derive(Args, Debug)]
struct PostArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    summary: String,
    /// Markdown file holding the post body
    #[arg(long)]
    content_file: PathBuf,
    #[arg(long)]
    friendly_url: String,
    /// Tag name (repeatable)
    #[arg(long = "tag", required = true)]
    tags: Vec<String>,
}

impl PostArgs {
    fn into_input(self) -> Result<PostInput> {
        let content = std::fs::read_to_string(&self.content_file)
            .with_context(|| format!("Failed to read {}", self.content_file.display()))?;
        Ok(PostInput {
            title: self.title,
            summary: self.summary,
            content,
            friendly_url: self.friendly_url,
            tags: self.tags.into_iter().collect::<BTreeSet<_>>(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting blog-posts v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path, &config.database)
        .await
        .context("Failed to initialize database")?;
    let service = PostService::new(pool).context("Failed to initialize post service")?;

    run(&service, cli.command).await
}

async fn run(service: &PostService, command: Command) -> Result<()> {
    match command {
        Command::Create(args) => {
            let post = service.create_post(&args.into_input()?).await?;
            println!("{}", post.id);
        }
        Command::Update { id, post } => {
            let post = service.update_post(id, &post.into_input()?).await?;
            println!("{}", post.id);
        }
        Command::Publish { id } => service.publish_post(id).await?,
        Command::Unpublish { id } => service.unpublish_post(id).await?,
        Command::List { all, tag, json } => {
            let query = SearchQuery {
                fetch_unpublished: all,
                tag_name: tag,
            };
            let posts = service.search_posts(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                for post in &posts {
                    println!("{}", summary_line(post));
                }
            }
        }
        Command::Show { id, json } => {
            let post = service
                .find_by_id(id)
                .await?
                .with_context(|| format!("Post not found: {}", id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&post)?);
            } else {
                println!("{}\n\n{}\n\n{}", summary_line(&post), post.summary, post.html_content);
            }
        }
        Command::Tags => {
            for tag in service.list_tags().await? {
                println!("{}", tag);
            }
        }
    }

    Ok(())
}

fn summary_line(post: &Post) -> String {
    let state = match post.published_at {
        Some(at) => format!("published {}", at.format("%Y-%m-%d %H:%M")),
        None => "draft".to_string(),
    };
    let tags: Vec<&str> = post.tags.iter().map(String::as_str).collect();
    format!(
        "{}  {}  [{}]  {}  ({})",
        post.id,
        post.friendly_url,
        state,
        post.title,
        tags.join(", ")
    )
}
