use std::cmp;
use std::error::Error;
use std::io::Write;
use std::time::Duration;

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use urbandict_rs::{
    CachePolicy, ClientConfig, CursorError, DEFAULT_API_BASE, HttpFetcher, Query, TextFormat,
    UrbanCursor, Word,
};

const SUGGESTION_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "urbandict", about = "Browse Urban Dictionary definitions", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Turn bracketed cross-references into markdown links.
    #[arg(long, global = true)]
    markdown: bool,

    /// Fetch every page again instead of caching it.
    #[arg(long, global = true, conflicts_with = "cache_pages")]
    no_cache: bool,

    /// Keep at most this many pages cached.
    #[arg(long, global = true, value_name = "N")]
    cache_pages: Option<usize>,

    /// Base URL of the definitions API.
    #[arg(long, global = true, env = "URBANDICT_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Give up on a request after this many seconds.
    #[arg(long, global = true, env = "URBANDICT_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// Log fetches and cache activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the top definitions for a term.
    Define {
        /// Word or phrase to look up.
        #[arg(required = true)]
        term: Vec<String>,
        /// Maximum number of definitions to print.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show a batch of random definitions.
    Random {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the latest words of the day.
    Wotd {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List terms the site suggests for a prefix.
    Suggest {
        #[arg(required = true)]
        prefix: Vec<String>,
        #[arg(short, long, default_value_t = SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Page through definitions interactively.
    Browse {
        /// Term to start from; words of the day when omitted.
        term: Vec<String>,
    },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let cache = if self.no_cache {
            CachePolicy::Disabled
        } else if let Some(pages) = self.cache_pages {
            CachePolicy::Bounded(pages)
        } else {
            CachePolicy::Unbounded
        };
        ClientConfig {
            api_base: self.api_base.clone(),
            timeout: self.timeout.map(Duration::from_secs),
            format: if self.markdown {
                TextFormat::Markdown
            } else {
                TextFormat::Plain
            },
            cache,
            ..ClientConfig::default()
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.client_config();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli, config))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "warn,urbandict_rs=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn dispatch(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Define { term, limit } => {
            let query = Query::term(&term.join(" "));
            if query.is_empty() {
                return Err("Search term cannot be empty".into());
            }
            handle_listing(&config, query, limit, cli.json).await
        }
        Command::Random { limit } => handle_listing(&config, Query::Random, limit, cli.json).await,
        Command::Wotd { limit } => {
            handle_listing(&config, Query::WordOfTheDay, limit, cli.json).await
        }
        Command::Suggest { prefix, limit } => {
            handle_suggest(&config, prefix.join(" "), limit, cli.json).await
        }
        Command::Browse { term } => handle_browse(&config, term.join(" ")).await,
    }
}

async fn handle_listing(
    config: &ClientConfig,
    query: Query,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let limit = cmp::max(1, limit);
    let mut cursor = UrbanCursor::new(config)?;
    cursor.set_query(query.clone()).await?;
    let page = cursor.current_page().await?;
    let words = &page[..page.len().min(limit)];

    if as_json {
        let payload = json!({
            "query": query_label(&query),
            "page": page.index() + 1,
            "limit": limit,
            "results": words,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if words.is_empty() {
        println!("No definitions found for {query}.");
        if let Query::Term(term) = &query {
            print_suggestions(cursor.source(), term).await;
        }
        return Ok(());
    }
    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            println!("\n{}", "-".repeat(40));
        }
        print_word(word);
    }
    Ok(())
}

async fn handle_suggest(
    config: &ClientConfig,
    prefix: String,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if prefix.trim().is_empty() {
        return Err("Prefix cannot be empty".into());
    }
    let limit = cmp::max(1, limit);
    let fetcher = HttpFetcher::new(config)?;
    let mut terms = fetcher.autocomplete(prefix.trim()).await?;
    terms.truncate(limit);

    if as_json {
        let payload = json!({ "prefix": prefix, "limit": limit, "results": terms });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if terms.is_empty() {
        println!("No suggestions for \"{prefix}\".");
    } else {
        for term in &terms {
            println!("{term}");
        }
    }
    Ok(())
}

async fn handle_browse(config: &ClientConfig, term: String) -> Result<(), Box<dyn Error>> {
    let mut cursor = UrbanCursor::new(config)?;
    let start = if term.trim().is_empty() {
        cursor.words_of_the_day().await
    } else {
        cursor.define(&term).await
    };
    if let Err(err) = start {
        println!("Could not load {}: {err}", cursor.query());
    }
    print_browse_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        show_position(&mut cursor).await;
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let outcome: Result<(), CursorError> = match BrowseCommand::parse(&line) {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                print_browse_help();
                continue;
            }
            BrowseCommand::Unknown(input) => {
                println!("Unknown command {input:?}; type ? for help.");
                continue;
            }
            BrowseCommand::Search(input) => {
                let query = Query::term(&input);
                let Query::Term(term) = &query else {
                    println!("Insert some text first.");
                    continue;
                };
                let term = term.clone();
                match cursor.set_query(query).await {
                    Ok(Some(_)) => Ok(()),
                    Ok(None) => {
                        println!("Sorry, we couldn't find: {term}");
                        print_suggestions(cursor.source(), &term).await;
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            BrowseCommand::Home => cursor.words_of_the_day().await.map(drop).map_err(Into::into),
            BrowseCommand::Random => cursor.random().await.map(drop).map_err(Into::into),
            BrowseCommand::NextWord => cursor.go_to_next_word().await.map(drop),
            BrowseCommand::PreviousWord => cursor.go_to_previous_word().await.map(drop),
            BrowseCommand::NextPage => cursor.go_to_next_page().await.map(drop),
            BrowseCommand::PreviousPage => cursor.go_to_previous_page().await.map(drop),
        };
        if let Err(err) = outcome {
            report_navigation_error(&err);
        }
    }
    Ok(())
}

fn report_navigation_error(err: &CursorError) {
    if !err.is_boundary() {
        warn!(error = %err, "navigation failed");
    }
    println!("{err}");
}

/// One line typed at the `browse` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    NextWord,
    PreviousWord,
    NextPage,
    PreviousPage,
    Home,
    Random,
    Search(String),
    Help,
    Quit,
    Unknown(String),
}

impl BrowseCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(term) = line.strip_prefix('/') {
            return BrowseCommand::Search(term.to_string());
        }
        if let Some(term) = line.strip_prefix("s ") {
            return BrowseCommand::Search(term.to_string());
        }
        match line {
            "" | "n" | ">" => BrowseCommand::NextWord,
            "p" | "<" => BrowseCommand::PreviousWord,
            "N" | ">>" => BrowseCommand::NextPage,
            "P" | "<<" => BrowseCommand::PreviousPage,
            "h" | "home" => BrowseCommand::Home,
            "r" | "random" => BrowseCommand::Random,
            "s" => BrowseCommand::Search(String::new()),
            "?" | "help" => BrowseCommand::Help,
            "q" | "quit" | "exit" => BrowseCommand::Quit,
            other => BrowseCommand::Unknown(other.to_string()),
        }
    }
}

/// Which moves the browse prompt currently allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NavState {
    previous_page: bool,
    previous_word: bool,
    home: bool,
    next_word: bool,
    next_page: bool,
}

impl NavState {
    fn bar(&self) -> String {
        let slots = [
            (self.previous_page, "<< P"),
            (self.previous_word, "< p"),
            (self.home, "home h"),
            (self.next_word, "> n"),
            (self.next_page, ">> N"),
        ];
        slots
            .iter()
            .map(|(enabled, label)| {
                if *enabled {
                    format!("[{label}]")
                } else {
                    format!("[{}]", "-".repeat(label.chars().count()))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

async fn show_position(cursor: &mut UrbanCursor) {
    let word = match cursor.current_word().await {
        Ok(word) => word,
        Err(err) => {
            warn!(error = %err, "failed to load current page");
            println!("Could not load the current page: {err}");
            None
        }
    };
    match &word {
        Some(word) => {
            let (page, index) = cursor.position();
            println!("\n{} (page {}, #{})", query_label(cursor.query()), page + 1, index + 1);
            print_word(word);
        }
        None => println!("\nNothing to show for {}.", cursor.query()),
    }
    let nav = NavState {
        previous_page: cursor.has_previous_page(),
        previous_word: cursor.has_previous_word(),
        home: word.is_some(),
        next_word: cursor.has_next_word().await.unwrap_or(false),
        next_page: cursor.has_next_page().await.unwrap_or(false),
    };
    println!("{}", nav.bar());
}

async fn print_suggestions(fetcher: &HttpFetcher, term: &str) {
    match fetcher.autocomplete(term).await {
        Ok(terms) if !terms.is_empty() => {
            println!("\nDid you mean:");
            for suggestion in terms.iter().take(SUGGESTION_LIMIT) {
                println!("  {suggestion}");
            }
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "autocomplete failed"),
    }
}

fn print_browse_help() {
    println!(
        "Commands: n next word, p previous word, N next page, P previous page, \
         h words of the day, r random, s <term> or /<term> search, ? help, q quit"
    );
}

fn query_label(query: &Query) -> String {
    match query {
        Query::Empty => String::new(),
        Query::Term(term) => term.clone(),
        Query::Random => "random".to_string(),
        Query::WordOfTheDay => "words of the day".to_string(),
    }
}

fn print_word(word: &Word) {
    println!("{}", word.term);
    render_text_block("Definition", &word.definition);
    render_text_block("Example", &word.example);
    let featured = word
        .featured_on
        .as_deref()
        .map(|date| format!(" · featured {date}"))
        .unwrap_or_default();
    println!(
        "\nby {} on {}{featured} · +{} / -{}",
        word.author,
        word.written_on.format("%Y-%m-%d"),
        word.thumbs_up,
        word.thumbs_down
    );
    if !word.permalink.is_empty() {
        println!("{}", word.permalink);
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_text_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
