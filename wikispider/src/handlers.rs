use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wikispider_core::crawl::{
    CrawlOptions, crawl_summary_json, execute_crawl, generate_crawl_report, parse_kinds,
};

/// Install the global subscriber. `RUST_LOG` wins over the quiet default.
pub fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Helper functions for crawl handler

/// Collect seed titles from the command line and an optional titles file
pub fn load_titles_from_source(
    titles: Vec<String>,
    titles_file: Option<&PathBuf>,
) -> anyhow::Result<Vec<String>> {
    let mut seeds: Vec<String> = titles
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .collect();

    if let Some(path) = titles_file {
        seeds.extend(load_titles_from_file(path)?);
    }

    if seeds.is_empty() {
        bail!("Require one or more starting articles (TITLES or --titles-file)");
    }

    Ok(seeds)
}

/// Load seed titles from a newline-delimited file, skipping blanks and `#` comments
pub fn load_titles_from_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read titles file {}", path.display()))?;

    let titles: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if titles.is_empty() {
        bail!("No titles found in {}", path.display());
    }

    Ok(titles)
}

/// Translate `crawl` arguments into options. `--depth` counts the seeds as
/// generation zero, so the crawl itself runs one level deeper.
pub fn crawl_options_from_matches(
    sub_matches: &ArgMatches,
    titles: Vec<String>,
) -> CrawlOptions {
    let depth = *sub_matches.get_one::<usize>("depth").unwrap_or(&2);
    let width = *sub_matches.get_one::<usize>("width").unwrap_or(&3);
    let workers = *sub_matches.get_one::<usize>("pool").unwrap_or(&4);
    let delay_ms = *sub_matches.get_one::<u64>("limit").unwrap_or(&300);
    let path = sub_matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or("pages");
    let kinds = sub_matches
        .get_one::<String>("kind")
        .map(|kind| parse_kinds(kind))
        .unwrap_or_default();

    CrawlOptions {
        titles,
        cache_dir: PathBuf::from(shellexpand::tilde(path).as_ref()),
        max_depth: depth.saturating_add(1),
        max_width: (width > 0).then_some(width),
        workers,
        delay_ms,
        kinds,
        rank: !sub_matches.get_flag("no-rank"),
        force: sub_matches.get_flag("force"),
        endpoint: sub_matches.get_one::<String>("endpoint").cloned(),
        show_progress_bars: false,
    }
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    let titles: Vec<String> = sub_matches
        .get_many::<String>("TITLES")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let titles_file = sub_matches.get_one::<PathBuf>("titles-file");
    let json = sub_matches.get_flag("json");

    // Load titles from source
    let titles = match load_titles_from_source(titles, titles_file) {
        Ok(titles) => titles,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let mut options = crawl_options_from_matches(sub_matches, titles);
    options.show_progress_bars = !quiet && !json;
    debug!("Crawl options: {:?}", options);

    // Print crawl configuration
    if !quiet && !json {
        println!("\n🕷️  Crawling from {} seed(s)", options.titles.len());
        println!("Workers: {}", options.workers);
        println!("Max depth: {}", options.max_depth.saturating_sub(1));
        match options.max_width {
            Some(width) => println!("Width: {}", width),
            None => println!("Width: all links"),
        }
        if !options.kinds.is_empty() {
            let kinds: Vec<&str> = options.kinds.iter().map(String::as_str).collect();
            println!("Kinds: {}", kinds.join(", "));
        }
        println!("Output: {}\n", options.cache_dir.display());
    }

    let progress_callback = (!quiet && !json).then(|| {
        Arc::new(|msg: String| {
            println!("{}", msg);
        }) as wikispider_core::CrawlProgressCallback
    });

    let summary = match execute_crawl(options, progress_callback).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if json {
        match crawl_summary_json(&summary) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => {
                eprintln!("{} Couldn't render summary: {}", "✗".red().bold(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("\n{} Crawl complete!\n", "✓".green().bold());
    print!("{}", generate_crawl_report(&summary));
}
