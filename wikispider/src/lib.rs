pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    crawl_options_from_matches, handle_crawl, init_tracing, load_titles_from_file,
    load_titles_from_source,
};

// Re-export crawl functionality from wikispider-core
pub use wikispider_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, generate_crawl_report,
};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
