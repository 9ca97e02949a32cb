pub mod crawl;

pub use crawl::{
    CrawlOptions, CrawlProgressCallback, crawl_summary_json, execute_crawl,
    generate_crawl_report, parse_kinds, prepare_cache_dir,
};
