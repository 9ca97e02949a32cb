use crate::CLAP_STYLING;
use clap::{arg, command};

/// Largest accepted `--depth`.
pub const MAX_DEPTH: u64 = 1000;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikispider")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikispider")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only log warnings and errors")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl Wikipedia breadth-first from one or more seed articles, caching each \
                article and writing the link graph as TSV.",
                )
                .arg(
                    arg!([TITLES] ...)
                        .help("Seed article titles")
                        .required_unless_present("titles-file"),
                )
                .arg(
                    arg!(-T --"titles-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed titles")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Depth to traverse to (0 downloads the seeds only)")
                        .value_parser(
                            clap::builder::RangedU64ValueParser::<usize>::new()
                                .range(..=MAX_DEPTH),
                        )
                        .default_value("2"),
                )
                .arg(
                    arg!(-w --"width" <WIDTH>)
                        .required(false)
                        .help("Number of links to follow from each page (0 follows all of them)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"no-rank")
                        .required(false)
                        .help("Keep links in page order instead of ranking them before limiting")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"force")
                        .required(false)
                        .help("Redownload articles cached before this run")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-p --"pool" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of simultaneous downloads")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(-l --"limit" <MILLIS>)
                        .required(false)
                        .help("Delay between downloads in milliseconds, shared by the whole pool")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("300"),
                )
                .arg(
                    arg!(--"path" <PATH>)
                        .required(false)
                        .help("Directory in which to put the visited pages and the graph")
                        .default_value("pages"),
                )
                .arg(
                    arg!(-k --"kind" <KINDS>)
                        .required(false)
                        .help("Comma-separated infobox kinds to keep, e.g. person,company"),
                )
                .arg(
                    arg!(--"endpoint" <URL>)
                        .required(false)
                        .help("MediaWiki index.php to fetch raw articles from"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the crawl summary as JSON instead of a report")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
