use wikispider::commands::command_argument_builder;
use wikispider::handlers::{handle_crawl, init_tracing};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(quiet);

    match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
