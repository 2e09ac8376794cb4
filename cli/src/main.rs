mod commands;
mod output;
mod terminal;

use commands::{CommandLine, Mode, scan, sweep};
use terminal::{print, spinner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    spinner::init_logging(commands.verbose);

    let cfg = commands.config();
    print::banner(cfg.no_banner || cfg.json, cfg.quiet);

    match commands.mode() {
        Mode::Sweep { cidr, options } => sweep::sweep(&cidr, options, &cfg).await,
        Mode::Scan { host, ports, options } => scan::scan(&host, ports, options, &cfg).await,
    }
}
