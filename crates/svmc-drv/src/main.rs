use clap::Parser;
use svmc_drv::{emit_result, init_logging, run, Cli};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli).and_then(|text| emit_result(&cli, &text)) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
