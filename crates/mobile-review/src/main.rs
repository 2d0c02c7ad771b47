use clap::Parser;
use tokio::runtime::Builder;

use mobile_review::cli::Cli;
use mobile_review::config::{EndpointConfig, EnvSource, Inputs};
use mobile_review::orchestrator::run;
use mobile_review::telemetry::init_tracing;

// Exit code: 0 = review created, 1 = anything else
fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not errors
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };
    init_tracing(cli.log_json, cli.log_level());

    if let Err(err) = notify(cli) {
        println!("{err:#}");
        std::process::exit(1);
    }
}

fn notify(cli: Cli) -> anyhow::Result<()> {
    let inputs = Inputs::load(&EnvSource)?;
    tracing::debug!(?inputs, "loaded input variables");
    let endpoint = EndpointConfig::load(cli.config, &EnvSource)?;

    // One request, one thread.
    let rt = Builder::new_current_thread().enable_all().build()?;
    let mut stdout = std::io::stdout().lock();
    rt.block_on(run(&inputs, endpoint, &mut stdout))?;
    Ok(())
}
