use anyhow::Result;
use options::{Command, LogFormat};
use rendezvous::harness::ModuleRunner;
use rendezvous::module::relay::Relay;
use structopt::StructOpt;
use tracing::info;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init();

    match command {
        Command::Relay(options) => runner.run(Relay::new(options)).await,
    };

    Ok(())
}

fn init() -> (Command, ModuleRunner) {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    info!("rendezvous {}", env!("CARGO_PKG_VERSION"));

    (options.command, ModuleRunner::new(options.status_server))
}
