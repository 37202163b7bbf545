use anyhow::Result;

use pod_priority_webhook::{cli, config::Config};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    pod_priority_webhook::run(config)
}
