use clap::builder::PossibleValue;
use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, Command};

use crate::mutation::{DEFAULT_PRIORITY_CLASS, LOGCLEAN_LABEL_KEY, LOGCLEAN_LABEL_VALUE};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("match-label-key")
            .long("match-label-key")
            .value_name("LABEL_KEY")
            .default_value(LOGCLEAN_LABEL_KEY)
            .env("WEBHOOK_MATCH_LABEL_KEY")
            .help("Mutate only Pods carrying this label key"),
        Arg::new("match-label-value")
            .long("match-label-value")
            .value_name("LABEL_VALUE")
            .default_value(LOGCLEAN_LABEL_VALUE)
            .env("WEBHOOK_MATCH_LABEL_VALUE")
            .help("Mutate only Pods whose label value equals this exactly"),
        Arg::new("priority-class")
            .long("priority-class")
            .value_name("PRIORITY_CLASS")
            .default_value(DEFAULT_PRIORITY_CLASS)
            .env("WEBHOOK_PRIORITY_CLASS")
            .help("priorityClassName written into matching Pods"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
