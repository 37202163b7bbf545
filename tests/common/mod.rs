use std::net::SocketAddr;

use axum::Router;
use pod_priority_webhook::{config::Config, mutation::MutationRule, WebhookServer};

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 8443)),
        tls_config: None,
        rule: MutationRule::default(),
        log_level: "info".to_owned(),
        log_fmt: "text".to_owned(),
        log_no_color: true,
    }
}

pub(crate) fn app(config: Config) -> Router {
    WebhookServer::new(config).router()
}
