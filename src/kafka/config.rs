use rdkafka::config::ClientConfig;
use tracing::info;

use crate::config::KafkaConfig;

/// Base client configuration shared by the producer and the verdict consumer
pub fn create_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers);

    if config.ssl_enabled {
        let protocol = if config.sasl_mechanism.is_some() {
            "SASL_SSL"
        } else {
            "SSL"
        };
        client_config.set("security.protocol", protocol);
        if let Some(ca) = &config.ssl_ca_location {
            client_config.set("ssl.ca.location", ca);
        }
    } else if config.sasl_mechanism.is_some() {
        client_config.set("security.protocol", "SASL_PLAINTEXT");
    }

    if let Some(mechanism) = &config.sasl_mechanism {
        info!(mechanism = %mechanism, "Kafka SASL authentication enabled");
        client_config.set("sasl.mechanism", mechanism);
        if let Some(username) = &config.sasl_username {
            client_config.set("sasl.username", username);
        }
        if let Some(password) = &config.sasl_password {
            client_config.set("sasl.password", password);
        }
    }

    client_config
}
