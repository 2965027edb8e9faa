// Configuration lives in the groupchat-config workspace crate; re-exported so
// the rest of the service can keep using `crate::config::*`.

pub use groupchat_config::{
    AttachmentFailurePolicy, Config, DbConfig, KafkaConfig, LogFormat, LoggingConfig,
    MediaConfig, ModerationConfig, RedisConfig, MAX_CONTENT_LENGTH, MAX_REQUEST_BODY_SIZE,
};
