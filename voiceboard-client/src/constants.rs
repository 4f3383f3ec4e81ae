//! Application-wide constants

/// Host connected to when `--host` is not given
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Author used when neither `--author` nor `$USER` is set
pub const DEFAULT_AUTHOR: &str = "anonymous";

/// Environment variable consulted for the default author
pub const AUTHOR_ENV_VAR: &str = "USER";
