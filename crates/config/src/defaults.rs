//! Default values applied when the config omits optional fields

pub fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_listen_port() -> u16 {
    8080
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_max_connections() -> u32 {
    20
}

pub fn default_engine_timeout_ms() -> u64 {
    2000
}

pub fn default_provider_base_url() -> String {
    "https://app.cr.bot".to_string()
}

pub fn default_provider_timeout_ms() -> u64 {
    3000
}
