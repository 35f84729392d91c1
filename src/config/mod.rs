mod settings;

pub use settings::{Settings, DEFAULT_ENDPOINT, DEFAULT_TTL};
