mod display;
mod settings;

pub use display::{map_link, DisplaySettings, DEFAULT_RADIUS, MAP_LINK_PROVIDERS};
pub use settings::{Config, TomlConfig, DEFAULT_SERVER_URL, EXAMPLE_CONFIG};
