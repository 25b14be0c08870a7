//! Configuration and subtitle commands

mod get_configuration;
mod get_subtitles;
mod save_configuration;
mod save_subtitles;

pub use get_configuration::GetConfigurationCommand;
pub use get_subtitles::GetSubtitlesCommand;
pub use save_configuration::SaveConfigurationCommand;
pub use save_subtitles::SaveSubtitlesCommand;
