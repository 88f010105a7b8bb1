pub mod algo;
pub mod error;
pub mod ops;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct StorylinePlugin;

#[cfg(feature = "plugin")]
impl Plugin for StorylinePlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![Box::new(commands::Clusters), Box::new(commands::Entities)]
    }
}
