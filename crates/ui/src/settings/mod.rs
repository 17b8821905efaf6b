pub mod state;
pub mod view;

pub use state::{ClientSettings, SettingsChanged, SettingsError, SettingsState, SettingsStore};
pub use view::{SettingsClose, SettingsView};
