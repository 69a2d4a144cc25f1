mod store;

pub use protocol::{AppError, AppResult};
pub use store::{
    MAX_ROOT_DEPTH, ResolverSettings, SETTINGS_PATH_ENV, SettingsStore, normalize_settings,
};
