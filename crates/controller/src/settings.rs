// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Settings of the controller, see [`controller_shared::settings`]
use crate::cli::Args;
use config::ConfigError;
use std::path::Path;
use std::sync::Arc;

pub use controller_shared::settings::*;

/// Reload the settings from the `config_path` & the environment
///
/// Not all settings are used, as most of the settings are not reloadable while the
/// controller is running. Currently only the logging section is taken over.
pub(crate) fn reload_settings(
    shared_settings: SharedSettings,
    config_path: &Path,
) -> Result<(), ConfigError> {
    let new_settings = Settings::load(config_path)?;
    let mut current_settings = (*shared_settings.load_full()).clone();

    current_settings.logging = new_settings.logging;

    // replace the shared settings with the modified ones
    shared_settings.store(Arc::new(current_settings));

    Ok(())
}

/// Loads settings from program arguments and config file
pub fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    Settings::load(&args.config)
}
