// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use controller_shared::settings::Settings;
use database::Db;
use std::path::PathBuf;

mod reload;

#[derive(Parser, Debug, Clone)]
#[clap(name = "gathr-controller", version)]
pub struct Args {
    /// Specify path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Triggers a reload of the running controller's settings
    #[clap(long)]
    pub reload: bool,

    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Subcommand, Debug, Clone)]
#[clap(rename_all = "kebab_case")]
enum SubCommand {
    /// Migrate the db. This is done automatically during start of the controller,
    /// but can be done without starting the controller using this command.
    MigrateDb,
    /// Expire all sent invitations whose event has already started
    ExpireInvitations,
}

impl Args {
    /// Returns true if we want to startup the controller after we finished the cli part
    pub fn controller_should_start(&self) -> bool {
        !(self.reload || self.cmd.is_some())
    }
}

/// Parses the CLI-Arguments into [`Args`]
///
/// Also runs (optional) cli commands if necessary
pub async fn parse_args() -> Result<Args> {
    let args = Args::parse();

    if args.reload {
        reload::trigger_reload()?;
    }

    if let Some(sub_command) = args.cmd.clone() {
        let settings = Settings::load(&args.config)?;

        match sub_command {
            SubCommand::MigrateDb => {
                db_storage::migrations::migrate_from_url(&settings.database.url)
                    .await
                    .context("Failed to migrate database")?;
            }
            SubCommand::ExpireInvitations => {
                let db = Db::connect(&settings.database).context("Failed to connect to database")?;

                let expired = crate::block(move || -> Result<usize> {
                    let mut conn = db.get_conn()?;

                    Ok(crate::services::invitations::expire_stale(&mut conn, Utc::now())?)
                })
                .await??;

                println!("Expired {expired} invitation(s)");
            }
        }
    }

    Ok(args)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert()
    }

    #[test]
    fn subcommands_do_not_start_the_controller() {
        let args = Args::parse_from(["gathr-controller", "expire-invitations"]);
        assert!(!args.controller_should_start());

        let args = Args::parse_from(["gathr-controller", "--config", "other.toml"]);
        assert!(args.controller_should_start());
        assert_eq!(args.config, PathBuf::from("other.toml"));
    }
}
