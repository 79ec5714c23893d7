//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `places`        | `Nearby`, `Details`                                |
//! | `checkin`       | `Show`, `Checkin`, `Tags`                          |
//! | `info`          | `Tiers`, `Catalogue`                               |
//! | `config`        | `Config`                                           |

pub mod checkin;
pub mod config;
pub mod info;
pub mod places;

pub use checkin::{cmd_checkin, cmd_show, cmd_tags};
pub use config::cmd_config;
pub use info::{cmd_catalogue, cmd_tiers};
pub use places::{cmd_details, cmd_nearby};

use anyhow::Result;
use craic::checkin::CheckInSync;
use craic::config::CraicConfig;

use super::Cli;

/// Effective configuration for this invocation.
pub(crate) fn load_config(cli: &Cli) -> Result<CraicConfig> {
    Ok(CraicConfig::load(cli.config.as_deref())?.with_cli_store(cli.store))
}

pub(crate) fn open_sync(config: &CraicConfig) -> Result<CheckInSync> {
    Ok(CheckInSync::new(config.open_store()?))
}
