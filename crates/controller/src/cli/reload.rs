// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::{Context, Error, Result};
use nix::sys::signal::{kill, SIGHUP};
use sysinfo::{
    get_current_pid, Pid, PidExt, ProcessExt, ProcessRefreshKind, RefreshKind, System, SystemExt,
};

/// Sends SIGHUP to every other process running under the name of the current executable
pub fn trigger_reload() -> Result<()> {
    let system =
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()));

    let own_pid = get_current_pid().map_err(Error::msg)?;
    let own_name = system
        .process(own_pid)
        .map(|process| process.name().to_owned())
        .context("Failed to find the current process in the process list")?;

    let targets = other_instances(
        system
            .processes()
            .iter()
            .map(|(pid, process)| (*pid, process.name())),
        own_pid,
        &own_name,
    );

    if targets.is_empty() {
        println!("There is currently no other controller process running");
        return Ok(());
    }

    for pid in targets {
        kill(nix::unistd::Pid::from_raw(pid.as_u32() as i32), SIGHUP)
            .with_context(|| format!("Failed to send SIGHUP to process {pid}"))?;

        println!("Sent reload signal to process {pid}");
    }

    Ok(())
}

fn other_instances<'a>(
    processes: impl IntoIterator<Item = (Pid, &'a str)>,
    own_pid: Pid,
    own_name: &str,
) -> Vec<Pid> {
    processes
        .into_iter()
        .filter(|(pid, name)| *pid != own_pid && *name == own_name)
        .map(|(pid, _)| pid)
        .collect()
}
