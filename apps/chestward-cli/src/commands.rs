use anyhow::Context as _;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chestward_common::{PlayerId, format_millis, now_millis};
use chestward_kernel::{AccessLogRecord, SessionTracker, Snapshot};
use chestward_persist::{AccessLogStore, LockStore};
use chestward_policy::{
    GuardConfig, RetentionPolicy, check_interaction, check_removal, request_lock, request_unlock,
};

use crate::{LockCommand, LogCommand, Position};

/// Config plus both stores, opened once per invocation.
pub(crate) struct Context {
    config: GuardConfig,
    logs: AccessLogStore,
    locks: LockStore,
}

impl Context {
    pub(crate) fn open(data_dir: PathBuf, config_dir: &Path) -> Self {
        let config = GuardConfig::load_or_create(config_dir);
        let logs = AccessLogStore::open(config.log_path(&data_dir));
        let locks = LockStore::open(config.lock_path(&data_dir));
        tracing::debug!(
            data_dir = %data_dir.display(),
            logs = logs.count(),
            locks = locks.count(),
            "stores opened"
        );
        Self {
            config,
            logs,
            locks,
        }
    }

    fn flush_logs(&self) -> anyhow::Result<()> {
        self.logs
            .flush()
            .with_context(|| format!("failed to write {}", self.logs.path().display()))
    }

    fn flush_locks(&self) -> anyhow::Result<()> {
        self.locks
            .flush()
            .with_context(|| format!("failed to write {}", self.locks.path().display()))
    }
}

pub(crate) fn log(mut ctx: Context, cmd: LogCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        LogCommand::Query { player } => {
            let found = ctx.logs.query_by_player(&player);
            if found.is_empty() {
                println!("No logs for player: {player}");
            } else {
                print_records(&format!("Chest logs for {player}"), &found);
            }
        }
        LogCommand::Recent { count } => {
            let recent: Vec<&AccessLogRecord> = ctx.logs.query_recent(count).iter().collect();
            if recent.is_empty() {
                println!("No logs recorded.");
            } else {
                print_records(&format!("Last {} chest accesses", recent.len()), &recent);
            }
        }
        LogCommand::At(at) => {
            let found = ctx.logs.query_by_position(&at.key());
            if found.is_empty() {
                println!("No logs for position: {}", at.pos());
            } else {
                print_records(&format!("Chest logs at {}", at.pos()), &found);
            }
        }
        LogCommand::Near(at) => match ctx.logs.query_around(at.pos(), &at.dimension) {
            Some((pos, found)) => print_records(&format!("Chest logs at {pos}"), &found),
            None => println!("No logged containers near {}.", at.pos()),
        },
        LogCommand::Clear => {
            let removed = ctx.logs.clear();
            ctx.flush_logs()?;
            println!("Cleared all {removed} chest logs.");
        }
        LogCommand::Prune { days } => {
            let policy = days.map_or_else(|| ctx.config.retention(), RetentionPolicy::new);
            let removed = policy.sweep(&mut ctx.logs, now_millis());
            if policy.is_enabled() {
                ctx.flush_logs()?;
            }
            println!("Removed {removed} logs older than {} days.", policy.days);
        }
        LogCommand::Stats => {
            println!("=== Chest log statistics ===");
            println!("Total logs: {}", ctx.logs.count());
            println!("Total locks: {}", ctx.locks.count());
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn lock(mut ctx: Context, cmd: LockCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        LockCommand::Add {
            at,
            owner,
            owner_name,
        } => {
            match request_lock(&mut ctx.locks, &ctx.config, owner, &owner_name, at.key()) {
                Ok(record) => println!("Container locked: {record}"),
                Err(rejected) => return Ok(reject(rejected)),
            }
            ctx.flush_locks()?;
        }
        LockCommand::Remove { at, who } => {
            match request_unlock(&mut ctx.locks, who.requester, who.admin, &at.key()) {
                Ok(lifted) => println!("Container unlocked (was owned by {}).", lifted.owner_name()),
                Err(rejected) => return Ok(reject(rejected)),
            }
            ctx.flush_locks()?;
        }
        LockCommand::Info(at) => match ctx.locks.lock_of(&at.key()) {
            Some(lock) => {
                println!("Owner: {} ({})", lock.owner_name(), lock.owner_id());
                println!("Position: {} ({})", lock.pos(), lock.dimension());
                println!("Locked: {}", format_millis(lock.locked_at_millis()));
            }
            None => println!("This container is not locked"),
        },
        LockCommand::List { owner } => {
            let locks = match owner {
                Some(owner) => ctx.locks.locks_of(owner),
                None => ctx.locks.all_locks(),
            };
            if locks.is_empty() {
                println!("No locks.");
            } else {
                println!("=== Locks ({}) ===", locks.len());
                for lock in locks {
                    println!("{lock}");
                }
            }
        }
        LockCommand::Check { at, who } => {
            let verdict =
                check_interaction(&ctx.locks, &ctx.config, who.requester, who.admin, &at.key());
            if !verdict.is_allowed() {
                return Ok(reject(verdict));
            }
            println!("{verdict}");
        }
        LockCommand::Break { at, who } => {
            let verdict =
                check_removal(&mut ctx.locks, &ctx.config, who.requester, who.admin, &at.key());
            if !verdict.is_allowed() {
                return Ok(reject(verdict.message().unwrap_or_default()));
            }
            ctx.flush_locks()?;
            println!("{}", verdict.message().unwrap_or_else(|| "Break allowed".to_string()));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Run one open/close session against the access log.
pub(crate) fn record(
    mut ctx: Context,
    at: &Position,
    player: &str,
    before: &str,
    after: &str,
) -> anyhow::Result<ExitCode> {
    let before: BTreeMap<String, u32> =
        serde_json::from_str(before).context("--before must be a JSON object of item counts")?;
    let after: BTreeMap<String, u32> =
        serde_json::from_str(after).context("--after must be a JSON object of item counts")?;

    // Log records carry names only, so a throwaway session id is enough here.
    let session = PlayerId::new();
    let mut sessions = SessionTracker::new();
    sessions.open(
        session,
        player,
        Snapshot::new(at.pos(), at.dimension.clone(), before),
    );

    match sessions.close(session, after, now_millis()) {
        Some(record) => {
            println!("{record}");
            ctx.logs.append(record);
            ctx.flush_logs()?;
        }
        None => println!("No changes detected, nothing logged."),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_records(title: &str, records: &[&AccessLogRecord]) {
    println!("=== {title} ({} entries) ===", records.len());
    for record in records {
        println!("{record}");
    }
}

fn reject(reason: impl Display) -> ExitCode {
    eprintln!("{reason}");
    ExitCode::FAILURE
}
