//! Three-tier progress delivery: member scan, direct call, then `onProgress`.

use std::fmt;

use crate::receiver::{ON_PROGRESS, ProgressReceiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Downloading,
    Finished
}

impl Phase {
    fn prefix(self) -> &'static str {
        match self {
            Phase::Downloading => "",
            Phase::Finished => "Finished: "
        }
    }
}

/// How a progress update reached the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Member(String),
    Direct,
    OnProgress
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Member(name) => write!(f, "method {name}"),
            Delivery::Direct => write!(f, "progress receiver directly"),
            Delivery::OnProgress => write!(f, "{ON_PROGRESS}")
        }
    }
}

/// Members eligible for the scan; `__`-prefixed names are internal.
pub fn available_members<R: ProgressReceiver + ?Sized>(receiver: &R) -> Vec<&str> {
    receiver
        .members()
        .into_iter()
        .filter(|name| !name.starts_with("__"))
        .collect()
}

/// Delivers `(downloaded, total)` to the first tier that accepts it.
///
/// Failures are logged and swallowed; `None` means every tier failed.
pub fn dispatch<R: ProgressReceiver + ?Sized>(
    receiver: &R,
    downloaded: u64,
    total: u64,
    phase: Phase
) -> Option<Delivery> {
    let prefix = phase.prefix();

    for name in available_members(receiver) {
        tracing::debug!("{}Trying method: {}", prefix, name);
        match receiver.invoke(name, downloaded, total) {
            Ok(()) => {
                tracing::info!("{}Called method: {} with {}/{}", prefix, name, downloaded, total);
                return Some(Delivery::Member(name.to_string()));
            }
            Err(e) => tracing::debug!("{}Method {} failed: {}", prefix, name, e)
        }
    }

    match receiver.call(downloaded, total) {
        Ok(()) => {
            tracing::info!(
                "{}Called progress receiver directly with {}/{}",
                prefix,
                downloaded,
                total
            );
            return Some(Delivery::Direct);
        }
        Err(e) => tracing::error!("{}Direct call failed: {}", prefix, e)
    }

    match receiver.invoke(ON_PROGRESS, downloaded, total) {
        Ok(()) => {
            tracing::info!("{}Called {} with {}/{}", prefix, ON_PROGRESS, downloaded, total);
            Some(Delivery::OnProgress)
        }
        Err(e) => {
            tracing::error!("{}{} call failed: {}", prefix, ON_PROGRESS, e);
            None
        }
    }
}
