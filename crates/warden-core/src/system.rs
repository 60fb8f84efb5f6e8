//! System-control seam: filesystem sync and OS power-off
//!
//! The scheduling loop talks to the operating system through this
//! trait so the shutdown sequence can be exercised in tests without
//! powering anything off.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use warden_util::{Result, WardenError};

/// Host-side system operations used by the shutdown sequence
#[async_trait]
pub trait SystemControl: Send + Sync {
    /// Flush filesystem buffers to disk.
    fn sync_filesystems(&self);

    /// Ask the operating system to power down. A failure is fatal: the
    /// controller has already been armed and the host must not linger.
    async fn power_down(&self) -> Result<()>;
}

/// Real implementation
pub struct LinuxSystem;

#[async_trait]
impl SystemControl for LinuxSystem {
    fn sync_filesystems(&self) {
        nix::unistd::sync();
    }

    async fn power_down(&self) -> Result<()> {
        let output = tokio::process::Command::new("/sbin/poweroff")
            .output()
            .await
            .map_err(|e| WardenError::system(format!("failed to run poweroff: {e}")))?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(WardenError::system(format!(
                "poweroff failed ({}): {}",
                output.status,
                text.trim()
            )));
        }

        Ok(())
    }
}

/// Recording implementation for tests. Clones share state.
#[derive(Clone, Default)]
pub struct MockSystem {
    syncs: Arc<Mutex<u32>>,
    power_downs: Arc<Mutex<u32>>,

    /// Configure power_down to fail
    pub fail_power_down: Arc<Mutex<bool>>,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_count(&self) -> u32 {
        *self.syncs.lock().unwrap()
    }

    pub fn power_down_count(&self) -> u32 {
        *self.power_downs.lock().unwrap()
    }
}

#[async_trait]
impl SystemControl for MockSystem {
    fn sync_filesystems(&self) {
        *self.syncs.lock().unwrap() += 1;
    }

    async fn power_down(&self) -> Result<()> {
        if *self.fail_power_down.lock().unwrap() {
            return Err(WardenError::system("mock poweroff failure"));
        }
        *self.power_downs.lock().unwrap() += 1;
        Ok(())
    }
}
