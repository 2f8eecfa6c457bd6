use anyhow::Result;
use async_trait::async_trait;

#[cfg(not(windows))]
use std::sync::atomic::{AtomicBool, Ordering};

#[allow(dead_code)]
const ENABLE_LOGS: bool = true;

#[allow(unused_imports)]
use crate::log_warn;

/// Host "seconds since last keyboard or mouse input".
#[async_trait]
pub trait IdleProbe: Send + Sync {
    async fn system_idle_seconds(&self) -> Result<u64>;
}

#[derive(Debug, Default)]
pub struct SystemIdleProbe {
    #[cfg(not(windows))]
    warned: AtomicBool,
}

impl SystemIdleProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(windows)]
#[async_trait]
impl IdleProbe for SystemIdleProbe {
    async fn system_idle_seconds(&self) -> Result<u64> {
        let idle_ms = idle_millis().ok_or_else(|| anyhow::anyhow!("GetLastInputInfo failed"))?;
        Ok(u64::from(idle_ms) / 1000)
    }
}

#[cfg(windows)]
fn idle_millis() -> Option<u32> {
    use windows_sys::Win32::System::SystemInformation::GetTickCount;
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};

    let mut lii = LASTINPUTINFO {
        cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let ok = unsafe { GetLastInputInfo(&mut lii) };
    if ok == 0 {
        return None;
    }

    let now_tick = unsafe { GetTickCount() };
    Some(now_tick.wrapping_sub(lii.dwTime))
}

#[cfg(not(windows))]
#[async_trait]
impl IdleProbe for SystemIdleProbe {
    async fn system_idle_seconds(&self) -> Result<u64> {
        if !self.warned.swap(true, Ordering::Relaxed) {
            log_warn!("no idle probe on this platform; every sample counts as active");
        }
        Ok(0)
    }
}
