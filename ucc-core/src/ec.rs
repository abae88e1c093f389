//! Single-owner binder to the embedded-controller character device.
//!
//! The EC exposes fan, keyboard-backlight, charging, and power registers
//! through `/dev/uniwill` as fixed-size request/response frames. There is
//! no public specification of the byte layout beyond "request in, response
//! out" — every access funnels through one mutex-guarded file descriptor so
//! a half-written request from one caller can never interleave with
//! another's.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Mutex;

use ucc_error::{Result, UccError};

const OP_GET_FIELD: u8 = 0x01;
const OP_SET_FIELD: u8 = 0x02;
const OP_SET_FIELD_MASKED: u8 = 0x03;
const OP_GET_FAN_INFO: u8 = 0x04;

const RESPONSE_OK: u8 = 0x00;

/// RPM + duty-cycle pair returned by the EC for one fan channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanInfo {
    pub rpm: u16,
    pub duty_pct: u8,
}

struct EcHandle {
    device: File,
}

impl EcHandle {
    /// Writes `request` then reads exactly `response_len` bytes back. A
    /// single round trip per call — the mutex around this struct is what
    /// guarantees no interleaving, not anything in the framing itself.
    fn transact(&mut self, request: &[u8], response_len: usize) -> Result<Vec<u8>> {
        self.device
            .write_all(request)
            .map_err(|e| UccError::EcTransport(format!("write failed: {e}")))?;
        let mut response = vec![0u8; response_len];
        self.device
            .read_exact(&mut response)
            .map_err(|e| UccError::EcTransport(format!("read failed: {e}")))?;
        Ok(response)
    }
}

/// Exclusive handle to the embedded controller. Opened once at daemon
/// start; every [`crate::hal`] capability that touches EC registers goes
/// through this.
pub struct EcTransport {
    handle: Mutex<EcHandle>,
}

impl EcTransport {
    /// Opens the EC character device. Failure here means the daemon
    /// should report the device unsupported and exit cleanly — this is
    /// not a retryable condition.
    pub fn open(path: &Path) -> Result<Self> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| UccError::EcTransport(format!("failed to open {}: {e}", path.display())))?;
        Ok(Self { handle: Mutex::new(EcHandle { device }) })
    }

    pub fn get_field(&self, id: u16) -> Option<u16> {
        let mut guard = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        let mut request = [0u8; 3];
        request[0] = OP_GET_FIELD;
        request[1..3].copy_from_slice(&id.to_le_bytes());
        let response = guard.transact(&request, 3).ok()?;
        if response[0] != RESPONSE_OK {
            return None;
        }
        Some(u16::from_le_bytes([response[1], response[2]]))
    }

    pub fn set_field(&self, id: u16, value: u16) -> Result<()> {
        let mut guard = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        let mut request = [0u8; 5];
        request[0] = OP_SET_FIELD;
        request[1..3].copy_from_slice(&id.to_le_bytes());
        request[3..5].copy_from_slice(&value.to_le_bytes());
        let response = guard.transact(&request, 1)?;
        if response[0] != RESPONSE_OK {
            return Err(UccError::EcTransport(format!("set_field({id}) rejected by EC")));
        }
        Ok(())
    }

    pub fn write_field_masked(&self, id: u16, value: u16, mask: u16) -> Result<()> {
        let mut guard = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        let mut request = [0u8; 7];
        request[0] = OP_SET_FIELD_MASKED;
        request[1..3].copy_from_slice(&id.to_le_bytes());
        request[3..5].copy_from_slice(&value.to_le_bytes());
        request[5..7].copy_from_slice(&mask.to_le_bytes());
        let response = guard.transact(&request, 1)?;
        if response[0] != RESPONSE_OK {
            return Err(UccError::EcTransport(format!(
                "write_field_masked({id}) rejected by EC"
            )));
        }
        Ok(())
    }

    pub fn get_fan_info(&self, channel: u8) -> Option<FanInfo> {
        let mut guard = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        let request = [OP_GET_FAN_INFO, channel];
        let response = guard.transact(&request, 4).ok()?;
        if response[0] != RESPONSE_OK {
            return None;
        }
        let rpm = u16::from_le_bytes([response[1], response[2]]);
        Some(FanInfo { rpm, duty_pct: response[3] })
    }
}
