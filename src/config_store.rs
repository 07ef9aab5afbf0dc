//! Persistent display settings in the Pico's internal flash.
//!
//! The settings live in the last 4KB flash sector, serialized with
//! `postcard` and guarded by a CRC32 checksum. A layout version in the
//! header lets a newer firmware treat an older layout as absent instead
//! of misreading it.
//!
//! # Storage format
//!
//! - Magic number (4 bytes): `0x5646_4443` ('VFDC')
//! - Layout version (4 bytes)
//! - Payload length (2 bytes)
//! - Payload: postcard-serialized [`DisplayConfig`]
//! - CRC32 (4 bytes) over everything before it
//!
//! # Examples
//!
//! ```no_run
//! use embassy_rp::flash::{Blocking, Flash};
//! use vfd_kit::{ConfigStore, DisplayConfig, INTERNAL_FLASH_SIZE};
//!
//! # fn example() -> vfd_kit::Result<()> {
//! let p = embassy_rp::init(Default::default());
//! let flash = Flash::<_, Blocking, INTERNAL_FLASH_SIZE>::new_blocking(p.FLASH);
//! let mut store = ConfigStore::new(flash);
//!
//! let config = store.load()?.unwrap_or_default();
//! // ... user edits settings ...
//! store.save(&config)?;
//! # Ok(())
//! # }
//! ```

use crc32fast::Hasher;
use defmt::{error, info};
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash, Instance};

use crate::config::DisplayConfig;
use crate::{Error, Result};

/// Internal flash size for the Raspberry Pi Pico 1 W (2 MB).
pub const INTERNAL_FLASH_SIZE: usize = 2 * 1024 * 1024;

const MAGIC: u32 = 0x5646_4443; // 'VFDC'
const LAYOUT_VERSION: u32 = 1;
const HEADER_SIZE: usize = 4 + 4 + 2; // Magic + Version + PayloadLen
const CRC_SIZE: usize = 4;
const MAX_PAYLOAD_SIZE: usize = ERASE_SIZE - HEADER_SIZE - CRC_SIZE;

/// Owns the internal flash and the settings sector at its end.
///
/// Saving erases the sector first, so it takes on the order of 100 ms;
/// call it on explicit user commit, not on a tick path.
pub struct ConfigStore<I: Instance + 'static, const N: usize = INTERNAL_FLASH_SIZE> {
    flash: Flash<'static, I, Blocking, N>,
}

impl<I: Instance + 'static, const N: usize> ConfigStore<I, N> {
    #[must_use]
    pub const fn new(flash: Flash<'static, I, Blocking, N>) -> Self {
        Self { flash }
    }

    /// Loads the stored settings.
    ///
    /// Returns `Ok(None)` when the sector is empty or holds an older
    /// layout, and `Err` when the sector claims to hold settings but
    /// fails validation.
    pub fn load(&mut self) -> Result<Option<DisplayConfig>> {
        let offset = self.sector_offset();
        let mut buffer = [0_u8; ERASE_SIZE];
        self.flash
            .blocking_read(offset, &mut buffer)
            .map_err(Error::Flash)?;

        if read_u32(&buffer, 0) != MAGIC {
            info!("ConfigStore: no saved settings");
            return Ok(None);
        }
        let version = read_u32(&buffer, 4);
        if version != LAYOUT_VERSION {
            info!(
                "ConfigStore: layout version {} stored, {} expected; using defaults",
                version, LAYOUT_VERSION
            );
            return Ok(None);
        }

        let payload_len = usize::from(read_u16(&buffer, 8));
        if payload_len > MAX_PAYLOAD_SIZE {
            error!("ConfigStore: invalid payload length {}", payload_len);
            return Err(Error::SettingsCorrupted);
        }

        let crc_offset = HEADER_SIZE.saturating_add(payload_len);
        let stored_crc = read_u32(&buffer, crc_offset);
        let covered = buffer.get(..crc_offset).ok_or(Error::SettingsCorrupted)?;
        let computed_crc = compute_crc(covered);
        if stored_crc != computed_crc {
            error!(
                "ConfigStore: CRC mismatch (computed {}, stored {})",
                computed_crc, stored_crc
            );
            return Err(Error::SettingsCorrupted);
        }

        let payload = buffer
            .get(HEADER_SIZE..crc_offset)
            .ok_or(Error::SettingsCorrupted)?;
        let config = postcard::from_bytes(payload).map_err(|_| {
            error!("ConfigStore: deserialization failed");
            Error::SettingsCorrupted
        })?;
        info!("ConfigStore: loaded settings");
        Ok(Some(config))
    }

    /// Saves `config`, replacing whatever the sector held.
    pub fn save(&mut self, config: &DisplayConfig) -> Result<()> {
        let mut payload_buffer = [0_u8; MAX_PAYLOAD_SIZE];
        let payload_len = postcard::to_slice(config, &mut payload_buffer)
            .map_err(|_| {
                error!(
                    "ConfigStore: serialization failed or settings exceed {} bytes",
                    MAX_PAYLOAD_SIZE
                );
                Error::SettingsTooLarge
            })?
            .len();

        let mut buffer = [0xFF_u8; ERASE_SIZE];
        write_bytes(&mut buffer, 0, &MAGIC.to_le_bytes());
        write_bytes(&mut buffer, 4, &LAYOUT_VERSION.to_le_bytes());
        let len_bytes = u16::try_from(payload_len)
            .map_err(|_| Error::SettingsTooLarge)?
            .to_le_bytes();
        write_bytes(&mut buffer, 8, &len_bytes);
        if let Some(slice) = payload_buffer.get(..payload_len) {
            write_bytes(&mut buffer, HEADER_SIZE, slice);
        }

        let crc_offset = HEADER_SIZE.saturating_add(payload_len);
        let covered = buffer.get(..crc_offset).ok_or(Error::SettingsTooLarge)?;
        let crc = compute_crc(covered);
        write_bytes(&mut buffer, crc_offset, &crc.to_le_bytes());

        let offset = self.sector_offset();
        self.flash
            .blocking_erase(offset, offset.saturating_add(ERASE_SIZE as u32))
            .map_err(Error::Flash)?;
        self.flash
            .blocking_write(offset, &buffer)
            .map_err(Error::Flash)?;
        info!("ConfigStore: saved {} bytes of settings", payload_len);
        Ok(())
    }

    /// Erases the sector; the next [`load`](Self::load) returns `Ok(None)`.
    pub fn clear(&mut self) -> Result<()> {
        let offset = self.sector_offset();
        self.flash
            .blocking_erase(offset, offset.saturating_add(ERASE_SIZE as u32))
            .map_err(Error::Flash)?;
        info!("ConfigStore: cleared settings");
        Ok(())
    }

    /// The settings sector sits in the last erase block of flash.
    fn sector_offset(&self) -> u32 {
        let capacity = u32::try_from(self.flash.capacity()).unwrap_or(u32::MAX);
        capacity.saturating_sub(ERASE_SIZE as u32)
    }
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    let mut bytes = [0_u8; 4];
    if let Some(slice) = buffer.get(offset..offset.saturating_add(4)) {
        bytes.copy_from_slice(slice);
    }
    u32::from_le_bytes(bytes)
}

fn read_u16(buffer: &[u8], offset: usize) -> u16 {
    let mut bytes = [0_u8; 2];
    if let Some(slice) = buffer.get(offset..offset.saturating_add(2)) {
        bytes.copy_from_slice(slice);
    }
    u16::from_le_bytes(bytes)
}

fn write_bytes(buffer: &mut [u8], offset: usize, bytes: &[u8]) {
    if let Some(slice) = buffer.get_mut(offset..offset.saturating_add(bytes.len())) {
        slice.copy_from_slice(bytes);
    }
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
