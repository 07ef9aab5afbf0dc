use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[expect(missing_docs, reason = "The variants are self-explanatory.")]
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that the wrapped type
    // does not implement Rust's `core::error::Error` trait. The embassy error
    // types predate that trait's move from `std` (unavailable on bare metal)
    // to `core`; a future embassy release may implement it and make this
    // unnecessary.
    #[cfg(feature = "pico1")]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    #[cfg(feature = "pico1")]
    #[display("Flash operation failed: {_0:?}")]
    Flash(#[error(not(source))] embassy_rp::flash::Error),

    #[display("Stored settings failed validation")]
    SettingsCorrupted,

    #[display("Settings do not fit in the reserved flash sector")]
    SettingsTooLarge,
}

#[cfg(feature = "pico1")]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}

#[cfg(feature = "pico1")]
impl From<embassy_rp::flash::Error> for Error {
    fn from(err: embassy_rp::flash::Error) -> Self {
        Self::Flash(err)
    }
}
