//! Errors specific to reading, writing or patching a PE image and its resources.

use alloc::string::String;

#[cfg(feature = "std")]
use std::{io::Error as IOError, path::PathBuf};

/// Error that can occur when reading and parsing bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(feature = "std", error("{0}"))]
pub struct ReadError(pub String);

/// Errors that can occur when reading a PE image.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ImageReadError {
    #[cfg_attr(feature = "std", error("invalid bytes: {0}"))]
    InvalidBytes(ReadError),
    #[cfg_attr(feature = "std", error("invalid header: {0}"))]
    InvalidHeader(String),
    #[cfg_attr(feature = "std", error("invalid section: {0}"))]
    InvalidSection(String),
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for ImageReadError {
    fn from(error: ReadError) -> Self { ImageReadError::InvalidBytes(error) }
}
#[cfg(feature = "std")]
impl From<IOError> for ImageReadError {
    fn from(error: IOError) -> Self { ImageReadError::IOError(error) }
}

/// Errors that can occur when writing a PE image.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ImageWriteError {
    #[cfg_attr(feature = "std", error("not enough space in file header"))]
    NotEnoughSpaceInHeader,
    #[cfg_attr(feature = "std", error("section points outside image: {0} > {1}"))]
    InvalidSectionRange(u64, u64),
    #[cfg_attr(feature = "std", error("resource directory too large: {0} bytes"))]
    ResourceDirectoryTooLarge(u64),
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    IOError(IOError),
}
#[cfg(feature = "std")]
impl From<IOError> for ImageWriteError {
    fn from(error: IOError) -> Self { ImageWriteError::IOError(error) }
}

/// Errors that can occur when modifying resource data.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ResourceError {
    #[cfg_attr(feature = "std", error("invalid table: {0}"))]
    InvalidTable(String),
    #[cfg_attr(feature = "std", error("invalid bytes: {0}"))]
    InvalidBytes(ReadError),
}
impl From<ReadError> for ResourceError {
    fn from(error: ReadError) -> Self { ResourceError::InvalidBytes(error) }
}

/// Errors that can occur when validating an icon file.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum IconError {
    #[cfg_attr(feature = "std", error("icon header truncated: {0} bytes"))]
    TruncatedHeader(usize),
    #[cfg_attr(
        feature = "std",
        error("invalid icon header: reserved {reserved}, type {type_}, count {count}")
    )]
    InvalidMagic { reserved: u16, type_: u16, count: u16 },
    #[cfg_attr(
        feature = "std",
        error("icon entry table truncated: {count} entries need {required} bytes, got {size}")
    )]
    TruncatedEntryTable { count: u16, required: usize, size: usize },
    #[cfg_attr(
        feature = "std",
        error("icon entry {index} out of bounds: {bytes} bytes at {offset}, file size {size}")
    )]
    EntryOutOfBounds { index: u16, offset: u32, bytes: u32, size: usize },
    #[cfg_attr(feature = "std", error("icon entry {index} has no image data"))]
    EmptyEntry { index: u16 },
}

/// Errors that can occur when populating or encoding a string table block.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum StringTableError {
    #[cfg_attr(feature = "std", error("string slot {0} out of range"))]
    SlotOutOfRange(usize),
    #[cfg_attr(feature = "std", error("string in slot {0} too long: {1} code units"))]
    StringTooLong(usize, usize),
    #[cfg_attr(feature = "std", error("out of memory encoding {0} bytes"))]
    OutOfMemory(usize),
    #[cfg_attr(feature = "std", error("invalid string block: {0}"))]
    InvalidBytes(ReadError),
}
impl From<ReadError> for StringTableError {
    fn from(error: ReadError) -> Self { StringTableError::InvalidBytes(error) }
}

/// Errors that can occur in a resource update transaction.
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("cannot open {0:?} for resource editing: {1}")]
    CannotOpenTarget(PathBuf, String),
    #[error("resource update rejected: {0}")]
    UpdateRejected(String),
    #[error("committing resource updates failed, target state unknown: {0}")]
    CommitFailed(String),
}

/// Errors that can occur when patching the resources of an executable.
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("invalid icon: {0}")]
    InvalidIcon(#[from] IconError),
    #[error("invalid string table: {0}")]
    StringTable(#[from] StringTableError),
    #[error("{0}")]
    Transaction(#[from] TransactionError),
    #[error("failed to read {0:?}: {1}")]
    FileRead(PathBuf, IOError),
}
