//! Resource **patch**ing for portable executables.
//!
//! Supports:
//! * Parsing and rebuilding the resource section of portable executables
//! * Icon file validation and icon replacement
//! * String table blocks and embedded archives for launcher stubs
//! * Transactional resource updates of executables on disk
//!
//! See [`replace_resources`] and [`ResourcePatcher`] for patching executables on disk,
//! and [`Image`] for parsing, querying and updating an executable image in memory.
//!
//! # Examples
//!
//! ### Icon replacement
//! ```
//! use rsrcpatch::{PatchRequest, ResourcePatcher};
//!
//! let mut patcher = ResourcePatcher::default();
//! patcher.patch(&PatchRequest::new(BINARY_PATH, ICON_PATH))?;
//! ```
//!
//! ### Launcher stub
//! ```
//! use rsrcpatch::replace_resources;
//!
//! let patched = replace_resources(
//!     Path::new(STUB_PATH),
//!     Some(Path::new(ARCHIVE_PATH)),
//!     Path::new(ICON_PATH),
//!     "My Application",
//!     "-m app",
//!     true,
//! );
//! ```
//!
//! ### Resource editing
//! ```
//! use rsrcpatch::{constants::*, Image, ResourceData};
//!
//! let data = std::fs::read(BINARY_PATH)?;
//!
//! // parse the executable image
//! let mut image = Image::parse(&data)?;
//!
//! // get the resource directory
//! let mut resources = image.resource_directory().cloned().unwrap_or_default();
//!
//! // set a resource in the resource directory
//! resources.set_data(RT_RCDATA, 1, LANGUAGE_ID_EN_US, ResourceData::new(payload))?;
//!
//! // set the resource directory in the image
//! image.set_resource_directory(resources)?;
//!
//! // build an executable image with all changes applied
//! let target = image.data();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

extern crate alloc;

pub(crate) mod errors;
pub(crate) mod icon;
pub(crate) mod image;
pub(crate) mod resource;
pub(crate) mod strings;
pub(crate) mod util;

#[cfg(feature = "std")]
pub(crate) mod patcher;
#[cfg(feature = "std")]
pub(crate) mod transaction;

pub mod constants;
pub mod types;

pub use crate::{errors::*, icon::*, image::*, resource::*, strings::*};

#[cfg(feature = "std")]
pub use crate::{patcher::*, transaction::*};
