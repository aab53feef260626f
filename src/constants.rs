//! Windows API, binary layout and resource identifier constants.

#![allow(non_upper_case_globals)]

pub type DWORD = u32;
pub type WORD = u16;
pub type LANGID = WORD;


// https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-lcid/a9eac961-e77d-41a6-90a5-ce1a8b0cdb9c
pub const LANGUAGE_ID_EN_US: LANGID = 1033; // 0x0409, MAKELANGID(LANG_ENGLISH, SUBLANG_ENGLISH_US)


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format

pub const PE_DOS_MAGIC: WORD = 0x5a4d; // MZ
pub const PE_PTR_OFFSET: DWORD = 0x03c;
pub const PE_NT_SIGNATURE: DWORD = 0x00004550; // PE00
pub const PE_32_MAGIC: WORD = 0x010b;
pub const PE_64_MAGIC: WORD = 0x020b;

pub const SECTION_HEADER_SIZE: u32 = 40;
pub const DATA_DIRECTORY_SIZE: u32 = 8;
pub const RESOURCE_TABLE_SIZE: u32 = 16;
pub const RESOURCE_ENTRY_SIZE: u32 = 8;
pub const RESOURCE_DATA_ENTRY_SIZE: u32 = 16;

/// Name of the section appended when the resource directory can't be updated in place.
pub const RESOURCE_SECTION_NAME: &[u8; 8] = b".rsrc\0\0\0";


// https://docs.microsoft.com/en-us/windows/win32/menurc/resource-types

pub const RT_ICON: WORD = 0x03;
pub const RT_STRING: WORD = 0x06;
pub const RT_RCDATA: WORD = 0x0A;
pub const RT_GROUP_ICON: WORD = 0x0E;
pub const RT_MANIFEST: WORD = 0x18;


// https://learn.microsoft.com/en-us/windows/win32/menurc/resource-file-formats

pub const ICON_DIRECTORY_SIZE: usize = 6;
pub const ICON_DIRECTORY_ENTRY_SIZE: usize = 16;
pub const GROUP_ICON_DIRECTORY_ENTRY_SIZE: usize = 14;
pub const ICON_TYPE_ICON: WORD = 1;


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format#section-flags

pub const IMAGE_SCN_CNT_CODE: DWORD = 0x00000020;
pub const IMAGE_SCN_CNT_INITIALIZED_DATA: DWORD = 0x00000040;
pub const IMAGE_SCN_MEM_EXECUTE: DWORD = 0x20000000;
pub const IMAGE_SCN_MEM_READ: DWORD = 0x40000000;


// Resource identifiers shared with the launcher stub reading them back at runtime.
// Renumbering one side without the other breaks the stub.

/// `RT_GROUP_ICON` identifier of the application icon.
pub const IDI_APPLICATION_ICON: WORD = 101;
/// `RT_ICON` identifier of the first icon image, subsequent images follow consecutively.
pub const IDI_FIRST_ICON_IMAGE: WORD = 1;
/// `RT_RCDATA` identifier of the embedded archive.
pub const IDR_ARCHIVE: WORD = 102;
/// `RT_STRING` block identifier holding string ids 0 to 15.
pub const IDS_STRING_BLOCK: WORD = 1;

/// Number of strings in a string table block.
pub const STRING_TABLE_SLOTS: usize = 16;
/// Slot of the console window title.
pub const IDS_CONSOLE_TITLE: usize = 1;
/// Slot of the arguments passed to the launched process.
pub const IDS_PROCESS_ARGUMENTS: usize = 2;
