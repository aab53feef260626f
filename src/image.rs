//! Portable executable image representation.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format> for more information.

use alloc::{borrow::Cow, string::ToString, vec::Vec};

use ahash::RandomState;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, resource::*, types::*, util::*};

/// Image data directory type enumeration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DataDirectoryType {
    ExportTable,
    ImportTable,
    ResourceTable,
    ExceptionTable,
    CertificateTable,
    BaseRelocationTable,
    Debug,
    Architecture,
    GlobalPtr,
    TLSTable,
    LoadConfigTable,
    BoundImport,
    IAT,
    DelayImportDescriptor,
    CLRRuntimeHeader,
    Reserved,
}

const DATA_DIRECTORY_ORDER: [DataDirectoryType; 16] = {
    use DataDirectoryType::*;
    [
        ExportTable,
        ImportTable,
        ResourceTable,
        ExceptionTable,
        CertificateTable,
        BaseRelocationTable,
        Debug,
        Architecture,
        GlobalPtr,
        TLSTable,
        LoadConfigTable,
        BoundImport,
        IAT,
        DelayImportDescriptor,
        CLRRuntimeHeader,
        Reserved,
    ]
};

/// Where a new resource directory is written.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ResourcePlacement {
    /// Overwrite the section holding the current resource directory.
    /// A section that is last in the image may grow or shrink, others keep their size.
    InPlace { index: usize, last: bool },
    /// Append a new section, keeping any existing resource section intact.
    Append,
}

/// Portable executable image representation.
///
/// This struct is the main entry point for parsing, querying and updating the resources of a portable executable image.
#[derive(Debug, Clone)]
pub struct Image<'a> {
    pub(crate) image: Cow<'a, [u8]>,

    pub(crate) coff_header:           CoffHeader,
    pub(crate) windows_header:        GenericWindowsHeader,
    pub(crate) header_data_directory: IndexMap<DataDirectoryType, ImageDataDirectory, RandomState>,
    pub(crate) section_table:         Vec<SectionHeader>,

    pub(crate) resource_directory: Option<ResourceDirectory>,

    coff_header_offset:     u64,
    windows_header_offset:  u64,
    data_directory_offset:  u64,
    section_table_offset:   u64,
    directories_offset:     u64,
}

impl PartialEq for Image<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.coff_header == other.coff_header
            && self.windows_header == other.windows_header
            && self.header_data_directory == other.header_data_directory
            && self.section_table == other.section_table
            && self.resource_directory == other.resource_directory
    }
}
impl Eq for Image<'_> {}

impl<'a> Image<'a> {
    /// Parse a portable executable image from a byte slice.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the byte slice is not a valid portable executable image or is missing required headers.
    pub fn parse<R: Into<Cow<'a, [u8]>>>(image: R) -> Result<Self, ImageReadError> {
        let image = image.into();

        let pe_dos_magic = read_at::<u16>(&image, 0)?;
        debug!("pe_dos_magic: {:#x?}", pe_dos_magic);
        if pe_dos_magic != PE_DOS_MAGIC {
            return Err(ImageReadError::InvalidHeader("no dos magic".into()));
        }

        let pe_signature_offset = read_at::<u32>(&image, PE_PTR_OFFSET as u64)? as u64;
        let pe_signature = read_at::<u32>(&image, pe_signature_offset)?;
        debug!("pe_signature: {:#x?} at {:#x?}", pe_signature, pe_signature_offset);
        if pe_signature != PE_NT_SIGNATURE {
            return Err(ImageReadError::InvalidHeader("no pe signature".into()));
        }

        let coff_header_offset = pe_signature_offset + 4;
        let coff_header = read_at::<CoffHeader>(&image, coff_header_offset)?;
        debug!("{:#x?}: {:#x?}", coff_header_offset, coff_header);

        let standard_header_offset = coff_header_offset + 20;
        let standard_header = read_at::<StandardHeader>(&image, standard_header_offset)?;
        debug!("{:#x?}: {:#x?}", standard_header_offset, standard_header);

        let magic = standard_header.magic;
        let (windows_header_offset, windows_header, data_directory_offset) = match magic {
            PE_32_MAGIC if coff_header.size_of_optional_header >= 96 => {
                let offset = standard_header_offset + 28;
                let header = read_at::<WindowsHeader<u32>>(&image, offset)?;
                (offset, GenericWindowsHeader::WindowsHeader32(header), standard_header_offset + 96)
            }
            PE_64_MAGIC if coff_header.size_of_optional_header >= 112 => {
                let offset = standard_header_offset + 24;
                let header = read_at::<WindowsHeader<u64>>(&image, offset)?;
                (offset, GenericWindowsHeader::WindowsHeader64(header), standard_header_offset + 112)
            }
            _ => return Err(ImageReadError::InvalidHeader("invalid optional header".into())),
        };
        debug!("{:#x?}: {:#x?}", windows_header_offset, windows_header);

        let number_of_rva_and_sizes = windows_header.number_of_rva_and_sizes();
        let section_table_offset =
            standard_header_offset + coff_header.size_of_optional_header as u64;
        if data_directory_offset + number_of_rva_and_sizes.min(16) as u64 * 8 > section_table_offset
        {
            return Err(ImageReadError::InvalidHeader(
                "data directories overlap section table".into(),
            ));
        }

        let mut header_data_directory =
            IndexMap::<DataDirectoryType, ImageDataDirectory, _>::with_hasher(RandomState::new());
        for (index, &header) in DATA_DIRECTORY_ORDER.iter().enumerate() {
            if index as u32 >= number_of_rva_and_sizes {
                break;
            }
            let offset = data_directory_offset + index as u64 * DATA_DIRECTORY_SIZE as u64;
            let data = read_at::<ImageDataDirectory>(&image, offset)?;
            header_data_directory.insert(header, data);
            debug!("{:#x?}: {:?}: {:#x?}", offset, header, data);
        }

        let mut section_table = Vec::with_capacity(coff_header.number_of_sections as usize);
        for index in 0..coff_header.number_of_sections as u64 {
            let offset = section_table_offset + index * SECTION_HEADER_SIZE as u64;
            let section_header = read_at::<SectionHeader>(&image, offset)?;
            debug!(
                "{:#x?}: {}: {:#x?}",
                offset,
                section_header.name().unwrap_or("?".to_string()),
                section_header
            );
            section_table.push(section_header);
        }

        let directories_offset = section_table_offset
            + coff_header.number_of_sections as u64 * SECTION_HEADER_SIZE as u64;

        let mut resource_directory = None;
        if let Some(resource_data) = header_data_directory.get(&DataDirectoryType::ResourceTable) {
            if resource_data.virtual_address > 0 && resource_data.size > 0 {
                let section = section_table
                    .iter()
                    .find(|section| section.contains_rva(resource_data.virtual_address))
                    .ok_or_else(|| {
                        ImageReadError::InvalidSection("resource table outside of sections".into())
                    })?;
                debug!(
                    "found resource directory in {} section: {:#x?}",
                    section.name().unwrap_or("?".to_string()),
                    section
                );
                let base_address = section.pointer_to_raw_data as u64
                    + (resource_data.virtual_address - section.virtual_address) as u64;
                let base_address = u32::try_from(base_address).map_err(|_| {
                    ImageReadError::InvalidSection("resource table outside of image".into())
                })?;
                resource_directory = Some(ResourceDirectory::parse(
                    &image,
                    base_address,
                    resource_data.virtual_address,
                )?);
            }
        }

        Ok(Self {
            image,
            coff_header,
            windows_header,
            header_data_directory,
            section_table,
            resource_directory,
            coff_header_offset,
            windows_header_offset,
            data_directory_offset,
            section_table_offset,
            directories_offset,
        })
    }

    #[cfg(feature = "std")]
    /// Parse a portable executable image from a file.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the file could not be read, is not a valid portable executable image or is missing required headers.
    pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> Result<Image<'static>, ImageReadError> {
        let data = std::fs::read(path)?;
        Image::parse(data)
    }

    #[cfg(feature = "std")]
    /// Write the portable executable image to a file.
    ///
    /// # Returns
    /// Returns an error if the file could not be written.
    pub fn write_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ImageWriteError> {
        std::fs::write(path, &self.image).map_err(|e| e.into())
    }

    /// Set the resource directory of the image.
    ///
    /// This will update the resource data directory and the resource section.
    /// The section holding the existing resource directory is overwritten in place if only the resource table uses it,
    /// the directory starts at the beginning of the section, and the new directory fits into the section or the section is the last one in the image.
    ///
    /// Otherwise, the existing section is kept intact and a new section is added after all other sections and before any trailing data.
    ///
    /// # Returns
    /// Returns the previous resource directory, or an error in the following cases:
    /// - There is not enough space in the image header to add a new section.
    /// - A section points to data outside the image.
    ///
    /// On error the image is left unchanged.
    pub fn set_resource_directory(
        &mut self, resource_directory: ResourceDirectory,
    ) -> Result<Option<ResourceDirectory>, ImageWriteError> {
        // work on copies so errors leave the image untouched
        let mut coff_header = self.coff_header;
        let mut windows_header = self.windows_header;
        let mut header_data_directory = self.header_data_directory.clone();
        let mut section_table = self.section_table.clone();

        let mut required_header_space = 0u64;
        for header in [
            DataDirectoryType::ExportTable,
            DataDirectoryType::ImportTable,
            DataDirectoryType::ResourceTable,
        ] {
            if !header_data_directory.contains_key(&header) {
                debug!("adding missing header data directory: {:?}", header);
                header_data_directory.insert(header, ImageDataDirectory::default());
                coff_header.size_of_optional_header += DATA_DIRECTORY_SIZE as u16;
                required_header_space += DATA_DIRECTORY_SIZE as u64;
            }
        }

        let directory_size = resource_directory.size();
        let file_alignment = windows_header.file_alignment();
        let section_alignment = windows_header.section_alignment();
        debug!("new resource directory size: {:#x?}", directory_size);

        let (first_section_start, last_section_end) = self.raw_section_bounds();
        if last_section_end > self.image.len() as u64 {
            error!("sections end at {:#x?} past the image end", last_section_end);
            return Err(ImageWriteError::InvalidSectionRange(
                last_section_end,
                self.image.len() as u64,
            ));
        }

        let placement = self.resource_placement(&header_data_directory, directory_size);
        debug!("resource placement: {:?}", placement);

        let mut body = Vec::with_capacity(self.image.len() + directory_size as usize);
        match placement {
            ResourcePlacement::InPlace { index, last } => {
                let section = &mut section_table[index];
                let section_start = section.pointer_to_raw_data as usize;
                let section_end = section.raw_end() as usize;

                let mut data = resource_directory.build(section.virtual_address);
                if last {
                    let raw_size = aligned_to(directory_size, file_alignment);
                    data.resize(raw_size as usize, 0);
                    section.size_of_raw_data = raw_size;
                    section.virtual_size = directory_size;
                } else {
                    data.resize(section.size_of_raw_data as usize, 0);
                    section.virtual_size = section.virtual_size.max(directory_size);
                }

                let resource_dd = header_data_directory.entry(DataDirectoryType::ResourceTable).or_default();
                resource_dd.virtual_address = section.virtual_address;
                resource_dd.size = directory_size;

                body.extend_from_slice(&self.image[first_section_start as usize..section_start]);
                body.extend_from_slice(&data);
                body.extend_from_slice(&self.image[section_end..last_section_end as usize]);
            }
            ResourcePlacement::Append => {
                let virtual_address = aligned_to(
                    section_table
                        .iter()
                        .map(|section| section.virtual_address as u64 + section.virtual_size as u64)
                        .max()
                        .unwrap_or(section_alignment as u64),
                    section_alignment as u64,
                );
                if virtual_address + directory_size as u64 > u32::MAX as u64 {
                    return Err(ImageWriteError::ResourceDirectoryTooLarge(directory_size as u64));
                }
                let virtual_address = virtual_address as u32;
                let pointer_to_raw_data = aligned_to(last_section_end, file_alignment as u64);
                if pointer_to_raw_data > u32::MAX as u64 {
                    return Err(ImageWriteError::InvalidSectionRange(
                        pointer_to_raw_data,
                        u32::MAX as u64,
                    ));
                }

                let raw_size = aligned_to(directory_size, file_alignment);
                let mut data = resource_directory.build(virtual_address);
                data.resize(raw_size as usize, 0);

                section_table.push(SectionHeader {
                    name: u64::from_le_bytes(*RESOURCE_SECTION_NAME),
                    virtual_size: directory_size,
                    virtual_address,
                    size_of_raw_data: raw_size,
                    pointer_to_raw_data: pointer_to_raw_data as u32,
                    characteristics: IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
                    ..SectionHeader::default()
                });
                coff_header.number_of_sections += 1;
                required_header_space += SECTION_HEADER_SIZE as u64;

                let resource_dd = header_data_directory.entry(DataDirectoryType::ResourceTable).or_default();
                resource_dd.virtual_address = virtual_address;
                resource_dd.size = directory_size;

                body.extend_from_slice(
                    &self.image[first_section_start as usize..last_section_end as usize],
                );
                body.resize(body.len() + (pointer_to_raw_data - last_section_end) as usize, 0);
                body.extend_from_slice(&data);
                info!(
                    "added resource section at {:#x?} ({:#x?} bytes)",
                    virtual_address, directory_size
                );
            }
        }

        if first_section_start < self.directories_offset {
            return Err(ImageWriteError::InvalidSectionRange(
                self.directories_offset,
                first_section_start,
            ));
        }
        let available_space = first_section_start - self.directories_offset;
        debug!(
            "header space available: {:#x?}, required: {:#x?}",
            available_space, required_header_space
        );
        if required_header_space > available_space {
            error!(
                "not enough space in header to add new section ({} > {})",
                required_header_space, available_space
            );
            return Err(ImageWriteError::NotEnoughSpaceInHeader);
        }

        if header_data_directory
            .get(&DataDirectoryType::CertificateTable)
            .is_some_and(|certificates| certificates.size > 0)
        {
            warn!("image is signed, the signature is invalidated by the resource update");
        }

        let size_of_image = aligned_to(
            section_table
                .iter()
                .map(|section| section.virtual_address as u64 + section.virtual_size as u64)
                .max()
                .unwrap_or_default(),
            section_alignment as u64,
        ) as u32;
        windows_header.set_layout(size_of_image, header_data_directory.len() as u32);

        let mut new_image = Vec::with_capacity(first_section_start as usize + body.len());
        new_image.extend_from_slice(&self.image[..self.coff_header_offset as usize]);
        new_image.extend_from_slice(coff_header.as_bytes());
        // standard header including fields not modeled by `StandardHeader`
        new_image.extend_from_slice(
            &self.image[(self.coff_header_offset + 20) as usize..self.windows_header_offset as usize],
        );
        new_image.extend_from_slice(windows_header.as_bytes());
        for directory in header_data_directory.values() {
            new_image.extend_from_slice(directory.as_bytes());
        }
        // bytes between the data directories and the section table
        new_image.extend_from_slice(
            &self.image[(self.data_directory_offset
                + self.header_data_directory.len() as u64 * DATA_DIRECTORY_SIZE as u64)
                as usize..self.section_table_offset as usize],
        );
        for section_header in section_table.iter() {
            new_image.extend_from_slice(section_header.as_bytes());
        }
        new_image.extend_from_slice(
            &self.image[(self.directories_offset + required_header_space) as usize
                ..first_section_start as usize],
        );
        new_image.extend_from_slice(&body);
        new_image.extend_from_slice(&self.image[last_section_end as usize..]);

        let section_table_offset = self.section_table_offset
            + (header_data_directory.len() - self.header_data_directory.len()) as u64
                * DATA_DIRECTORY_SIZE as u64;
        let directories_offset = self.directories_offset + required_header_space;
        let mut resource_directory = resource_directory;
        resource_directory.virtual_address = header_data_directory
            .get(&DataDirectoryType::ResourceTable)
            .map(|directory| directory.virtual_address)
            .unwrap_or_default();

        self.coff_header = coff_header;
        self.windows_header = windows_header;
        self.header_data_directory = header_data_directory;
        self.section_table = section_table;
        self.section_table_offset = section_table_offset;
        self.directories_offset = directories_offset;
        self.image = new_image.into();

        Ok(self.resource_directory.replace(resource_directory))
    }

    /// Returns the file offsets where the raw data of the first section starts and of the last section ends.
    fn raw_section_bounds(&self) -> (u64, u64) {
        let with_data = || self.section_table.iter().filter(|section| section.size_of_raw_data > 0);
        let first = with_data()
            .map(|section| section.pointer_to_raw_data as u64)
            .min()
            .unwrap_or(self.image.len() as u64);
        let last = with_data()
            .map(|section| section.raw_end())
            .max()
            .unwrap_or(self.image.len() as u64);
        (first, last)
    }

    fn resource_placement(
        &self, header_data_directory: &IndexMap<DataDirectoryType, ImageDataDirectory, RandomState>,
        directory_size: u32,
    ) -> ResourcePlacement {
        let Some(resource_dd) = header_data_directory.get(&DataDirectoryType::ResourceTable).copied() else {
            return ResourcePlacement::Append;
        };
        if resource_dd.size == 0 {
            return ResourcePlacement::Append;
        }
        let Some(index) = self
            .section_table
            .iter()
            .position(|section| section.contains_rva(resource_dd.virtual_address))
        else {
            return ResourcePlacement::Append;
        };
        let section = self.section_table[index];
        if section.virtual_address != resource_dd.virtual_address || section.size_of_raw_data == 0
        {
            debug!("resource directory does not start its section, keeping section intact");
            return ResourcePlacement::Append;
        }

        let shared = header_data_directory.iter().any(|(header, directory)| {
            *header != DataDirectoryType::ResourceTable
                && directory.size > 0
                && section.contains_rva(directory.virtual_address)
        });
        if shared {
            info!("resource section also used by other data directories, keeping section intact");
            warn!("resource section used by multiple data directories can indicate a packed executable");
            return ResourcePlacement::Append;
        }

        let last_raw = self.section_table.iter().all(|other| other.raw_end() <= section.raw_end());
        let last_virtual =
            self.section_table.iter().all(|other| other.virtual_address <= section.virtual_address);
        if last_raw && last_virtual {
            return ResourcePlacement::InPlace { index, last: true };
        }

        let capacity = section
            .size_of_raw_data
            .min(aligned_to(section.virtual_size, self.windows_header.section_alignment()));
        if directory_size <= capacity {
            ResourcePlacement::InPlace { index, last: false }
        } else {
            debug!(
                "resource section too small and followed by other sections ({:#x?} < {:#x?})",
                capacity, directory_size
            );
            ResourcePlacement::Append
        }
    }

    /// Returns the current resource directory or `None` if the image does not contain a resource directory.
    pub fn resource_directory(&self) -> Option<&ResourceDirectory> {
        self.resource_directory.as_ref()
    }

    /// Returns the raw image data with all changes applied.
    pub fn data(&self) -> &[u8] { &self.image }

    /// Returns the parsed coff header.
    pub fn coff_header(&self) -> &CoffHeader { &self.coff_header }

    /// Returns the parsed windows header.
    pub fn windows_header(&self) -> &GenericWindowsHeader { &self.windows_header }

    /// Returns the data directory for the requested header.
    pub fn data_directory(&self, directory: DataDirectoryType) -> Option<&ImageDataDirectory> {
        self.header_data_directory.get(&directory)
    }

    /// Returns the section header containing the data directory.
    pub fn section_header_for_data_directory(
        &self, directory: DataDirectoryType,
    ) -> Option<&SectionHeader> {
        let data_directory = self.data_directory(directory)?;
        self.section_table
            .iter()
            .find(|section| section.contains_rva(data_directory.virtual_address))
    }

    /// Returns all section tables existing in the image.
    pub fn section_table(&self) -> &Vec<SectionHeader> { &self.section_table }
}
