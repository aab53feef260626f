//! Data types for parsing and building the resource section.
//! The resource section contains the resource directory and the resource data.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for more information.

use alloc::{format, string::String, vec::Vec};
use core::{borrow::Borrow, cmp::Ordering};

use ahash::RandomState;
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;
use log::{error, trace, warn};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, types::*, util::*};

// type, name and language tables plus headroom for unusual but valid images
const MAX_TABLE_DEPTH: usize = 8;


/// Portable executable resource directory.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceDirectory {
    pub(crate) virtual_address: u32,
    pub(crate) root:            ResourceTable,
}
impl ResourceDirectory {
    /// Parse the resource directory from the given image at the given base address.
    /// The virtual address is used to resolve the resource data offsets and has to correspond to the virtual address in the section table header of the source image.
    ///
    /// # Returns
    /// Returns an error if the resource directory at the given address is invalid.
    pub fn parse(
        image: &[u8], base_address: u32, virtual_address: u32,
    ) -> Result<Self, ImageReadError> {
        let root = ResourceTable::parse(image, base_address, virtual_address, 0, 0)?;
        Ok(Self {
            virtual_address,
            root,
        })
    }

    /// Returns the virtual address of the resource directory in the source image.
    pub fn virtual_address(&self) -> u32 { self.virtual_address }

    /// Returns the root resource table.
    /// The root resource table contains one table per resource type.
    pub fn root(&self) -> &ResourceTable { &self.root }

    /// Returns the mutable root resource table.
    pub fn root_mut(&mut self) -> &mut ResourceTable { &mut self.root }

    /// Returns the size of the resulting resource directory in bytes.
    pub fn size(&self) -> u32 { ResourceLayout::of(&self.root).size() }

    /// Build the resource directory into raw bytes to be included in an image.
    /// The virtual address is used to compute the resource data offsets and has to correspond to the virtual address in the section table header of the target image.
    pub fn build(&self, virtual_address: u32) -> Vec<u8> {
        let layout = ResourceLayout::of(&self.root);
        let mut writer = ResourceWriter::new(&layout, virtual_address);
        self.root.write(&mut writer, 0);
        let data = writer.finish();
        debug_assert_eq!(data.len(), layout.size() as usize);
        data
    }

    /// Returns the data of the resource with the given type, id and language.
    pub fn get_data(&self, kind: WORD, id: WORD, language: LANGID) -> Option<&ResourceData> {
        self.root
            .get(ResourceEntryName::from(kind))?
            .as_table()?
            .get(ResourceEntryName::from(id))?
            .as_table()?
            .get(ResourceEntryName::from(language))?
            .as_data()
    }

    /// Returns the first language variant of the resource with the given type and id.
    pub fn find_data(&self, kind: WORD, id: WORD) -> Option<(LANGID, &ResourceData)> {
        let languages = self
            .root
            .get(ResourceEntryName::from(kind))?
            .as_table()?
            .get(ResourceEntryName::from(id))?
            .as_table()?;
        languages.entries.iter().find_map(|(name, entry)| match (name, entry) {
            (ResourceEntryName::ID(language), ResourceEntry::Data(data)) => {
                Some((*language as LANGID, data))
            }
            _ => None,
        })
    }

    /// Set the data of the resource with the given type, id and language.
    /// Missing type and id tables are created.
    ///
    /// # Returns
    /// Returns the replaced data, or an error if an existing entry on the path is not a table.
    pub fn set_data(
        &mut self, kind: WORD, id: WORD, language: LANGID, data: ResourceData,
    ) -> Result<Option<ResourceData>, ResourceError> {
        let names = self.root.subtable_mut(ResourceEntryName::from(kind))?;
        let languages = names.subtable_mut(ResourceEntryName::from(id))?;
        match languages.insert(ResourceEntryName::from(language), ResourceEntry::Data(data)) {
            Some(ResourceEntry::Data(previous)) => Ok(Some(previous)),
            Some(ResourceEntry::Table(_)) => {
                warn!("replaced resource table {}/{}/{} with data", kind, id, language);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Remove the resource with the given type, id and language.
    /// Id and type tables left empty are removed as well.
    ///
    /// # Returns
    /// Returns the removed data, or `None` if the resource did not exist.
    pub fn remove_data(&mut self, kind: WORD, id: WORD, language: LANGID) -> Option<ResourceData> {
        let kind = ResourceEntryName::from(kind);
        let id = ResourceEntryName::from(id);
        let Some(ResourceEntry::Table(names)) = self.root.get_mut(&kind) else {
            return None;
        };
        let Some(ResourceEntry::Table(languages)) = names.get_mut(&id) else {
            return None;
        };
        let removed = languages.remove(ResourceEntryName::from(language))?;
        if languages.entries.is_empty() {
            names.remove(&id);
        }
        if names.entries.is_empty() {
            self.root.remove(&kind);
        }
        match removed {
            ResourceEntry::Data(data) => Some(data),
            ResourceEntry::Table(_) => None,
        }
    }
}

/// Portable executable resource table.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceTable {
    pub(crate) data:    ResourceDirectoryTable,
    pub(crate) entries: IndexMap<ResourceEntryName, ResourceEntry, RandomState>,
}
impl ResourceTable {
    fn parse(
        image: &[u8], base_address: u32, virtual_address: u32, directory_offset: u32, level: usize,
    ) -> Result<Self, ImageReadError> {
        if level > MAX_TABLE_DEPTH {
            return Err(ImageReadError::InvalidSection(format!(
                "resource table nesting deeper than {}",
                MAX_TABLE_DEPTH
            )));
        }
        let table_offset = base_address as u64 + directory_offset as u64;
        let resource_table = read_at::<ResourceDirectoryTable>(image, table_offset)?;
        trace!("{} {:#x?}", "--".repeat(level + 1), resource_table);

        let mut entries = IndexMap::with_hasher(RandomState::new());

        let count = resource_table.number_of_name_entries as u64
            + resource_table.number_of_id_entries as u64;
        for index in 0..count {
            let entry_offset =
                table_offset + RESOURCE_TABLE_SIZE as u64 + index * RESOURCE_ENTRY_SIZE as u64;
            let entry = read_at::<ResourceDirectoryEntry>(image, entry_offset)?;
            trace!("{} {:#x?}", "--".repeat(level + 1), entry);

            let name =
                ResourceEntryName::parse(image, base_address, entry.name_offset_or_integer_id)?;
            if entry.data_entry_or_subdirectory_offset & 0x80000000 != 0 {
                let table = ResourceTable::parse(
                    image,
                    base_address,
                    virtual_address,
                    entry.data_entry_or_subdirectory_offset ^ 0x80000000,
                    level + 1,
                )?;
                entries.insert(name, ResourceEntry::Table(table));
                continue;
            }

            let description = read_at::<ResourceDataEntry>(
                image,
                base_address as u64 + entry.data_entry_or_subdirectory_offset as u64,
            )?;
            // calculate as i64 and convert to u64 first to check for padding
            let address = base_address as i64 + description.data_rva as i64 - virtual_address as i64;
            let mut address = address as u64;
            if address & 0xffffffffff000000 == 0xffffffffff000000 {
                warn!(
                    "{} resource data entry address {:#x?} seems to be packed, ignoring padding",
                    "--".repeat(level + 1),
                    address
                );
                address ^= 0xffffffffff000000;
            }
            trace!("{} {:#x?} {:#x?}", "--".repeat(level + 1), address, description);
            let Some(data) = slice_at(image, address, description.size as u64) else {
                error!(
                    "{} resource data entry address {:#x?} with size {:#x?} outside valid range ({:#x?})",
                    "--".repeat(level + 1),
                    address,
                    description.size,
                    image.len()
                );
                continue;
            };
            entries.insert(
                name,
                ResourceEntry::Data(ResourceData {
                    data:     data.to_vec().into(),
                    codepage: description.codepage,
                    reserved: description.reserved,
                }),
            );
        }
        Ok(Self {
            data: resource_table,
            entries,
        })
    }

    fn write(&self, writer: &mut ResourceWriter, offset: u32) {
        let (number_of_name_entries, number_of_id_entries) = self.entry_counts();
        let table = ResourceDirectoryTable {
            number_of_name_entries,
            number_of_id_entries,
            ..self.data
        };
        writer.tables.extend_from_slice(table.as_bytes());

        // child tables follow this table in preorder
        let mut child_offset = offset + self.own_size();
        for (name, entry) in &self.entries {
            let name_offset_or_integer_id = match name {
                ResourceEntryName::ID(id) => *id,
                ResourceEntryName::Name(data) => writer.push_string(data) | 0x80000000,
            };
            let data_entry_or_subdirectory_offset = match entry {
                ResourceEntry::Table(table) => {
                    let table_offset = child_offset;
                    child_offset += table.tables_size();
                    table_offset | 0x80000000
                }
                ResourceEntry::Data(data) => writer.push_data(data),
            };
            let entry = ResourceDirectoryEntry {
                name_offset_or_integer_id,
                data_entry_or_subdirectory_offset,
            };
            writer.tables.extend_from_slice(entry.as_bytes());
        }

        let mut child_offset = offset + self.own_size();
        for entry in self.entries.values() {
            if let ResourceEntry::Table(table) = entry {
                table.write(writer, child_offset);
                child_offset += table.tables_size();
            }
        }
    }

    fn entry_counts(&self) -> (u16, u16) {
        let names = self.entries.keys().filter(|name| name.string_size() > 0).count();
        (names as u16, (self.entries.len() - names) as u16)
    }

    fn own_size(&self) -> u32 {
        RESOURCE_TABLE_SIZE + self.entries.len() as u32 * RESOURCE_ENTRY_SIZE
    }

    fn subtable_mut(&mut self, name: ResourceEntryName) -> Result<&mut ResourceTable, ResourceError> {
        if self.get(&name).is_none() {
            self.insert(&name, ResourceEntry::Table(ResourceTable::default()));
        }
        match self.get_mut(&name) {
            Some(ResourceEntry::Table(table)) => Ok(table),
            _ => Err(ResourceError::InvalidTable(format!("{:?} is not a table", name))),
        }
    }

    /// Get a resource entry from the table.
    pub fn get<N: Borrow<ResourceEntryName>>(&self, name: N) -> Option<&ResourceEntry> {
        self.entries.get(name.borrow())
    }

    /// Get a mutable resource entry from the table.
    pub fn get_mut<N: Borrow<ResourceEntryName>>(&mut self, name: N) -> Option<&mut ResourceEntry> {
        self.entries.get_mut(name.borrow())
    }

    /// Insert a resource entry into the table.
    /// If an entry with the given name already exists, it will be replaced.
    /// Entries are kept sorted the way the loader expects them, names first and ids ascending.
    ///
    /// # Returns
    /// The replaced entry.
    pub fn insert<N: Borrow<ResourceEntryName>>(
        &mut self, name: N, entry: ResourceEntry,
    ) -> Option<ResourceEntry> {
        let name = name.borrow();
        let entry = self.entries.insert(name.clone(), entry);
        if entry.is_none() {
            if name.string_size() > 0 {
                self.data.number_of_name_entries += 1;
            } else {
                self.data.number_of_id_entries += 1;
            }
            self.entries.sort_by(|a, _, b, _| a.cmp(b));
        }
        entry
    }

    /// Remove a resource entry from the table.
    ///
    /// # Returns
    /// The removed entry.
    pub fn remove<N: Borrow<ResourceEntryName>>(&mut self, name: N) -> Option<ResourceEntry> {
        let name = name.borrow();
        let entry = self.entries.shift_remove(name)?;
        // counts read from the image are not trusted to match the entries
        if name.string_size() > 0 {
            self.data.number_of_name_entries = self.data.number_of_name_entries.saturating_sub(1);
        } else {
            self.data.number_of_id_entries = self.data.number_of_id_entries.saturating_sub(1);
        }
        Some(entry)
    }

    /// Returns the entries in the table.
    pub fn entries(&self) -> Vec<&ResourceEntryName> { self.entries.keys().collect() }

    /// Returns the size of the table and its children in the resource table.
    pub fn tables_size(&self) -> u32 {
        self.entries.values().map(|entry| entry.table_size()).sum::<u32>() + RESOURCE_TABLE_SIZE
    }

    /// Returns the size of the resource names of the table and its children.
    pub fn strings_size(&self) -> u32 {
        self.entries
            .iter()
            .map(|(name, entry)| name.string_size() + entry.strings_size())
            .sum::<u32>()
    }

    /// Returns the number of data entries in the table and its children.
    pub fn data_count(&self) -> u32 {
        self.entries.values().map(|entry| entry.data_count()).sum::<u32>()
    }

    /// Returns the size of the data in the table and its children, each blob padded to eight bytes.
    pub fn data_size(&self) -> u32 {
        self.entries.values().map(|entry| entry.data_size()).sum::<u32>()
    }
}

/// Offsets of the four regions of a built resource directory:
/// tables, name strings, data descriptions and data.
struct ResourceLayout {
    strings_offset:      u32,
    descriptions_offset: u32,
    data_offset:         u32,
    data_size:           u32,
}
impl ResourceLayout {
    fn of(root: &ResourceTable) -> Self {
        let strings_offset = root.tables_size();
        let descriptions_offset = aligned_to(strings_offset + root.strings_size(), 4);
        let data_offset =
            aligned_to(descriptions_offset + root.data_count() * RESOURCE_DATA_ENTRY_SIZE, 8);
        Self {
            strings_offset,
            descriptions_offset,
            data_offset,
            data_size: root.data_size(),
        }
    }

    fn size(&self) -> u32 { self.data_offset + self.data_size }
}

struct ResourceWriter {
    virtual_address:     u32,
    strings_offset:      u32,
    descriptions_offset: u32,
    data_offset:         u32,
    tables:              Vec<u8>,
    strings:             Vec<u8>,
    descriptions:        Vec<u8>,
    data:                Vec<u8>,
}
impl ResourceWriter {
    fn new(layout: &ResourceLayout, virtual_address: u32) -> Self {
        Self {
            virtual_address,
            strings_offset: layout.strings_offset,
            descriptions_offset: layout.descriptions_offset,
            data_offset: layout.data_offset,
            tables: Vec::with_capacity(layout.strings_offset as usize),
            strings: Vec::new(),
            descriptions: Vec::new(),
            data: Vec::with_capacity(layout.data_size as usize),
        }
    }

    /// Returns the offset of the name string relative to the directory start.
    fn push_string(&mut self, name: &[u8]) -> u32 {
        let offset = self.strings_offset + self.strings.len() as u32;
        self.strings.extend_from_slice(name);
        offset
    }

    /// Returns the offset of the data description relative to the directory start.
    fn push_data(&mut self, data: &ResourceData) -> u32 {
        let offset = self.descriptions_offset + self.descriptions.len() as u32;
        let description = ResourceDataEntry {
            data_rva: self.virtual_address + self.data_offset + self.data.len() as u32,
            size:     data.data.len() as u32,
            codepage: data.codepage,
            reserved: data.reserved,
        };
        self.descriptions.extend_from_slice(description.as_bytes());
        self.data.extend_from_slice(&data.data);
        self.data.resize(aligned_to(self.data.len(), 8), 0);
        offset
    }

    fn finish(self) -> Vec<u8> {
        let mut data = self.tables;
        data.extend_from_slice(&self.strings);
        data.resize(self.descriptions_offset as usize, 0);
        data.extend_from_slice(&self.descriptions);
        data.resize(self.data_offset as usize, 0);
        data.extend_from_slice(&self.data);
        data
    }
}

/// Raw resource data.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceData {
    data:     DebugIgnore<Vec<u8>>,
    codepage: u32,
    reserved: u32,
}
impl ResourceData {
    /// Create resource data with the default codepage.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data:     data.into(),
            codepage: 0,
            reserved: 0,
        }
    }

    /// Returns the raw data.
    pub fn data(&self) -> &[u8] { &self.data }

    /// Returns the codepage of the data.
    pub fn codepage(&self) -> u32 { self.codepage }

    /// Set the raw data.
    pub fn set_data(&mut self, data: Vec<u8>) { self.data = data.into(); }

    /// Set the codepage of the data.
    pub fn set_codepage(&mut self, codepage: u32) { self.codepage = codepage; }
}

/// Resource entry in a resource table.
/// This can be either a child table or raw data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceEntry {
    Table(ResourceTable),
    Data(ResourceData),
}
impl ResourceEntry {
    pub fn as_table(&self) -> Option<&ResourceTable> {
        match self {
            ResourceEntry::Table(table) => Some(table),
            ResourceEntry::Data(_) => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut ResourceTable> {
        match self {
            ResourceEntry::Table(table) => Some(table),
            ResourceEntry::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&ResourceData> {
        match self {
            ResourceEntry::Table(_) => None,
            ResourceEntry::Data(data) => Some(data),
        }
    }

    /// Returns the size of the table entry and its children in the resource table.
    pub fn table_size(&self) -> u32 {
        match self {
            // entry + sub-table
            ResourceEntry::Table(table) => table.tables_size() + RESOURCE_ENTRY_SIZE,
            // entry
            ResourceEntry::Data(_) => RESOURCE_ENTRY_SIZE,
        }
    }

    /// Returns the size of the resource names of child tables.
    pub fn strings_size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.strings_size(),
            ResourceEntry::Data(_) => 0,
        }
    }

    /// Returns the number of data entries in the entry and its children.
    pub fn data_count(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.data_count(),
            ResourceEntry::Data(_) => 1,
        }
    }

    /// Returns the size of the data in the entry and its children, each blob padded to eight bytes.
    pub fn data_size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.data_size(),
            ResourceEntry::Data(data) => aligned_to(data.data.len() as u32, 8),
        }
    }
}

/// Resource directory entry name.
/// This can either be a raw id or a name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceEntryName {
    // raw id
    ID(u32),
    // 2 byte size + data
    Name(Vec<u8>),
}
impl ResourceEntryName {
    fn parse(image: &[u8], offset: u32, id: u32) -> Result<Self, ReadError> {
        if id & 0x80000000 == 0 {
            return Ok(Self::ID(id));
        }
        trace!("reading resource name {:#x?}", id);
        let address = offset as u64 + (id ^ 0x80000000) as u64;
        let length = read_at::<u16>(image, address)? as u64;
        // size is in 16 bit characters so it needs to be doubled
        let data = slice_at(image, address, 2 + length * 2)
            .ok_or_else(|| ReadError(format!("resource name at {:#x?}", address)))?;
        trace!("resource name: {:x?}", data);
        Ok(Self::Name(data.to_vec()))
    }

    pub fn from_string<S: AsRef<str>>(string: S) -> Self {
        let units = string.as_ref().encode_utf16().collect::<Vec<_>>();
        let mut data = Vec::with_capacity(units.len() * 2 + 2);
        data.extend_from_slice(&(units.len() as u16).to_le_bytes());
        data.extend(u16_to_bytes(&units));
        Self::Name(data)
    }

    pub fn to_string(&self) -> Option<String> {
        match self {
            Self::ID(_) => None,
            Self::Name(data) => {
                let units = data
                    .get(2..)?
                    .chunks_exact(2)
                    .map(|unit| u16::from_le_bytes([unit[0], unit[1]]));
                char::decode_utf16(units).collect::<Result<String, _>>().ok()
            }
        }
    }

    fn string_size(&self) -> u32 {
        match self {
            Self::ID(_) => 0,
            Self::Name(name) => name.len() as u32,
        }
    }
}
impl From<u16> for ResourceEntryName {
    fn from(id: u16) -> Self { Self::ID(id as u32) }
}
impl Ord for ResourceEntryName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => a.get(2..).cmp(&b.get(2..)),
            (Self::Name(_), Self::ID(_)) => Ordering::Less,
            (Self::ID(_), Self::Name(_)) => Ordering::Greater,
            (Self::ID(a), Self::ID(b)) => a.cmp(b),
        }
    }
}
impl PartialOrd for ResourceEntryName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample_directory() -> ResourceDirectory {
        let mut directory = ResourceDirectory::default();
        directory
            .set_data(RT_RCDATA, 102, LANGUAGE_ID_EN_US, ResourceData::new(vec![1, 2, 3]))
            .unwrap();
        directory
            .set_data(RT_ICON, 2, LANGUAGE_ID_EN_US, ResourceData::new(vec![4; 9]))
            .unwrap();
        directory
            .set_data(RT_ICON, 1, LANGUAGE_ID_EN_US, ResourceData::new(vec![5; 16]))
            .unwrap();
        directory
    }

    #[test]
    fn build_matches_size_and_parses_back() {
        let directory = sample_directory();
        let data = directory.build(0x3000);
        assert_eq!(data.len(), directory.size() as usize);

        let parsed = ResourceDirectory::parse(&data, 0, 0x3000).unwrap();
        assert_eq!(parsed.root(), directory.root());
        assert_eq!(parsed.get_data(RT_ICON, 2, LANGUAGE_ID_EN_US).unwrap().data(), &[4; 9]);
        assert_eq!(parsed.get_data(RT_RCDATA, 102, LANGUAGE_ID_EN_US).unwrap().data(), &[1, 2, 3]);
    }

    #[test]
    fn entries_sorted_by_id() {
        let directory = sample_directory();
        assert_eq!(
            directory.root().entries(),
            vec![&ResourceEntryName::ID(RT_ICON as u32), &ResourceEntryName::ID(RT_RCDATA as u32)]
        );
        let icons = directory.root().get(ResourceEntryName::from(RT_ICON)).unwrap();
        assert_eq!(
            icons.as_table().unwrap().entries(),
            vec![&ResourceEntryName::ID(1), &ResourceEntryName::ID(2)]
        );
    }

    #[test]
    fn names_sort_before_ids() {
        let mut table = ResourceTable::default();
        table.insert(ResourceEntryName::ID(1), ResourceEntry::Data(ResourceData::default()));
        table.insert(
            ResourceEntryName::from_string("MAINICON"),
            ResourceEntry::Data(ResourceData::default()),
        );
        assert_eq!(table.entries()[0], &ResourceEntryName::from_string("MAINICON"));
        assert_eq!(table.data.number_of_name_entries, 1);
        assert_eq!(table.data.number_of_id_entries, 1);
    }

    #[test]
    fn remove_with_mismatched_counts() {
        let mut table = ResourceTable::default();
        table
            .entries
            .insert(ResourceEntryName::ID(1), ResourceEntry::Data(ResourceData::default()));
        assert!(table.remove(ResourceEntryName::ID(1)).is_some());
        assert_eq!(table.data.number_of_id_entries, 0);
        assert_eq!(table.data.number_of_name_entries, 0);
    }

    #[test]
    fn remove_prunes_empty_tables() {
        let mut directory = sample_directory();
        assert!(directory.remove_data(RT_RCDATA, 102, LANGUAGE_ID_EN_US).is_some());
        assert!(directory.root().get(ResourceEntryName::from(RT_RCDATA)).is_none());

        assert!(directory.remove_data(RT_ICON, 1, LANGUAGE_ID_EN_US).is_some());
        assert!(directory.root().get(ResourceEntryName::from(RT_ICON)).is_some());
        assert!(directory.remove_data(RT_ICON, 1, LANGUAGE_ID_EN_US).is_none());
        assert!(directory.remove_data(RT_ICON, 2, LANGUAGE_ID_EN_US).is_some());
        assert!(directory.root().entries().is_empty());
    }

    #[test]
    fn find_data_returns_any_language() {
        let directory = sample_directory();
        let (language, data) = directory.find_data(RT_ICON, 1).unwrap();
        assert_eq!(language, LANGUAGE_ID_EN_US);
        assert_eq!(data.data().len(), 16);
        assert!(directory.find_data(RT_ICON, 3).is_none());
    }

    #[test]
    fn truncated_directory_is_an_error() {
        let data = sample_directory().build(0x3000);
        assert!(ResourceDirectory::parse(&data[..20], 0, 0x3000).is_err());
    }

    #[test]
    fn convert_resource_name_string() {
        assert_eq!(
            ResourceEntryName::from_string("MAINICON").to_string(),
            Some("MAINICON".into()),
            "resource name conversion to string is correct",
        );
    }
}
