//! Icon file validation and `RT_GROUP_ICON` directory construction.
//!
//! An icon file stores its images by file offset, while an executable stores each image as a separate `RT_ICON`
//! resource and indexes them by resource id in an `RT_GROUP_ICON` resource.
//! See <https://learn.microsoft.com/en-us/previous-versions/ms997538(v=msdn.10)> for the layout of both.

use alloc::vec::Vec;

use log::{debug, trace};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, types::*, util::*};

/// Validated view over the bytes of an icon file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IconContainer<'a> {
    data:    &'a [u8],
    header:  IconDirectory,
    entries: Vec<IconDirectoryEntry>,
}
impl<'a> IconContainer<'a> {
    /// Parse and validate an icon file and derive the group icon directory referencing its images.
    /// The images are assigned consecutive resource ids starting at `first_icon_id`, in file order.
    ///
    /// Every entry is bounds-checked and must hold image data before anything is returned, a single invalid entry rejects the whole file.
    pub fn parse(
        data: &'a [u8], first_icon_id: WORD,
    ) -> Result<(Self, GroupIconDirectory), IconError> {
        let header = read::<IconDirectory>(data).map_err(|_| IconError::TruncatedHeader(data.len()))?;
        trace!("icon header: {:#x?}", header);
        if header.reserved != 0 || header.type_ != ICON_TYPE_ICON || header.count == 0 {
            return Err(IconError::InvalidMagic {
                reserved: header.reserved,
                type_:    header.type_,
                count:    header.count,
            });
        }

        let count = header.count;
        let required = ICON_DIRECTORY_SIZE + count as usize * ICON_DIRECTORY_ENTRY_SIZE;
        if data.len() < required {
            return Err(IconError::TruncatedEntryTable {
                count,
                required,
                size: data.len(),
            });
        }

        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let offset = ICON_DIRECTORY_SIZE + index as usize * ICON_DIRECTORY_ENTRY_SIZE;
            let entry = read::<IconDirectoryEntry>(&data[offset..]).map_err(|_| {
                IconError::TruncatedEntryTable {
                    count,
                    required,
                    size: data.len(),
                }
            })?;
            trace!("icon entry {}: {:#x?}", index, entry);
            if slice_at(data, entry.offset as u64, entry.bytes as u64).is_none() {
                return Err(IconError::EntryOutOfBounds {
                    index,
                    offset: entry.offset,
                    bytes: entry.bytes,
                    size: data.len(),
                });
            }
            if entry.bytes == 0 {
                return Err(IconError::EmptyEntry { index });
            }
            entries.push(entry);
        }

        let group = GroupIconDirectory::from_entries(&entries, first_icon_id);
        debug!("validated icon with {} images", count);
        Ok((
            Self {
                data,
                header,
                entries,
            },
            group,
        ))
    }

    /// Returns the icon file header.
    pub fn header(&self) -> &IconDirectory { &self.header }

    /// Returns the number of images in the icon.
    pub fn count(&self) -> u16 { self.header.count }

    /// Returns the image entries in file order.
    pub fn entries(&self) -> &[IconDirectoryEntry] { &self.entries }

    /// Returns the image data of the entry at the index.
    pub fn image_data(&self, index: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(index)?;
        slice_at(self.data, entry.offset as u64, entry.bytes as u64)
    }

    /// Returns the image data of all entries in file order.
    pub fn images(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.entries.len()).filter_map(|index| self.image_data(index))
    }
}

/// Group icon directory, the content of an `RT_GROUP_ICON` resource.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GroupIconDirectory {
    header:  IconDirectory,
    entries: Vec<GroupIconDirectoryEntry>,
}
impl GroupIconDirectory {
    fn from_entries(entries: &[IconDirectoryEntry], first_icon_id: WORD) -> Self {
        let entries = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| GroupIconDirectoryEntry {
                width:       entry.width,
                height:      entry.height,
                color_count: entry.color_count,
                reserved:    entry.reserved,
                planes:      entry.planes,
                bit_count:   entry.bit_count,
                bytes:       entry.bytes,
                // ids are 16 bit, an id wrapping to 0 is rejected when written
                id:          first_icon_id.wrapping_add(index as u16),
            })
            .collect::<Vec<_>>();
        Self {
            header: IconDirectory {
                reserved: 0,
                type_:    ICON_TYPE_ICON,
                count:    entries.len() as u16,
            },
            entries,
        }
    }

    /// Parse a group icon directory from the data of an `RT_GROUP_ICON` resource.
    pub fn parse(data: &[u8]) -> Result<Self, ResourceError> {
        let header = read::<IconDirectory>(data)?;
        let mut entries = Vec::with_capacity(header.count as usize);
        for index in 0..header.count as u64 {
            let offset =
                ICON_DIRECTORY_SIZE as u64 + index * GROUP_ICON_DIRECTORY_ENTRY_SIZE as u64;
            entries.push(read_at::<GroupIconDirectoryEntry>(data, offset)?);
        }
        Ok(Self { header, entries })
    }

    /// Returns the directory header.
    pub fn header(&self) -> &IconDirectory { &self.header }

    /// Returns the number of images in the group.
    pub fn count(&self) -> u16 { self.header.count }

    /// Returns the group entries in image order.
    pub fn entries(&self) -> &[GroupIconDirectoryEntry] { &self.entries }

    /// Returns the `RT_ICON` resource ids referenced by the group.
    pub fn ids(&self) -> impl Iterator<Item = WORD> + '_ { self.entries.iter().map(|entry| entry.id) }

    /// Build the group icon directory into the raw bytes of an `RT_GROUP_ICON` resource.
    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            ICON_DIRECTORY_SIZE + self.entries.len() * GROUP_ICON_DIRECTORY_ENTRY_SIZE,
        );
        data.extend_from_slice(self.header.as_bytes());
        for entry in &self.entries {
            data.extend_from_slice(entry.as_bytes());
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Icon file with one entry per image size, each image filled with its index.
    fn icon_file(sizes: &[u32]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(
            IconDirectory {
                reserved: 0,
                type_:    ICON_TYPE_ICON,
                count:    sizes.len() as u16,
            }
            .as_bytes(),
        );
        let mut offset = (ICON_DIRECTORY_SIZE + sizes.len() * ICON_DIRECTORY_ENTRY_SIZE) as u32;
        for (index, &size) in sizes.iter().enumerate() {
            let entry = IconDirectoryEntry {
                width: 16 << index,
                height: 16 << index,
                planes: 1,
                bit_count: 32,
                bytes: size,
                offset,
                ..Default::default()
            };
            data.extend_from_slice(entry.as_bytes());
            offset += size;
        }
        for (index, &size) in sizes.iter().enumerate() {
            data.extend(vec![index as u8; size as usize]);
        }
        data
    }

    fn set_entry(data: &mut [u8], index: usize, bytes: u32, offset: u32) {
        let start = ICON_DIRECTORY_SIZE + index * ICON_DIRECTORY_ENTRY_SIZE + 8;
        data[start..start + 4].copy_from_slice(&bytes.to_le_bytes());
        data[start + 4..start + 8].copy_from_slice(&offset.to_le_bytes());
    }

    #[test]
    fn parse_valid_icon() {
        let data = icon_file(&[40, 24, 8]);
        let (icon, group) = IconContainer::parse(&data, 2000).unwrap();
        assert_eq!(icon.count(), 3);
        assert_eq!(icon.image_data(1).unwrap(), &[1u8; 24]);
        assert_eq!(icon.images().map(|image| image.len()).collect::<Vec<_>>(), vec![40, 24, 8]);
        assert!(icon.image_data(3).is_none());

        assert_eq!(group.count(), 3);
        assert_eq!(group.ids().collect::<Vec<_>>(), vec![2000, 2001, 2002]);
        let second = group.entries()[1];
        assert_eq!({ second.width }, 32);
        assert_eq!({ second.bytes }, 24);
        assert_eq!({ second.bit_count }, 32);
    }

    #[test]
    fn short_buffers_are_truncated_headers() {
        let data = icon_file(&[4]);
        for length in 0..ICON_DIRECTORY_SIZE {
            assert_eq!(
                IconContainer::parse(&data[..length], 1).unwrap_err(),
                IconError::TruncatedHeader(length)
            );
        }
    }

    #[test]
    fn invalid_magic() {
        let mut reserved = icon_file(&[4]);
        reserved[0] = 1;
        let mut cursor = icon_file(&[4]);
        cursor[2] = 2;
        let mut empty = icon_file(&[4]);
        empty[4] = 0;
        for data in [reserved, cursor, empty] {
            assert!(matches!(
                IconContainer::parse(&data, 1).unwrap_err(),
                IconError::InvalidMagic { .. }
            ));
        }
    }

    #[test]
    fn truncated_entry_table() {
        let data = icon_file(&[4, 4]);
        let error = IconContainer::parse(&data[..ICON_DIRECTORY_SIZE + 20], 1).unwrap_err();
        assert_eq!(
            error,
            IconError::TruncatedEntryTable {
                count:    2,
                required: 38,
                size:     26,
            }
        );
    }

    #[test]
    fn entry_past_end_is_out_of_bounds() {
        let mut data = icon_file(&[4, 4]);
        let size = data.len() as u32;
        set_entry(&mut data, 1, 5, size - 4);
        assert!(matches!(
            IconContainer::parse(&data, 1).unwrap_err(),
            IconError::EntryOutOfBounds { index: 1, .. }
        ));
    }

    #[test]
    fn wrapping_offset_is_out_of_bounds() {
        // the 32 bit sum of offset and size wraps around to a small value
        let mut data = icon_file(&[4]);
        let size = data.len() as u32;
        set_entry(&mut data, 0, size, u32::MAX - size + 2);
        assert!(matches!(
            IconContainer::parse(&data, 1).unwrap_err(),
            IconError::EntryOutOfBounds { index: 0, .. }
        ));

        let mut data = icon_file(&[4]);
        let size = data.len() as u32;
        set_entry(&mut data, 0, u32::MAX, size);
        assert!(matches!(
            IconContainer::parse(&data, 1).unwrap_err(),
            IconError::EntryOutOfBounds { .. }
        ));

        let mut data = icon_file(&[4]);
        let size = data.len() as u32;
        set_entry(&mut data, 0, size / 2 + 1, size / 2);
        assert!(matches!(
            IconContainer::parse(&data, 1).unwrap_err(),
            IconError::EntryOutOfBounds { .. }
        ));
    }

    #[test]
    fn entry_ending_at_file_end_is_valid() {
        let mut data = icon_file(&[4, 4]);
        let size = data.len() as u32;
        set_entry(&mut data, 0, 8, size - 8);
        let (icon, _) = IconContainer::parse(&data, 1).unwrap();
        assert_eq!(icon.image_data(0).unwrap().len(), 8);
    }

    #[test]
    fn empty_entry_is_rejected() {
        let mut data = icon_file(&[8, 4]);
        let size = data.len() as u32;
        set_entry(&mut data, 1, 0, size);
        assert_eq!(IconContainer::parse(&data, 2000).unwrap_err(), IconError::EmptyEntry { index: 1 });
    }

    #[test]
    fn group_round_trip() {
        let data = icon_file(&[12, 4, 4, 20]);
        let (_, group) = IconContainer::parse(&data, 7).unwrap();
        let built = group.build();
        assert_eq!(built.len(), ICON_DIRECTORY_SIZE + 4 * GROUP_ICON_DIRECTORY_ENTRY_SIZE);
        assert_eq!(&built[..6], &[0, 0, 1, 0, 4, 0]);

        let parsed = GroupIconDirectory::parse(&built).unwrap();
        assert_eq!(parsed, group);
        assert_eq!(parsed.ids().collect::<Vec<_>>(), vec![7, 8, 9, 10]);
        assert_eq!(parsed.entries().iter().map(|entry| entry.bytes).collect::<Vec<_>>(), vec![
            12, 4, 4, 20
        ]);
    }

    #[test]
    fn group_entry_layout() {
        let data = icon_file(&[4]);
        let (_, group) = IconContainer::parse(&data, 0x1234).unwrap();
        let built = group.build();
        // width, height, colors, reserved, planes, bit count, bytes, id
        assert_eq!(&built[6..], &[16, 16, 0, 0, 1, 0, 32, 0, 4, 0, 0, 0, 0x34, 0x12]);
    }

    #[test]
    fn truncated_group_is_an_error() {
        let data = icon_file(&[4, 4]);
        let (_, group) = IconContainer::parse(&data, 1).unwrap();
        let built = group.build();
        assert!(GroupIconDirectory::parse(&built[..built.len() - 1]).is_err());
    }
}
