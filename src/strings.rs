//! String table blocks.
//!
//! An `RT_STRING` resource holds a block of 16 strings, each stored as a 16 bit length in code units followed by the
//! UTF-16 code units. Empty strings are stored as a zero length, so the position of every string in the block stays fixed.

use alloc::{string::String, vec::Vec};

use crate::{constants::*, errors::*, util::*};

/// Block of 16 optional strings as stored in an `RT_STRING` resource.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct StringSlotTable {
    slots: [Option<Vec<u16>>; STRING_TABLE_SLOTS],
}
impl StringSlotTable {
    /// Set the string in the slot, replacing any previous string.
    ///
    /// # Returns
    /// Returns an error if the slot is not in the block or the string has more code units than the length prefix can hold.
    pub fn set<S: AsRef<str>>(&mut self, slot: usize, string: S) -> Result<(), StringTableError> {
        let units = string.as_ref().encode_utf16().collect::<Vec<_>>();
        self.set_units(slot, units)
    }

    /// Set the UTF-16 code units of the slot, replacing any previous string.
    pub fn set_units(&mut self, slot: usize, units: Vec<u16>) -> Result<(), StringTableError> {
        if units.len() > u16::MAX as usize {
            return Err(StringTableError::StringTooLong(slot, units.len()));
        }
        let entry = self.slots.get_mut(slot).ok_or(StringTableError::SlotOutOfRange(slot))?;
        *entry = Some(units);
        Ok(())
    }

    /// Clear the slot.
    pub fn clear(&mut self, slot: usize) -> Result<(), StringTableError> {
        let entry = self.slots.get_mut(slot).ok_or(StringTableError::SlotOutOfRange(slot))?;
        *entry = None;
        Ok(())
    }

    /// Returns the code units of the slot, or `None` if the slot is empty or out of range.
    pub fn units(&self, slot: usize) -> Option<&[u16]> { self.slots.get(slot)?.as_deref() }

    /// Returns the string in the slot, or `None` if the slot is empty, out of range or not valid UTF-16.
    pub fn get(&self, slot: usize) -> Option<String> {
        String::from_utf16(self.units(slot)?).ok()
    }

    /// Returns the size of the encoded block in bytes.
    pub fn size(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| 2 + 2 * slot.as_ref().map_or(0, |units| units.len()))
            .sum()
    }

    /// Encode the block into the raw bytes of an `RT_STRING` resource.
    /// Every slot is written in order, empty slots as a zero length.
    pub fn encode(&self) -> Result<Vec<u8>, StringTableError> {
        let size = self.size();
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| StringTableError::OutOfMemory(size))?;
        for slot in &self.slots {
            let units = slot.as_deref().unwrap_or_default();
            data.extend_from_slice(&(units.len() as u16).to_le_bytes());
            data.extend(u16_to_bytes(units));
        }
        debug_assert_eq!(data.len(), size);
        Ok(data)
    }

    /// Parse a block from the data of an `RT_STRING` resource.
    /// Zero length strings are read as empty slots.
    pub fn parse(data: &[u8]) -> Result<Self, StringTableError> {
        let mut table = Self::default();
        let mut offset = 0u64;
        for slot in 0..STRING_TABLE_SLOTS {
            let length = read_at::<u16>(data, offset)? as u64;
            offset += 2;
            if length == 0 {
                continue;
            }
            let bytes = slice_at(data, offset, length * 2)
                .ok_or_else(|| ReadError(alloc::format!("string {} at {:#x?}", slot, offset)))?;
            let units = bytes
                .chunks_exact(2)
                .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
                .collect::<Vec<_>>();
            table.set_units(slot, units)?;
            offset += length * 2;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(data: &[u8], offset: usize) -> (usize, Vec<u16>) {
        let length = u16::from_le_bytes([data[offset], data[offset + 1]]) as usize;
        let units = data[offset + 2..offset + 2 + length * 2]
            .chunks_exact(2)
            .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
            .collect();
        (length, units)
    }

    #[test]
    fn encode_launcher_strings() {
        let mut table = StringSlotTable::default();
        table.set(IDS_CONSOLE_TITLE, "Console").unwrap();
        table.set(IDS_PROCESS_ARGUMENTS, "-m app").unwrap();
        let data = table.encode().unwrap();
        assert_eq!(data.len(), 16 * 2 + 7 * 2 + 6 * 2);

        let mut offset = 0;
        let mut records = Vec::new();
        while offset < data.len() {
            let (length, units) = record(&data, offset);
            offset += 2 + length * 2;
            records.push((length, units));
        }
        assert_eq!(records.len(), 16);
        assert_eq!(records[0].0, 0);
        assert_eq!(records[1], (7, "Console".encode_utf16().collect()));
        assert_eq!(records[2], (6, "-m app".encode_utf16().collect()));
        assert!(records[3..].iter().all(|(length, _)| *length == 0));
    }

    #[test]
    fn empty_table_is_sixteen_zero_lengths() {
        let data = StringSlotTable::default().encode().unwrap();
        assert_eq!(data, [0u8; 32]);
    }

    #[test]
    fn lengths_count_code_units() {
        let mut table = StringSlotTable::default();
        // one supplementary character is two code units
        table.set(0, "\u{1F980}é").unwrap();
        let data = table.encode().unwrap();
        assert_eq!(record(&data, 0).0, 3);
        assert_eq!(data.len(), table.size());
    }

    #[test]
    fn parse_back() {
        let mut table = StringSlotTable::default();
        table.set(IDS_CONSOLE_TITLE, "Title").unwrap();
        table.set(15, "last").unwrap();
        let parsed = StringSlotTable::parse(&table.encode().unwrap()).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.get(IDS_CONSOLE_TITLE).as_deref(), Some("Title"));
        assert_eq!(parsed.get(15).as_deref(), Some("last"));
        assert_eq!(parsed.get(IDS_PROCESS_ARGUMENTS), None);
    }

    #[test]
    fn parse_truncated_block() {
        let mut table = StringSlotTable::default();
        table.set(3, "abc").unwrap();
        let data = table.encode().unwrap();
        assert!(StringSlotTable::parse(&data[..data.len() - 1]).is_err());
        assert!(StringSlotTable::parse(&data[..10]).is_err());
    }

    #[test]
    fn reject_invalid_slots() {
        let mut table = StringSlotTable::default();
        assert_eq!(table.set(16, "x"), Err(StringTableError::SlotOutOfRange(16)));
        let long = "a".repeat(u16::MAX as usize + 1);
        assert_eq!(
            table.set(1, long),
            Err(StringTableError::StringTooLong(1, u16::MAX as usize + 1))
        );
        assert!(table.set(1, "a".repeat(u16::MAX as usize)).is_ok());
        table.clear(1).unwrap();
        assert_eq!(table, StringSlotTable::default());
    }
}
