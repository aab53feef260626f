use alloc::{string::ToString, vec::Vec};
use core::{
    any::type_name,
    ops::{Add, Rem, Sub},
};

use zerocopy::FromBytes;

use crate::ReadError;

pub fn read<T: FromBytes + Copy>(resource: &[u8]) -> Result<T, ReadError> {
    T::read_from_prefix(resource)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

/// Read a `T` at the offset, failing instead of panicking when the offset is past the end.
pub fn read_at<T: FromBytes + Copy>(resource: &[u8], offset: u64) -> Result<T, ReadError> {
    let tail = usize::try_from(offset)
        .ok()
        .and_then(|offset| resource.get(offset..))
        .ok_or_else(|| ReadError(type_name::<T>().to_string()))?;
    read::<T>(tail)
}

/// Returns the bytes in `offset..offset + size` or `None` if the range is outside the data.
pub fn slice_at(data: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let end = offset.checked_add(size)?;
    data.get(usize::try_from(offset).ok()?..usize::try_from(end).ok()?)
}

pub fn aligned_to<T: Add<Output = T> + Sub<Output = T> + Rem<Output = T> + Eq + Copy + Default>(
    value: T, alignment: T,
) -> T {
    if alignment == T::default() || value % alignment == T::default() {
        return value;
    }
    value + alignment - (value % alignment)
}

/// Little-endian bytes of UTF-16 code units.
pub fn u16_to_bytes(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|unit| unit.to_le_bytes()).collect()
}
