//! Grid-wide column store of per-cell attributes.

use crate::common::GHOST_ARRAY_NAME;
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use bitflags::bitflags;
use indexmap::IndexMap;
use std::ops::Range;

bitflags! {
    /// Per-cell ghost flags stored as `u8` in the `GhostType` array.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GhostFlags: u8 {
        const DUPLICATE_CELL = 1;
        const HIGH_CONNECTIVITY_CELL = 2;
        const LOW_CONNECTIVITY_CELL = 4;
        const REFINED_CELL = 8;
        const EXTERIOR_CELL = 16;
        const HIDDEN_CELL = 32;
    }
}

impl GhostFlags {
    /// Flags that exclude a cell from derived ranges.
    pub fn skipped() -> Self {
        GhostFlags::DUPLICATE_CELL | GhostFlags::HIDDEN_CELL
    }
}

/// Scalar type of a [`DataArray`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    F64,
    F32,
    I64,
    I32,
    U8,
}

/// Typed, flat storage of a [`DataArray`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayValues {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I64(Vec<i64>),
    I32(Vec<i32>),
    U8(Vec<u8>),
}

macro_rules! for_each_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            ArrayValues::F64($v) => $body,
            ArrayValues::F32($v) => $body,
            ArrayValues::I64($v) => $body,
            ArrayValues::I32($v) => $body,
            ArrayValues::U8($v) => $body,
        }
    };
}

impl ArrayValues {
    pub fn zeros(value_type: ValueType, len: usize) -> Self {
        match value_type {
            ValueType::F64 => ArrayValues::F64(vec![0.0; len]),
            ValueType::F32 => ArrayValues::F32(vec![0.0; len]),
            ValueType::I64 => ArrayValues::I64(vec![0; len]),
            ValueType::I32 => ArrayValues::I32(vec![0; len]),
            ValueType::U8 => ArrayValues::U8(vec![0; len]),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ArrayValues::F64(_) => ValueType::F64,
            ArrayValues::F32(_) => ValueType::F32,
            ArrayValues::I64(_) => ValueType::I64,
            ArrayValues::I32(_) => ValueType::I32,
            ArrayValues::U8(_) => ValueType::U8,
        }
    }

    pub fn len(&self) -> usize {
        for_each_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the values in `range`, `None` when it is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<ArrayValues> {
        Some(match self {
            ArrayValues::F64(v) => ArrayValues::F64(v.get(range)?.to_vec()),
            ArrayValues::F32(v) => ArrayValues::F32(v.get(range)?.to_vec()),
            ArrayValues::I64(v) => ArrayValues::I64(v.get(range)?.to_vec()),
            ArrayValues::I32(v) => ArrayValues::I32(v.get(range)?.to_vec()),
            ArrayValues::U8(v) => ArrayValues::U8(v.get(range)?.to_vec()),
        })
    }

    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            ArrayValues::F64(v) => v.get(index).copied(),
            ArrayValues::F32(v) => v.get(index).map(|&x| x as f64),
            ArrayValues::I64(v) => v.get(index).map(|&x| x as f64),
            ArrayValues::I32(v) => v.get(index).map(|&x| x as f64),
            ArrayValues::U8(v) => v.get(index).map(|&x| x as f64),
        }
    }

    /// Stores `value` converted to the array's type; out-of-range writes are ignored.
    #[inline]
    pub fn set_f64(&mut self, index: usize, value: f64) {
        match self {
            ArrayValues::F64(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value;
                }
            }
            ArrayValues::F32(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as f32;
                }
            }
            ArrayValues::I64(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as i64;
                }
            }
            ArrayValues::I32(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as i32;
                }
            }
            ArrayValues::U8(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as u8;
                }
            }
        }
    }

    pub fn resize(&mut self, len: usize) {
        match self {
            ArrayValues::F64(v) => v.resize(len, 0.0),
            ArrayValues::F32(v) => v.resize(len, 0.0),
            ArrayValues::I64(v) => v.resize(len, 0),
            ArrayValues::I32(v) => v.resize(len, 0),
            ArrayValues::U8(v) => v.resize(len, 0),
        }
    }

    /// Copies `count` values from `source[source_start..]` into `self[target_start..]`.
    ///
    /// Both sides must have the same type and be large enough.
    fn copy_range(&mut self, target_start: usize, source: &ArrayValues, source_start: usize, count: usize) -> bool {
        match (self, source) {
            (ArrayValues::F64(t), ArrayValues::F64(s)) => copy_slice(t, target_start, s, source_start, count),
            (ArrayValues::F32(t), ArrayValues::F32(s)) => copy_slice(t, target_start, s, source_start, count),
            (ArrayValues::I64(t), ArrayValues::I64(s)) => copy_slice(t, target_start, s, source_start, count),
            (ArrayValues::I32(t), ArrayValues::I32(s)) => copy_slice(t, target_start, s, source_start, count),
            (ArrayValues::U8(t), ArrayValues::U8(s)) => copy_slice(t, target_start, s, source_start, count),
            _ => false,
        }
    }

    fn gather(&self, indices: &[usize]) -> ArrayValues {
        match self {
            ArrayValues::F64(v) => ArrayValues::F64(indices.iter().map(|&i| v[i]).collect()),
            ArrayValues::F32(v) => ArrayValues::F32(indices.iter().map(|&i| v[i]).collect()),
            ArrayValues::I64(v) => ArrayValues::I64(indices.iter().map(|&i| v[i]).collect()),
            ArrayValues::I32(v) => ArrayValues::I32(indices.iter().map(|&i| v[i]).collect()),
            ArrayValues::U8(v) => ArrayValues::U8(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

fn copy_slice<T: Copy>(target: &mut [T], target_start: usize, source: &[T], source_start: usize, count: usize) -> bool {
    if target_start + count > target.len() || source_start + count > source.len() {
        return false;
    }
    target[target_start..target_start + count].copy_from_slice(&source[source_start..source_start + count]);
    true
}

/// A named array holding one tuple of `number_of_components` values per cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataArray {
    name: String,
    number_of_components: usize,
    values: ArrayValues,
}

impl DataArray {
    pub fn new(name: &str, number_of_components: usize, values: ArrayValues) -> HyperTreeResult<Self> {
        if number_of_components == 0 {
            log::error!("Array {} must have at least one component", name);
            return Err(HyperTreeError::new(
                &format!("Array {} must have at least one component", name),
                ErrorKind::InvalidArgument,
            ));
        }
        if values.len() % number_of_components != 0 {
            log::error!(
                "Array {} has {} values, not a multiple of {} components",
                name,
                values.len(),
                number_of_components
            );
            return Err(HyperTreeError::new(
                &format!(
                    "Array {} has {} values, not a multiple of {} components",
                    name,
                    values.len(),
                    number_of_components
                ),
                ErrorKind::ValidationError,
            ));
        }
        Ok(DataArray {
            name: name.to_string(),
            number_of_components,
            values,
        })
    }

    /// Creates a zero-filled array of `number_of_tuples` tuples.
    pub fn zeros(name: &str, value_type: ValueType, number_of_components: usize, number_of_tuples: usize) -> Self {
        let number_of_components = number_of_components.max(1);
        DataArray {
            name: name.to_string(),
            number_of_components,
            values: ArrayValues::zeros(value_type, number_of_components * number_of_tuples),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_components(&self) -> usize {
        self.number_of_components
    }

    pub fn number_of_tuples(&self) -> usize {
        self.values.len() / self.number_of_components
    }

    pub fn value_type(&self) -> ValueType {
        self.values.value_type()
    }

    pub fn values(&self) -> &ArrayValues {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ArrayValues {
        &mut self.values
    }

    pub fn into_values(self) -> ArrayValues {
        self.values
    }

    #[inline]
    pub fn value_as_f64(&self, tuple: usize, component: usize) -> Option<f64> {
        if component >= self.number_of_components {
            return None;
        }
        self.values.get_f64(tuple * self.number_of_components + component)
    }

    pub fn tuple_as_f64(&self, tuple: usize) -> Option<Vec<f64>> {
        if tuple >= self.number_of_tuples() {
            return None;
        }
        (0..self.number_of_components)
            .map(|c| self.value_as_f64(tuple, c))
            .collect()
    }

    pub fn set_value_from_f64(&mut self, tuple: usize, component: usize, value: f64) {
        if component < self.number_of_components {
            self.values.set_f64(tuple * self.number_of_components + component, value);
        }
    }

    /// Writes a tuple, growing the array with zero tuples when `tuple` is past the end.
    pub fn set_tuple_from_f64(&mut self, tuple: usize, values: &[f64]) {
        if tuple >= self.number_of_tuples() {
            self.resize(tuple + 1);
        }
        for (c, &value) in values.iter().take(self.number_of_components).enumerate() {
            self.set_value_from_f64(tuple, c, value);
        }
    }

    /// Grows with zero tuples or truncates to `number_of_tuples`.
    pub fn resize(&mut self, number_of_tuples: usize) {
        self.values.resize(number_of_tuples * self.number_of_components);
    }

    /// Copies `count` tuples of `source` starting at `source_start` into this
    /// array at `target_start`, growing it when needed.
    pub fn copy_tuples_from(
        &mut self,
        target_start: usize,
        source: &DataArray,
        source_start: usize,
        count: usize,
    ) -> HyperTreeResult<()> {
        if source.number_of_components != self.number_of_components
            || source.value_type() != self.value_type()
        {
            log::error!("Array {} is not compatible with array {}", source.name, self.name);
            return Err(HyperTreeError::new(
                &format!("Array {} is not compatible with array {}", source.name, self.name),
                ErrorKind::ValidationError,
            ));
        }
        if source_start + count > source.number_of_tuples() {
            log::error!(
                "Array {} has {} tuples, cannot copy {} from {}",
                source.name,
                source.number_of_tuples(),
                count,
                source_start
            );
            return Err(HyperTreeError::new(
                &format!("Array {} is too short", source.name),
                ErrorKind::IndexOutOfBounds,
            ));
        }
        if target_start + count > self.number_of_tuples() {
            self.resize(target_start + count);
        }
        let nc = self.number_of_components;
        if self.values.copy_range(target_start * nc, &source.values, source_start * nc, count * nc) {
            Ok(())
        } else {
            log::error!("Failed to copy tuples into array {}", self.name);
            Err(HyperTreeError::new(
                &format!("Failed to copy tuples into array {}", self.name),
                ErrorKind::InternalError,
            ))
        }
    }

    /// New array made of the tuples at `tuples`, in that order.
    ///
    /// # Panics
    ///
    /// Panics when a tuple id is out of range.
    pub fn gather(&self, tuples: &[usize]) -> DataArray {
        let nc = self.number_of_components;
        let indices: Vec<usize> = tuples
            .iter()
            .flat_map(|&t| (t * nc)..(t * nc + nc))
            .collect();
        DataArray {
            name: self.name.clone(),
            number_of_components: nc,
            values: self.values.gather(&indices),
        }
    }

    /// Min and max of `component` over tuples for which `skip` is false.
    ///
    /// With `component == None` the range covers the Euclidean norm of each tuple.
    pub fn range<F>(&self, component: Option<usize>, skip: F) -> Option<(f64, f64)>
    where
        F: Fn(usize) -> bool,
    {
        let mut range: Option<(f64, f64)> = None;
        for tuple in 0..self.number_of_tuples() {
            if skip(tuple) {
                continue;
            }
            let value = match component {
                Some(c) => match self.value_as_f64(tuple, c) {
                    Some(v) => v,
                    None => return None,
                },
                None => (0..self.number_of_components)
                    .filter_map(|c| self.value_as_f64(tuple, c))
                    .map(|v| v * v)
                    .sum::<f64>()
                    .sqrt(),
            };
            if value.is_nan() {
                continue;
            }
            range = Some(match range {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
        }
        range
    }
}

/// Ordered set of named [`DataArray`]s sharing the grid's global cell index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellData {
    arrays: IndexMap<String, DataArray>,
}

impl CellData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `array`, replacing any array with the same name.
    pub fn add_array(&mut self, array: DataArray) -> Option<DataArray> {
        self.arrays.insert(array.name.clone(), array)
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.arrays.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DataArray> {
        self.arrays.get_mut(name)
    }

    /// Removes an array, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<DataArray> {
        self.arrays.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DataArray> {
        self.arrays.values_mut()
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
    }

    /// Resizes every array to `number_of_tuples`.
    pub fn resize(&mut self, number_of_tuples: usize) {
        for array in self.arrays.values_mut() {
            array.resize(number_of_tuples);
        }
    }

    pub fn ghost_array(&self) -> Option<&DataArray> {
        self.arrays.get(GHOST_ARRAY_NAME)
    }

    /// Ghost flags of cell `global`; empty when there is no ghost array.
    pub fn ghost_flags(&self, global: usize) -> GhostFlags {
        self.ghost_array()
            .and_then(|a| a.value_as_f64(global, 0))
            .map(|v| GhostFlags::from_bits_truncate(v as u8))
            .unwrap_or_default()
    }

    /// Sets the ghost flags of cell `global`, creating the ghost array when needed.
    pub fn set_ghost_flags(&mut self, global: usize, flags: GhostFlags) {
        let array = self
            .arrays
            .entry(GHOST_ARRAY_NAME.to_string())
            .or_insert_with(|| DataArray::zeros(GHOST_ARRAY_NAME, ValueType::U8, 1, 0));
        array.set_tuple_from_f64(global, &[flags.bits() as f64]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_values() {
        let err = DataArray::new("v", 3, ArrayValues::F64(vec![0.0; 4])).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(DataArray::new("v", 0, ArrayValues::U8(vec![])).is_err());
    }

    #[test]
    fn test_tuple_access() {
        let mut array = DataArray::zeros("velocity", ValueType::F32, 3, 2);
        array.set_tuple_from_f64(1, &[1.0, 2.0, 3.0]);
        assert_eq!(array.tuple_as_f64(1), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(array.tuple_as_f64(2), None);
        assert_eq!(array.value_as_f64(1, 3), None);

        array.set_tuple_from_f64(4, &[7.0, 0.0, 0.0]);
        assert_eq!(array.number_of_tuples(), 5);
        assert_eq!(array.value_as_f64(4, 0), Some(7.0));
    }

    #[test]
    fn test_copy_tuples_from() {
        let source = DataArray::new("d", 1, ArrayValues::I32(vec![1, 2, 3, 4])).unwrap();
        let mut target = DataArray::zeros("d", ValueType::I32, 1, 2);
        target.copy_tuples_from(3, &source, 1, 3).unwrap();
        assert_eq!(target.values(), &ArrayValues::I32(vec![0, 0, 0, 2, 3, 4]));

        let other = DataArray::zeros("d", ValueType::F64, 1, 4);
        assert!(target.copy_tuples_from(0, &other, 0, 1).is_err());
        assert!(target.copy_tuples_from(0, &source, 2, 3).is_err());
    }

    #[test]
    fn test_slice_values() {
        let values = ArrayValues::U8(vec![1, 2, 3, 4]);
        assert_eq!(values.slice(1..3), Some(ArrayValues::U8(vec![2, 3])));
        assert_eq!(values.slice(4..4), Some(ArrayValues::U8(vec![])));
        assert_eq!(values.slice(2..5), None);
    }

    #[test]
    fn test_gather() {
        let array = DataArray::new("d", 2, ArrayValues::I64(vec![0, 1, 10, 11, 20, 21])).unwrap();
        let gathered = array.gather(&[2, 0]);
        assert_eq!(gathered.values(), &ArrayValues::I64(vec![20, 21, 0, 1]));
        assert_eq!(gathered.name(), "d");
    }

    #[test]
    fn test_range_skips_cells() {
        let array = DataArray::new("p", 1, ArrayValues::F64(vec![5.0, -1.0, 3.0, f64::NAN])).unwrap();
        assert_eq!(array.range(Some(0), |_| false), Some((-1.0, 5.0)));
        assert_eq!(array.range(Some(0), |t| t == 1), Some((3.0, 5.0)));
        assert_eq!(array.range(Some(0), |_| true), None);

        let vectors = DataArray::new("v", 2, ArrayValues::F64(vec![3.0, 4.0, 0.0, 1.0])).unwrap();
        assert_eq!(vectors.range(None, |_| false), Some((1.0, 5.0)));
    }

    #[test]
    fn test_cell_data_keeps_insertion_order() {
        let mut data = CellData::new();
        data.add_array(DataArray::zeros("b", ValueType::F64, 1, 1));
        data.add_array(DataArray::zeros("a", ValueType::F64, 1, 1));
        data.add_array(DataArray::zeros("c", ValueType::F64, 1, 1));
        data.remove("a");
        assert_eq!(data.names().collect::<Vec<_>>(), vec!["b", "c"]);
        data.resize(4);
        assert!(data.iter().all(|a| a.number_of_tuples() == 4));
    }

    #[test]
    fn test_ghost_flags() {
        let mut data = CellData::new();
        assert_eq!(data.ghost_flags(3), GhostFlags::empty());
        data.set_ghost_flags(3, GhostFlags::DUPLICATE_CELL | GhostFlags::REFINED_CELL);
        assert!(data.ghost_flags(3).intersects(GhostFlags::skipped()));
        assert_eq!(data.ghost_flags(0), GhostFlags::empty());
        assert_eq!(data.ghost_array().map(|a| a.value_type()), Some(ValueType::U8));
        assert_eq!(GhostFlags::HIDDEN_CELL.bits(), 32);
    }
}
