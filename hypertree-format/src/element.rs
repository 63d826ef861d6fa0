//! Document model of a hypertree grid file.
//!
//! A document is a tree of named elements carrying string attributes,
//! typed arrays and child elements. It is encoded with bincode behind a
//! magic header in binary mode, or as pretty JSON in ASCII mode; the
//! decoder tells the two apart by the header.

use crate::errors::{FormatError, FormatResult};
use crate::schema::{BINARY_MAGIC, DOCUMENT_TYPE};
use crate::version::{DataMode, FormatVersion};
use hypertree::common::BitArray;
use hypertree::grid::{ArrayValues, DataArray};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::ops::Range;
use std::str::FromStr;

/// Values of an [`ArrayElement`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ArrayPayload {
    /// Packed bits, least significant bit first.
    Bits(Vec<u8>),
    Indices(Vec<u64>),
    Values(ArrayValues),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayElement {
    pub name: String,
    pub number_of_tuples: usize,
    pub number_of_components: usize,
    pub payload: ArrayPayload,
}

impl ArrayElement {
    pub fn bits(name: &str, bits: &BitArray) -> Self {
        ArrayElement {
            name: name.to_string(),
            number_of_tuples: bits.len(),
            number_of_components: 1,
            payload: ArrayPayload::Bits(bits.to_bytes()),
        }
    }

    pub fn indices(name: &str, values: &[usize]) -> Self {
        ArrayElement {
            name: name.to_string(),
            number_of_tuples: values.len(),
            number_of_components: 1,
            payload: ArrayPayload::Indices(values.iter().map(|&v| v as u64).collect()),
        }
    }

    pub fn coordinates(name: &str, values: &[f64]) -> Self {
        ArrayElement {
            name: name.to_string(),
            number_of_tuples: values.len(),
            number_of_components: 1,
            payload: ArrayPayload::Values(ArrayValues::F64(values.to_vec())),
        }
    }

    pub fn from_data_array(array: &DataArray) -> Self {
        ArrayElement {
            name: array.name().to_string(),
            number_of_tuples: array.number_of_tuples(),
            number_of_components: array.number_of_components(),
            payload: ArrayPayload::Values(array.values().clone()),
        }
    }

    fn check_len(&self, expected: usize, actual: usize) -> FormatResult<()> {
        if expected != actual {
            log::error!(
                "Array {} holds {} values, header declares {}",
                self.name,
                actual,
                expected
            );
            return Err(FormatError::SizeMismatch {
                name: self.name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// `number_of_tuples * number_of_components`, as declared by the header.
    fn declared_values(&self) -> FormatResult<usize> {
        self.number_of_tuples
            .checked_mul(self.number_of_components)
            .ok_or_else(|| {
                log::error!(
                    "Array {} declares {} tuples of {} components, which overflows",
                    self.name,
                    self.number_of_tuples,
                    self.number_of_components
                );
                FormatError::CorruptFile(format!("Array {} declares too many values", self.name))
            })
    }

    fn check_window(&self, window: &Range<usize>) -> FormatResult<()> {
        if window.start > window.end || window.end > self.number_of_tuples {
            log::error!(
                "Array {} has {} tuples, cannot read tuples {:?}",
                self.name,
                self.number_of_tuples,
                window
            );
            return Err(FormatError::SizeMismatch {
                name: self.name.clone(),
                expected: window.end,
                actual: self.number_of_tuples,
            });
        }
        Ok(())
    }

    fn wrong_payload(&self, expected: &str) -> FormatError {
        log::error!("Array {} is not {}", self.name, expected);
        FormatError::CorruptFile(format!("Array {} is not {}", self.name, expected))
    }

    pub fn to_bit_array(&self) -> FormatResult<BitArray> {
        self.bit_window(0..self.number_of_tuples)
    }

    /// Bits in `window`, leaving the rest of the payload packed.
    pub fn bit_window(&self, window: Range<usize>) -> FormatResult<BitArray> {
        match &self.payload {
            ArrayPayload::Bits(bytes) => {
                self.check_len(self.number_of_tuples.div_ceil(8), bytes.len())?;
                self.check_window(&window)?;
                Ok(window.map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect())
            }
            _ => Err(self.wrong_payload("a bit array")),
        }
    }

    pub fn to_indices(&self) -> FormatResult<Vec<usize>> {
        match &self.payload {
            ArrayPayload::Indices(values) => {
                self.check_len(self.declared_values()?, values.len())?;
                values
                    .iter()
                    .map(|&v| {
                        usize::try_from(v).map_err(|_| {
                            FormatError::CorruptFile(format!("Index {} in array {} overflows", v, self.name))
                        })
                    })
                    .collect()
            }
            _ => Err(self.wrong_payload("an index array")),
        }
    }

    pub fn to_f64_vec(&self) -> FormatResult<Vec<f64>> {
        match &self.payload {
            ArrayPayload::Values(values) => {
                self.check_len(self.declared_values()?, values.len())?;
                Ok((0..values.len()).filter_map(|i| values.get_f64(i)).collect())
            }
            _ => Err(self.wrong_payload("a value array")),
        }
    }

    pub fn to_data_array(&self) -> FormatResult<DataArray> {
        self.data_window(0..self.number_of_tuples)
    }

    /// Tuples in `window` as a [`DataArray`]; values outside it are not copied.
    pub fn data_window(&self, window: Range<usize>) -> FormatResult<DataArray> {
        match &self.payload {
            ArrayPayload::Values(values) => {
                self.check_len(self.declared_values()?, values.len())?;
                self.check_window(&window)?;
                let nc = self.number_of_components;
                let part = values
                    .slice(window.start * nc..window.end * nc)
                    .ok_or_else(|| self.wrong_payload("long enough"))?;
                Ok(DataArray::new(&self.name, nc, part)?)
            }
            _ => Err(self.wrong_payload("a value array")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub arrays: Vec<ArrayElement>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl ToString) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn set_attribute(&mut self, key: &str, value: impl ToString) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn required_attribute(&self, key: &str) -> FormatResult<&str> {
        self.attribute(key).ok_or_else(|| {
            log::error!("Element {} has no attribute {}", self.name, key);
            FormatError::MissingAttribute {
                element: self.name.clone(),
                attribute: key.to_string(),
            }
        })
    }

    fn invalid_attribute(key: &str, value: &str) -> FormatError {
        log::error!("Attribute {} has invalid value '{}'", key, value);
        FormatError::InvalidAttribute {
            attribute: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn parse_attribute<T: FromStr>(&self, key: &str) -> FormatResult<T> {
        let value = self.required_attribute(key)?;
        value.trim().parse().map_err(|_| Self::invalid_attribute(key, value))
    }

    /// Parses a whitespace separated list attribute.
    pub fn parse_list_attribute<T: FromStr>(&self, key: &str) -> FormatResult<Vec<T>> {
        let value = self.required_attribute(key)?;
        value
            .split_whitespace()
            .map(|item| item.parse().map_err(|_| Self::invalid_attribute(key, value)))
            .collect()
    }

    /// Accepts `0`/`1` and `false`/`true`.
    pub fn parse_flag_attribute(&self, key: &str) -> FormatResult<bool> {
        let value = self.required_attribute(key)?;
        match value.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(Self::invalid_attribute(key, value)),
        }
    }

    pub fn add_array(&mut self, array: ArrayElement) {
        self.arrays.push(array);
    }

    pub fn with_array(mut self, array: ArrayElement) -> Self {
        self.add_array(array);
        self
    }

    pub fn array(&self, name: &str) -> Option<&ArrayElement> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn required_array(&self, name: &str) -> FormatResult<&ArrayElement> {
        self.array(name).ok_or_else(|| {
            log::error!("Element {} has no array {}", self.name, name);
            FormatError::MissingArray(name.to_string())
        })
    }

    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn required_child(&self, name: &str) -> FormatResult<&Element> {
        self.child(name).ok_or_else(|| {
            log::error!("Element {} has no child {}", self.name, name);
            FormatError::MissingElement(name.to_string())
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Top-level envelope: document type, version and the root element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_type: String,
    pub version: String,
    pub root: Element,
}

impl Document {
    pub fn new(version: FormatVersion, root: Element) -> Self {
        Document {
            document_type: DOCUMENT_TYPE.to_string(),
            version: version.version_string(),
            root,
        }
    }

    pub fn format_version(&self) -> FormatResult<FormatVersion> {
        FormatVersion::parse(&self.version).inspect_err(|_| {
            log::error!("Unsupported document version {}", self.version);
        })
    }

    pub fn encode(&self, mode: DataMode) -> FormatResult<Vec<u8>> {
        match mode {
            DataMode::Binary => {
                let payload = bincode::serde::encode_to_vec(self, bincode::config::legacy())?;
                let mut bytes = Vec::with_capacity(BINARY_MAGIC.len() + payload.len());
                bytes.extend_from_slice(BINARY_MAGIC);
                bytes.extend_from_slice(&payload);
                Ok(bytes)
            }
            DataMode::Ascii => Ok(serde_json::to_vec_pretty(self)?),
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W, mode: DataMode) -> FormatResult<()> {
        writer.write_all(&self.encode(mode)?)?;
        writer.flush()?;
        Ok(())
    }

    /// Which data mode `bytes` were written in.
    pub fn data_mode_of(bytes: &[u8]) -> DataMode {
        if bytes.starts_with(BINARY_MAGIC) {
            DataMode::Binary
        } else {
            DataMode::Ascii
        }
    }

    pub fn decode(bytes: &[u8]) -> FormatResult<Document> {
        let document: Document = match Self::data_mode_of(bytes) {
            DataMode::Binary => {
                let (document, _) = bincode::serde::decode_from_slice(
                    &bytes[BINARY_MAGIC.len()..],
                    bincode::config::legacy(),
                )
                .inspect_err(|e| log::error!("Failed to decode binary document: {}", e))?;
                document
            }
            DataMode::Ascii => serde_json::from_slice(bytes)
                .inspect_err(|e| log::error!("Failed to decode ASCII document: {}", e))?,
        };
        if document.document_type != DOCUMENT_TYPE {
            log::error!("Unexpected document type {}", document.document_type);
            return Err(FormatError::CorruptFile(format!(
                "Unexpected document type {}",
                document.document_type
            )));
        }
        Ok(document)
    }

    pub fn read_from<R: Read>(mut reader: R) -> FormatResult<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }
}
