use super::access::Access;
use super::{child_int, child_text};
use crate::element::Element;
use eyre::{eyre, Result, WrapErr};
use log::trace;
use serde::Serialize;

/// Bit-field properties of a register.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Name string used to identify the field.
    pub name: Option<String>,
    /// String describing the details of the field.
    pub description: Option<String>,
    /// The position of the least significant bit of the field within the
    /// register.
    pub bit_offset: Option<u64>,
    /// The bit-width of the bitfield within the register.
    pub bit_width: Option<u64>,
    /// The access type, as written in the description.
    pub access: Option<String>,
    /// Named values of the field. `None` when the field declares none.
    pub enumerated_values: Option<Vec<EnumeratedValue>>,
}

/// A named value of a field.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EnumeratedValue {
    /// Identifier of the value.
    pub name: Option<String>,
    /// Description of the value.
    pub description: Option<String>,
    /// The value itself.
    pub value: Option<u64>,
}

impl Field {
    /// Builds a field from a `field` element.
    ///
    /// The bit position is taken from `bitRange` if present, then from
    /// `msb`/`lsb`, then from `bitOffset`/`bitWidth`.
    pub fn from_element(node: &Element) -> Result<Self> {
        let name = child_text(node, "name").map(ToOwned::to_owned);
        let context = || format!("in field `{}`", name.as_deref().unwrap_or("?"));
        let (bit_offset, bit_width) = bit_position(node).wrap_err_with(context)?;
        let mut enumerated_values = Vec::new();
        for values in node.children("enumeratedValues") {
            for value in values.descendants("enumeratedValue") {
                let value = EnumeratedValue::from_element(value).wrap_err_with(context)?;
                enumerated_values.push(value);
            }
        }
        trace!("Field {:?} at bit {:?} width {:?}", name, bit_offset, bit_width);
        Ok(Self {
            name,
            description: child_text(node, "description").map(ToOwned::to_owned),
            bit_offset,
            bit_width,
            access: child_text(node, "access").map(ToOwned::to_owned),
            enumerated_values: (!enumerated_values.is_empty()).then_some(enumerated_values),
        })
    }

    /// Returns the typed access rights, if the access text is recognized.
    pub fn access_rights(&self) -> Option<Access> {
        self.access.as_deref().and_then(|access| access.parse().ok())
    }
}

impl EnumeratedValue {
    /// Builds a value from an `enumeratedValue` element.
    pub fn from_element(node: &Element) -> Result<Self> {
        Ok(Self {
            name: child_text(node, "name").map(ToOwned::to_owned),
            description: child_text(node, "description").map(ToOwned::to_owned),
            value: child_int(node, "value")?,
        })
    }
}

fn bit_position(node: &Element) -> Result<(Option<u64>, Option<u64>)> {
    if let Some(bit_range) = child_text(node, "bitRange") {
        let (msb, lsb) = parse_bit_range(bit_range)
            .ok_or_else(|| eyre!("malformed bit range `{}`", bit_range))?;
        return Ok((Some(lsb), Some(width(msb, lsb)?)));
    }
    let bit_offset = child_int(node, "bitOffset")?;
    let bit_width = child_int(node, "bitWidth")?;
    if let Some(msb) = child_int(node, "msb")? {
        let lsb = child_int(node, "lsb")?.ok_or_else(|| eyre!("<msb> without <lsb>"))?;
        return Ok((Some(lsb), Some(width(msb, lsb)?)));
    }
    Ok((bit_offset, bit_width))
}

fn width(msb: u64, lsb: u64) -> Result<u64> {
    msb.checked_sub(lsb)
        .map(|diff| diff + 1)
        .ok_or_else(|| eyre!("msb {} is below lsb {}", msb, lsb))
}

/// Finds the first `[msb:lsb]` token in `src`.
fn parse_bit_range(src: &str) -> Option<(u64, u64)> {
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let mut rest = src;
    while let Some(start) = rest.find('[') {
        rest = &rest[start + 1..];
        let Some(end) = rest.find(']') else { break };
        if let Some((msb, lsb)) = rest[..end].split_once(':') {
            if is_number(msb) && is_number(lsb) {
                return Some((msb.parse().ok()?, lsb.parse().ok()?));
            }
        }
    }
    None
}
