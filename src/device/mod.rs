mod access;
mod field;
mod peripheral;
mod register;

pub use self::access::Access;
pub use self::field::{EnumeratedValue, Field};
pub use self::peripheral::{AddressBlock, Interrupt, Peripheral};
pub use self::register::Register;
use crate::element::Element;
use eyre::{Result, WrapErr};
use log::debug;
use serde::Serialize;
use std::num::ParseIntError;

/// The outermost frame of the description.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Device {
    /// The vendor of the device.
    pub vendor: Option<String>,
    /// The vendor abbreviation, usually in upper case.
    pub vendor_id: Option<String>,
    /// The string identifies the device or device series.
    pub name: Option<String>,
    /// The version of the description.
    pub version: Option<String>,
    /// The device description.
    pub description: Option<String>,
    /// The processor description. Never populated.
    pub cpu: Option<String>,
    /// The number of data bits uniquely selected by each address.
    pub address_unit_bits: Option<u64>,
    /// The bit-width of the maximum single data transfer.
    pub width: Option<u64>,
    /// Peripherals in document order.
    pub peripherals: Vec<Peripheral>,
}

impl Device {
    /// Creates a new empty device definition.
    pub fn new(name: String) -> Self {
        Self { name: Some(name), ..Self::default() }
    }

    /// Builds a device from the document root.
    ///
    /// Peripherals are collected from every `peripheral` element in the
    /// document, not only the children of `peripherals`.
    pub fn from_element(node: &Element) -> Result<Self> {
        let mut peripherals = Vec::new();
        for peripheral in node.descendants("peripheral") {
            let peripheral = Peripheral::from_element(peripheral).wrap_err_with(|| {
                format!("in peripheral `{}`", child_text(peripheral, "name").unwrap_or("?"))
            })?;
            debug!(
                "Parsed peripheral {} with {} registers",
                peripheral.name.as_deref().unwrap_or("?"),
                peripheral.registers.len()
            );
            peripherals.push(peripheral);
        }
        Ok(Self {
            vendor: child_text(node, "vendor").map(ToOwned::to_owned),
            vendor_id: child_text(node, "vendorID").map(ToOwned::to_owned),
            name: child_text(node, "name").map(ToOwned::to_owned),
            version: child_text(node, "version").map(ToOwned::to_owned),
            description: child_text(node, "description").map(ToOwned::to_owned),
            cpu: None,
            address_unit_bits: child_int(node, "addressUnitBits")?,
            width: child_int(node, "width")?,
            peripherals,
        })
    }

    /// Returns an iterator over all peripheral names.
    pub fn periph_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.peripherals.iter().filter_map(|peripheral| peripheral.name.as_deref())
    }

    /// Returns a reference to the first peripheral with name `name`.
    pub fn periph(&self, name: &str) -> Option<&Peripheral> {
        self.peripherals.iter().find(|peripheral| peripheral.name.as_deref() == Some(name))
    }

    /// Returns a mutable reference to the first peripheral with name `name`.
    pub fn periph_mut(&mut self, name: &str) -> Option<&mut Peripheral> {
        self.peripherals.iter_mut().find(|peripheral| peripheral.name.as_deref() == Some(name))
    }

    /// Appends a new peripheral `peripheral`.
    pub fn add_periph(&mut self, peripheral: Peripheral) {
        self.peripherals.push(peripheral);
    }

    /// Appends a new peripheral initialized by `f`.
    pub fn new_periph(&mut self, f: impl FnOnce(&mut Peripheral)) {
        let mut peripheral = Peripheral::default();
        f(&mut peripheral);
        self.add_periph(peripheral);
    }
}

/// Returns the text of the first child of `node` named `tag`.
///
/// A missing child and a child without text are both `None`.
pub fn child_text<'a>(node: &'a Element, tag: &str) -> Option<&'a str> {
    node.child(tag).and_then(Element::text)
}

/// Returns the integer value of the first child of `node` named `tag`.
///
/// See [`parse_int`] for the accepted notations. Absence is `Ok(None)`,
/// present but unparsable text is an error.
pub fn child_int(node: &Element, tag: &str) -> Result<Option<u64>> {
    child_text(node, tag)
        .map(|text| {
            parse_int(text).wrap_err_with(|| format!("malformed integer `{}` in <{}>", text, tag))
        })
        .transpose()
}

/// Parses an SVD scalar.
///
/// `0x`/`0X` introduces hexadecimal, `#` introduces binary, anything else is
/// decimal. In binary notation every digit other than `0` and `1` is a
/// don't-care bit and is read as `0`, so `#1x0` is `4`.
pub fn parse_int(src: &str) -> Result<u64, ParseIntError> {
    let src = src.trim();
    if let Some(hex) = src.strip_prefix("0x").or_else(|| src.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = src.strip_prefix('#') {
        let bin = bin.chars().map(|c| if c == '1' { '1' } else { '0' }).collect::<String>();
        u64::from_str_radix(&bin, 2)
    } else {
        src.parse()
    }
}
