//! CMSIS-SVD parser producing a typed device model.
//!
//! The document is read into a plain [`Element`] tree, translated top-down
//! into a [`Device`], and then post-processed in place: register arrays are
//! expanded into concrete registers, and reserved placeholders are removed.
//!
//! # Usage
//!
//! ```
//! use svd_model::Config;
//!
//! let device = Config::new()
//!     .load_str(
//!         "<device>
//!            <name>DEV</name>
//!            <peripherals>
//!              <peripheral>
//!                <name>P</name>
//!                <baseAddress>0x40000000</baseAddress>
//!                <registers>
//!                  <register>
//!                    <name>CTRL%s</name>
//!                    <addressOffset>0x0</addressOffset>
//!                    <dim>2</dim>
//!                    <dimIncrement>0x4</dimIncrement>
//!                    <dimIndex>0,1</dimIndex>
//!                  </register>
//!                </registers>
//!              </peripheral>
//!            </peripherals>
//!          </device>",
//!     )
//!     .unwrap();
//! let peripheral = device.periph("P").unwrap();
//! let ctrl1 = peripheral.reg("CTRL1").unwrap();
//! assert_eq!(peripheral.address_of(ctrl1), Some(0x4000_0004));
//! ```

#![deny(elided_lifetimes_in_paths)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

mod device;
mod element;
mod expand;
mod reserved;

pub use self::device::{
    child_int, child_text, parse_int, Access, AddressBlock, Device, EnumeratedValue, Field,
    Interrupt, Peripheral, Register,
};
pub use self::element::Element;
pub use self::expand::{expand_arrays, expand_register};
pub use self::reserved::{remove_reserved, ReservedPolicy};
use eyre::{Result, WrapErr};
use log::debug;
use std::{fs, path::Path};

/// Options to configure which transforms run after parsing.
#[derive(Clone, Debug)]
pub struct Config {
    expand_arrays: bool,
    remove_reserved: bool,
    reserved_policy: ReservedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates the default set of options: both transforms enabled, reserved
    /// fields removed individually.
    pub fn new() -> Self {
        Self {
            expand_arrays: true,
            remove_reserved: true,
            reserved_policy: ReservedPolicy::default(),
        }
    }

    /// Sets whether register arrays are expanded.
    pub fn expand_arrays(&mut self, expand_arrays: bool) -> &mut Self {
        self.expand_arrays = expand_arrays;
        self
    }

    /// Sets whether reserved registers and fields are removed.
    pub fn remove_reserved(&mut self, remove_reserved: bool) -> &mut Self {
        self.remove_reserved = remove_reserved;
        self
    }

    /// Sets what is removed when a field is reserved.
    pub fn reserved_policy(&mut self, reserved_policy: ReservedPolicy) -> &mut Self {
        self.reserved_policy = reserved_policy;
        self
    }

    /// Parses the SVD document `xml` and applies the enabled transforms.
    pub fn load_str(&self, xml: &str) -> Result<Device> {
        let mut device = parse_str(xml)?;
        self.apply(&mut device)?;
        Ok(device)
    }

    /// Parses the SVD file at `path` and applies the enabled transforms.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Device> {
        let mut device = parse(path)?;
        self.apply(&mut device)?;
        Ok(device)
    }

    /// Applies the enabled transforms to an already parsed `device`.
    pub fn apply(&self, device: &mut Device) -> Result<()> {
        if self.expand_arrays {
            expand_arrays(device)?;
        }
        if self.remove_reserved {
            remove_reserved(device, self.reserved_policy);
        }
        Ok(())
    }
}

/// Parses the SVD document `xml` without transforming it.
pub fn parse_str(xml: &str) -> Result<Device> {
    let root = Element::parse(xml)?;
    let device = Device::from_element(&root)?;
    debug!(
        "Parsed device {} with {} peripherals",
        device.name.as_deref().unwrap_or("?"),
        device.peripherals.len()
    );
    Ok(device)
}

/// Parses the SVD file at `path` without transforming it.
pub fn parse<P: AsRef<Path>>(path: P) -> Result<Device> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_str(&xml).wrap_err_with(|| format!("in {}", path.display()))
}
