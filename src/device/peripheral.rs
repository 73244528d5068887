use super::register::Register;
use super::{child_int, child_text};
use crate::element::Element;
use eyre::{Result, WrapErr};
use serde::Serialize;

/// Peripheral of the device.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Peripheral {
    /// The string identifies the peripheral.
    pub name: Option<String>,
    /// The string provides an overview of the purpose and functionality of the
    /// peripheral.
    pub description: Option<String>,
    /// Prefix for the register names of the peripheral.
    pub prepend_to_name: Option<String>,
    /// Lowest address reserved or used by the peripheral.
    pub base_address: Option<u64>,
    /// The first address block of the peripheral.
    pub address_block: Option<AddressBlock>,
    /// Associated interrupts.
    pub interrupts: Vec<Interrupt>,
    /// Registers in document order.
    pub registers: Vec<Register>,
}

/// An address range uniquely mapped to a peripheral.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AddressBlock {
    /// Start address of the block relative to the peripheral base address.
    pub offset: Option<u64>,
    /// Number of address units in the block.
    pub size: Option<u64>,
    /// Usage of the block, e.g. `registers`.
    pub usage: Option<String>,
}

/// An interrupt associated with a peripheral.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Interrupt {
    /// The string represents the interrupt name.
    pub name: Option<String>,
    /// Represents the enumeration index value associated to the interrupt.
    pub value: Option<u64>,
}

impl Peripheral {
    /// Builds a peripheral from a `peripheral` element.
    ///
    /// Only direct `interrupt` children and direct `register` children of
    /// `registers` are read.
    pub fn from_element(node: &Element) -> Result<Self> {
        let mut registers = Vec::new();
        if let Some(tree) = node.child("registers") {
            for register in tree.children("register") {
                registers.push(Register::from_element(register)?);
            }
        }
        let interrupts = node
            .children("interrupt")
            .map(Interrupt::from_element)
            .collect::<Result<Vec<_>>>()?;
        let address_block = node.child("addressBlock").map(AddressBlock::from_element).transpose()?;
        Ok(Self {
            name: child_text(node, "name").map(ToOwned::to_owned),
            description: child_text(node, "description").map(ToOwned::to_owned),
            prepend_to_name: child_text(node, "prependToName").map(ToOwned::to_owned),
            base_address: child_int(node, "baseAddress")?,
            address_block,
            interrupts,
            registers,
        })
    }

    /// Returns a reference to the first register with name `name`.
    pub fn reg(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|register| register.name.as_deref() == Some(name))
    }

    /// Returns a mutable reference to the first register with name `name`.
    pub fn reg_mut(&mut self, name: &str) -> Option<&mut Register> {
        self.registers.iter_mut().find(|register| register.name.as_deref() == Some(name))
    }

    /// Adds a new register `register`.
    pub fn add_reg(&mut self, register: Register) {
        self.registers.push(register);
    }

    /// Adds a new register initialized by `f`.
    pub fn new_reg(&mut self, f: impl FnOnce(&mut Register)) {
        let mut register = Register::default();
        f(&mut register);
        self.add_reg(register);
    }

    /// Returns the absolute address of `register`, when both parts are known.
    pub fn address_of(&self, register: &Register) -> Option<u64> {
        self.base_address?.checked_add(register.address_offset?)
    }
}

impl AddressBlock {
    /// Builds an address block from an `addressBlock` element.
    pub fn from_element(node: &Element) -> Result<Self> {
        Ok(Self {
            offset: child_int(node, "offset")?,
            size: child_int(node, "size")?,
            usage: child_text(node, "usage").map(ToOwned::to_owned),
        })
    }
}

impl Interrupt {
    /// Builds an interrupt from an `interrupt` element.
    pub fn from_element(node: &Element) -> Result<Self> {
        let name = child_text(node, "name").map(ToOwned::to_owned);
        let value = child_int(node, "value")
            .wrap_err_with(|| format!("in interrupt `{}`", name.as_deref().unwrap_or("?")))?;
        Ok(Self { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMER: &str = "<peripheral>
        <name>TIM2</name>
        <description>Timer</description>
        <prependToName>TIM2_</prependToName>
        <baseAddress>0x40000000</baseAddress>
        <addressBlock><offset>0</offset><size>0x400</size><usage>registers</usage></addressBlock>
        <addressBlock><offset>0x400</offset><size>0x10</size><usage>buffer</usage></addressBlock>
        <interrupt><name>TIM2</name><value>28</value></interrupt>
        <interrupt><name>TIM2_CC</name><value>29</value></interrupt>
        <registers>
          <register><name>CR1</name><addressOffset>0x0</addressOffset></register>
          <cluster><register><name>NESTED</name></register></cluster>
          <register><name>CR2</name><addressOffset>0x4</addressOffset></register>
        </registers>
      </peripheral>";

    #[test]
    fn reads_peripheral() {
        let peripheral = Peripheral::from_element(&Element::parse(TIMER).unwrap()).unwrap();
        assert_eq!(peripheral.name.as_deref(), Some("TIM2"));
        assert_eq!(peripheral.description.as_deref(), Some("Timer"));
        assert_eq!(peripheral.prepend_to_name.as_deref(), Some("TIM2_"));
        assert_eq!(peripheral.base_address, Some(0x4000_0000));
        assert_eq!(
            peripheral.address_block,
            Some(AddressBlock { offset: Some(0), size: Some(0x400), usage: Some("registers".into()) })
        );
        assert_eq!(peripheral.interrupts.len(), 2);
        assert_eq!(peripheral.interrupts[1].name.as_deref(), Some("TIM2_CC"));
        assert_eq!(peripheral.interrupts[1].value, Some(29));
    }

    #[test]
    fn reads_only_direct_registers() {
        let peripheral = Peripheral::from_element(&Element::parse(TIMER).unwrap()).unwrap();
        let names =
            peripheral.registers.iter().filter_map(|r| r.name.as_deref()).collect::<Vec<_>>();
        assert_eq!(names, ["CR1", "CR2"]);
        let cr2 = peripheral.reg("CR2").unwrap();
        assert_eq!(peripheral.address_of(cr2), Some(0x4000_0004));
    }

    #[test]
    fn empty_peripheral() {
        let peripheral =
            Peripheral::from_element(&Element::parse("<peripheral/>").unwrap()).unwrap();
        assert_eq!(peripheral, Peripheral::default());
    }
}
