use super::access::Access;
use super::field::Field;
use super::{child_int, child_text};
use crate::element::Element;
use eyre::{Result, WrapErr};
use log::trace;
use serde::Serialize;

/// The description of a register.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Register {
    /// Define the number of elements in an array.
    pub dim: Option<u64>,
    /// Specify the address increment, in Bytes, between two neighboring array
    /// members in the address map.
    pub dim_increment: Option<u64>,
    /// Substitutions for the `%s` placeholder of the name, one per element.
    pub dim_index: Option<Vec<String>>,
    /// String to identify the register.
    pub name: Option<String>,
    /// String describing the details of the register.
    pub description: Option<String>,
    /// The address offset relative to the enclosing element.
    pub address_offset: Option<u64>,
    /// The bit-width of the register.
    pub size: Option<u64>,
    /// The access rights for the register, as written in the description.
    pub access: Option<String>,
    /// The default value for the register at RESET.
    pub reset_value: Option<u64>,
    /// The bits of the register that have a defined reset value.
    pub reset_mask: Option<u64>,
    /// Bit-fields of the register in document order.
    pub fields: Vec<Field>,
}

impl Register {
    /// Builds a register from a `register` element.
    ///
    /// Fields are collected from every `field` element below the register.
    pub fn from_element(node: &Element) -> Result<Self> {
        let name = child_text(node, "name").map(ToOwned::to_owned);
        let context = || format!("in register `{}`", name.as_deref().unwrap_or("?"));
        let fields = node
            .descendants("field")
            .into_iter()
            .map(Field::from_element)
            .collect::<Result<Vec<_>>>()
            .wrap_err_with(context)?;
        let register = Self {
            dim: child_int(node, "dim").wrap_err_with(context)?,
            dim_increment: child_int(node, "dimIncrement").wrap_err_with(context)?,
            dim_index: child_text(node, "dimIndex")
                .map(|index| index.split(',').map(ToOwned::to_owned).collect()),
            description: child_text(node, "description").map(ToOwned::to_owned),
            address_offset: child_int(node, "addressOffset").wrap_err_with(context)?,
            size: child_int(node, "size").wrap_err_with(context)?,
            access: child_text(node, "access").map(ToOwned::to_owned),
            reset_value: child_int(node, "resetValue").wrap_err_with(context)?,
            reset_mask: child_int(node, "resetMask").wrap_err_with(context)?,
            fields,
            name,
        };
        trace!("Register {:?} with {} fields", register.name, register.fields.len());
        Ok(register)
    }

    /// Returns `true` if the register is an array template.
    pub fn is_array(&self) -> bool {
        self.dim.is_some()
    }

    /// Returns the typed access rights, if the access text is recognized.
    pub fn access_rights(&self) -> Option<Access> {
        self.access.as_deref().and_then(|access| access.parse().ok())
    }

    /// Returns a reference to the first field with name `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name.as_deref() == Some(name))
    }

    /// Adds a new field `field`.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Adds a new field initialized by `f`.
    pub fn new_field(&mut self, f: impl FnOnce(&mut Field)) {
        let mut field = Field::default();
        f(&mut field);
        self.add_field(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(xml: &str) -> Result<Register> {
        Register::from_element(&Element::parse(xml).unwrap())
    }

    #[test]
    fn reads_scalars() {
        let register = register(
            "<register><name>CR</name><description>Control</description>\
             <addressOffset>0x10</addressOffset><size>32</size><access>read-only</access>\
             <resetValue>0x0000FFFF</resetValue><resetMask>0xFFFFFFFF</resetMask></register>",
        )
        .unwrap();
        assert_eq!(register.name.as_deref(), Some("CR"));
        assert_eq!(register.description.as_deref(), Some("Control"));
        assert_eq!(register.address_offset, Some(0x10));
        assert_eq!(register.size, Some(32));
        assert_eq!(register.access_rights(), Some(Access::ReadOnly));
        assert_eq!(register.reset_value, Some(0xFFFF));
        assert_eq!(register.reset_mask, Some(0xFFFF_FFFF));
        assert!(!register.is_array());
        assert_eq!(register.dim_index, None);
    }

    #[test]
    fn collects_nested_fields() {
        let register = register(
            "<register><name>SR</name><fields>\
             <field><name>A</name><bitOffset>0</bitOffset><bitWidth>1</bitWidth></field>\
             <group><field><name>B</name><bitRange>[2:1]</bitRange></field></group>\
             </fields></register>",
        )
        .unwrap();
        let names = register.fields.iter().filter_map(|f| f.name.as_deref()).collect::<Vec<_>>();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(register.field("B").unwrap().bit_width, Some(2));
    }

    #[test]
    fn splits_dim_index_without_trimming() {
        let register = register(
            "<register><name>CH%s</name><dim>3</dim><dimIncrement>0x8</dimIncrement>\
             <dimIndex>A, B,C</dimIndex></register>",
        )
        .unwrap();
        assert!(register.is_array());
        assert_eq!(register.dim, Some(3));
        assert_eq!(register.dim_increment, Some(8));
        assert_eq!(register.dim_index.unwrap(), ["A", " B", "C"]);
    }

    #[test]
    fn malformed_field_names_register() {
        let err = register(
            "<register><name>DR</name><fields><field><name>F</name>\
             <bitOffset>x</bitOffset></field></fields></register>",
        )
        .unwrap_err();
        let message = format!("{:?}", err);
        assert!(message.contains("DR"));
        assert!(message.contains("<bitOffset>"));
    }
}
