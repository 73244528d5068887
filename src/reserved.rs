use crate::Device;
use log::{debug, trace};

/// What to delete when a field is a reserved placeholder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReservedPolicy {
    /// Delete only the reserved field.
    #[default]
    Field,
    /// Delete the whole register that contains the reserved field.
    Register,
}

/// Deletes reserved placeholder registers and fields.
///
/// A register or field is reserved when its name contains `reserved` in any
/// letter case. Reserved registers are always deleted; reserved fields are
/// handled according to `policy`.
pub fn remove_reserved(device: &mut Device, policy: ReservedPolicy) {
    let mut removed = 0;
    for peripheral in &mut device.peripherals {
        let registers = &mut peripheral.registers;
        for i in (0..registers.len()).rev() {
            if is_reserved(registers[i].name.as_deref()) {
                trace!("Removing reserved register {:?}", registers[i].name);
                registers.remove(i);
                removed += 1;
                continue;
            }
            match policy {
                ReservedPolicy::Field => {
                    let fields = &mut registers[i].fields;
                    for j in (0..fields.len()).rev() {
                        if is_reserved(fields[j].name.as_deref()) {
                            trace!("Removing reserved field {:?}", fields[j].name);
                            fields.remove(j);
                            removed += 1;
                        }
                    }
                }
                ReservedPolicy::Register => {
                    if registers[i].fields.iter().any(|field| is_reserved(field.name.as_deref())) {
                        trace!("Removing register {:?} with a reserved field", registers[i].name);
                        registers.remove(i);
                        removed += 1;
                    }
                }
            }
        }
    }
    debug!("Removed {} reserved entries", removed);
}

fn is_reserved(name: Option<&str>) -> bool {
    name.map_or(false, |name| name.to_lowercase().contains("reserved"))
}
