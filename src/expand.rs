use crate::{Device, Register};
use eyre::{bail, ensure, eyre, Result, WrapErr};
use log::{debug, trace};

/// Replaces every register array template with its concrete registers.
///
/// Each template is spliced out and its instances are inserted at the same
/// position, so the order of the surrounding registers is preserved. All
/// templates of the device are expanded before anything is replaced: if one of
/// them is malformed, the device is left untouched.
pub fn expand_arrays(device: &mut Device) -> Result<()> {
    let mut expansions = Vec::with_capacity(device.peripherals.len());
    for peripheral in &device.peripherals {
        let mut peripheral_expansions = Vec::new();
        for (i, register) in peripheral.registers.iter().enumerate().rev() {
            if register.is_array() {
                let instances = expand_register(register).wrap_err_with(|| {
                    format!(
                        "in register `{}` of peripheral `{}`",
                        register.name.as_deref().unwrap_or("?"),
                        peripheral.name.as_deref().unwrap_or("?")
                    )
                })?;
                peripheral_expansions.push((i, instances));
            }
        }
        expansions.push(peripheral_expansions);
    }
    let mut count = 0;
    for (peripheral, peripheral_expansions) in device.peripherals.iter_mut().zip(expansions) {
        // Indices are descending, so a splice never shifts a pending one.
        for (i, instances) in peripheral_expansions {
            count += 1;
            peripheral.registers.splice(i..=i, instances);
        }
    }
    debug!("Expanded {} register arrays", count);
    Ok(())
}

/// Returns the concrete registers described by the array template `template`.
///
/// The template name must contain exactly one `%s` placeholder, which is
/// replaced by the matching `dimIndex` entry, and the address offset advances
/// by `dimIncrement` per element. Each instance gets its own copy of the fields.
pub fn expand_register(template: &Register) -> Result<Vec<Register>> {
    let (Some(dim), Some(dim_increment), Some(dim_index)) =
        (template.dim, template.dim_increment, template.dim_index.as_ref())
    else {
        bail!("incomplete array descriptor: `dim`, `dimIncrement` and `dimIndex` are required");
    };
    ensure!(
        usize::try_from(dim).map_or(false, |dim| dim == dim_index.len()),
        "`dim` is {} but `dimIndex` has {} entries",
        dim,
        dim_index.len()
    );
    let name = template.name.as_deref().ok_or_else(|| eyre!("array register has no name"))?;
    let address_offset =
        template.address_offset.ok_or_else(|| eyre!("array register has no address offset"))?;
    match name.matches("%s").count() {
        0 => bail!("array register `{}` has no `%s` placeholder", name),
        1 => {}
        _ => bail!("array register `{}` has more than one `%s` placeholder", name),
    }
    let mut instances = Vec::with_capacity(dim_index.len());
    for (i, index) in (0_u64..).zip(dim_index) {
        let address_offset = dim_increment
            .checked_mul(i)
            .and_then(|step| address_offset.checked_add(step))
            .ok_or_else(|| eyre!("address offset of element {} overflows", i))?;
        let instance = Register {
            dim: None,
            dim_increment: None,
            dim_index: None,
            name: Some(name.replace("%s", index)),
            description: template.description.clone(),
            address_offset: Some(address_offset),
            size: template.size,
            access: template.access.clone(),
            reset_value: template.reset_value,
            reset_mask: template.reset_mask,
            fields: template.fields.clone(),
        };
        trace!("Array element {:?} at offset {:#x}", instance.name, address_offset);
        instances.push(instance);
    }
    Ok(instances)
}
