use eyre::{eyre, Report};
use serde::Serialize;
use std::str::FromStr;

/// Predefined access rights.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    /// Read operations have an undefined result. Write access is permitted.
    WriteOnly,
    /// Read access is permitted. Write operations have an undefined result.
    ReadOnly,
    /// Read and write accesses are permitted. Writes affect the state of the
    /// register and reads return the register value.
    ReadWrite,
    /// Read operations have an undefined result. Only the first write after
    /// reset has an effect.
    WriteOnce,
    /// Read access is always permitted. Only the first write access after a
    /// reset will have an effect on the content. Other write operations have an
    /// undefined result.
    ReadWriteOnce,
}

impl FromStr for Access {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Report> {
        match s.trim() {
            "write-only" => Ok(Self::WriteOnly),
            "read-only" => Ok(Self::ReadOnly),
            "read-write" => Ok(Self::ReadWrite),
            "writeOnce" => Ok(Self::WriteOnce),
            "read-writeOnce" => Ok(Self::ReadWriteOnce),
            _ => Err(eyre!("unknown access `{}`", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_svd_keywords() {
        assert_eq!("read-only".parse::<Access>().unwrap(), Access::ReadOnly);
        assert_eq!("read-writeOnce".parse::<Access>().unwrap(), Access::ReadWriteOnce);
        assert_eq!("writeOnce".parse::<Access>().unwrap(), Access::WriteOnce);
        let err = "rw".parse::<Access>().unwrap_err();
        assert_eq!(err.to_string(), "unknown access `rw`");
    }
}
