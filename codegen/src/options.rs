//! Per-target rendering options

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How server identifiers are numbered in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerEncoding {
    /// The declaration ordinal: 0, 1, 2, ...
    #[default]
    Ordinal,
    /// A power of two per server so ids can be OR-combined: 1, 2, 4, ...
    BitFlag,
}

impl ServerEncoding {
    /// `None` when a bit flag would not fit in 64 bits.
    pub fn id(self, ordinal: usize) -> Option<u64> {
        match self {
            ServerEncoding::Ordinal => Some(ordinal as u64),
            ServerEncoding::BitFlag => u32::try_from(ordinal)
                .ok()
                .and_then(|shift| 1u64.checked_shl(shift)),
        }
    }
}

impl fmt::Display for ServerEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServerEncoding::Ordinal => "ordinal",
            ServerEncoding::BitFlag => "bit_flag",
        })
    }
}

pub const DEFAULT_RESPONSE_CODE_BASE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetOptions {
    /// Enclosing namespace or module name. Defaults to the protocol name in
    /// PascalCase.
    pub namespace: Option<String>,
    pub server_encoding: ServerEncoding,
    /// Added to every response code ordinal.
    pub response_code_base: u64,
    /// Replacements for the target's type names, keyed by primitive tag,
    /// `array`, `map`, or an external type name.
    pub types: BTreeMap<String, String>,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            server_encoding: ServerEncoding::default(),
            response_code_base: DEFAULT_RESPONSE_CODE_BASE,
            types: BTreeMap::new(),
        }
    }
}
