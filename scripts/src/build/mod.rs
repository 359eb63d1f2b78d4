//! Compilation of the solidity sources into artifacts.

mod info;
mod solc;

pub use info::BuildInfo;
pub use solc::{parse_combined_json, parse_solc_version, SolcBuilder, SolcVersion};
