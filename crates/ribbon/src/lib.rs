//! Ribbon XML normalization.
//!
//! Turns the XML returned by `RetrieveEntityRibbon` (or the ribbon sections of
//! a `customizations.xml`) into a navigable [`RibbonDocument`].

pub mod error;
pub mod model;
pub mod parser;
pub mod payload;

pub use error::{RibbonError, RibbonResult};
pub use model::{CommandDefinition, Control, Group, RibbonDocument, RuleRef, Tab};
pub use parser::{parse_ribbon, parse_ribbon_file};
pub use payload::decode_ribbon_payload;
