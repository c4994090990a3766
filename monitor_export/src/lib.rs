pub mod destination;
pub mod exporters;

pub use destination::{DestinationConfig, DestinationKind};
pub use exporters::{from_destination, supported_kinds, DynExporter, Exporter};
