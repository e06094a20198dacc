//! Open Packaging Conventions (OPC) layer.
//!
//! Parts, relationships and content types of ZIP-based Office packages,
//! plus the [`PackageGateway`] through which documents are read and saved.

pub mod constants;
pub mod error;
pub mod gateway;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use error::OpcError;
pub use gateway::{OoxmlGateway, PackageGateway};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::Part;
pub use phys_pkg::Compression;
pub use rel::{Relationship, Relationships};
