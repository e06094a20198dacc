//! Office Open XML packages.
//!
//! The module is organized in layers:
//!
//! 1. **OPC layer** (`opc`): parts, relationships, content types, the ZIP
//!    container and the [`PackageGateway`](opc::PackageGateway) documents
//!    persist through
//! 2. **Parts** (`parts`): the XML parts documents interpret (core
//!    properties, theme, workbook) and templates for new documents
//! 3. **Format modules**: `docx`, `pptx` and `xlsx`
pub mod docx;
pub mod opc;
pub mod parts;
pub mod pptx;
pub mod xlsx;
