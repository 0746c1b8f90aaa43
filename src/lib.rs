// Library exports for qrsmith

pub mod batch;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod logo;
pub mod pattern;
pub mod payload;
pub mod render;
pub mod session;
pub mod store;
pub mod style;
pub mod vector;

pub use color::Color;
pub use error::{Error, Result};
pub use export::{Artifact, ExportFormat};
pub use payload::{PayloadKind, PayloadRequest};
pub use session::{Notice, RenderHandle, Session};
pub use style::{LogoImage, ModulePattern, StyleConfig};
