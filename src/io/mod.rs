//! I/O modules for ALOS-2 archives, file names, catalog lookups and product XML

pub mod archive;
pub mod catalog;
pub mod context;
pub mod filename;
pub mod product_xml;

pub use catalog::{CatalogClient, CatalogConfig};
pub use context::{write_failure_report, JobContext};
pub use filename::{parse_img_filename, ImgFileInfo};
pub use product_xml::{load_track, Component};
