use alos2_ingest::constants::{ALOS2APP_COMMAND, BOS_SARCAT_URL};
use alos2_ingest::logging::setup_logging;
use alos2_ingest::{CatalogConfig, ExtractionMethod, IsceConfig, MetadataExtractor};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Extract metadata from an ALOS-2 SLC directory.
///
/// The metadata comes from the BOS sarcat catalog, from ISCE preprocessing, or from the catalog
/// with ISCE as the fallback when the catalog lookup fails.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "extract_alos2_md")]
#[clap(author, version, about)]
struct ExtractOptions {
    /// Directory holding the ALOS-2 IMG/LED files.
    #[clap(short, long, default_value = ".")]
    dir: PathBuf,

    /// Output metadata file.
    #[clap(short, long, default_value = "alos2_md.json")]
    output: PathBuf,

    /// Extraction method: "bos" for the catalog, "isce" for preprocessing.
    ///
    /// Any other value, or none, tries the catalog first and uses ISCE when it fails.
    #[clap(short, long, default_value = "")]
    method: String,

    /// Shell command running ISCE preprocessing.
    #[clap(long, env = "ALOS2APP_COMMAND", default_value = ALOS2APP_COMMAND)]
    command: String,

    /// Directory holding the per-scene ISCE preprocessing directories.
    #[clap(long, default_value = ".")]
    work_dir: PathBuf,

    /// Catalog feature service endpoint.
    #[clap(long, env = "BOS_SARCAT_URL", default_value = BOS_SARCAT_URL)]
    catalog_url: String,

    /// Verify the catalog's TLS certificate.
    #[clap(long)]
    verify_tls: bool,

    /// Verbose output, repeat for more detail
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let ExtractOptions {
        dir,
        output,
        method,
        command,
        work_dir,
        catalog_url,
        verify_tls,
        verbose,
    } = ExtractOptions::parse();
    setup_logging(verbose);

    let method = ExtractionMethod::from_str(&method);
    let catalog = CatalogConfig {
        url: catalog_url,
        accept_invalid_certs: !verify_tls,
        ..CatalogConfig::default()
    };
    let isce = IsceConfig { command, work_dir };

    let extractor = MetadataExtractor::with_defaults(method, catalog, isce)?;
    let written = extractor
        .extract_to_file(&dir, &output)
        .with_context(|| format!("Metadata extraction failed for {}", dir.display()))?;

    if !written {
        log::warn!("No metadata written for {}", dir.display());
    }
    Ok(())
}
