use alos2_ingest::constants::{ALOS2APP_COMMAND, BOS_SARCAT_URL};
use alos2_ingest::logging::setup_logging;
use alos2_ingest::io::write_failure_report;
use alos2_ingest::{
    CatalogConfig, ExtractionMethod, IngestConfig, IngestPipeline, IsceConfig, JobContext,
    MetadataExtractor,
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Ingest ALOS-2 SLC archives into products.
///
/// Every archive is unpacked, each ALOS-2 dataset directory inside it becomes a product directory
/// holding the raw files plus `<name>.met.json` and `<name>.dataset.json`, and the working
/// directory is cleaned up afterwards.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "ingest_alos2_slc")]
#[clap(author, version, about)]
struct IngestOptions {
    /// An SLC archive, or a directory of SLC archives.
    ///
    /// If this is not specified, then the program will check the "SLC_PATH" environment variable
    /// and then the `slc_path` entry of `_context.json` in the working directory.
    #[clap(short = 'd', long)]
    #[clap(env = "SLC_PATH")]
    slc_path: Option<PathBuf>,

    /// Working directory archives are unpacked in and products written to.
    #[clap(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// Extraction method: "bos" for the catalog, "isce" for preprocessing.
    ///
    /// Any other value, or none, tries the catalog first and uses ISCE when it fails.
    #[clap(short, long, default_value = "")]
    method: String,

    /// Shell command running ISCE preprocessing.
    #[clap(long, env = "ALOS2APP_COMMAND", default_value = ALOS2APP_COMMAND)]
    command: String,

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

fn run(options: IngestOptions) -> anyhow::Result<()> {
    let IngestOptions {
        slc_path,
        work_dir,
        method,
        command,
        catalog_url,
        verify_tls,
        ..
    } = options;

    let slc_path = match slc_path {
        Some(path) => path,
        None => JobContext::load(&work_dir)?
            .slc_path
            .map(PathBuf::from)
            .context("No SLC path given on the command line, in SLC_PATH or in _context.json")?,
    };

    let method = ExtractionMethod::from_str(&method);
    let catalog = CatalogConfig {
        url: catalog_url,
        accept_invalid_certs: !verify_tls,
        ..CatalogConfig::default()
    };
    // ISCE scene directories go under the working directory
    let isce = IsceConfig {
        command,
        work_dir: work_dir.clone(),
    };
    let extractor = MetadataExtractor::with_defaults(method, catalog, isce)?;

    let pipeline = IngestPipeline::new(IngestConfig { work_dir }, extractor);
    let products = pipeline
        .process_slc_path(&slc_path)
        .with_context(|| format!("Ingestion failed for {}", slc_path.display()))?;

    log::info!("Created {} product(s)", products.len());
    for product in &products {
        log::info!("  {}", product.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let options = IngestOptions::parse();
    setup_logging(options.verbose);
    let work_dir = options.work_dir.clone();

    if let Err(err) = run(options) {
        log::error!("{:#}", err);
        if let Err(report_err) = write_failure_report(&work_dir, &err) {
            log::error!("Could not write failure report: {}", report_err);
        }
        return Err(err);
    }
    Ok(())
}
