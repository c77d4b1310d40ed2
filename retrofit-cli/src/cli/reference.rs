use std::path::PathBuf;

use clap::Parser;

use crate::{pipeline::reference::ReferenceMapping, prelude::*};

#[derive(Parser)]
pub struct ReferenceArgs {
    /// Directory of `<category>.json` label files, or a single TOML file.
    #[clap(long = "reference-path", env = "REFERENCE_PATH", default_value = "json")]
    path: PathBuf,
}

impl ReferenceArgs {
    pub fn load(&self) -> Result<ReferenceMapping> {
        ReferenceMapping::read_from(&self.path).context("failed to load the reference mapping")
    }
}
