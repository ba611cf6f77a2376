//! # pipeline-bench CLI
//!
//! Times fused pipelines at varying input sizes.
//!
//! ## Usage
//! ```bash
//! pipeline-bench bench 1000 100000 --threads 4 --policy preserve-order
//! pipeline-bench compare 1000000 --threads 8 --output json
//! ```

mod cli;

use fused_pipeline::Result;

fn main() -> Result<()> {
    fused_pipeline::init_tracing();
    cli::run()
}
