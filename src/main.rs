//! reportchart CLI entry point.

use reportchart_lib::cli::{self, Cli};
use reportchart_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
