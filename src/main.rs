//! Downloads and unpacks the configured `PostgreSQL` release, then prints the
//! runtime directory.
//!
//! The server is **not** started. Configuration comes from `PG_*` environment
//! variables parsed by [`OrthoConfig`](https://github.com/leynos/ortho-config);
//! logs go to stderr so the printed path can be captured by scripts. The
//! binary exits with status code `0` on success and `1` on error.

use std::io::{self, Write};

fn main() -> color_eyre::eyre::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let prepared = pg_embed_runtime::run()?;
    writeln!(io::stdout().lock(), "{}", prepared.runtime_dir)?;
    Ok(())
}
