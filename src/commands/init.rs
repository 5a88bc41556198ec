//! `dbsync init <path>`: write the configuration template.
//!
//! The file will later hold the database password, so it is created with
//! mode `0600`.  An existing file is left alone unless `--force` is passed,
//! in which case it is rewritten and its mode reset to `0600`.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use console::style;
use tracing::info;

use crate::{
    config::TEMPLATE,
    error::{BackupError, BackupResult},
};

/// Owner read/write only.
pub const CONFIG_MODE: u32 = 0o600;

pub fn run(path: &Path, force: bool) -> BackupResult<()> {
    write_template(path, force)?;
    println!(
        "  {}  Configuration file created: {}",
        style("✓").green().bold(),
        path.display()
    );
    Ok(())
}

/// Write [`TEMPLATE`] to `path` with owner-only permissions.
pub fn write_template(path: &Path, force: bool) -> BackupResult<()> {
    let write_err = |source: io::Error| BackupError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut opts = OpenOptions::new();
    opts.write(true);
    if force {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(CONFIG_MODE);
    }

    let mut file = opts.open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            BackupError::ConfigExists {
                path: path.to_path_buf(),
            }
        } else {
            write_err(source)
        }
    })?;

    // `mode` only applies to newly created files; a forced overwrite must
    // tighten whatever was there before.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(CONFIG_MODE))
            .map_err(write_err)?;
    }

    file.write_all(TEMPLATE.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    info!(path = %path.display(), force, "configuration template written");
    Ok(())
}
