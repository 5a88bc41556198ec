//! Verb handlers.
//!
//! Each file in this module corresponds to one user-facing verb:
//!
//! | File          | Invocation                 | Description                          |
//! |---------------|----------------------------|--------------------------------------|
//! | `init.rs`     | `dbsync init <path>`       | Write the config template (0600)     |
//! | `export.rs`   | `dbsync export <path>`     | mysqldump → `<db>-<ts>.sql.gz`       |
//! | `sync.rs`     | `dbsync sync <path>`       | rclone sync to every remote, in order |

pub mod export;
pub mod init;
pub mod sync;
