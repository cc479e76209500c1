//! Environment-file loading.
//!
//! Flags win over environment variables, which clap reads through its `env`
//! attributes; this module only makes `.env` files visible to it.

/// Load `.env.local`, then `.env`.
///
/// Existing variables are never overwritten, so the process environment wins
/// over `.env.local`, which wins over `.env`. Missing files are ignored.
pub fn load_env_files() {
    for file in [".env.local", ".env"] {
        match dotenvy::from_filename(file) {
            Ok(path) => tracing::trace!(path = %path.display(), "loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => eprintln!("warning: ignoring {file}: {e}"),
        }
    }
}
