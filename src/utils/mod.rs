use std::{
    path::{Path, PathBuf},
    sync::Once,
};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "spoiltracker=warn";
const TMP_SUFFIX: &str = "tmp";

/// Initializes the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` replaces the default `spoiltracker=warn` filter when set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Staging path for atomic rewrites: `history.csv` becomes `history.csv.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_keeps_existing_extension() {
        assert_eq!(
            tmp_path(Path::new("data/history.csv")),
            PathBuf::from("data/history.csv.tmp")
        );
        assert_eq!(tmp_path(Path::new("notes")), PathBuf::from("notes.tmp"));
    }
}
