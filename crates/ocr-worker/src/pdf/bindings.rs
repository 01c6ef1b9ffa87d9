use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;

/// Directory holding a Pdfium shared library to prefer over the system one.
pub const PDFIUM_LIB_DIR_ENV: &str = "PDFIUM_LIB_DIR";

/// Cached outcome of the first Pdfium binding attempt.
///
/// Bindings are not `Clone`, so the library location (or the failure) is cached and fresh
/// bindings are created per call. A failed first attempt is remembered so that every
/// request on a host without Pdfium fails fast instead of probing the filesystem again.
enum InitializationState {
    Uninitialized,
    Initialized { lib_dir: Option<PathBuf> },
    Failed(String),
}

static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

fn bind_from(lib_dir: Option<&PathBuf>) -> Result<Box<dyn PdfiumLibraryBindings>, String> {
    match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| format!("Failed to bind Pdfium in {}: {}", dir.display(), e)),
        None => Pdfium::bind_to_system_library().map_err(|e| format!("Failed to bind system Pdfium: {}", e)),
    }
}

fn initialize() -> Result<Option<PathBuf>, String> {
    if let Some(dir) = std::env::var_os(PDFIUM_LIB_DIR_ENV).map(PathBuf::from) {
        match bind_from(Some(&dir)) {
            Ok(_) => return Ok(Some(dir)),
            Err(err) => tracing::warn!("{}, falling back to system library", err),
        }
    }

    bind_from(None).map(|_| None)
}

/// Get a Pdfium instance, initializing the binding state on first use.
///
/// # Arguments
///
/// * `map_err` - Function to map error strings to a `PdfError` variant
/// * `context` - Context string for error reporting
pub(crate) fn bind_pdfium(map_err: fn(String) -> PdfError, context: &'static str) -> Result<Pdfium, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| map_err(format!("Failed to acquire lock on Pdfium state ({}): {}", context, e)))?;

    if let InitializationState::Uninitialized = &*state {
        *state = match initialize() {
            Ok(lib_dir) => InitializationState::Initialized { lib_dir },
            Err(err) => {
                tracing::warn!("Pdfium initialization failed ({}): {}", context, err);
                InitializationState::Failed(err)
            }
        };
    }

    match &*state {
        InitializationState::Initialized { lib_dir } => bind_from(lib_dir.as_ref())
            .map(Pdfium::new)
            .map_err(|e| map_err(format!("Failed to create Pdfium bindings ({}): {}", context, e))),
        InitializationState::Failed(err) => Err(map_err(format!(
            "Pdfium initialization previously failed ({}): {}",
            context, err
        ))),
        InitializationState::Uninitialized => Err(map_err(format!(
            "Internal error: Pdfium state not initialized ({})",
            context
        ))),
    }
}

/// Open a document from disk, distinguishing password protection from corruption.
pub(crate) fn load_document<'a>(
    pdfium: &'a Pdfium,
    path: &std::path::Path,
) -> Result<PdfDocument<'a>, PdfError> {
    pdfium.load_pdf_from_file(path, None).map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("password") || err_msg.contains("Password") {
            PdfError::PasswordRequired
        } else {
            PdfError::InvalidPdf(err_msg)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_pdfium_is_stable_across_calls() {
        // Availability depends on the host; the cached state must give the same answer twice.
        let first = bind_pdfium(PdfError::BindingFailed, "test 1").is_ok();
        let second = bind_pdfium(PdfError::BindingFailed, "test 2").is_ok();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bind_pdfium_error_mapping() {
        if let Err(err) = bind_pdfium(PdfError::RenderingFailed, "mapping") {
            assert!(matches!(err, PdfError::RenderingFailed(_)));
            assert!(err.to_string().contains("mapping"));
        }
    }
}
