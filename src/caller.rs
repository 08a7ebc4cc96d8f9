//! Caller attribution for log records.

use std::fmt;
use std::path::Path;

// Frames whose symbol matches one of these belong to the logger or the
// connection wrapper and never count towards the skip.
const PLUMBING: &[&str] = &[
    "sea_orm_query_logger::caller::",
    "sea_orm_query_logger::logger::",
    "sea_orm_query_logger::connection::TracedConnection",
];

/// Source location a record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

fn is_plumbing(symbol: &str) -> bool {
    !symbol.contains("::tests::") && PLUMBING.iter().any(|prefix| symbol.contains(prefix))
}

fn is_toolchain(file: &Path) -> bool {
    let file = file.to_string_lossy();
    file.starts_with("/rustc/")
        || ["/library/core/", "/library/std/", "/library/alloc/"]
            .iter()
            .any(|dir| file.contains(dir))
}

/// Resolve the frame `skip` levels out from the logger.
///
/// `skip == 1` is the first frame outside the logger and `TracedConnection`,
/// each further level moves one frame up the stack. Frames from the Rust
/// standard library and frames without debug info are not counted.
/// Returns `None` for `skip == 0` or when the stack runs out.
pub(crate) fn resolve(skip: usize) -> Option<Caller> {
    if skip == 0 {
        return None;
    }

    let mut entered = false;
    let mut remaining = skip;
    let mut found = None;

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if found.is_some() {
                return;
            }
            let name = symbol.name().map(|name| name.to_string()).unwrap_or_default();
            if is_plumbing(&name) {
                entered = true;
                return;
            }
            if !entered {
                return;
            }
            let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) else {
                return;
            };
            if is_toolchain(file) {
                return;
            }
            remaining -= 1;
            if remaining == 0 {
                found = Some(Caller {
                    file: file.display().to_string(),
                    line,
                });
            }
        });
        found.is_none()
    });

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plumbing_symbols() {
        assert!(is_plumbing(
            "<sea_orm_query_logger::logger::TraceLogger as sea_orm_query_logger::logger::QueryLogger>::trace::h0123"
        ));
        assert!(is_plumbing(
            "<sea_orm_query_logger::connection::TracedConnection as sea_orm::database::connection::ConnectionTrait>::query_all::{{closure}}"
        ));
        assert!(!is_plumbing(
            "sea_orm_query_logger::logger::tests::test_caller_attribution"
        ));
        assert!(!is_plumbing("my_app::handlers::list_users"));
    }

    #[test]
    fn test_toolchain_paths() {
        assert!(is_toolchain(Path::new(
            "/rustc/abc123/library/core/src/future/future.rs"
        )));
        assert!(!is_toolchain(Path::new("/srv/app/src/main.rs")));
    }

    #[test]
    fn test_zero_skip_resolves_nothing() {
        assert_eq!(resolve(0), None);
    }

    #[test]
    fn test_display() {
        let caller = Caller {
            file: "src/main.rs".to_string(),
            line: 12,
        };
        assert_eq!(caller.to_string(), "src/main.rs:12");
    }
}
