//! One-time resolution of a C function table from a shared library.

use std::ffi::{OsStr, c_void};
use std::sync::OnceLock;

use libloading::Library;

use crate::error::InitError;

/// A declared entry point of a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: &'static str,
    pub required: bool,
}

/// Whether a declared entry point is exported by a given library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStatus {
    pub entry: EntryPoint,
    pub resolved: bool,
}

/// A struct of function pointers resolved by name.
///
/// Implemented with `#[derive(SymbolTable)]` from `mediacodec-macros`.
pub trait SymbolTable: Sized {
    /// Entry points in declaration order.
    const ENTRY_POINTS: &'static [EntryPoint];

    /// Looks up every entry point in `library`.
    ///
    /// # Safety
    ///
    /// Each field's function pointer type must match the signature of the
    /// symbol exported under its name, and the returned table must not be
    /// used after `library` is dropped.
    unsafe fn from_library(library: &Library) -> Result<Self, InitError>;
}

/// A lazily resolved, never torn down value.
///
/// The first caller runs the resolution; concurrent first callers block until
/// it finishes, and every caller observes the same cached outcome afterwards.
#[derive(Debug)]
pub struct Resolver<T> {
    cell: OnceLock<Result<T, InitError>>,
}

impl<T> Resolver<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_resolve<F>(&self, resolve: F) -> Result<&T, InitError>
    where
        F: FnOnce() -> Result<T, InitError>,
    {
        match self.cell.get_or_init(resolve) {
            Ok(value) => Ok(value),
            Err(err) => Err(err.clone()),
        }
    }

    /// The cached outcome, if resolution already ran.
    pub fn get(&self) -> Option<Result<&T, InitError>> {
        self.cell.get().map(|outcome| outcome.as_ref().map_err(InitError::clone))
    }
}

impl<T> Default for Resolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn open_library(path: &OsStr) -> Result<Library, InitError> {
    unsafe { Library::new(path) }.map_err(|err| InitError::LibraryUnavailable {
        library: path.to_string_lossy().into_owned(),
        reason: err.to_string(),
    })
}

/// Opens `path` and resolves `T` from it.
///
/// On failure the library is closed again before returning, so no partially
/// resolved table survives.
///
/// # Safety
///
/// Same contract as [`SymbolTable::from_library`]: the declared signatures
/// must match the library's exports.
pub unsafe fn load_table<T: SymbolTable>(
    path: impl AsRef<OsStr>,
) -> Result<(Library, T), InitError> {
    let library = open_library(path.as_ref())?;
    let table = unsafe { T::from_library(&library) }?;
    Ok((library, table))
}

/// Reports which of `T`'s entry points `path` exports, without building `T`.
pub fn probe<T: SymbolTable>(path: impl AsRef<OsStr>) -> Result<Vec<EntryStatus>, InitError> {
    let library = open_library(path.as_ref())?;
    Ok(T::ENTRY_POINTS
        .iter()
        .map(|&entry| EntryStatus {
            entry,
            resolved: unsafe { library.get::<*const c_void>(entry.name.as_bytes()) }.is_ok(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn concurrent_first_use_resolves_once() {
        let resolver = &Resolver::<u32>::new();
        let attempts = &AtomicUsize::new(0);

        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        resolver
                            .get_or_resolve(move || {
                                attempts.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(std::time::Duration::from_millis(5));
                                Ok(42)
                            })
                            .copied()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(outcomes.iter().all(|outcome| *outcome == Ok(42)));
    }

    #[test]
    fn failure_is_cached() {
        let resolver = Resolver::<u32>::new();
        assert!(resolver.get().is_none());

        let missing = InitError::MissingSymbol {
            name: "AMediaCodec_start",
            reason: "not found".to_string(),
        };
        let first = resolver.get_or_resolve(|| Err(missing.clone()));
        assert_eq!(first, Err(missing.clone()));

        let second = resolver.get_or_resolve(|| Ok(1));
        assert_eq!(second, Err(missing.clone()));
        assert_eq!(resolver.get(), Some(Err(missing)));
    }

    #[test]
    fn missing_library_is_reported() {
        let err = open_library(OsStr::new("libdefinitely-not-here-mediacodec.so")).unwrap_err();
        match err {
            InitError::LibraryUnavailable { library, .. } => {
                assert_eq!(library, "libdefinitely-not-here-mediacodec.so");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    mod libc_tables {
        use super::super::*;
        use mediacodec_macros::SymbolTable;
        use std::ffi::{CStr, c_char};

        const LIBC: &str = "libc.so.6";

        type Strlen = unsafe extern "C" fn(*const c_char) -> usize;

        #[derive(SymbolTable)]
        struct WithOptional {
            #[symbol(name = "strlen")]
            strlen: Strlen,
            #[symbol(name = "mediacodec_no_such_function")]
            missing: Option<Strlen>,
        }

        #[derive(SymbolTable)]
        struct WithMissingRequired {
            #[symbol(name = "strlen")]
            _strlen: Strlen,
            #[symbol(name = "mediacodec_no_such_function")]
            _missing: Strlen,
        }

        #[test]
        fn optional_entry_may_be_absent() -> Result<(), InitError> {
            let (_library, table) = unsafe { load_table::<WithOptional>(LIBC) }?;
            let text: &CStr = c"mediacodec";
            assert_eq!(unsafe { (table.strlen)(text.as_ptr()) }, 10);
            assert!(table.missing.is_none());
            Ok(())
        }

        #[test]
        fn missing_required_entry_fails_table() {
            let err = unsafe { load_table::<WithMissingRequired>(LIBC) }.err();
            assert!(matches!(
                err,
                Some(InitError::MissingSymbol {
                    name: "mediacodec_no_such_function",
                    ..
                })
            ));
        }

        #[test]
        fn probe_lists_every_entry() -> Result<(), InitError> {
            let statuses = probe::<WithMissingRequired>(LIBC)?;
            assert_eq!(
                statuses,
                vec![
                    EntryStatus {
                        entry: EntryPoint {
                            name: "strlen",
                            required: true
                        },
                        resolved: true,
                    },
                    EntryStatus {
                        entry: EntryPoint {
                            name: "mediacodec_no_such_function",
                            required: true
                        },
                        resolved: false,
                    },
                ]
            );
            assert!(!WithOptional::ENTRY_POINTS[1].required);
            Ok(())
        }
    }
}
