// src/extractor/mod.rs

//! Package metadata extraction
//!
//! Builds one `PackageRecord` per installed findlib package by querying
//! `ocamlfind` for identity, archives, dependencies and extras, and
//! `ocamlobjinfo` for the C libraries each archive links against.
//!
//! All queries run under the posix-threads predicates (`mt,mt_posix`);
//! ppx rewriters and derivers additionally get `ppx_driver` and an extra
//! recursive `ppx_runtime_deps` query. Packages are independent, so a batch
//! can be extracted on a thread pool; the queries for one package always
//! run in order on one thread.

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::findlib::{Findlib, add_predicate, split_words};
use crate::objinfo::{CLibInfo, ObjInfo};
use crate::package::{LibraryKind, PackageRecord, PackageSet, sanitize, unique};
use crate::process::{CommandRunner, resolve_tool};
use crate::progress::ProgressTracker;

/// Library kinds as reported by findlib's `library_kind` variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindTag {
    Plain,
    Rewriter,
    Deriver,
}

impl KindTag {
    fn parse(package: &str, raw: &str) -> Result<Self> {
        match raw {
            "" => Ok(Self::Plain),
            "ppx_rewriter" => Ok(Self::Rewriter),
            "ppx_deriver" => Ok(Self::Deriver),
            other => Err(Error::InvalidLibraryKind {
                package: package.to_string(),
                kind: other.to_string(),
            }),
        }
    }
}

/// Extracts package records from the switch's findlib installation
pub struct Extractor<'a> {
    config: ExtractorConfig,
    findlib: Findlib<'a>,
    objinfo: ObjInfo<'a>,
}

impl<'a> Extractor<'a> {
    /// Create an extractor, locating the tools in `switch/bin` or on `PATH`
    pub fn new(config: ExtractorConfig, runner: &'a dyn CommandRunner, switch: Option<&Path>) -> Self {
        let findlib_tool = resolve_tool(&config.findlib_tool, switch);
        let objinfo_tool = resolve_tool(&config.objinfo_tool, switch);
        Self::with_tools(config, findlib_tool, objinfo_tool, runner)
    }

    /// Create an extractor with explicit tool paths
    pub fn with_tools(
        config: ExtractorConfig,
        findlib_tool: impl Into<PathBuf>,
        objinfo_tool: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        let findlib = Findlib::new(findlib_tool, runner);
        let objinfo = ObjInfo::new(objinfo_tool, config.c_objects_marker.clone(), runner);
        Self {
            config,
            findlib,
            objinfo,
        }
    }

    /// All installed packages except the configured and given exclusions
    pub fn list_packages(&self, exclude: &[String]) -> Result<Vec<String>> {
        let excluded: HashSet<&str> = self
            .config
            .exclude
            .iter()
            .chain(exclude)
            .map(String::as_str)
            .collect();
        if !excluded.is_empty() {
            let mut names: Vec<&str> = excluded.iter().copied().collect();
            names.sort();
            info!("Excluding packages {:?}", names);
        }

        Ok(self
            .findlib
            .list()?
            .into_iter()
            .filter(|name| !excluded.contains(name.as_str()))
            .collect())
    }

    /// Extract every package in `names`, in order
    ///
    /// `installed` is the full installed set used to drop references to
    /// optional packages that are not installed. `jobs` > 1 extracts that
    /// many packages at a time.
    pub fn extract(
        &self,
        names: &[String],
        installed: &HashSet<String>,
        jobs: usize,
        progress: &dyn ProgressTracker,
    ) -> Result<PackageSet> {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicatePackage(name.clone()));
            }
        }

        let extract_one = |name: &String| -> Result<(String, PackageRecord)> {
            progress.set_message(name);
            let record = self.extract_package(name, installed)?;
            progress.increment(1);
            Ok((name.clone(), record))
        };

        let records: Vec<(String, PackageRecord)> = if jobs > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| names.par_iter().map(extract_one).collect::<Result<Vec<_>>>())?,
                Err(e) => {
                    warn!("Could not start {} extraction threads, running sequentially: {}", jobs, e);
                    names.iter().map(extract_one).collect::<Result<Vec<_>>>()?
                }
            }
        } else {
            names.iter().map(extract_one).collect::<Result<Vec<_>>>()?
        };

        let mut packages = PackageSet::new();
        for (name, record) in records {
            packages.insert(name, record)?;
        }
        progress.finish_with_message(&format!("Extracted {} packages", packages.len()));
        Ok(packages)
    }

    /// Build the record for one package
    pub fn extract_package(&self, libname: &str, installed: &HashSet<String>) -> Result<PackageRecord> {
        debug!("Processing package: {}", libname);
        let findlib = &self.findlib;
        let config = &self.config;

        let name = findlib.package_name(libname)?;
        let directory = findlib.package_directory(libname)?;

        let raw_kind = findlib.variable_text(libname, "library_kind", "")?;
        let tag = KindTag::parse(libname, &raw_kind)?;

        let predicates = match tag {
            KindTag::Plain => config.base_predicates.clone(),
            KindTag::Rewriter | KindTag::Deriver => {
                add_predicate(&config.base_predicates, &config.ppx_predicate)
            }
        };
        let pbyte = add_predicate(&predicates, &config.byte_predicate);
        let pnative = add_predicate(&predicates, &config.native_predicate);

        let static_byte_libs = unique(findlib.archives(libname, &pbyte)?);
        let static_native_libs = unique(findlib.archives(libname, &pnative)?);
        let dyn_byte_libs = unique(findlib.plugins(libname, &pbyte)?);
        let dyn_native_libs = unique(findlib.plugins(libname, &pnative)?);

        // META files are not always consistent about which query returns
        // which archive, so pool all four answers by extension
        let all_archives = || {
            static_byte_libs
                .iter()
                .chain(&static_native_libs)
                .chain(&dyn_byte_libs)
                .chain(&dyn_native_libs)
        };
        let native_pool = unique(
            all_archives()
                .filter(|lib| lib.ends_with(&config.native_archive_suffix))
                .cloned(),
        );
        let byte_pool = unique(
            all_archives()
                .filter(|lib| lib.ends_with(&config.byte_archive_suffix))
                .cloned(),
        );

        let native_info = self.c_libs(&directory, &native_pool);
        let bytecode_info = self.c_libs(&directory, &byte_pool);

        let dependencies = unique(sanitize(
            installed,
            findlib.variable(libname, "requires", &predicates, false)?,
        ));

        let kind = match tag {
            KindTag::Plain => LibraryKind::Plain,
            KindTag::Rewriter | KindTag::Deriver => {
                // Recursive: some ppx declare nothing themselves but their
                // requirements do
                let ppx_runtime_deps = unique(sanitize(
                    installed,
                    findlib.variable(libname, "ppx_runtime_deps", &predicates, true)?,
                ));
                if tag == KindTag::Rewriter {
                    LibraryKind::PpxRewriter { ppx_runtime_deps }
                } else {
                    LibraryKind::PpxDeriver { ppx_runtime_deps }
                }
            }
        };

        let jsoo_runtime = split_words(&findlib.variable_text(libname, "jsoo_runtime", "")?);
        let warning = findlib.variable_text(libname, "warning", &predicates)?;
        let error = findlib.variable_text(libname, "error", &predicates)?;

        Ok(PackageRecord {
            name,
            directory,
            kind,
            static_byte_libs,
            static_native_libs,
            dyn_byte_libs,
            dyn_native_libs,
            native_c_libs: native_info.libs,
            native_c_lib_paths: native_info.paths,
            bytecode_c_libs: bytecode_info.libs,
            bytecode_c_lib_paths: bytecode_info.paths,
            dependencies,
            jsoo_runtime: (!jsoo_runtime.is_empty()).then_some(jsoo_runtime),
            warning: (!warning.is_empty()).then_some(warning),
            error: (!error.is_empty()).then_some(error),
        })
    }

    /// C libraries of every archive in `archives`, relative to `directory`
    fn c_libs(&self, directory: &str, archives: &[String]) -> CLibInfo {
        let mut info = CLibInfo::default();
        for archive in archives {
            let path = Path::new(directory).join(archive);
            info.extend(self.objinfo.c_libs(&path));
        }
        info
    }
}
