// src/rules/generator.rs

//! Package records to Buck2 rules
//!
//! Every path the generator emits is relative to the switch root and then
//! prefixed with the build-tree location of the switch (`opam` by default).
//! Record directories are absolute paths from the machine that extracted
//! them; only the part after the switch's own directory name is kept, so a
//! snapshot taken in one location can be generated against another.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::paths::{check_file, find_file, join, relative_to_switch};
use super::{CommandAlias, ExportFile, PrebuiltCxxLibrary, PrebuiltOcamlLibrary, Rule};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::package::{PackageRecord, PackageSet, unique};

/// Builds rules for one switch
pub struct Generator {
    pub(super) config: GeneratorConfig,
    pub(super) switch: PathBuf,
    prefix: String,
    strict: bool,
}

impl Generator {
    pub fn new(config: GeneratorConfig, switch: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            config,
            switch: switch.into(),
            prefix: prefix.into(),
            strict: false,
        }
    }

    /// Fail on duplicate rule names instead of warning
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// A switch-relative path as seen from the build tree
    pub(super) fn prefixed(&self, path: &str) -> String {
        join(&self.prefix, path)
    }

    fn prefixed_all(&self, paths: &[String]) -> Vec<String> {
        paths.iter().map(|path| self.prefixed(path)).collect()
    }

    /// All rules: prologue, switch binaries, then every record in order
    pub fn generate(&self, packages: &PackageSet) -> Result<Vec<Rule>> {
        info!("Emitting compiler rules");
        let mut rules = self.prologue();

        info!("Emitting binaries");
        rules.extend(self.binary_rules()?);

        info!("Emitting library rules for {} packages", packages.len());
        for record in packages.records() {
            rules.extend(self.package_rules(record)?);
        }

        self.check_names(&rules)?;
        Ok(rules)
    }

    /// Rules for the compiler itself, independent of any package
    pub fn prologue(&self) -> Vec<Rule> {
        let config = &self.config;
        let runtime = self.prefixed(&config.runtime_dir);
        let interpreter = join(&config.bin_dir, &config.interpreter);
        let debugger = join(&config.bin_dir, &config.debugger);

        vec![
            Rule::PrebuiltCxxLibrary(PrebuiltCxxLibrary {
                name: config.headers_rule.clone(),
                header_dirs: vec![runtime.clone()],
                header_only: true,
                visibility: config.visibility.clone(),
            }),
            Rule::ExportFile(ExportFile {
                name: config.runtime_archive.clone(),
                src: self.prefixed(&join(&config.runtime_dir, &config.runtime_archive)),
            }),
            Rule::ExportFile(ExportFile {
                name: config.interop_includes_rule.clone(),
                src: runtime.clone(),
            }),
            Rule::ExportFile(ExportFile {
                name: config.interpreter.clone(),
                src: self.prefixed(&interpreter),
            }),
            Rule::ExportFile(ExportFile {
                name: config.debugger.clone(),
                src: self.prefixed(&debugger),
            }),
            // The debugger is a bytecode program, run it through the
            // interpreter with the standard library at hand
            Rule::CommandAlias(CommandAlias {
                name: format!("{}-exe", config.debugger),
                exe: format!(":{}", config.debugger),
                resources: vec![
                    format!(":{}", config.interpreter),
                    format!(":{}", config.debugger),
                    runtime,
                ],
                visibility: config.visibility.clone(),
            }),
        ]
    }

    /// Rules for one package record
    pub fn package_rules(&self, record: &PackageRecord) -> Result<Vec<Rule>> {
        let config = &self.config;
        let name = &record.name;
        debug!("Processing package: {}", name);

        let target_dir = self.target_dir(record)?;

        if let Some(warning) = &record.warning {
            warn!("Package {} has a warning: {}", name, warning);
        }
        if let Some(message) = &record.error {
            warn!("Package {} has an error: {}", name, message);
        }

        let native_c_libs = self.resolve_c_libs(name, &target_dir, &record.native_c_libs);
        let bytecode_c_libs = self.resolve_c_libs(name, &target_dir, &record.bytecode_c_libs);

        let search_paths = unique(
            record
                .native_c_lib_paths
                .iter()
                .chain(&record.bytecode_c_lib_paths)
                .cloned(),
        );
        for path in &search_paths {
            info!("{} c_lib_path {}", name, path);
        }

        let native_lib = self.select_archive(record, &target_dir, &record.static_native_libs, true)?;
        let bytecode_lib = self.select_archive(record, &target_dir, &record.static_byte_libs, false)?;

        let mut rules = vec![Rule::PrebuiltOcamlLibrary(PrebuiltOcamlLibrary {
            name: name.clone(),
            visibility: config.visibility.clone(),
            lib_name: name.clone(),
            lib_dir: String::new(),
            include_dir: self.prefixed(&target_dir),
            native_lib: native_lib.map(|path| self.prefixed(&path)),
            bytecode_lib: bytecode_lib.map(|path| self.prefixed(&path)),
            native_c_libs: self.prefixed_all(&native_c_libs),
            bytecode_c_libs: self.prefixed_all(&bytecode_c_libs),
            bytecode_only: !record.is_native(),
            deps: references(&record.dependencies),
        })];

        if let Some(ppx_runtime_deps) = record.kind.ppx_runtime_deps() {
            let runtime_name = format!("{}-runtime-deps", name);
            rules.push(Rule::PrebuiltOcamlLibrary(PrebuiltOcamlLibrary {
                name: runtime_name.clone(),
                visibility: config.visibility.clone(),
                lib_name: runtime_name,
                lib_dir: String::new(),
                include_dir: self.prefixed(&target_dir),
                native_lib: None,
                bytecode_lib: None,
                native_c_libs: Vec::new(),
                bytecode_c_libs: Vec::new(),
                bytecode_only: true,
                deps: references(ppx_runtime_deps),
            }));
        }

        for plugin in &record.dyn_native_libs {
            if let Some(stem) = plugin.strip_suffix(config.plugin_suffix.as_str()) {
                rules.push(Rule::ExportFile(ExportFile {
                    name: format!("{}.{}-plugin", name, stem),
                    src: self.prefixed(&join(&target_dir, plugin)),
                }));
            }
        }

        for entry in record.jsoo_runtime.iter().flatten() {
            rules.push(Rule::ExportFile(ExportFile {
                name: format!("{}.{}", name, entry),
                src: self.prefixed(&join(&target_dir, entry)),
            }));
        }

        Ok(rules)
    }

    /// The record's install directory relative to the switch root
    fn target_dir(&self, record: &PackageRecord) -> Result<String> {
        let switch_name = self
            .switch
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        relative_to_switch(&record.directory, &switch_name).ok_or_else(|| {
            error!("Package {} is not installed in switch {}", record.name, switch_name);
            Error::OutsideStore {
                directory: record.directory.clone(),
                switch: switch_name,
            }
        })
    }

    /// Paths of the `lib<name>.a` archives that exist
    ///
    /// Compiler runtime libraries are retried in the runtime directory.
    /// Missing archives are logged and dropped. Duplicates are kept.
    fn resolve_c_libs(&self, package: &str, target_dir: &str, libs: &[String]) -> Vec<String> {
        let config = &self.config;
        libs.iter()
            .filter_map(|lib| {
                let file = format!("lib{}.a", lib);
                let found = find_file(&self.switch, target_dir, &file).or_else(|| {
                    if config.is_runtime_lib(lib) {
                        find_file(&self.switch, &config.runtime_dir, &file)
                    } else {
                        None
                    }
                });
                if found.is_none() {
                    warn!(
                        "Could not find C library {} for package {} in {}",
                        file,
                        package,
                        self.switch.join(target_dir).display()
                    );
                }
                found
            })
            .collect()
    }

    /// The single on-disk archive among `archives`, if any
    fn select_archive(
        &self,
        record: &PackageRecord,
        target_dir: &str,
        archives: &[String],
        native: bool,
    ) -> Result<Option<String>> {
        let mut found: Vec<String> = archives
            .iter()
            .filter(|archive| check_file(&self.switch, target_dir, archive).is_some())
            .map(|archive| join(target_dir, archive))
            .collect();

        match found.len() {
            0 => {
                if !archives.is_empty() {
                    warn!(
                        "None of the {} archives of package {} exist: {:?}",
                        if native { "native" } else { "bytecode" },
                        record.name,
                        archives
                    );
                }
                Ok(None)
            }
            1 => Ok(found.pop()),
            _ if native => {
                error!("Too many native libs for package {}.", record.name);
                Err(Error::TooManyNativeLibs {
                    package: record.name.clone(),
                    archives: found,
                })
            }
            _ => {
                error!("Too many bytecode libs for package {}.", record.name);
                Err(Error::TooManyBytecodeLibs {
                    package: record.name.clone(),
                    archives: found,
                })
            }
        }
    }

    fn check_names(&self, rules: &[Rule]) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in rules {
            if !seen.insert(rule.name()) {
                if self.strict {
                    error!("Duplicate rule name {}", rule.name());
                    return Err(Error::DuplicateRuleName(rule.name().to_string()));
                }
                warn!("Duplicate rule name {}", rule.name());
            }
        }
        Ok(())
    }
}

/// Deduplicated in-file target references (`:name`)
fn references(names: &[String]) -> Vec<String> {
    unique(names.iter().cloned())
        .into_iter()
        .map(|name| format!(":{}", name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::LibraryKind;
    use std::fs;

    struct Switch {
        _root: tempfile::TempDir,
        path: PathBuf,
    }

    impl Switch {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let path = root.path().join("myswitch");
            fs::create_dir_all(path.join("bin")).unwrap();
            fs::create_dir_all(path.join("lib/ocaml")).unwrap();
            Self { _root: root, path }
        }

        fn touch(&self, relative: &str) {
            let file = self.path.join(relative);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, b"").unwrap();
        }

        fn generator(&self) -> Generator {
            Generator::new(GeneratorConfig::default(), &self.path, "opam")
        }
    }

    fn record(name: &str) -> PackageRecord {
        PackageRecord::new(name, format!("/store/myswitch/lib/{}", name))
    }

    fn library(rules: &[Rule]) -> &PrebuiltOcamlLibrary {
        match &rules[0] {
            Rule::PrebuiltOcamlLibrary(lib) => lib,
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_library_rule() {
        let switch = Switch::new();
        switch.touch("lib/foo/foo.cma");
        switch.touch("lib/foo/foo.cmxa");
        switch.touch("lib/foo/libfoo_stubs.a");

        let mut foo = record("foo");
        foo.static_byte_libs = vec!["foo.cma".to_string()];
        foo.static_native_libs = vec!["foo.cmxa".to_string()];
        foo.native_c_libs = vec!["foo_stubs".to_string(), "foo_stubs".to_string()];
        foo.bytecode_c_libs = vec!["foo_stubs".to_string()];
        foo.dependencies = vec!["bar".to_string(), "baz".to_string(), "bar".to_string()];

        let rules = switch.generator().package_rules(&foo).unwrap();
        assert_eq!(rules.len(), 1);

        let lib = library(&rules);
        assert_eq!(lib.include_dir, "opam/lib/foo");
        assert_eq!(lib.native_lib.as_deref(), Some("opam/lib/foo/foo.cmxa"));
        assert_eq!(lib.bytecode_lib.as_deref(), Some("opam/lib/foo/foo.cma"));
        assert_eq!(
            lib.native_c_libs,
            vec!["opam/lib/foo/libfoo_stubs.a", "opam/lib/foo/libfoo_stubs.a"]
        );
        assert_eq!(lib.bytecode_c_libs, vec!["opam/lib/foo/libfoo_stubs.a"]);
        assert_eq!(lib.deps, vec![":bar", ":baz"]);
        assert!(!lib.bytecode_only);
    }

    #[test]
    fn test_bytecode_only() {
        let switch = Switch::new();
        switch.touch("lib/foo/foo.cma");

        let mut foo = record("foo");
        foo.static_byte_libs = vec!["foo.cma".to_string()];

        let rules = switch.generator().package_rules(&foo).unwrap();
        let lib = library(&rules);
        assert!(lib.bytecode_only);
        assert_eq!(lib.native_lib, None);
    }

    #[test]
    fn test_runtime_lib_fallback() {
        let switch = Switch::new();
        switch.touch("lib/ocaml/libunixnat.a");
        switch.touch("lib/ocaml/libotherlib.a");

        let mut unix = record("unix");
        unix.native_c_libs = vec!["unixnat".to_string(), "otherlib".to_string()];

        let rules = switch.generator().package_rules(&unix).unwrap();
        assert_eq!(library(&rules).native_c_libs, vec!["opam/lib/ocaml/libunixnat.a"]);
    }

    #[test]
    fn test_substituted_allow_list() {
        let switch = Switch::new();
        switch.touch("lib/ocaml/libunixnat.a");

        let config = GeneratorConfig {
            runtime_lib_stems: vec!["nothing".to_string()],
            ..Default::default()
        };
        let mut unix = record("unix");
        unix.native_c_libs = vec!["unixnat".to_string()];

        let generator = Generator::new(config, &switch.path, "opam");
        let rules = generator.package_rules(&unix).unwrap();
        assert!(library(&rules).native_c_libs.is_empty());
    }

    #[test]
    fn test_too_many_native_libs() {
        let switch = Switch::new();
        switch.touch("lib/foo/a.cmxa");
        switch.touch("lib/foo/b.cmxa");

        let mut foo = record("foo");
        foo.static_native_libs = vec!["a.cmxa".to_string(), "b.cmxa".to_string(), "c.cmxa".to_string()];

        let err = switch.generator().package_rules(&foo).unwrap_err();
        assert!(matches!(err, Error::TooManyNativeLibs { ref archives, .. } if archives.len() == 2));

        // One survivor is fine
        foo.static_native_libs = vec!["a.cmxa".to_string(), "c.cmxa".to_string()];
        let rules = switch.generator().package_rules(&foo).unwrap();
        assert_eq!(library(&rules).native_lib.as_deref(), Some("opam/lib/foo/a.cmxa"));
    }

    #[test]
    fn test_too_many_bytecode_libs() {
        let switch = Switch::new();
        switch.touch("lib/foo/a.cma");
        switch.touch("lib/foo/b.cma");

        let mut foo = record("foo");
        foo.static_byte_libs = vec!["a.cma".to_string(), "b.cma".to_string()];

        let err = switch.generator().package_rules(&foo).unwrap_err();
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_outside_store() {
        let switch = Switch::new();
        let foo = PackageRecord::new("foo", "/elsewhere/lib/foo");
        let err = switch.generator().package_rules(&foo).unwrap_err();
        assert!(matches!(err, Error::OutsideStore { .. }));
    }

    #[test]
    fn test_ppx_plugins_and_jsoo() {
        let switch = Switch::new();

        let mut ppx = record("ppx_foo");
        ppx.kind = LibraryKind::PpxRewriter {
            ppx_runtime_deps: vec!["foo_runtime".to_string()],
        };
        ppx.dyn_native_libs = vec!["ppx_foo.cmxs".to_string(), "ppx_foo.so".to_string()];
        ppx.jsoo_runtime = Some(vec!["runtime.js".to_string()]);

        let rules = switch.generator().package_rules(&ppx).unwrap();
        let names: Vec<&str> = rules.iter().map(Rule::name).collect();
        assert_eq!(
            names,
            vec![
                "ppx_foo",
                "ppx_foo-runtime-deps",
                "ppx_foo.ppx_foo-plugin",
                "ppx_foo.runtime.js",
            ]
        );

        match &rules[1] {
            Rule::PrebuiltOcamlLibrary(lib) => {
                assert_eq!(lib.deps, vec![":foo_runtime"]);
                assert!(lib.bytecode_only);
            }
            other => panic!("unexpected rule {:?}", other),
        }
        match &rules[2] {
            Rule::ExportFile(file) => assert_eq!(file.src, "opam/lib/ppx_foo/ppx_foo.cmxs"),
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_prologue() {
        let switch = Switch::new();
        let rules = switch.generator().prologue();
        let names: Vec<&str> = rules.iter().map(Rule::name).collect();
        assert_eq!(
            names,
            vec![
                "ocaml-dev",
                "libasmrun.a",
                "interop_includes",
                "ocamlrun",
                "ocamldebug",
                "ocamldebug-exe",
            ]
        );
        match &rules[5] {
            Rule::CommandAlias(alias) => assert_eq!(
                alias.resources,
                vec![":ocamlrun", ":ocamldebug", "opam/lib/ocaml"]
            ),
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_rule_names() {
        let switch = Switch::new();
        let mut packages = PackageSet::new();
        packages.insert("a", record("ocamlrun")).unwrap();

        assert!(switch.generator().generate(&packages).is_ok());

        let err = switch.generator().strict(true).generate(&packages).unwrap_err();
        assert!(matches!(err, Error::DuplicateRuleName(name) if name == "ocamlrun"));
    }
}
