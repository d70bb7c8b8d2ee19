// src/rules/mod.rs

//! Buck2 rule generation
//!
//! The generator turns package records into `Rule` values; the writer
//! serializes them into a BUCK file. All paths stored in a rule are final:
//! relative to the build tree and already carrying the switch prefix
//! (e.g. `opam/lib/astring/astring.cmxa`).

mod binaries;
mod generator;
pub mod paths;
mod writer;

pub use generator::Generator;
pub use writer::{RuleWriter, TargetsFile};

/// A rule attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(Vec<String>),
    Bool(bool),
    /// Literal `None`
    Null,
}

/// `command_alias`: run `exe` with extra runtime resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAlias {
    pub name: String,
    pub exe: String,
    pub resources: Vec<String>,
    pub visibility: Vec<String>,
}

/// `sh_binary`: a tool invoked directly from the switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShBinary {
    pub name: String,
    pub main: String,
    pub visibility: Vec<String>,
}

/// `prebuilt_cxx_library` with headers only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebuiltCxxLibrary {
    pub name: String,
    pub header_dirs: Vec<String>,
    pub header_only: bool,
    pub visibility: Vec<String>,
}

/// `export_file`: a single file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub src: String,
}

/// `prebuilt_ocaml_library`: one findlib package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebuiltOcamlLibrary {
    pub name: String,
    pub visibility: Vec<String>,
    pub lib_name: String,
    pub lib_dir: String,
    pub include_dir: String,
    pub native_lib: Option<String>,
    pub bytecode_lib: Option<String>,
    pub native_c_libs: Vec<String>,
    pub bytecode_c_libs: Vec<String>,
    pub bytecode_only: bool,
    /// Target references, e.g. `:str`
    pub deps: Vec<String>,
}

/// One declaration in the generated BUCK file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    CommandAlias(CommandAlias),
    ShBinary(ShBinary),
    PrebuiltCxxLibrary(PrebuiltCxxLibrary),
    ExportFile(ExportFile),
    PrebuiltOcamlLibrary(PrebuiltOcamlLibrary),
}

impl Rule {
    /// Rule name, unique within one BUCK file
    pub fn name(&self) -> &str {
        match self {
            Self::CommandAlias(r) => &r.name,
            Self::ShBinary(r) => &r.name,
            Self::PrebuiltCxxLibrary(r) => &r.name,
            Self::ExportFile(r) => &r.name,
            Self::PrebuiltOcamlLibrary(r) => &r.name,
        }
    }

    /// Buck2 function the rule is declared with
    pub fn function(&self) -> &'static str {
        match self {
            Self::CommandAlias(_) => "command_alias",
            Self::ShBinary(_) => "sh_binary",
            Self::PrebuiltCxxLibrary(_) => "prebuilt_cxx_library",
            Self::ExportFile(_) => "export_file",
            Self::PrebuiltOcamlLibrary(_) => "prebuilt_ocaml_library",
        }
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> Vec<(&'static str, Value)> {
        use Value::{Bool, List, Null, Str};

        match self {
            Self::CommandAlias(r) => vec![
                ("name", Str(r.name.clone())),
                ("exe", Str(r.exe.clone())),
                ("resources", List(r.resources.clone())),
                ("visibility", List(r.visibility.clone())),
            ],
            Self::ShBinary(r) => vec![
                ("name", Str(r.name.clone())),
                ("main", Str(r.main.clone())),
                ("visibility", List(r.visibility.clone())),
            ],
            Self::PrebuiltCxxLibrary(r) => vec![
                ("name", Str(r.name.clone())),
                ("header_dirs", List(r.header_dirs.clone())),
                ("header_only", Bool(r.header_only)),
                ("visibility", List(r.visibility.clone())),
            ],
            Self::ExportFile(r) => vec![
                ("name", Str(r.name.clone())),
                ("src", Str(r.src.clone())),
            ],
            Self::PrebuiltOcamlLibrary(r) => {
                let mut attrs = vec![
                    ("name", Str(r.name.clone())),
                    ("visibility", List(r.visibility.clone())),
                    ("lib_name", Str(r.lib_name.clone())),
                    ("lib_dir", Str(r.lib_dir.clone())),
                    ("include_dir", Str(r.include_dir.clone())),
                ];
                if let Some(native_lib) = &r.native_lib {
                    attrs.push(("native_lib", Str(native_lib.clone())));
                }
                if let Some(bytecode_lib) = &r.bytecode_lib {
                    attrs.push(("bytecode_lib", Str(bytecode_lib.clone())));
                }
                attrs.extend([
                    ("c_libs", Null),
                    ("native_c_libs", List(r.native_c_libs.clone())),
                    ("bytecode_c_libs", List(r.bytecode_c_libs.clone())),
                    ("bytecode_only", Bool(r.bytecode_only)),
                    ("deps", List(r.deps.clone())),
                ]);
                attrs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_libs_omitted() {
        let rule = Rule::PrebuiltOcamlLibrary(PrebuiltOcamlLibrary {
            name: "foo-runtime-deps".to_string(),
            visibility: vec!["PUBLIC".to_string()],
            lib_name: "foo-runtime-deps".to_string(),
            lib_dir: String::new(),
            include_dir: "opam/lib/foo".to_string(),
            native_lib: None,
            bytecode_lib: None,
            native_c_libs: vec![],
            bytecode_c_libs: vec![],
            bytecode_only: true,
            deps: vec![":bar".to_string()],
        });

        let names: Vec<&str> = rule.attributes().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "visibility",
                "lib_name",
                "lib_dir",
                "include_dir",
                "c_libs",
                "native_c_libs",
                "bytecode_c_libs",
                "bytecode_only",
                "deps",
            ]
        );
        assert_eq!(rule.function(), "prebuilt_ocaml_library");
        assert_eq!(rule.name(), "foo-runtime-deps");
    }
}
