use indexmap::IndexMap;
use strata_core::Kind;

use crate::compile::Compiler;
use crate::{
    EnumRepresentation, InvalidSchema, Schema, SchemaError, StructField, StructRepresentation,
    TypeDecl, UnionRepresentation,
};

/// Names of the types every [`TypeSystem::new`] starts with.
pub const PRELUDE: [&str; 7] = ["Bool", "Int", "Float", "String", "Bytes", "Link", "Any"];

/// A mutable collection of type declarations.
///
/// Declarations refer to each other by name and may be added in any order.
/// [`TypeSystem::validate`] reports every problem at once;
/// [`TypeSystem::compile`] freezes a valid system into a [`Schema`].
#[derive(Clone, Debug)]
pub struct TypeSystem {
    decls: IndexMap<String, TypeDecl>,
    duplicates: Vec<String>,
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// A type system holding the prelude: `Bool`, `Int`, `Float`, `String`,
    /// `Bytes`, `Link` and `Any`.
    pub fn new() -> Self {
        let mut ts = TypeSystem {
            decls: IndexMap::new(),
            duplicates: Vec::new(),
        };
        ts.spawn_scalar("Bool", Kind::Bool)
            .spawn_scalar("Int", Kind::Int)
            .spawn_scalar("Float", Kind::Float)
            .spawn_scalar("String", Kind::String)
            .spawn_scalar("Bytes", Kind::Bytes)
            .spawn_scalar("Link", Kind::Link)
            .spawn_any("Any");
        ts
    }

    /// Register a declaration under `name`.
    ///
    /// Registering a name twice keeps the first declaration; the repeat is
    /// reported by [`TypeSystem::validate`].
    pub fn spawn(&mut self, name: impl Into<String>, decl: TypeDecl) -> &mut Self {
        let name = name.into();
        if self.decls.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.decls.insert(name, decl);
        }
        self
    }

    /// Declare a scalar type.
    pub fn spawn_scalar(&mut self, name: impl Into<String>, kind: Kind) -> &mut Self {
        self.spawn(name, TypeDecl::Scalar(kind))
    }

    /// Declare an `Any` type.
    pub fn spawn_any(&mut self, name: impl Into<String>) -> &mut Self {
        self.spawn(name, TypeDecl::Any)
    }

    /// Declare a list type.
    pub fn spawn_list(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        nullable: bool,
    ) -> &mut Self {
        self.spawn(
            name,
            TypeDecl::List {
                value: value.into(),
                nullable,
            },
        )
    }

    /// Declare a map type.
    pub fn spawn_map(
        &mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        nullable: bool,
    ) -> &mut Self {
        self.spawn(
            name,
            TypeDecl::Map {
                key: key.into(),
                value: value.into(),
                nullable,
            },
        )
    }

    /// Declare a struct type.
    pub fn spawn_struct(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = StructField>,
        repr: StructRepresentation,
    ) -> &mut Self {
        self.spawn(
            name,
            TypeDecl::Struct {
                fields: fields.into_iter().collect(),
                repr,
            },
        )
    }

    /// Declare a union type.
    pub fn spawn_union<M: Into<String>>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = M>,
        repr: UnionRepresentation,
    ) -> &mut Self {
        self.spawn(
            name,
            TypeDecl::Union {
                members: members.into_iter().map(Into::into).collect(),
                repr,
            },
        )
    }

    /// Declare an enum type.
    pub fn spawn_enum<M: Into<String>>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = M>,
        repr: EnumRepresentation,
    ) -> &mut Self {
        self.spawn(
            name,
            TypeDecl::Enum {
                members: members.into_iter().map(Into::into).collect(),
                repr,
            },
        )
    }

    /// Declare an enum represented by member names.
    pub fn spawn_string_enum<M: Into<String>>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = M>,
    ) -> &mut Self {
        self.spawn_enum(name, members, EnumRepresentation::String(Vec::new()))
    }

    /// Declare an enum represented by integers.
    pub fn spawn_int_enum<M: Into<String>>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (M, i64)>,
    ) -> &mut Self {
        let pairs: Vec<(String, i64)> = members.into_iter().map(|(m, v)| (m.into(), v)).collect();
        let names: Vec<String> = pairs.iter().map(|(m, _)| m.clone()).collect();
        self.spawn_enum(name, names, EnumRepresentation::Int(pairs))
    }

    /// The declaration registered under `name`.
    pub fn type_by_name(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.get(name)
    }

    /// Declarations in registration order.
    pub fn decls(&self) -> impl Iterator<Item = (&str, &TypeDecl)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every problem in this type system. Empty means valid.
    pub fn validate(&self) -> Vec<SchemaError> {
        match self.compile() {
            Ok(_) => Vec::new(),
            Err(invalid) => invalid.errors,
        }
    }

    /// Resolve and freeze into a [`Schema`].
    pub fn compile(&self) -> Result<Schema, InvalidSchema> {
        Compiler::new(&self.decls, &self.duplicates).run()
    }
}
