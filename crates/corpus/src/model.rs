use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte and line extent of a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,
}

impl Span {
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// A type as written in source, e.g. `List<UserDto>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Source text with whitespace removed
    pub text: String,

    /// Base name without type arguments (`List`, `java.util.List`, `int`)
    pub name: String,

    /// Type arguments, in order
    #[serde(default)]
    pub args: Vec<TypeRef>,

    /// Array dimensions
    #[serde(default)]
    pub array: bool,
}

impl TypeRef {
    pub fn simple(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            text: name.clone(),
            name,
            args: Vec::new(),
            array: false,
        }
    }

    /// Last segment of the base name
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Primitive types and `void` never resolve to a corpus class
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !self.array
            && matches!(
                self.name.as_str(),
                "void" | "boolean" | "byte" | "short" | "int" | "long" | "char" | "float" | "double"
            )
    }
}

/// An annotation usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Name as written after `@` (may be qualified)
    pub name: String,

    /// Fully qualified name resolved through the unit's imports
    pub qualified_name: Option<String>,

    /// Arguments as (attribute name, raw value text); `None` for the unnamed default attribute
    #[serde(default)]
    pub arguments: Vec<(Option<String>, String)>,
}

impl Annotation {
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Qualified name if resolved, otherwise the written name
    #[must_use]
    pub fn best_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.name)
    }

    /// Raw text of a named attribute
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(key, _)| key.as_deref() == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw text of the unnamed default attribute
    #[must_use]
    pub fn default_attribute(&self) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(key, _)| key.is_none())
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaField {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// Method or constructor declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaMethod {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,
    pub parameters: Vec<Parameter>,

    /// `None` for constructors
    pub return_type: Option<TypeRef>,

    /// Names of methods invoked in the body, in source order
    #[serde(default)]
    pub invocations: Vec<String>,

    /// Span including leading annotations and modifiers
    pub span: Span,

    /// Line of the method name (1-indexed)
    pub name_line: usize,
}

impl JavaMethod {
    /// `name(ParamType,ParamType)` using types as written
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.ty.text.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    #[must_use]
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    #[must_use]
    pub const fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

/// Type declaration; nested types are flattened into the unit's class list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaClass {
    pub name: String,
    pub qualified_name: String,
    pub kind: ClassKind,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,

    /// `extends` and `implements` types, in source order
    pub super_types: Vec<TypeRef>,

    pub methods: Vec<JavaMethod>,
    pub fields: Vec<JavaField>,

    /// Span including leading annotations and modifiers
    pub span: Span,

    /// Line of the type name (1-indexed)
    pub name_line: usize,
}

impl JavaClass {
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Interface members are implicitly public
    #[must_use]
    pub fn is_public_member(&self, method: &JavaMethod) -> bool {
        method.has_modifier("public") || (self.is_interface() && !method.has_modifier("private"))
    }
}

/// A parsed compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaUnit {
    pub path: PathBuf,
    pub package: String,

    /// Imported names; wildcard imports keep their trailing `.*`
    pub imports: Vec<String>,

    pub classes: Vec<JavaClass>,
}

impl JavaUnit {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Qualify a written name using only information local to this unit
    #[must_use]
    pub fn qualify_locally(&self, written: &str) -> Option<String> {
        let head = written.split('.').next().unwrap_or(written);
        if let Some(import) = self
            .imports
            .iter()
            .find(|import| !import.ends_with(".*") && import.rsplit('.').next() == Some(head))
        {
            // `Outer.Inner` written against an imported `Outer`
            return Some(format!("{import}{}", &written[head.len()..]));
        }
        if written.contains('.') && written.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Some(written.to_string());
        }
        self.classes
            .iter()
            .find(|class| class.name == written || class.qualified_name.ends_with(&format!(".{written}")))
            .map(|class| class.qualified_name.clone())
    }

    /// Packages imported with `.*`
    pub fn wildcard_packages(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter_map(|import| import.strip_suffix(".*"))
    }
}

/// Cheap handle to a class inside a shared unit
#[derive(Debug, Clone)]
pub struct ClassRef {
    unit: Arc<JavaUnit>,
    index: usize,
}

impl ClassRef {
    /// Returns `None` when the index is out of range
    #[must_use]
    pub fn new(unit: Arc<JavaUnit>, index: usize) -> Option<Self> {
        (index < unit.classes.len()).then_some(Self { unit, index })
    }

    #[must_use]
    pub fn unit(&self) -> &Arc<JavaUnit> {
        &self.unit
    }

    #[must_use]
    pub fn class(&self) -> &JavaClass {
        &self.unit.classes[self.index]
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.class().qualified_name
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.class().name
    }

    #[must_use]
    pub fn package(&self) -> &str {
        &self.unit.package
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.unit.path
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodRef> + '_ {
        (0..self.class().methods.len()).map(move |index| MethodRef {
            class: self.clone(),
            index,
        })
    }

    #[must_use]
    pub fn method_named(&self, name: &str) -> Option<MethodRef> {
        self.methods().find(|m| m.method().name == name)
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.unit.path == other.unit.path
    }
}

impl Eq for ClassRef {}

/// Cheap handle to a method of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    class: ClassRef,
    index: usize,
}

impl MethodRef {
    #[must_use]
    pub const fn class(&self) -> &ClassRef {
        &self.class
    }

    #[must_use]
    pub fn method(&self) -> &JavaMethod {
        &self.class.class().methods[self.index]
    }

    #[must_use]
    pub fn unit(&self) -> &Arc<JavaUnit> {
        self.class.unit()
    }
}
