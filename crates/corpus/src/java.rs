use crate::error::{CorpusError, Result};
use crate::model::{
    Annotation, ClassKind, JavaClass, JavaField, JavaMethod, JavaUnit, Parameter, Span, TypeRef,
};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Tree-sitter based parser producing [`JavaUnit`] models
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_java::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| CorpusError::tree_sitter(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse one compilation unit
    pub fn parse(&mut self, path: &Path, content: &str) -> Result<JavaUnit> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| CorpusError::tree_sitter("Failed to parse source code"))?;
        let root = tree.root_node();

        let mut unit = JavaUnit {
            path: path.to_path_buf(),
            package: String::new(),
            imports: Vec::new(),
            classes: Vec::new(),
        };

        let mut cursor = root.walk();
        let children: Vec<_> = root.children(&mut cursor).collect();

        // Package and imports precede declarations, but collect them first regardless
        for child in &children {
            match child.kind() {
                "package_declaration" => {
                    if let Some(name) = first_named_of(*child, &["scoped_identifier", "identifier"]) {
                        unit.package = node_text(name, content).to_string();
                    }
                }
                "import_declaration" => {
                    if let Some(import) = import_name(*child, content) {
                        unit.imports.push(import);
                    }
                }
                _ => {}
            }
        }

        let package = unit.package.clone();
        for child in children {
            if class_kind(child.kind()).is_some() {
                collect_class(content, child, &package, &mut unit.classes);
            }
        }

        for class in &mut unit.classes {
            for annotation in &mut class.annotations {
                annotation.qualified_name = qualify_annotation(&unit.imports, &annotation.name);
            }
            for method in &mut class.methods {
                for annotation in &mut method.annotations {
                    annotation.qualified_name = qualify_annotation(&unit.imports, &annotation.name);
                }
            }
        }

        if root.has_error() {
            log::debug!("Parsed {} with syntax errors", path.display());
        }

        Ok(unit)
    }
}

fn class_kind(kind: &str) -> Option<ClassKind> {
    match kind {
        "class_declaration" => Some(ClassKind::Class),
        "interface_declaration" => Some(ClassKind::Interface),
        "enum_declaration" => Some(ClassKind::Enum),
        "record_declaration" => Some(ClassKind::Record),
        "annotation_type_declaration" => Some(ClassKind::Annotation),
        _ => None,
    }
}

/// Explicit imports and already-qualified names; everything else is left to the corpus
fn qualify_annotation(imports: &[String], written: &str) -> Option<String> {
    if let Some(import) = imports
        .iter()
        .find(|import| !import.ends_with(".*") && import.rsplit('.').next() == Some(written))
    {
        return Some(import.clone());
    }
    if written.contains('.') {
        return Some(written.to_string());
    }
    None
}

fn collect_class(content: &str, node: Node, scope: &str, out: &mut Vec<JavaClass>) {
    let Some(kind) = class_kind(node.kind()) else {
        return;
    };
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, content).to_string();
    let qualified_name = if scope.is_empty() {
        name.clone()
    } else {
        format!("{scope}.{name}")
    };
    let (annotations, modifiers) = modifiers_of(node, content);

    let mut super_types = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                let mut inner = child.walk();
                super_types.extend(
                    child
                        .named_children(&mut inner)
                        .map(|t| type_ref(t, content)),
                );
            }
            "super_interfaces" | "extends_interfaces" => {
                if let Some(list) = first_named_of(child, &["type_list"]) {
                    let mut inner = list.walk();
                    super_types.extend(list.named_children(&mut inner).map(|t| type_ref(t, content)));
                }
            }
            _ => {}
        }
    }

    let index = out.len();
    out.push(JavaClass {
        name,
        qualified_name: qualified_name.clone(),
        kind,
        annotations,
        modifiers,
        super_types,
        methods: Vec::new(),
        fields: Vec::new(),
        span: span_of(node),
        name_line: name_node.start_position().row + 1,
    });

    let mut methods = Vec::new();
    let mut fields = Vec::new();

    // Record components behave like fields for type traversal
    if kind == ClassKind::Record {
        if let Some(params) = node.child_by_field_name("parameters") {
            for param in parameters_of(params, content) {
                fields.push(JavaField {
                    name: param.name,
                    ty: param.ty,
                    span: span_of(params),
                });
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        collect_members(content, body, &qualified_name, out, &mut methods, &mut fields);
    }

    out[index].methods = methods;
    out[index].fields = fields;
}

fn collect_members(
    content: &str,
    body: Node,
    scope: &str,
    out: &mut Vec<JavaClass>,
    methods: &mut Vec<JavaMethod>,
    fields: &mut Vec<JavaField>,
) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_declaration" | "constructor_declaration" => {
                if let Some(method) = method_of(member, content) {
                    methods.push(method);
                }
            }
            "field_declaration" | "constant_declaration" => {
                let Some(ty) = member.child_by_field_name("type").map(|t| type_ref(t, content))
                else {
                    continue;
                };
                let mut inner = member.walk();
                for declarator in member.named_children(&mut inner) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        fields.push(JavaField {
                            name: node_text(name, content).to_string(),
                            ty: ty.clone(),
                            span: span_of(member),
                        });
                    }
                }
            }
            "enum_body_declarations" => {
                collect_members(content, member, scope, out, methods, fields);
            }
            kind if class_kind(kind).is_some() => collect_class(content, member, scope, out),
            _ => {}
        }
    }
}

fn method_of(node: Node, content: &str) -> Option<JavaMethod> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(name_node, content).to_string();
    let (annotations, modifiers) = modifiers_of(node, content);
    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| parameters_of(params, content))
        .unwrap_or_default();
    let return_type = if node.kind() == "method_declaration" {
        node.child_by_field_name("type").map(|t| type_ref(t, content))
    } else {
        None
    };
    let mut invocations = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        collect_invocations(body, content, &mut invocations);
    }

    Some(JavaMethod {
        name,
        annotations,
        modifiers,
        parameters,
        return_type,
        invocations,
        span: span_of(node),
        name_line: name_node.start_position().row + 1,
    })
}

fn parameters_of(params: Node, content: &str) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                let ty = param.child_by_field_name("type").map(|t| type_ref(t, content));
                let name = param.child_by_field_name("name").map(|n| node_text(n, content));
                if let (Some(ty), Some(name)) = (ty, name) {
                    parameters.push(Parameter {
                        name: name.to_string(),
                        ty,
                    });
                }
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let mut ty = None;
                let mut name = None;
                for child in param.named_children(&mut inner) {
                    match child.kind() {
                        "variable_declarator" => {
                            name = child
                                .child_by_field_name("name")
                                .map(|n| node_text(n, content).to_string());
                        }
                        "modifiers" => {}
                        _ if ty.is_none() => ty = Some(type_ref(child, content)),
                        _ => {}
                    }
                }
                if let (Some(mut ty), Some(name)) = (ty, name) {
                    ty.text.push_str("...");
                    ty.array = true;
                    parameters.push(Parameter { name, ty });
                }
            }
            _ => {}
        }
    }
    parameters
}

fn collect_invocations(node: Node, content: &str, out: &mut Vec<String>) {
    if node.kind() == "method_invocation" {
        if let Some(name) = node.child_by_field_name("name") {
            out.push(node_text(name, content).to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_invocations(child, content, out);
    }
}

fn modifiers_of(node: Node, content: &str) -> (Vec<Annotation>, Vec<String>) {
    let mut annotations = Vec::new();
    let mut modifiers = Vec::new();
    let Some(list) = first_named_of(node, &["modifiers"]) else {
        return (annotations, modifiers);
    };
    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        match child.kind() {
            "annotation" | "marker_annotation" => {
                if let Some(annotation) = annotation_of(child, content) {
                    annotations.push(annotation);
                }
            }
            _ if !child.is_named() => modifiers.push(child.kind().to_string()),
            _ => {}
        }
    }
    (annotations, modifiers)
}

fn annotation_of(node: Node, content: &str) -> Option<Annotation> {
    let name = node_text(node.child_by_field_name("name")?, content).to_string();
    let mut arguments = Vec::new();
    if let Some(args) = node.child_by_field_name("arguments") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            match arg.kind() {
                "element_value_pair" => {
                    let key = arg.child_by_field_name("key").map(|k| node_text(k, content));
                    let value = arg.child_by_field_name("value").map(|v| node_text(v, content));
                    if let (Some(key), Some(value)) = (key, value) {
                        arguments.push((Some(key.to_string()), value.to_string()));
                    }
                }
                "line_comment" | "block_comment" => {}
                _ => arguments.push((None, node_text(arg, content).to_string())),
            }
        }
    }
    Some(Annotation {
        name,
        qualified_name: None,
        arguments,
    })
}

fn type_ref(node: Node, content: &str) -> TypeRef {
    let text: String = node_text(node, content)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    match node.kind() {
        "generic_type" => {
            let mut name = String::new();
            let mut args = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "type_identifier" | "scoped_type_identifier" => {
                        name = node_text(child, content).to_string();
                    }
                    "type_arguments" => {
                        let mut inner = child.walk();
                        for arg in child.named_children(&mut inner) {
                            if arg.kind() == "wildcard" {
                                let mut bound_cursor = arg.walk();
                                let bound = arg
                                    .named_children(&mut bound_cursor)
                                    .filter(|n| !matches!(n.kind(), "annotation" | "marker_annotation"))
                                    .last();
                                if let Some(bound) = bound {
                                    args.push(type_ref(bound, content));
                                }
                            } else {
                                args.push(type_ref(arg, content));
                            }
                        }
                    }
                    _ => {}
                }
            }
            TypeRef {
                text,
                name,
                args,
                array: false,
            }
        }
        "array_type" => match node.child_by_field_name("element") {
            Some(element) => {
                let element = type_ref(element, content);
                TypeRef {
                    text,
                    name: element.name,
                    args: element.args,
                    array: true,
                }
            }
            None => TypeRef {
                name: text.clone(),
                text,
                args: Vec::new(),
                array: true,
            },
        },
        "annotated_type" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .filter(|n| !matches!(n.kind(), "annotation" | "marker_annotation"))
                .last();
            inner.map_or_else(|| TypeRef::simple(text), |inner| type_ref(inner, content))
        }
        _ => TypeRef::simple(text),
    }
}

fn import_name(node: Node, content: &str) -> Option<String> {
    let name = first_named_of(node, &["scoped_identifier", "identifier"])?;
    let mut import = node_text(name, content).to_string();
    let mut cursor = node.walk();
    if node.children(&mut cursor).any(|c| c.kind() == "asterisk") {
        import.push_str(".*");
    }
    Some(import)
}

fn first_named_of<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| kinds.contains(&child.kind()));
    found
}

fn span_of(node: Node) -> Span {
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
    }
}

fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    node.utf8_text(content.as_bytes()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER_SERVICE: &str = r#"package com.example.service;

import com.example.dto.UserDto;
import org.springframework.stereotype.Service;
import java.util.*;

@Service
public class UserService {
    private UserRepository repository;

    @Transactional(readOnly = true)
    public List<UserDto> findUsers(String name, int limit) {
        return repository.search(name, limit);
    }

    static class Helper {
        void help(String... args) {}
    }
}
"#;

    fn parse(code: &str) -> JavaUnit {
        let mut parser = JavaParser::new().unwrap();
        parser.parse(Path::new("UserService.java"), code).unwrap()
    }

    #[test]
    fn extracts_package_imports_and_classes() {
        let unit = parse(USER_SERVICE);
        assert_eq!(unit.package, "com.example.service");
        assert_eq!(
            unit.imports,
            vec![
                "com.example.dto.UserDto".to_string(),
                "org.springframework.stereotype.Service".to_string(),
                "java.util.*".to_string(),
            ]
        );
        let names: Vec<_> = unit.classes.iter().map(|c| c.qualified_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "com.example.service.UserService",
                "com.example.service.UserService.Helper"
            ]
        );
    }

    #[test]
    fn resolves_annotations_through_imports() {
        let unit = parse(USER_SERVICE);
        let service = &unit.classes[0];
        assert_eq!(service.annotations[0].name, "Service");
        assert_eq!(
            service.annotations[0].qualified_name.as_deref(),
            Some("org.springframework.stereotype.Service")
        );

        let method = &service.methods[0];
        assert_eq!(method.annotations[0].simple_name(), "Transactional");
        assert_eq!(method.annotations[0].qualified_name, None);
        assert_eq!(method.annotations[0].attribute("readOnly"), Some("true"));
    }

    #[test]
    fn captures_method_signature_and_span() {
        let unit = parse(USER_SERVICE);
        let method = &unit.classes[0].methods[0];
        assert_eq!(method.signature(), "findUsers(String,int)");
        assert!(method.has_modifier("public"));
        let ret = method.return_type.as_ref().unwrap();
        assert_eq!(ret.name, "List");
        assert_eq!(ret.args[0].name, "UserDto");
        assert_eq!(method.span.start_line, 11);
        assert_eq!(method.span.end_line, 14);
        // the span opens at the annotation, the name sits a line below
        assert_eq!(method.name_line, 12);
        assert_eq!(unit.classes[0].span.start_line, 7);
        assert_eq!(unit.classes[0].name_line, 8);
        assert_eq!(method.invocations, vec!["search".to_string()]);
    }

    #[test]
    fn collects_fields_and_varargs() {
        let unit = parse(USER_SERVICE);
        assert_eq!(unit.classes[0].fields[0].name, "repository");
        assert_eq!(unit.classes[0].fields[0].ty.name, "UserRepository");
        assert_eq!(unit.classes[1].methods[0].signature(), "help(String...)");
    }

    #[test]
    fn reads_interface_super_types_and_annotation_values() {
        let code = r#"package com.example.mapper;

import com.baomidou.mybatisplus.core.mapper.BaseMapper;
import org.apache.ibatis.annotations.Select;

public interface UserMapper extends BaseMapper<User> {
    @Select("SELECT * FROM users WHERE id = #{id}")
    User findById(Long id);
}
"#;
        let unit = parse(code);
        let mapper = &unit.classes[0];
        assert_eq!(mapper.kind, ClassKind::Interface);
        assert_eq!(mapper.super_types[0].name, "BaseMapper");
        assert_eq!(mapper.super_types[0].args[0].name, "User");
        let select = &mapper.methods[0].annotations[0];
        assert_eq!(
            select.qualified_name.as_deref(),
            Some("org.apache.ibatis.annotations.Select")
        );
        assert_eq!(
            select.default_attribute(),
            Some("\"SELECT * FROM users WHERE id = #{id}\"")
        );
    }
}
