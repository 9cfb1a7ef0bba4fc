use entrypack_corpus::{ClassRef, JavaUnit, MethodRef, SourceCorpus, TypeRef};
use std::collections::HashSet;

/// Collects classes related to a method, bounded by depth
pub trait TypeCollector: Send + Sync {
    fn collect(&self, corpus: &dyn SourceCorpus, method: &MethodRef, max_depth: usize) -> Vec<ClassRef>;
}

/// Collects methods transitively called by a method, bounded by depth
pub trait CalledMethodCollector: Send + Sync {
    fn collect(&self, corpus: &dyn SourceCorpus, method: &MethodRef, max_depth: usize) -> Vec<MethodRef>;
}

/// Name suffixes of behaviour-carrying types that are never collected as data
const ROLE_SUFFIXES: &[&str] = &[
    "Service",
    "ServiceImpl",
    "Controller",
    "Mapper",
    "Dao",
    "DAO",
    "Repository",
    "Config",
    "Configuration",
    "Utils",
    "Util",
    "Helper",
];

/// Follows the types in a method signature, then the field types of what it
/// found, one level per depth step.
///
/// Interfaces, the method's own class and role-named classes are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureTypeCollector;

impl TypeCollector for SignatureTypeCollector {
    fn collect(&self, corpus: &dyn SourceCorpus, method: &MethodRef, max_depth: usize) -> Vec<ClassRef> {
        if max_depth == 0 {
            return Vec::new();
        }
        let own = method.class().qualified_name().to_string();
        let mut seen: HashSet<String> = HashSet::from([own]);
        let mut found: Vec<ClassRef> = Vec::new();

        let java = method.method();
        let mut signature: Vec<&TypeRef> = Vec::new();
        for param in &java.parameters {
            flatten(&param.ty, &mut signature);
        }
        if let Some(ret) = &java.return_type {
            flatten(ret, &mut signature);
        }
        let mut frontier = admit(corpus, method.unit(), signature, &mut seen);

        for depth in 1..=max_depth {
            found.extend(frontier.iter().cloned());
            if depth == max_depth {
                break;
            }
            let mut next = Vec::new();
            for class in &frontier {
                let mut field_types = Vec::new();
                for field in &class.class().fields {
                    flatten(&field.ty, &mut field_types);
                }
                next.extend(admit(corpus, class.unit(), field_types, &mut seen));
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        found
    }
}

fn flatten<'a>(ty: &'a TypeRef, out: &mut Vec<&'a TypeRef>) {
    if !ty.is_primitive() {
        out.push(ty);
    }
    for arg in &ty.args {
        flatten(arg, out);
    }
}

fn admit(
    corpus: &dyn SourceCorpus,
    unit: &JavaUnit,
    types: Vec<&TypeRef>,
    seen: &mut HashSet<String>,
) -> Vec<ClassRef> {
    let mut admitted = Vec::new();
    for ty in types {
        let Some(class) = corpus.resolve_in(unit, &ty.name) else {
            continue;
        };
        if class.class().is_interface() || is_role_named(class.name()) {
            continue;
        }
        if seen.insert(class.qualified_name().to_string()) {
            admitted.push(class);
        }
    }
    admitted
}

fn is_role_named(name: &str) -> bool {
    ROLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Resolves invocation names in method bodies to methods of the same class or
/// of the declared types of its fields, following calls to `max_depth`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvocationCollector;

impl CalledMethodCollector for InvocationCollector {
    fn collect(&self, corpus: &dyn SourceCorpus, method: &MethodRef, max_depth: usize) -> Vec<MethodRef> {
        let mut found: Vec<MethodRef> = Vec::new();
        let mut frontier = vec![method.clone()];

        for _ in 0..max_depth {
            let mut next = Vec::new();
            for caller in &frontier {
                for name in &caller.method().invocations {
                    let Some(callee) = resolve_call(corpus, caller.class(), name) else {
                        continue;
                    };
                    if callee == *method || found.contains(&callee) {
                        continue;
                    }
                    found.push(callee.clone());
                    next.push(callee);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        found
    }
}

fn resolve_call(corpus: &dyn SourceCorpus, class: &ClassRef, name: &str) -> Option<MethodRef> {
    if let Some(local) = class.method_named(name) {
        return Some(local);
    }
    class.class().fields.iter().find_map(|field| {
        corpus
            .resolve_in(class.unit(), &field.ty.name)
            .and_then(|target| target.method_named(name))
    })
}
