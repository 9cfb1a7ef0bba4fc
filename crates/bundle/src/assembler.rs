use crate::classifier::EntityClassifier;
use crate::collectors::{CalledMethodCollector, InvocationCollector, SignatureTypeCollector, TypeCollector};
use crate::config::ContextConfig;
use crate::error::{BundleError, Result};
use crate::heuristics::{is_likely_entity_parameter, is_mapper_style, sql_placeholders};
use crate::render::BundleText;
use crate::slice::CallgraphSlice;
use crate::writer::BundleWriter;
use entrypack_corpus::{ClassRef, Corpus, MethodRef, SourceCorpus, SourceText};
use entrypack_scan::{base_mapper_type, read_mapper, EntryPoint, Provenance};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A rendered bundle and where it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBundle {
    pub text: String,

    /// Absolute path of the written file
    pub path: PathBuf,
}

/// Builds one self-contained text bundle per entry point.
///
/// Sections are emitted in a fixed order: entry header, SQL, method source,
/// call-graph summary, slices, related types, called methods. Related types and
/// called methods are the only sections cut short by the character budget; the
/// final text is truncated at the tail when it still overshoots.
pub struct ContextAssembler {
    config: ContextConfig,
    classifier: EntityClassifier,
    types: Box<dyn TypeCollector>,
    called: Box<dyn CalledMethodCollector>,
    writer: Box<dyn BundleWriter>,
}

impl ContextAssembler {
    pub fn new(config: ContextConfig, writer: impl BundleWriter + 'static) -> Result<Self> {
        config.validate().map_err(BundleError::InvalidConfig)?;
        Ok(Self {
            classifier: EntityClassifier::new(&config),
            config,
            types: Box::new(SignatureTypeCollector),
            called: Box::new(InvocationCollector),
            writer: Box::new(writer),
        })
    }

    #[must_use]
    pub fn with_type_collector(mut self, collector: impl TypeCollector + 'static) -> Self {
        self.types = Box::new(collector);
        self
    }

    #[must_use]
    pub fn with_called_collector(mut self, collector: impl CalledMethodCollector + 'static) -> Self {
        self.called = Box::new(collector);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Render against the current corpus version and write to `out_path`,
    /// relative to the writer's root
    pub fn build(
        &self,
        corpus: &Corpus,
        entry: &EntryPoint,
        slice: &CallgraphSlice,
        out_path: &Path,
    ) -> Result<ContextBundle> {
        let snapshot = corpus.snapshot()?;
        let text = self.render(snapshot.as_ref(), entry, slice);
        let path = self.writer.write_relative(out_path, &text)?;
        Ok(ContextBundle { text, path })
    }

    /// Class-level variant of [`ContextAssembler::build`]
    pub fn build_for_class(&self, corpus: &Corpus, entry: &EntryPoint, out_path: &Path) -> Result<ContextBundle> {
        let snapshot = corpus.snapshot()?;
        let text = self.render_for_class(snapshot.as_ref(), entry);
        let path = self.writer.write_relative(out_path, &text)?;
        Ok(ContextBundle { text, path })
    }

    /// Bundle text for one entry method
    #[must_use]
    pub fn render(&self, corpus: &dyn SourceCorpus, entry: &EntryPoint, slice: &CallgraphSlice) -> String {
        let mut out = BundleText::new(self.config.max_chars);

        out.line("# Entry Method");
        out.line(&format!("{}#{}", entry.class_fqn, entry.method));

        if let Some(sql) = entry.sql.as_deref().filter(|sql| !sql.trim().is_empty()) {
            out.blank();
            out.line("# SQL Statement");
            out.line("```sql");
            out.line(sql);
            out.line("```");
            if let Some(xml_path) = &entry.xml_path {
                out.line(&format!("// Origin: {}", xml_path.display()));
            }
        }

        let method = find_entry_method(corpus, entry);
        if method.is_none() {
            log::debug!("No source method for {}#{}", entry.class_fqn, entry.method);
        }

        out.blank();
        if let Some(method) = &method {
            if let Some(text) = corpus.text(method.unit().path()) {
                let span = method.method().span;
                out.line("# Method Source");
                out.excerpt(&text, span.start_line, span.end_line, false);
            }
        }

        out.blank();
        out.line("# Callgraph Summary");
        out.line(&slice.summary);

        out.blank();
        out.line("# Slices");
        write_slices(corpus, slice, &mut out);

        let related = self.related_types(corpus, entry, method.as_ref());
        write_related(corpus, &related, &mut out);

        if let Some(method) = &method {
            if self.config.collect_called && self.config.called_depth > 0 {
                let called = self.called.collect(corpus, method, self.config.called_depth);
                write_called(corpus, &called, &mut out);
            }
        }

        let text = out.finish();
        log::debug!(
            "Assembled bundle for {}#{} ({} chars)",
            entry.class_fqn,
            entry.method,
            text.chars().count()
        );
        text
    }

    /// Bundle text for the class of an entry point: full class source, public
    /// method signatures and the types those methods touch
    #[must_use]
    pub fn render_for_class(&self, corpus: &dyn SourceCorpus, entry: &EntryPoint) -> String {
        let mut out = BundleText::new(self.config.max_chars);

        out.line("# Entry Class");
        out.line(&entry.class_fqn);
        out.blank();

        let Some(class) = corpus.resolve(&entry.class_fqn) else {
            log::debug!("Entry class {} not in corpus", entry.class_fqn);
            return out.finish();
        };

        let public: Vec<MethodRef> = class
            .methods()
            .filter(|m| !m.method().is_constructor() && class.class().is_public_member(m.method()))
            .collect();

        if let Some(text) = corpus.text(class.path()) {
            let span = class.class().span;
            out.line("# Class Source");
            out.line(&format!(
                "// File: {} [{}-{}]",
                class.path().display(),
                span.start_line,
                span.end_line
            ));
            out.excerpt(&text, span.start_line, span.end_line, true);
            out.blank();

            out.line("# Public Methods");
            for method in &public {
                out.line(&format!("- {}", method.method().signature()));
            }
        }

        let mut related = RelatedTypes::default();
        for method in &public {
            for found in self.types.collect(corpus, method, self.config.type_depth) {
                related.insert(found);
            }
        }
        write_related(corpus, &related.into_vec(), &mut out);

        out.finish()
    }

    fn related_types(&self, corpus: &dyn SourceCorpus, entry: &EntryPoint, method: Option<&MethodRef>) -> Vec<ClassRef> {
        let mut related = RelatedTypes::default();
        if let Some(method) = method {
            for found in self.types.collect(corpus, method, self.config.type_depth) {
                related.insert(found);
            }
        }

        let entry_class = corpus.resolve(&entry.class_fqn);

        match &entry.provenance {
            Provenance::BaseMapper => {
                let entity = entry_class.as_ref().and_then(|class| {
                    let base = base_mapper_type(corpus, class.unit(), class.class())?;
                    let arg = base.args.first()?;
                    corpus.resolve_in(class.unit(), &arg.name)
                });
                if let Some(entity) = entity {
                    self.admit(&mut related, entity);
                }
            }
            Provenance::MyBatisXml => {
                if let Some(xml_path) = &entry.xml_path {
                    for name in read_mapper(corpus, xml_path).entity_types {
                        if let Some(entity) = resolve_type_name(corpus, &name) {
                            self.admit(&mut related, entity);
                        }
                    }
                }
            }
            Provenance::Annotation(_) => {}
        }

        if is_mapper_style(entry) {
            if let Some(class) = &entry_class {
                for sibling in class.methods() {
                    for found in self.types.collect(corpus, &sibling, 1) {
                        self.admit(&mut related, found);
                    }
                }
            }
        }

        if let (Some(sql), Some(method)) = (entry.sql.as_deref(), method) {
            self.sql_parameter_types(corpus, sql, method, &mut related);
        }

        related.into_vec()
    }

    /// Parameters bound by SQL placeholders or shaped like entities, plus the
    /// generic arguments of every parameter and the return type
    fn sql_parameter_types(&self, corpus: &dyn SourceCorpus, sql: &str, method: &MethodRef, related: &mut RelatedTypes) {
        let placeholders = sql_placeholders(sql);
        let unit = method.unit();
        let java = method.method();

        for param in &java.parameters {
            if placeholders.contains(&param.name) || is_likely_entity_parameter(corpus, unit, param) {
                if let Some(class) = corpus.resolve_in(unit, &param.ty.name) {
                    self.admit(related, class);
                }
            }
            for arg in &param.ty.args {
                if let Some(class) = corpus.resolve_in(unit, &arg.name) {
                    self.admit(related, class);
                }
            }
        }

        if let Some(ret) = java.return_type.as_ref().filter(|ret| !ret.is_primitive()) {
            let candidates = std::iter::once(ret).chain(ret.args.iter());
            for ty in candidates {
                if let Some(class) = corpus.resolve_in(unit, &ty.name) {
                    self.admit(related, class);
                }
            }
        }
    }

    fn admit(&self, related: &mut RelatedTypes, class: ClassRef) {
        if self.classifier.is_entity(&class) {
            related.insert(class);
        }
    }
}

/// Insertion-ordered class set keyed by qualified name
#[derive(Default)]
struct RelatedTypes {
    classes: Vec<ClassRef>,
    seen: HashSet<String>,
}

impl RelatedTypes {
    fn insert(&mut self, class: ClassRef) {
        if self.seen.insert(class.qualified_name().to_string()) {
            self.classes.push(class);
        }
    }

    fn into_vec(self) -> Vec<ClassRef> {
        self.classes
    }
}

/// Locate the source method behind an entry point.
///
/// Looks in the entry's file first, by line then by name, preferring classes
/// whose qualified name matches. Falls back to the entry class resolved by
/// name, which covers XML entries whose file is the mapper document.
#[must_use]
pub fn find_entry_method(corpus: &dyn SourceCorpus, entry: &EntryPoint) -> Option<MethodRef> {
    let name = entry.method_name();

    if let Some(unit) = corpus.unit(&entry.file) {
        let classes: Vec<ClassRef> = (0..unit.classes.len())
            .filter_map(|index| ClassRef::new(Arc::clone(&unit), index))
            .collect();
        let ordered: Vec<&ClassRef> = classes
            .iter()
            .filter(|class| class.qualified_name() == entry.class_fqn)
            .chain(classes.iter().filter(|class| class.qualified_name() != entry.class_fqn))
            .collect();

        let by_line = ordered.iter().find_map(|class| {
            class
                .methods()
                .find(|m| m.method().name == name && m.method().span.contains_line(entry.line))
        });
        if by_line.is_some() {
            return by_line;
        }
        if let Some(found) = ordered.iter().find_map(|class| class.method_named(name)) {
            return Some(found);
        }
    }

    corpus
        .resolve(&entry.class_fqn)
        .and_then(|class| class.method_named(name))
}

fn resolve_type_name(corpus: &dyn SourceCorpus, name: &str) -> Option<ClassRef> {
    corpus.resolve(name).or_else(|| {
        if name.contains('.') {
            None
        } else {
            corpus.resolve_short_name(name).into_iter().next()
        }
    })
}

fn write_slices(corpus: &dyn SourceCorpus, slice: &CallgraphSlice, out: &mut BundleText) {
    let mut seen: HashSet<(PathBuf, usize, usize)> = HashSet::new();
    for anchor in &slice.anchors {
        let Some(text) = corpus.text(&anchor.file) else {
            log::debug!("Slice anchor file not in corpus: {}", anchor.file.display());
            continue;
        };
        let Some((start, end)) = anchor.clamp(text.line_count()) else {
            continue;
        };
        if !seen.insert((anchor.file.clone(), start, end)) {
            continue;
        }
        out.line(&format!("## File: {} [{start}-{end}]", anchor.file.display()));
        out.excerpt(&text, start, end, false);
        out.blank();
    }
}

fn write_related(corpus: &dyn SourceCorpus, related: &[ClassRef], out: &mut BundleText) {
    if related.is_empty() {
        return;
    }
    out.blank();
    out.line("# Related Types (DTO/VO/Entity/Enum)");
    for class in related {
        out.line(&format!("## {}", class.qualified_name()));
        if let Some(text) = corpus.text(class.path()) {
            let span = class.class().span;
            write_located_excerpt(out, &text, class.path(), span.start_line, span.end_line);
        }
        out.blank();
        if out.is_full() {
            break;
        }
    }
}

fn write_called(corpus: &dyn SourceCorpus, called: &[MethodRef], out: &mut BundleText) {
    if called.is_empty() {
        return;
    }
    out.blank();
    out.line("# Called Methods");
    for method in called {
        let Some(text) = corpus.text(method.unit().path()) else {
            continue;
        };
        let span = method.method().span;
        out.line(&format!(
            "## {}#{}",
            method.class().qualified_name(),
            method.method().name
        ));
        write_located_excerpt(out, &text, method.unit().path(), span.start_line, span.end_line);
        out.blank();
        if out.is_full() {
            break;
        }
    }
}

fn write_located_excerpt(out: &mut BundleText, text: &SourceText, path: &Path, start: usize, end: usize) {
    out.line(&format!("// File: {} [{start}-{end}]", path.display()));
    out.excerpt(text, start, end, true);
}
