//! AST walk that fills the owned script model.

use std::collections::{BTreeSet, HashMap, HashSet};

use oxc_ast::ast::{
    Argument, BindingIdentifier, BindingProperty, CallExpression, ComputedMemberExpression,
    Directive, ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration,
    ImportDeclarationSpecifier, ImportExpression, JSXAttribute, JSXAttributeValue,
    MethodDefinition, ObjectProperty, PropertyDefinition, PropertyKey, StaticMemberExpression,
    StringLiteral, TSEnumMember, TSLiteralType, TSModuleDeclaration, TSModuleDeclarationName,
    TSPropertySignature, TemplateLiteral,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;

use modulize_core::patch::Span;

use crate::{ImportDecl, Literal, LiteralContext, LiteralKind, ScriptDocument};

type SpanKey = (u32, u32);

fn key(span: oxc_span::Span) -> SpanKey {
    (span.start, span.end)
}

fn to_span(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

pub(crate) struct Collector<'s> {
    source: &'s str,
    literals: Vec<Literal>,
    imports: Vec<ImportDecl>,
    bindings: BTreeSet<String>,
    excluded: HashSet<SpanKey>,
    contexts: HashMap<SpanKey, LiteralContext>,
    single_quotes: usize,
    double_quotes: usize,
}

impl<'s> Collector<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Collector {
            source,
            literals: Vec::new(),
            imports: Vec::new(),
            bindings: BTreeSet::new(),
            excluded: HashSet::new(),
            contexts: HashMap::new(),
            single_quotes: 0,
            double_quotes: 0,
        }
    }

    pub(crate) fn finish(
        mut self,
        path: &str,
        insertion_point: usize,
        first_is_import: bool,
    ) -> ScriptDocument {
        self.literals.sort_by_key(|l| l.span.start);
        ScriptDocument {
            path: path.to_string(),
            literals: self.literals,
            imports: self.imports,
            bindings: self.bindings,
            insertion_point,
            first_is_import,
            single_quotes: self.single_quotes,
            double_quotes: self.double_quotes,
        }
    }

    fn exclude(&mut self, span: oxc_span::Span) {
        self.excluded.insert(key(span));
    }

    fn exclude_expression(&mut self, expr: &Expression<'_>) {
        if let Expression::StringLiteral(lit) = expr {
            self.exclude(lit.span);
        }
    }

    fn mark_key(&mut self, key_node: &PropertyKey<'_>, computed: bool) {
        if computed {
            return;
        }
        if let PropertyKey::StringLiteral(lit) = key_node {
            self.contexts.insert(key(lit.span), LiteralContext::PropertyKey);
        }
    }

    fn quote_at(&self, offset: u32) -> char {
        match self.source.as_bytes().get(offset as usize) {
            Some(b'\'') => '\'',
            _ => '"',
        }
    }

    fn count_quote(&mut self, offset: u32) {
        match self.quote_at(offset) {
            '\'' => self.single_quotes += 1,
            _ => self.double_quotes += 1,
        }
    }

    /// Text range of each quasi, in order.
    ///
    /// The quasi's own span is used when it covers exactly the raw text;
    /// otherwise the range is derived from the surrounding delimiters.
    fn quasi_ranges(&self, it: &TemplateLiteral<'_>) -> Vec<Span> {
        let mut ranges = Vec::with_capacity(it.quasis.len());
        for (i, quasi) in it.quasis.iter().enumerate() {
            let raw = quasi.value.raw.as_str();
            let own = to_span(quasi.span);
            if self.source.get(own.start..own.end) == Some(raw) {
                ranges.push(own);
                continue;
            }
            let start = if i == 0 {
                it.span.start as usize + 1
            } else {
                let expr_end = it.expressions[i - 1].span().end as usize;
                self.source[expr_end..]
                    .find('}')
                    .map(|p| expr_end + p + 1)
                    .unwrap_or(expr_end)
            };
            ranges.push(Span::new(start, start + raw.len()));
        }
        ranges
    }
}

impl<'a> Visit<'a> for Collector<'_> {
    fn visit_string_literal(&mut self, it: &StringLiteral<'a>) {
        let context = self
            .contexts
            .get(&key(it.span))
            .copied()
            .unwrap_or(LiteralContext::Expression);
        // JSX attribute quotes are not counted.
        if context != LiteralContext::JsxAttributeValue {
            self.count_quote(it.span.start);
        }
        if self.excluded.contains(&key(it.span)) {
            return;
        }
        let span = to_span(it.span);
        if span.len() < 2 {
            return;
        }
        let text_span = Span::new(span.start + 1, span.end - 1);
        self.literals.push(Literal {
            kind: LiteralKind::Plain {
                quote: self.quote_at(it.span.start),
            },
            span,
            text_span,
            text: self.source[text_span.start..text_span.end].to_string(),
            context,
        });
    }

    fn visit_template_literal(&mut self, it: &TemplateLiteral<'a>) {
        for range in self.quasi_ranges(it) {
            self.literals.push(Literal {
                kind: LiteralKind::TemplateQuasi,
                span: range,
                text_span: range,
                text: self.source[range.start..range.end].to_string(),
                context: LiteralContext::Expression,
            });
        }
        walk::walk_template_literal(self, it);
    }

    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        self.bindings.insert(it.name.to_string());
    }

    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        // Not walked: nothing inside an import is class text.
        let mut has_specifiers = it.import_kind.is_type();
        if let Some(specifiers) = &it.specifiers {
            for specifier in specifiers {
                let local = match specifier {
                    ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
                };
                self.bindings.insert(local.name.to_string());
                has_specifiers = true;
            }
        }
        self.count_quote(it.source.span.start);
        self.imports.push(ImportDecl {
            span: to_span(it.span),
            source: it.source.value.to_string(),
            source_span: to_span(it.source.span),
            quote: self.quote_at(it.source.span.start),
            has_specifiers,
        });
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &it.source {
            self.exclude(source.span);
        }
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        self.exclude(it.source.span);
        walk::walk_export_all_declaration(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        self.exclude_expression(&it.source);
        walk::walk_import_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        let is_require =
            matches!(&it.callee, Expression::Identifier(id) if id.name.as_str() == "require");
        if is_require {
            if let Some(Argument::StringLiteral(lit)) = it.arguments.first() {
                self.exclude(lit.span);
            }
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_computed_member_expression(&mut self, it: &ComputedMemberExpression<'a>) {
        self.exclude_expression(&it.object);
        self.exclude_expression(&it.expression);
        walk::walk_computed_member_expression(self, it);
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        self.exclude_expression(&it.object);
        walk::walk_static_member_expression(self, it);
    }

    fn visit_directive(&mut self, it: &Directive<'a>) {
        self.exclude(it.expression.span);
        walk::walk_directive(self, it);
    }

    fn visit_ts_literal_type(&mut self, _it: &TSLiteralType<'a>) {}

    fn visit_ts_property_signature(&mut self, it: &TSPropertySignature<'a>) {
        if let PropertyKey::StringLiteral(lit) = &it.key {
            self.exclude(lit.span);
        }
        walk::walk_ts_property_signature(self, it);
    }

    fn visit_ts_enum_member(&mut self, it: &TSEnumMember<'a>) {
        // Member names are not walked.
        if let Some(initializer) = &it.initializer {
            self.visit_expression(initializer);
        }
    }

    fn visit_ts_module_declaration(&mut self, it: &TSModuleDeclaration<'a>) {
        if let TSModuleDeclarationName::StringLiteral(lit) = &it.id {
            self.exclude(lit.span);
        }
        walk::walk_ts_module_declaration(self, it);
    }

    fn visit_jsx_attribute(&mut self, it: &JSXAttribute<'a>) {
        if let Some(JSXAttributeValue::StringLiteral(lit)) = &it.value {
            self.contexts
                .insert(key(lit.span), LiteralContext::JsxAttributeValue);
        }
        walk::walk_jsx_attribute(self, it);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        self.mark_key(&it.key, it.computed);
        walk::walk_object_property(self, it);
    }

    fn visit_binding_property(&mut self, it: &BindingProperty<'a>) {
        // A destructuring key names a field of the source object.
        if let PropertyKey::StringLiteral(lit) = &it.key {
            self.exclude(lit.span);
        }
        walk::walk_binding_property(self, it);
    }

    fn visit_method_definition(&mut self, it: &MethodDefinition<'a>) {
        self.mark_key(&it.key, it.computed);
        walk::walk_method_definition(self, it);
    }

    fn visit_property_definition(&mut self, it: &PropertyDefinition<'a>) {
        self.mark_key(&it.key, it.computed);
        walk::walk_property_definition(self, it);
    }
}
