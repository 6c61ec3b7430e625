use crate::annotate::recognizer::InjectionSite;
use crate::edit::Edit;
use crate::syntax::SyntaxNode;
use tracing::debug;

/// Turns injection sites into byte-span edits against the original buffer.
pub struct Synthesizer<'c> {
    inject_property: &'c str,
}

impl<'c> Synthesizer<'c> {
    pub fn new(inject_property: &'c str) -> Self {
        Self { inject_property }
    }

    /// Edits for one site; empty when nothing needs to change.
    pub fn edits_for_site(&self, site: &InjectionSite<'_>) -> Vec<Edit> {
        match site {
            InjectionSite::BareCallable {
                callable,
                parameters,
            } => wrap_callable(*callable, parameters),
            InjectionSite::ClassConstructor {
                class_body,
                first_member,
                parameters,
            } => self.inject_property_edit(*class_body, *first_member, parameters),
            InjectionSite::ArrayAnnotation {
                array,
                callable,
                parameters,
            } => fix_annotation(*array, *callable, parameters),
        }
    }

    /// Edits for every site, in site order.
    pub fn edits_for_sites(&self, sites: &[InjectionSite<'_>]) -> Vec<Edit> {
        sites
            .iter()
            .flat_map(|site| self.edits_for_site(site))
            .collect()
    }

    /// `static $inject = [...];` inserted before the first class member,
    /// followed by that member's own indentation.
    fn inject_property_edit(
        &self,
        class_body: SyntaxNode<'_>,
        first_member: SyntaxNode<'_>,
        parameters: &[&str],
    ) -> Vec<Edit> {
        if parameters.is_empty() {
            return Vec::new();
        }
        let start = first_member.start();
        let indentation = member_indentation(class_body, first_member);
        let declaration = format!(
            "static {} = {};\n{}",
            self.inject_property,
            string_array_literal(parameters),
            indentation
        );
        vec![Edit::insert(start, declaration)]
    }
}

/// `fn` becomes `['a', 'b', fn]`.
fn wrap_callable(callable: SyntaxNode<'_>, parameters: &[&str]) -> Vec<Edit> {
    if parameters.is_empty() {
        return Vec::new();
    }
    vec![
        Edit::insert(callable.start(), annotation_head(parameters)),
        Edit::insert(callable.end(), "]"),
    ]
}

/// Rewrite the string elements of an existing annotation to match the
/// callable's parameters, or unwrap the callable when it takes none.
fn fix_annotation(array: SyntaxNode<'_>, callable: SyntaxNode<'_>, parameters: &[&str]) -> Vec<Edit> {
    let head_start = array.start();
    let head_end = callable.start();

    if parameters.is_empty() {
        return vec![
            Edit::delete(head_start, head_end),
            Edit::delete(callable.end(), array.end()),
        ];
    }

    let head = annotation_head(parameters);
    if array.source().get(head_start..head_end) == Some(head.as_str()) {
        debug!(at = head_start, "annotation already up to date");
        return Vec::new();
    }
    vec![Edit::replace(head_start, head_end, head)]
}

/// `['a', 'b'` rendered as the opening of an annotation array: `['a', 'b', `.
fn annotation_head(parameters: &[&str]) -> String {
    let literal = string_array_literal(parameters);
    let mut head = literal[..literal.len() - 1].to_string();
    head.push_str(", ");
    head
}

/// `['a', 'b']`. Names are identifiers, so no quoting is needed.
pub fn string_array_literal(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("'{name}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Whitespace between the last line break before `member` and `member`.
///
/// Without a line break, the whole run after the opening brace is used.
fn member_indentation<'t>(class_body: SyntaxNode<'t>, member: SyntaxNode<'t>) -> &'t str {
    let source = member.source();
    // class bodies start with their `{`
    let trivia_start = (class_body.start() + 1).min(member.start());
    let leading = &source[trivia_start..member.start()];
    match leading.rfind('\n') {
        Some(index) => &leading[index + 1..],
        None => leading,
    }
}
