//! Finds the constructs that need an explicit dependency list.
//!
//! Recognition is purely syntactic. Three shapes are recognized:
//!
//! - function/arrow arguments of a module-registration call
//!   (`angular.module('m').controller('c', function ($scope) {})`);
//! - function/arrow literals whose body starts with the `"ngInject"` marker;
//! - class declarations whose constructor starts with the marker.
//!
//! Existing `['a', 'b', function (a, b) {}]` annotations passed to a
//! registration call are reported separately so they can be brought up to date.

use crate::config::RecognizerConfig;
use crate::syntax::{parameter_names, SyntaxKind, SyntaxNode};
use tracing::debug;

/// Marker string that opts a callable into annotation.
pub const NG_INJECT_MARKER: &str = "ngInject";

/// Call that starts a fluent module-registration chain.
pub const NG_MODULE_ENTRY: &str = "angular.module";

/// Registration methods whose callable arguments are injected.
pub const NG_MODULE_METHOD_NAMES: &[&str] = &[
    "component",
    "config",
    "constant",
    "controller",
    "directive",
    "factory",
    "filter",
    "provider",
    "run",
    "service",
    "value",
    "decorator",
];

/// Accessors that register injectable callables outside a module chain.
pub const NG_PROVIDER_ACCESSORS: &[&str] = &["$provide.decorator"];

/// Static class property holding a class's dependency list.
pub const NG_INJECT_PROPERTY: &str = "$inject";

/// A construct that needs (or already has) an explicit dependency list.
#[derive(Debug, Clone)]
pub enum InjectionSite<'t> {
    /// A function/arrow literal to be wrapped in `['a', ..., fn]`.
    BareCallable {
        callable: SyntaxNode<'t>,
        parameters: Vec<&'t str>,
    },
    /// A class whose marked constructor needs a `static $inject` member.
    ClassConstructor {
        class_body: SyntaxNode<'t>,
        first_member: SyntaxNode<'t>,
        parameters: Vec<&'t str>,
    },
    /// An existing `['a', ..., fn]` annotation to re-validate.
    ArrayAnnotation {
        array: SyntaxNode<'t>,
        callable: SyntaxNode<'t>,
        parameters: Vec<&'t str>,
    },
}

impl<'t> InjectionSite<'t> {
    pub fn parameters(&self) -> &[&'t str] {
        match self {
            InjectionSite::BareCallable { parameters, .. }
            | InjectionSite::ClassConstructor { parameters, .. }
            | InjectionSite::ArrayAnnotation { parameters, .. } => parameters,
        }
    }
}

/// Depth-first recognizer over one parse tree.
pub struct Recognizer<'c> {
    config: &'c RecognizerConfig,
}

impl<'c> Recognizer<'c> {
    pub fn new(config: &'c RecognizerConfig) -> Self {
        Self { config }
    }

    /// All injection sites under `root`, in traversal order.
    pub fn recognize<'t>(&self, root: SyntaxNode<'t>) -> Vec<InjectionSite<'t>> {
        let mut sites = Vec::new();
        self.visit(root, &mut sites);
        sites
    }

    fn visit<'t>(&self, node: SyntaxNode<'t>, sites: &mut Vec<InjectionSite<'t>>) {
        if self.is_registration_call(node) {
            self.visit_registration_call(node, sites);
            return;
        }

        match node.kind() {
            kind if kind.is_callable() && self.has_marker_prologue(node.field("body")) => {
                // Elements of an array are handled as annotations, never wrapped again
                if is_array_element(node) {
                    debug!(at = node.start(), "marked callable already inside an array");
                } else {
                    debug!(at = node.start(), "marked callable");
                    sites.push(InjectionSite::BareCallable {
                        callable: node,
                        parameters: parameter_names(node),
                    });
                }
            }
            SyntaxKind::ClassDeclaration => {
                if let Some(site) = self.constructor_site(node) {
                    sites.push(site);
                }
            }
            _ => {}
        }

        self.visit_children(node, sites);
    }

    fn visit_children<'t>(&self, node: SyntaxNode<'t>, sites: &mut Vec<InjectionSite<'t>>) {
        for child in node.children() {
            self.visit(child, sites);
        }
    }

    /// Arguments first, then the callee chain; the call node itself is done.
    fn visit_registration_call<'t>(
        &self,
        call: SyntaxNode<'t>,
        sites: &mut Vec<InjectionSite<'t>>,
    ) {
        let arguments = call
            .field("arguments")
            .map(|arguments| arguments.children())
            .unwrap_or_default();

        for argument in arguments {
            match argument.kind() {
                kind if kind.is_callable() => {
                    debug!(at = argument.start(), "registration callable");
                    sites.push(InjectionSite::BareCallable {
                        callable: argument,
                        parameters: parameter_names(argument),
                    });
                }
                SyntaxKind::ArrayLiteral => match annotated_array(argument) {
                    Some(site) => sites.push(site),
                    None => debug!(at = argument.start(), "array argument is not an annotation"),
                },
                _ => {}
            }
            self.visit_children(argument, sites);
        }

        if let Some(callee) = call.field("function") {
            self.visit_children(callee, sites);
        }
    }

    /// `<chain>.<method>(...)` rooted at the module entry, or a provider accessor call.
    pub fn is_registration_call(&self, node: SyntaxNode<'_>) -> bool {
        if node.kind() != SyntaxKind::CallExpression {
            return false;
        }
        let has_argument_list = node
            .field("arguments")
            .is_some_and(|arguments| arguments.kind() == SyntaxKind::Arguments);
        if !has_argument_list {
            return false;
        }
        let Some(callee) = node.field("function") else {
            return false;
        };
        if callee.kind() != SyntaxKind::MemberExpression {
            return false;
        }
        self.is_registration_access(callee)
            || self
                .config
                .provider_accessors
                .iter()
                .any(|accessor| accessor == callee.text())
    }

    fn is_registration_access(&self, member: SyntaxNode<'_>) -> bool {
        let Some(property) = member.field("property") else {
            return false;
        };
        if !self
            .config
            .registration_methods
            .iter()
            .any(|method| method == property.text())
        {
            return false;
        }
        let Some(receiver) = member.field("object") else {
            return false;
        };
        if receiver.kind() != SyntaxKind::CallExpression {
            return false;
        }
        let Some(receiver_callee) = receiver.field("function") else {
            return false;
        };
        if receiver_callee.kind() != SyntaxKind::MemberExpression {
            return false;
        }
        receiver_callee.text() == self.config.module_entry
            || self.is_registration_access(receiver_callee)
    }

    /// Body is a block whose first statement is exactly the marker string.
    pub fn has_marker_prologue(&self, body: Option<SyntaxNode<'_>>) -> bool {
        let Some(body) = body else {
            return false;
        };
        if body.kind() != SyntaxKind::StatementBlock {
            return false;
        }
        let Some(first) = body.first_child() else {
            return false;
        };
        if first.kind() != SyntaxKind::ExpressionStatement {
            return false;
        }
        first
            .first_child()
            .and_then(|expression| expression.string_value())
            .is_some_and(|value| value == self.config.marker)
    }

    fn constructor_site<'t>(&self, class: SyntaxNode<'t>) -> Option<InjectionSite<'t>> {
        let class_body = class.field("body")?;
        let members = class_body.children();

        let mut has_inject_property = false;
        let mut parameters = None;
        for member in &members {
            match member.kind() {
                SyntaxKind::FieldDefinition
                    if field_name(*member)
                        .is_some_and(|name| name.text() == self.config.inject_property) =>
                {
                    has_inject_property = true;
                }
                SyntaxKind::MethodDefinition
                    if is_constructor(*member) && self.has_marker_prologue(member.field("body")) =>
                {
                    parameters = Some(parameter_names(*member));
                }
                _ => {}
            }
        }

        let parameters = parameters?;
        if has_inject_property {
            debug!(at = class.start(), "class already declares its injection list");
            return None;
        }
        let first_member = *members.first()?;
        debug!(at = class.start(), "marked constructor");
        Some(InjectionSite::ClassConstructor {
            class_body,
            first_member,
            parameters,
        })
    }
}

fn is_constructor(method: SyntaxNode<'_>) -> bool {
    method
        .field("name")
        .is_some_and(|name| name.text() == "constructor")
}

/// TypeScript names the property `name`, JavaScript names it `property`.
fn field_name(field: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    field.field("name").or_else(|| field.field("property"))
}

fn is_array_element(node: SyntaxNode<'_>) -> bool {
    node.parent()
        .is_some_and(|parent| parent.kind() == SyntaxKind::ArrayLiteral)
}

/// `['a', 'b', fn]`: a non-empty array of strings ending in a callable.
fn annotated_array(array: SyntaxNode<'_>) -> Option<InjectionSite<'_>> {
    let elements = array.children();
    let (callable, names) = elements.split_last()?;
    if !callable.kind().is_callable() {
        return None;
    }
    if names
        .iter()
        .any(|element| element.kind() != SyntaxKind::StringLiteral)
    {
        return None;
    }
    Some(InjectionSite::ArrayAnnotation {
        array,
        callable: *callable,
        parameters: parameter_names(*callable),
    })
}
