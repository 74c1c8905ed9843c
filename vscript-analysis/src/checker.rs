//! The type checker.
//!
//! A single top-down pass over a bound tree. The global scope is seeded from
//! the injected [`DocRegistry`], local scopes stack on top of it, and every
//! expression yields a [`SquirrelType`]. Unknowable types widen to `any`,
//! and `any` is exempt from the assignability checks so untyped code stays
//! quiet; diagnostics fire only where a concrete source type contradicts a
//! concrete target type.
//!
//! Messages carry `SQ`-prefixed codes, a byte span and a zero-based
//! line/character location. The entry point [`check_file`] never panics: a
//! failure inside the checker is converted into a single synthetic error
//! spanning the whole file.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

use vscript_parser::ast::{Ast, NodeId, NodeKind, Span};
use vscript_parser::TokenKind;

use crate::docs::{parse_detail, type_from_name, DocRegistry};
use crate::types::{ClassData, SquirrelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageSeverity {
    Error = 1,
    Warning = 2,
    Info = 3,
}

/// Zero-based line and character of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub character: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCheckerMessage {
    pub severity: MessageSeverity,
    pub code: &'static str,
    pub message: String,
    pub location: SourceLocation,
    pub start: usize,
    pub end: usize,
}

pub mod codes {
    pub const CANNOT_FIND_NAME: &str = "SQ2304";
    pub const NOT_ASSIGNABLE: &str = "SQ2322";
    pub const ARGUMENT_NOT_ASSIGNABLE: &str = "SQ2345";
    pub const INVALID_INDEX: &str = "SQ2538";
    pub const WRONG_ARGUMENT_COUNT: &str = "SQ2554";
    pub const CONDITION_NOT_BOOL: &str = "SQ2801";
    pub const UNKNOWN_NET_PROP: &str = "SQ3001";
    pub const NET_PROP_TYPE_MISMATCH: &str = "SQ3002";
    pub const ANNOTATION: &str = "SQ6000";
    pub const CHECKER_FAILED: &str = "SQ9999";
}

/// Checks one source file against the given registry. `text` is the file
/// contents the tree was parsed from; it is only used to map byte offsets to
/// line/character locations.
pub fn check_file(
    file_name: &str,
    text: &str,
    ast: &Ast,
    registry: &DocRegistry,
) -> Vec<TypeCheckerMessage> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut checker = Checker::new(text, ast, registry);
        checker.check_node(ast.root());
        checker.messages
    }));
    outcome.unwrap_or_else(|_| {
        vec![TypeCheckerMessage {
            severity: MessageSeverity::Error,
            code: codes::CHECKER_FAILED,
            message: format!("The type checker failed to process '{file_name}'."),
            location: SourceLocation {
                line: 0,
                character: 0,
            },
            start: 0,
            end: text.len(),
        }]
    })
}

struct Checker<'a> {
    ast: &'a Ast,
    registry: &'a DocRegistry,
    line_starts: Vec<usize>,
    scopes: Vec<HashMap<String, SquirrelType>>,
    /// Declared return type of each enclosing function, innermost last.
    return_types: Vec<Option<SquirrelType>>,
    messages: Vec<TypeCheckerMessage>,
}

impl<'a> Checker<'a> {
    fn new(text: &str, ast: &'a Ast, registry: &'a DocRegistry) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        let mut globals = HashMap::new();
        for name in SquirrelType::BUILTIN_NAMES {
            if let Some(builtin) = SquirrelType::builtin(name) {
                globals.insert(name.to_string(), builtin);
            }
        }
        for (_, doc) in registry.all_docs() {
            if let Some((name, parsed)) = parse_detail(&doc.detail) {
                globals.insert(name, parsed);
            }
        }
        Self {
            ast,
            registry,
            line_starts,
            scopes: vec![globals],
            return_types: Vec::new(),
            messages: Vec::new(),
        }
    }

    fn location(&self, offset: usize) -> SourceLocation {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        SourceLocation {
            line,
            character: offset - self.line_starts[line],
        }
    }

    fn report(&mut self, severity: MessageSeverity, code: &'static str, message: String, span: Span) {
        self.messages.push(TypeCheckerMessage {
            severity,
            code,
            message,
            location: self.location(span.start),
            start: span.start,
            end: span.end,
        });
    }

    fn error(&mut self, code: &'static str, message: String, span: Span) {
        self.report(MessageSeverity::Error, code, message, span);
    }

    fn warning(&mut self, code: &'static str, message: String, span: Span) {
        self.report(MessageSeverity::Warning, code, message, span);
    }

    fn info(&mut self, message: String, span: Span) {
        self.report(MessageSeverity::Info, codes::ANNOTATION, message, span);
    }

    fn declare(&mut self, name: impl Into<String>, declared: SquirrelType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), declared);
        }
    }

    fn lookup(&self, name: &str) -> Option<&SquirrelType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn span(&self, id: NodeId) -> Span {
        self.ast.node(id).span
    }

    /// Identifier or string-literal text of a name node.
    fn name_of(&self, id: NodeId) -> Option<&'a str> {
        match &self.ast.node(id).kind {
            NodeKind::Identifier { value }
            | NodeKind::StringLiteral { value }
            | NodeKind::VerbatimStringLiteral { value } => Some(value),
            NodeKind::ComputedName { expression } => self.name_of(*expression),
            _ => None,
        }
    }

    fn from_annotation(&self, id: NodeId) -> SquirrelType {
        let NodeKind::TypeAnnotation {
            name,
            generic_arguments,
            is_optional,
        } = &self.ast.node(id).kind
        else {
            return SquirrelType::Any;
        };
        let mut arguments = generic_arguments
            .iter()
            .map(|argument| self.from_annotation(*argument));
        let base = match name.as_str() {
            "array" if !generic_arguments.is_empty() => {
                SquirrelType::array(arguments.next().unwrap_or(SquirrelType::Any))
            }
            "table" if !generic_arguments.is_empty() => {
                let key = arguments.next().unwrap_or(SquirrelType::Any);
                let value = arguments.next().unwrap_or(SquirrelType::Any);
                SquirrelType::table(key, value)
            }
            other => match self.lookup(other) {
                Some(found @ SquirrelType::Class(_)) => found.clone(),
                _ => SquirrelType::builtin(other)
                    .unwrap_or_else(|| SquirrelType::named_class(other)),
            },
        };
        if *is_optional {
            SquirrelType::optional(base)
        } else {
            base
        }
    }

    /// Reports unless `source` fits `target`. `any` sources are exempt.
    fn expect_assignable(
        &mut self,
        source: &SquirrelType,
        target: &SquirrelType,
        code: &'static str,
        message: impl FnOnce(&SquirrelType, &SquirrelType) -> String,
        span: Span,
    ) {
        if matches!(source, SquirrelType::Any) {
            return;
        }
        if !source.is_assignable_to(target) {
            let message = message(source, target);
            self.error(code, message, span);
        }
    }

    fn check_condition(&mut self, id: NodeId) {
        let condition = self.check_node(id);
        let boolean = SquirrelType::boolean();
        if !matches!(condition, SquirrelType::Any) && !condition.is_assignable_to(&boolean) {
            let span = self.span(id);
            self.warning(
                codes::CONDITION_NOT_BOOL,
                format!("Condition should be of type 'bool', but got '{condition}'"),
                span,
            );
        }
    }

    fn check_function(
        &mut self,
        name: Option<&str>,
        parameters: &[NodeId],
        return_annotation: Option<NodeId>,
        body: NodeId,
    ) -> SquirrelType {
        let declared_return = return_annotation.map(|annotation| self.from_annotation(annotation));
        if let (Some(name), Some(declared)) = (name, declared_return.as_ref()) {
            if let Some(annotation) = return_annotation {
                let span = self.span(annotation);
                self.info(format!("Function '{name}' returns: {declared}"), span);
            }
        }
        self.scopes.push(HashMap::new());
        let mut parameter_types = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            parameter_types.push(self.check_parameter(*parameter));
        }
        self.return_types.push(declared_return.clone());
        self.check_node(body);
        self.return_types.pop();
        self.scopes.pop();
        SquirrelType::function(parameter_types, declared_return.unwrap_or(SquirrelType::Any))
    }

    fn check_parameter(&mut self, id: NodeId) -> SquirrelType {
        let NodeKind::ParameterDeclaration {
            name,
            type_annotation,
            initialiser,
        } = &self.ast.node(id).kind
        else {
            return SquirrelType::Any;
        };
        let declared = type_annotation
            .map(|annotation| self.from_annotation(annotation))
            .unwrap_or(SquirrelType::Any);
        if let Some(initialiser) = initialiser {
            let initial = self.check_node(*initialiser);
            let span = self.span(*initialiser);
            self.expect_assignable(
                &initial,
                &declared,
                codes::NOT_ASSIGNABLE,
                |s, t| format!("Type '{s}' is not assignable to type '{t}'"),
                span,
            );
        }
        if let Some(parameter_name) = self.name_of(*name).map(str::to_string) {
            if type_annotation.is_some() {
                let span = self.span(*name);
                self.info(format!("Parameter '{parameter_name}': {declared}"), span);
            }
            self.declare(parameter_name, declared.clone());
        }
        declared
    }

    /// Signature of a function-like member from its annotations alone,
    /// without touching its body.
    fn function_signature(
        &self,
        parameters: &[NodeId],
        return_annotation: Option<NodeId>,
    ) -> SquirrelType {
        let parameter_types = parameters
            .iter()
            .map(|parameter| match &self.ast.node(*parameter).kind {
                NodeKind::ParameterDeclaration {
                    type_annotation: Some(annotation),
                    ..
                } => self.from_annotation(*annotation),
                _ => SquirrelType::Any,
            })
            .collect();
        let return_type = return_annotation
            .map(|annotation| self.from_annotation(annotation))
            .unwrap_or(SquirrelType::Any);
        SquirrelType::function(parameter_types, return_type)
    }

    /// Members of a declarative container see each other regardless of
    /// declaration order, so every member name is declared into the
    /// container's scope before any body is checked.
    fn declare_members(&mut self, members: &[NodeId]) {
        for member in members {
            match &self.ast.node(*member).kind {
                NodeKind::MethodDeclaration {
                    name,
                    parameters,
                    return_annotation,
                    ..
                } => {
                    if let Some(method_name) = self.name_of(*name).map(str::to_string) {
                        let signature = self.function_signature(parameters, *return_annotation);
                        self.declare(method_name, signature);
                    }
                }
                NodeKind::ConstructorDeclaration { parameters, .. } => {
                    let signature = self.function_signature(parameters, None);
                    self.declare("constructor", signature);
                }
                NodeKind::PropertyAssignment { name, .. } => {
                    if let Some(property_name) = self.name_of(*name).map(str::to_string) {
                        self.declare(property_name, SquirrelType::Any);
                    }
                }
                _ => {}
            }
        }
    }

    /// Class value type: named, with method and property members and the
    /// base chain resolved through the current scope.
    fn check_class(
        &mut self,
        name: &str,
        extends: Option<NodeId>,
        members: &[NodeId],
    ) -> SquirrelType {
        let mut data = ClassData::new(name);
        if let Some(extends) = extends {
            let base = self.check_node(extends);
            if let SquirrelType::Class(base) = base {
                data.base = Some(Box::new(base));
            }
        }
        self.scopes.push(HashMap::new());
        self.declare_members(members);
        for member in members {
            match &self.ast.node(*member).kind {
                NodeKind::MethodDeclaration {
                    name,
                    parameters,
                    return_annotation,
                    body,
                    ..
                } => {
                    let method_name = self.name_of(*name).map(str::to_string);
                    let method =
                        self.check_function(method_name.as_deref(), parameters, *return_annotation, *body);
                    if let Some(method_name) = method_name {
                        data.members.insert(method_name, method);
                    }
                }
                NodeKind::ConstructorDeclaration { parameters, body } => {
                    let constructor = self.check_function(Some("constructor"), parameters, None, *body);
                    data.members.insert("constructor".to_string(), constructor);
                }
                NodeKind::PropertyAssignment { name, initialiser } => {
                    let property = self.check_node(*initialiser);
                    if let Some(property_name) = self.name_of(*name).map(str::to_string) {
                        self.declare(property_name.clone(), property.clone());
                        data.members.insert(property_name, property);
                    }
                }
                _ => {
                    self.check_node(*member);
                }
            }
        }
        self.scopes.pop();
        SquirrelType::Class(data)
    }

    fn check_call(&mut self, id: NodeId, callee: NodeId, arguments: &[NodeId]) -> SquirrelType {
        let callee_type = self.check_node(callee);
        let argument_types: Vec<SquirrelType> = arguments
            .iter()
            .map(|argument| self.check_node(*argument))
            .collect();
        self.check_net_props(callee, arguments, &argument_types);
        match callee_type {
            SquirrelType::Function {
                parameters,
                return_type,
            } => {
                if parameters.len() != arguments.len() {
                    let span = self.span(id);
                    self.error(
                        codes::WRONG_ARGUMENT_COUNT,
                        format!(
                            "Expected {} arguments, but got {}",
                            parameters.len(),
                            arguments.len()
                        ),
                        span,
                    );
                }
                for ((argument, argument_type), parameter) in
                    arguments.iter().zip(&argument_types).zip(&parameters)
                {
                    let span = self.span(*argument);
                    self.expect_assignable(
                        argument_type,
                        parameter,
                        codes::ARGUMENT_NOT_ASSIGNABLE,
                        |s, t| {
                            format!(
                                "Argument of type '{s}' is not assignable to parameter of type '{t}'"
                            )
                        },
                        span,
                    );
                }
                *return_type
            }
            // Calling a class value constructs an instance of it.
            class @ SquirrelType::Class(_) => class,
            _ => SquirrelType::Any,
        }
    }

    /// NetProp accessor validation: the property-name argument of a
    /// `GetProp*`/`SetProp*` call must name a registered property whose type
    /// agrees with the accessor suffix, and `SetProp*` values must fit it.
    fn check_net_props(
        &mut self,
        callee: NodeId,
        arguments: &[NodeId],
        argument_types: &[SquirrelType],
    ) {
        let NodeKind::PropertyAccessExpression { name, .. } = &self.ast.node(callee).kind else {
            return;
        };
        let Some(method) = self.name_of(*name) else {
            return;
        };
        if method == "GetTable" {
            return;
        }
        let Some(suffix) = method
            .strip_prefix("GetProp")
            .or_else(|| method.strip_prefix("SetProp"))
        else {
            return;
        };
        let Some(property_node) = arguments.get(1).copied() else {
            return;
        };
        let NodeKind::StringLiteral { value: property } = &self.ast.node(property_node).kind else {
            return;
        };
        let Some(registered) = self.registry.net_prop_type(property) else {
            let property = property.clone();
            let span = self.span(property_node);
            self.warning(
                codes::UNKNOWN_NET_PROP,
                format!("Unknown NetProp '{property}'"),
                span,
            );
            return;
        };
        let registered = type_from_name(registered);
        let Some(expected) = net_prop_suffix_type(suffix) else {
            return;
        };
        if registered != expected {
            let property = property.clone();
            let span = self.span(property_node);
            self.error(
                codes::NET_PROP_TYPE_MISMATCH,
                format!("NetProp '{property}' expects a value of type '{registered}'"),
                span,
            );
        } else if method.starts_with("SetProp") {
            if let (Some(value_node), Some(value_type)) = (arguments.get(2), argument_types.get(2))
            {
                if !matches!(value_type, SquirrelType::Any)
                    && !value_type.is_assignable_to(&registered)
                {
                    let property = property.clone();
                    let span = self.span(*value_node);
                    self.error(
                        codes::NET_PROP_TYPE_MISMATCH,
                        format!("NetProp '{property}' expects a value of type '{registered}'"),
                        span,
                    );
                }
            }
        }
    }

    fn check_element_access(&mut self, object: NodeId, index: NodeId) -> SquirrelType {
        let object_type = self.check_node(object);
        let index_type = self.check_node(index);
        match object_type {
            SquirrelType::Array(element) => {
                if !matches!(index_type, SquirrelType::Any)
                    && !index_type.is_assignable_to(&SquirrelType::int())
                {
                    let span = self.span(index);
                    self.error(
                        codes::INVALID_INDEX,
                        format!("Array index must be of type 'int', but got '{index_type}'"),
                        span,
                    );
                }
                *element
            }
            SquirrelType::Table { key, value } => {
                if !matches!(index_type, SquirrelType::Any) && !index_type.is_assignable_to(&key) {
                    let span = self.span(index);
                    self.error(
                        codes::INVALID_INDEX,
                        format!("Table key must be of type '{key}', but got '{index_type}'"),
                        span,
                    );
                }
                *value
            }
            _ => SquirrelType::Any,
        }
    }

    fn check_property_access(&mut self, object: NodeId, name: NodeId) -> SquirrelType {
        let object_type = self.check_node(object);
        let Some(member) = self.name_of(name) else {
            return SquirrelType::Any;
        };
        match &object_type {
            SquirrelType::Class(class) => {
                let mut current = Some(class);
                while let Some(class) = current {
                    if let Some(found) = class.members.get(member) {
                        return found.clone();
                    }
                    current = class.base.as_deref();
                }
                self.method_doc_type(member)
            }
            SquirrelType::Table { value, .. } => value.as_ref().clone(),
            _ => self.method_doc_type(member),
        }
    }

    /// Type of a documented native method, for receivers the scope cannot
    /// explain further.
    fn method_doc_type(&self, member: &str) -> SquirrelType {
        self.registry
            .methods
            .get(member)
            .and_then(|doc| parse_detail(&doc.detail))
            .map(|(_, parsed)| parsed)
            .unwrap_or(SquirrelType::Any)
    }

    fn check_binary(&mut self, left: NodeId, operator: TokenKind, right: NodeId) -> SquirrelType {
        if operator == TokenKind::NewSlot {
            let slot_type = self.check_node(right);
            // Names declared with `<-` become visible file-wide.
            if let NodeKind::PropertyAccessExpression { name, .. }
            | NodeKind::RootAccessExpression { name } = &self.ast.node(left).kind
            {
                if let Some(slot_name) = self.name_of(*name).map(str::to_string) {
                    if let Some(scope) = self.scopes.first_mut() {
                        scope.insert(slot_name, slot_type.clone());
                    }
                }
            } else if let Some(slot_name) = self.name_of(left).map(str::to_string) {
                if let Some(scope) = self.scopes.first_mut() {
                    scope.insert(slot_name, slot_type.clone());
                }
            }
            return slot_type;
        }
        // Assigning a function or class expression to a bare name defines
        // that name, like `<-` does; there is nothing to look up yet.
        if operator == TokenKind::Assign {
            if let (
                NodeKind::Identifier { value },
                NodeKind::FunctionExpression { .. }
                | NodeKind::LambdaExpression { .. }
                | NodeKind::ClassExpression { .. },
            ) = (&self.ast.node(left).kind, &self.ast.node(right).kind)
            {
                let name = value.clone();
                let defined = self.check_node(right);
                self.declare(name, defined.clone());
                return defined;
            }
        }
        let left_type = self.check_node(left);
        let right_type = self.check_node(right);
        match operator {
            TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::AsteriskAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign => {
                let span = self.span(right);
                self.expect_assignable(
                    &right_type,
                    &left_type,
                    codes::NOT_ASSIGNABLE,
                    |s, t| format!("Type '{s}' is not assignable to type '{t}'"),
                    span,
                );
                left_type
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Percent => arithmetic_type(&left_type, &right_type),
            TokenKind::Equals
            | TokenKind::NotEquals
            | TokenKind::Less
            | TokenKind::LessEquals
            | TokenKind::Greater
            | TokenKind::GreaterEquals
            | TokenKind::AmpersandAmpersand
            | TokenKind::PipePipe
            | TokenKind::InKeyword
            | TokenKind::InstanceOfKeyword => SquirrelType::boolean(),
            TokenKind::ThreeWayCompare
            | TokenKind::Ampersand
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::ShiftLeft
            | TokenKind::ShiftRight
            | TokenKind::UnsignedShiftRight => SquirrelType::int(),
            _ => SquirrelType::Any,
        }
    }

    fn check_node(&mut self, id: NodeId) -> SquirrelType {
        let ast = self.ast;
        match &ast.node(id).kind {
            NodeKind::SourceFile { statements } => {
                for statement in statements {
                    self.check_node(*statement);
                }
                SquirrelType::Null
            }
            NodeKind::Block { statements } => {
                self.scopes.push(HashMap::new());
                for statement in statements {
                    self.check_node(*statement);
                }
                self.scopes.pop();
                SquirrelType::Null
            }
            NodeKind::ExpressionStatement { expression } => {
                self.check_node(*expression);
                SquirrelType::Null
            }
            NodeKind::LocalStatement { declarations } => {
                for declaration in declarations {
                    self.check_node(*declaration);
                }
                SquirrelType::Null
            }
            NodeKind::VariableDeclaration {
                name,
                type_annotation,
                initialiser,
            } => {
                let declared = type_annotation.map(|annotation| self.from_annotation(annotation));
                let initial = initialiser.map(|initialiser| {
                    let initial = self.check_node(initialiser);
                    if let Some(declared) = declared.as_ref() {
                        let span = self.span(initialiser);
                        self.expect_assignable(
                            &initial,
                            declared,
                            codes::NOT_ASSIGNABLE,
                            |s, t| format!("Type '{s}' is not assignable to type '{t}'"),
                            span,
                        );
                    }
                    initial
                });
                let variable_type = declared
                    .clone()
                    .or(initial)
                    .unwrap_or(SquirrelType::Any);
                if let Some(variable_name) = self.name_of(*name).map(str::to_string) {
                    if let Some(declared) = declared.as_ref() {
                        let span = self.span(*name);
                        self.info(
                            format!("Variable '{variable_name}' declared with type: {declared}"),
                            span,
                        );
                    }
                    self.declare(variable_name, variable_type);
                }
                SquirrelType::Null
            }
            NodeKind::ConstStatement { name, initialiser } => {
                let constant = self.check_node(*initialiser);
                if let Some(constant_name) = self.name_of(*name).map(str::to_string) {
                    self.declare(constant_name, constant);
                }
                SquirrelType::Null
            }
            NodeKind::FunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                let function_name = name.and_then(|n| self.name_of(n)).map(str::to_string);
                let function =
                    self.check_function(function_name.as_deref(), parameters, *return_annotation, *body);
                if let Some(function_name) = function_name {
                    self.declare(function_name, function);
                }
                SquirrelType::Null
            }
            NodeKind::LocalFunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                let function_name = self.name_of(*name).map(str::to_string);
                let function =
                    self.check_function(function_name.as_deref(), parameters, *return_annotation, *body);
                if let Some(function_name) = function_name {
                    self.declare(function_name, function);
                }
                SquirrelType::Null
            }
            NodeKind::FunctionExpression {
                parameters,
                return_annotation,
                body,
            } => self.check_function(None, parameters, *return_annotation, *body),
            NodeKind::LambdaExpression {
                parameters,
                expression,
            } => {
                self.scopes.push(HashMap::new());
                let mut parameter_types = Vec::with_capacity(parameters.len());
                for parameter in parameters {
                    parameter_types.push(self.check_parameter(*parameter));
                }
                let result = self.check_node(*expression);
                self.scopes.pop();
                SquirrelType::function(parameter_types, result)
            }
            NodeKind::ClassDeclaration {
                name,
                extends,
                members,
            } => {
                let class_name = name
                    .and_then(|n| self.name_of(n))
                    .map(str::to_string)
                    .unwrap_or_else(|| "<anonymous>".to_string());
                let class = self.check_class(&class_name, *extends, members);
                if let Some(name) = name {
                    let span = self.span(*name);
                    self.info(format!("Class '{class_name}' defined"), span);
                }
                self.declare(class_name, class);
                SquirrelType::Null
            }
            NodeKind::ClassExpression { extends, members } => {
                self.check_class("<anonymous>", *extends, members)
            }
            NodeKind::MethodDeclaration {
                name,
                parameters,
                return_annotation,
                body,
                ..
            } => {
                // Outside a class body; still check it.
                let method_name = self.name_of(*name).map(str::to_string);
                self.check_function(method_name.as_deref(), parameters, *return_annotation, *body)
            }
            NodeKind::ConstructorDeclaration { parameters, body } => {
                self.check_function(Some("constructor"), parameters, None, *body)
            }
            NodeKind::ParameterDeclaration { .. } => self.check_parameter(id),
            NodeKind::PropertyAssignment { name, initialiser } => {
                let property = self.check_node(*initialiser);
                if let Some(property_name) = self.name_of(*name).map(str::to_string) {
                    self.declare(property_name, property);
                }
                SquirrelType::Null
            }
            NodeKind::EnumDeclaration { name, members } => {
                for member in members {
                    if let NodeKind::EnumMember {
                        initialiser: Some(initialiser),
                        ..
                    } = &ast.node(*member).kind
                    {
                        self.check_node(*initialiser);
                    }
                }
                if let Some(enum_name) = self.name_of(*name).map(str::to_string) {
                    self.declare(
                        enum_name,
                        SquirrelType::table(SquirrelType::string(), SquirrelType::int()),
                    );
                }
                SquirrelType::Null
            }
            NodeKind::EnumMember { .. } => SquirrelType::int(),
            NodeKind::TableLiteralExpression { members } => {
                self.scopes.push(HashMap::new());
                self.declare_members(members);
                for member in members {
                    self.check_node(*member);
                }
                self.scopes.pop();
                if members.is_empty() {
                    SquirrelType::table(SquirrelType::Any, SquirrelType::Any)
                } else {
                    SquirrelType::table(SquirrelType::string(), SquirrelType::Any)
                }
            }
            NodeKind::ArrayLiteralExpression { elements } => {
                let mut inferred: Option<SquirrelType> = None;
                for element in elements {
                    let element_type = self.check_node(*element);
                    match inferred.as_ref() {
                        None => inferred = Some(element_type),
                        Some(expected) => {
                            if !matches!(element_type, SquirrelType::Any)
                                && !element_type.is_assignable_to(expected)
                            {
                                let span = self.span(*element);
                                let expected = expected.clone();
                                self.error(
                                    codes::NOT_ASSIGNABLE,
                                    format!(
                                        "Array element type '{element_type}' is not assignable to inferred type '{expected}'"
                                    ),
                                    span,
                                );
                            }
                        }
                    }
                }
                SquirrelType::array(inferred.unwrap_or(SquirrelType::Any))
            }
            NodeKind::Identifier { value } => match self.lookup(value) {
                Some(found) => found.clone(),
                None => {
                    let value = value.clone();
                    let span = self.span(id);
                    self.error(
                        codes::CANNOT_FIND_NAME,
                        format!("Cannot find name '{value}'"),
                        span,
                    );
                    SquirrelType::Any
                }
            },
            NodeKind::StringLiteral { .. } | NodeKind::VerbatimStringLiteral { .. } => {
                SquirrelType::string()
            }
            NodeKind::IntegerLiteral { .. } => SquirrelType::int(),
            NodeKind::FloatLiteral { .. } => SquirrelType::float(),
            NodeKind::TrueLiteral | NodeKind::FalseLiteral => SquirrelType::boolean(),
            NodeKind::NullLiteral => SquirrelType::Null,
            NodeKind::ThisExpression => self
                .lookup("self")
                .cloned()
                .unwrap_or_else(|| SquirrelType::named_class("instance")),
            NodeKind::BaseExpression => SquirrelType::Any,
            NodeKind::RootAccessExpression { name } => {
                let Some(root_name) = self.name_of(*name) else {
                    return SquirrelType::Any;
                };
                self.lookup(root_name).cloned().unwrap_or(SquirrelType::Any)
            }
            NodeKind::ComputedName { expression } => self.check_node(*expression),
            NodeKind::BinaryExpression {
                left,
                operator,
                right,
            } => self.check_binary(*left, *operator, *right),
            NodeKind::PrefixUnaryExpression { operator, operand } => {
                let operand_type = self.check_node(*operand);
                match operator {
                    TokenKind::Exclamation => SquirrelType::boolean(),
                    TokenKind::Tilde => SquirrelType::int(),
                    _ => operand_type,
                }
            }
            NodeKind::PostfixUnaryExpression { operand, .. } => self.check_node(*operand),
            NodeKind::ConditionalExpression {
                condition,
                when_true,
                when_false,
            } => {
                self.check_condition(*condition);
                let when_true = self.check_node(*when_true);
                let when_false = self.check_node(*when_false);
                SquirrelType::union(vec![when_true, when_false])
            }
            NodeKind::CallExpression { callee, arguments } => {
                self.check_call(id, *callee, arguments)
            }
            NodeKind::PropertyAccessExpression { object, name } => {
                self.check_property_access(*object, *name)
            }
            NodeKind::ElementAccessExpression { object, index } => {
                self.check_element_access(*object, *index)
            }
            NodeKind::ParenthesisedExpression { expression } => self.check_node(*expression),
            NodeKind::TypeAnnotation { .. } => self.from_annotation(id),
            NodeKind::ReturnStatement { expression } => {
                let returned = expression
                    .map(|expression| self.check_node(expression))
                    .unwrap_or(SquirrelType::Null);
                if let Some(Some(declared)) = self.return_types.last().cloned() {
                    let span = expression.map(|e| self.span(e)).unwrap_or(self.span(id));
                    self.expect_assignable(
                        &returned,
                        &declared,
                        codes::NOT_ASSIGNABLE,
                        |s, t| format!("Type '{s}' is not assignable to type '{t}'"),
                        span,
                    );
                }
                SquirrelType::Null
            }
            NodeKind::YieldStatement { expression } => {
                if let Some(expression) = expression {
                    self.check_node(*expression);
                }
                SquirrelType::Null
            }
            NodeKind::ThrowStatement { expression } => {
                self.check_node(*expression);
                SquirrelType::Null
            }
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(*condition);
                self.check_node(*then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_node(*else_branch);
                }
                SquirrelType::Null
            }
            NodeKind::WhileStatement { condition, body } => {
                self.check_condition(*condition);
                self.check_node(*body);
                SquirrelType::Null
            }
            NodeKind::DoWhileStatement { body, condition } => {
                self.check_node(*body);
                self.check_condition(*condition);
                SquirrelType::Null
            }
            NodeKind::ForStatement {
                initialiser,
                condition,
                increment,
                body,
            } => {
                self.scopes.push(HashMap::new());
                if let Some(initialiser) = initialiser {
                    self.check_node(*initialiser);
                }
                if let Some(condition) = condition {
                    self.check_condition(*condition);
                }
                if let Some(increment) = increment {
                    self.check_node(*increment);
                }
                self.check_node(*body);
                self.scopes.pop();
                SquirrelType::Null
            }
            NodeKind::ForEachStatement {
                index,
                value,
                iterable,
                body,
            } => {
                let iterable_type = self.check_node(*iterable);
                let (index_type, value_type) = match iterable_type {
                    SquirrelType::Array(element) => (SquirrelType::int(), *element),
                    SquirrelType::Table { value, .. } => (SquirrelType::int(), *value),
                    SquirrelType::Primitive(p) if p == crate::types::Primitive::String => {
                        (SquirrelType::int(), SquirrelType::character())
                    }
                    _ => (SquirrelType::int(), SquirrelType::Any),
                };
                self.scopes.push(HashMap::new());
                if let Some(index) = index {
                    if let Some(index_name) = self.name_of(*index).map(str::to_string) {
                        self.declare(index_name, index_type);
                    }
                }
                if let Some(value_name) = self.name_of(*value).map(str::to_string) {
                    self.declare(value_name, value_type);
                }
                self.check_node(*body);
                self.scopes.pop();
                SquirrelType::Null
            }
            NodeKind::SwitchStatement { expression, cases } => {
                self.check_node(*expression);
                self.check_node(*cases);
                SquirrelType::Null
            }
            NodeKind::CaseBlock { clauses } => {
                self.scopes.push(HashMap::new());
                for clause in clauses {
                    self.check_node(*clause);
                }
                self.scopes.pop();
                SquirrelType::Null
            }
            NodeKind::CaseClause {
                expression,
                statements,
            } => {
                self.check_node(*expression);
                for statement in statements {
                    self.check_node(*statement);
                }
                SquirrelType::Null
            }
            NodeKind::DefaultClause { statements } => {
                for statement in statements {
                    self.check_node(*statement);
                }
                SquirrelType::Null
            }
            NodeKind::TryStatement { body, catch } => {
                self.check_node(*body);
                self.check_node(*catch);
                SquirrelType::Null
            }
            NodeKind::CatchClause { variable, body } => {
                self.scopes.push(HashMap::new());
                if let Some(variable_name) = self.name_of(*variable).map(str::to_string) {
                    self.declare(variable_name, SquirrelType::Any);
                }
                self.check_node(*body);
                self.scopes.pop();
                SquirrelType::Null
            }
            NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::EmptyStatement => SquirrelType::Null,
            NodeKind::DeleteExpression { operand } | NodeKind::CloneExpression { operand } => {
                self.check_node(*operand)
            }
            NodeKind::TypeOfExpression { operand } => {
                self.check_node(*operand);
                SquirrelType::string()
            }
            NodeKind::ResumeExpression { operand } => {
                self.check_node(*operand);
                SquirrelType::Any
            }
            NodeKind::Missing => SquirrelType::Any,
        }
    }
}

/// Result type of `+ - * / %`. A string operand promotes the whole
/// expression to string, as the runtime concatenates via `tostring`.
fn arithmetic_type(left: &SquirrelType, right: &SquirrelType) -> SquirrelType {
    let int = SquirrelType::int();
    let float = SquirrelType::float();
    if *left == SquirrelType::string() || *right == SquirrelType::string() {
        SquirrelType::string()
    } else if *left == int && *right == int {
        int
    } else if (*left == int || *left == float) && (*right == int || *right == float) {
        float
    } else {
        SquirrelType::Any
    }
}

/// Value type implied by a `GetProp`/`SetProp` accessor suffix, when it has
/// one. Array accessors expect the element type.
fn net_prop_suffix_type(suffix: &str) -> Option<SquirrelType> {
    let base = suffix.strip_suffix("Array").unwrap_or(suffix);
    Some(match base {
        "Int" => SquirrelType::int(),
        "Float" => SquirrelType::float(),
        "Bool" => SquirrelType::boolean(),
        "String" => SquirrelType::string(),
        "Entity" => SquirrelType::named_class("instance"),
        "Vector" => SquirrelType::named_class("Vector"),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscript_parser::ast::AstBuilder;

    fn identifier(builder: &mut AstBuilder, value: &str, start: usize) -> NodeId {
        builder.add(
            NodeKind::Identifier {
                value: value.to_string(),
            },
            Span::new(start, start + value.len()),
        )
    }

    fn source_file(builder: AstBuilder, statements: Vec<NodeId>) -> Ast {
        let mut builder = builder;
        let root = builder.add(NodeKind::SourceFile { statements }, Span::default());
        builder.finish(root)
    }

    fn errors(messages: &[TypeCheckerMessage]) -> Vec<&TypeCheckerMessage> {
        messages
            .iter()
            .filter(|m| m.severity == MessageSeverity::Error)
            .collect()
    }

    #[test]
    fn test_cannot_find_name() {
        let mut builder = AstBuilder::new();
        let unknown = identifier(&mut builder, "x", 8);
        let statement = builder.add(
            NodeKind::ExpressionStatement {
                expression: unknown,
            },
            Span::new(8, 9),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "local y\nx", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Cannot find name 'x'");
        assert_eq!(messages[0].code, codes::CANNOT_FIND_NAME);
        assert_eq!(messages[0].severity, MessageSeverity::Error);
        assert_eq!(messages[0].location, SourceLocation { line: 1, character: 0 });
        assert_eq!((messages[0].start, messages[0].end), (8, 9));
    }

    #[test]
    fn test_annotated_local_mismatch() {
        // local x : int = "five"
        let mut builder = AstBuilder::new();
        let name = identifier(&mut builder, "x", 6);
        let annotation = builder.add(
            NodeKind::TypeAnnotation {
                name: "int".to_string(),
                generic_arguments: vec![],
                is_optional: false,
            },
            Span::new(10, 13),
        );
        let initialiser = builder.add(
            NodeKind::StringLiteral {
                value: "five".to_string(),
            },
            Span::new(16, 22),
        );
        let declaration = builder.add(
            NodeKind::VariableDeclaration {
                name,
                type_annotation: Some(annotation),
                initialiser: Some(initialiser),
            },
            Span::new(6, 22),
        );
        let statement = builder.add(
            NodeKind::LocalStatement {
                declarations: vec![declaration],
            },
            Span::new(0, 22),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "local x : int = \"five\"", &ast, DocRegistry::builtin());
        let errors = errors(&messages);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Type 'string' is not assignable to type 'int'"
        );
        assert_eq!((errors[0].start, errors[0].end), (16, 22));
        assert!(messages.iter().any(|m| {
            m.severity == MessageSeverity::Info
                && m.message == "Variable 'x' declared with type: int"
        }));
    }

    #[test]
    fn test_wrong_argument_count() {
        // printl()
        let mut builder = AstBuilder::new();
        let callee = identifier(&mut builder, "printl", 0);
        let call = builder.add(
            NodeKind::CallExpression {
                callee,
                arguments: vec![],
            },
            Span::new(0, 8),
        );
        let statement = builder.add(
            NodeKind::ExpressionStatement { expression: call },
            Span::new(0, 8),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "printl()", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Expected 1 arguments, but got 0");
        assert_eq!(messages[0].code, codes::WRONG_ARGUMENT_COUNT);
    }

    #[test]
    fn test_argument_type_mismatch() {
        // printl(5)
        let mut builder = AstBuilder::new();
        let callee = identifier(&mut builder, "printl", 0);
        let argument = builder.add(
            NodeKind::IntegerLiteral {
                value: "5".to_string(),
            },
            Span::new(7, 8),
        );
        let call = builder.add(
            NodeKind::CallExpression {
                callee,
                arguments: vec![argument],
            },
            Span::new(0, 9),
        );
        let statement = builder.add(
            NodeKind::ExpressionStatement { expression: call },
            Span::new(0, 9),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "printl(5)", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].message,
            "Argument of type 'int' is not assignable to parameter of type 'string'"
        );
        assert_eq!((messages[0].start, messages[0].end), (7, 8));
    }

    fn net_prop_call(method: &str, property: &str, value: Option<NodeKind>) -> Ast {
        let mut builder = AstBuilder::new();
        let object = identifier(&mut builder, "NetProps", 0);
        let name = identifier(&mut builder, method, 9);
        let callee = builder.add(
            NodeKind::PropertyAccessExpression { object, name },
            Span::new(0, 9 + method.len()),
        );
        let entity = identifier(&mut builder, "self", 20);
        let property = builder.add(
            NodeKind::StringLiteral {
                value: property.to_string(),
            },
            Span::new(26, 26 + property.len() + 2),
        );
        let mut arguments = vec![entity, property];
        if let Some(value) = value {
            arguments.push(builder.add(value, Span::new(50, 51)));
        }
        let call = builder.add(
            NodeKind::CallExpression { callee, arguments },
            Span::new(0, 52),
        );
        let statement = builder.add(
            NodeKind::ExpressionStatement { expression: call },
            Span::new(0, 52),
        );
        source_file(builder, vec![statement])
    }

    #[test]
    fn test_unknown_net_prop() {
        let ast = net_prop_call(
            "SetPropInt",
            "m_iDoesNotExist",
            Some(NodeKind::IntegerLiteral {
                value: "5".to_string(),
            }),
        );
        let messages = check_file("test.nut", "", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, MessageSeverity::Warning);
        assert_eq!(messages[0].code, codes::UNKNOWN_NET_PROP);
        assert_eq!(messages[0].message, "Unknown NetProp 'm_iDoesNotExist'");
    }

    #[test]
    fn test_net_prop_suffix_mismatch() {
        let ast = net_prop_call(
            "SetPropInt",
            "m_flModelScale",
            Some(NodeKind::IntegerLiteral {
                value: "5".to_string(),
            }),
        );
        let messages = check_file("test.nut", "", &ast, DocRegistry::builtin());
        let errors = errors(&messages);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::NET_PROP_TYPE_MISMATCH);
        assert_eq!(
            errors[0].message,
            "NetProp 'm_flModelScale' expects a value of type 'float'"
        );
    }

    #[test]
    fn test_net_prop_value_mismatch() {
        let ast = net_prop_call(
            "SetPropInt",
            "m_iHealth",
            Some(NodeKind::StringLiteral {
                value: "full".to_string(),
            }),
        );
        let messages = check_file("test.nut", "", &ast, DocRegistry::builtin());
        assert!(messages.iter().any(|m| {
            m.code == codes::NET_PROP_TYPE_MISMATCH
                && m.message == "NetProp 'm_iHealth' expects a value of type 'int'"
        }));
    }

    #[test]
    fn test_net_prop_well_typed_call_is_quiet() {
        let ast = net_prop_call(
            "SetPropInt",
            "m_iHealth",
            Some(NodeKind::IntegerLiteral {
                value: "100".to_string(),
            }),
        );
        let messages = check_file("test.nut", "", &ast, DocRegistry::builtin());
        assert!(errors(&messages).is_empty(), "{messages:?}");
    }

    #[test]
    fn test_condition_warning() {
        // if (5) {}
        let mut builder = AstBuilder::new();
        let condition = builder.add(
            NodeKind::IntegerLiteral {
                value: "5".to_string(),
            },
            Span::new(4, 5),
        );
        let body = builder.add(NodeKind::Block { statements: vec![] }, Span::new(7, 9));
        let statement = builder.add(
            NodeKind::IfStatement {
                condition,
                then_branch: body,
                else_branch: None,
            },
            Span::new(0, 9),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "if (5) {}", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, MessageSeverity::Warning);
        assert_eq!(
            messages[0].message,
            "Condition should be of type 'bool', but got 'int'"
        );
    }

    #[test]
    fn test_array_element_inference() {
        // [1, "a"]
        let mut builder = AstBuilder::new();
        let first = builder.add(
            NodeKind::IntegerLiteral {
                value: "1".to_string(),
            },
            Span::new(1, 2),
        );
        let second = builder.add(
            NodeKind::StringLiteral {
                value: "a".to_string(),
            },
            Span::new(4, 7),
        );
        let array = builder.add(
            NodeKind::ArrayLiteralExpression {
                elements: vec![first, second],
            },
            Span::new(0, 8),
        );
        let statement = builder.add(
            NodeKind::ExpressionStatement { expression: array },
            Span::new(0, 8),
        );
        let ast = source_file(builder, vec![statement]);

        let messages = check_file("test.nut", "[1, \"a\"]", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].message,
            "Array element type 'string' is not assignable to inferred type 'int'"
        );
        assert_eq!((messages[0].start, messages[0].end), (4, 7));
    }

    #[test]
    fn test_array_index_must_be_int() {
        // local a = [1]; a["x"]
        let mut builder = AstBuilder::new();
        let name = identifier(&mut builder, "a", 6);
        let element = builder.add(
            NodeKind::IntegerLiteral {
                value: "1".to_string(),
            },
            Span::new(11, 12),
        );
        let array = builder.add(
            NodeKind::ArrayLiteralExpression {
                elements: vec![element],
            },
            Span::new(10, 13),
        );
        let declaration = builder.add(
            NodeKind::VariableDeclaration {
                name,
                type_annotation: None,
                initialiser: Some(array),
            },
            Span::new(6, 13),
        );
        let local = builder.add(
            NodeKind::LocalStatement {
                declarations: vec![declaration],
            },
            Span::new(0, 13),
        );
        let object = identifier(&mut builder, "a", 15);
        let index = builder.add(
            NodeKind::StringLiteral {
                value: "x".to_string(),
            },
            Span::new(17, 20),
        );
        let access = builder.add(
            NodeKind::ElementAccessExpression { object, index },
            Span::new(15, 21),
        );
        let statement = builder.add(
            NodeKind::ExpressionStatement { expression: access },
            Span::new(15, 21),
        );
        let ast = source_file(builder, vec![local, statement]);

        let messages = check_file("test.nut", "local a = [1]; a[\"x\"]", &ast, DocRegistry::builtin());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, codes::INVALID_INDEX);
        assert_eq!(
            messages[0].message,
            "Array index must be of type 'int', but got 'string'"
        );
    }

    #[test]
    fn test_registry_substitution() {
        let registry = DocRegistry::from_json(
            r#"{ "functions": { "Only": { "detail": "Only() -> null" } } }"#,
        )
        .unwrap();
        let mut builder = AstBuilder::new();
        let known = identifier(&mut builder, "Only", 0);
        let unknown = identifier(&mut builder, "printl", 5);
        let first = builder.add(
            NodeKind::ExpressionStatement { expression: known },
            Span::new(0, 4),
        );
        let second = builder.add(
            NodeKind::ExpressionStatement {
                expression: unknown,
            },
            Span::new(5, 11),
        );
        let ast = source_file(builder, vec![first, second]);

        let messages = check_file("test.nut", "Only printl", &ast, &registry);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Cannot find name 'printl'");
    }

    #[test]
    fn test_class_methods_see_their_siblings() {
        // class Foo { function a() {} function b() { a() } }
        let mut builder = AstBuilder::new();
        let class_name = identifier(&mut builder, "Foo", 6);

        let a_name = identifier(&mut builder, "a", 21);
        let a_body = builder.add(NodeKind::Block { statements: vec![] }, Span::new(25, 27));
        let a_method = builder.add(
            NodeKind::MethodDeclaration {
                name: a_name,
                parameters: vec![],
                return_annotation: None,
                body: a_body,
                is_static: false,
            },
            Span::new(12, 27),
        );

        let b_name = identifier(&mut builder, "b", 37);
        let call_target = identifier(&mut builder, "a", 43);
        let call = builder.add(
            NodeKind::CallExpression {
                callee: call_target,
                arguments: vec![],
            },
            Span::new(43, 46),
        );
        let call_statement = builder.add(
            NodeKind::ExpressionStatement { expression: call },
            Span::new(43, 46),
        );
        let b_body = builder.add(
            NodeKind::Block {
                statements: vec![call_statement],
            },
            Span::new(41, 48),
        );
        let b_method = builder.add(
            NodeKind::MethodDeclaration {
                name: b_name,
                parameters: vec![],
                return_annotation: None,
                body: b_body,
                is_static: false,
            },
            Span::new(28, 48),
        );

        let class = builder.add(
            NodeKind::ClassDeclaration {
                name: Some(class_name),
                extends: None,
                members: vec![a_method, b_method],
            },
            Span::new(0, 50),
        );
        let ast = source_file(builder, vec![class]);

        let messages = check_file(
            "test.nut",
            "class Foo { function a() {} function b() { a() } }",
            &ast,
            DocRegistry::builtin(),
        );
        assert!(errors(&messages).is_empty(), "{messages:?}");
    }

    #[test]
    fn test_table_properties_see_their_siblings() {
        // local t = { a = 1, b = a }
        let mut builder = AstBuilder::new();
        let variable = identifier(&mut builder, "t", 6);
        let a_name = identifier(&mut builder, "a", 12);
        let a_value = builder.add(
            NodeKind::IntegerLiteral {
                value: "1".to_string(),
            },
            Span::new(16, 17),
        );
        let a_property = builder.add(
            NodeKind::PropertyAssignment {
                name: a_name,
                initialiser: a_value,
            },
            Span::new(12, 17),
        );
        let b_name = identifier(&mut builder, "b", 19);
        let b_value = identifier(&mut builder, "a", 23);
        let b_property = builder.add(
            NodeKind::PropertyAssignment {
                name: b_name,
                initialiser: b_value,
            },
            Span::new(19, 24),
        );
        let table = builder.add(
            NodeKind::TableLiteralExpression {
                members: vec![a_property, b_property],
            },
            Span::new(10, 26),
        );
        let declaration = builder.add(
            NodeKind::VariableDeclaration {
                name: variable,
                type_annotation: None,
                initialiser: Some(table),
            },
            Span::new(6, 26),
        );
        let local = builder.add(
            NodeKind::LocalStatement {
                declarations: vec![declaration],
            },
            Span::new(0, 26),
        );
        let ast = source_file(builder, vec![local]);

        let messages = check_file("test.nut", "local t = { a = 1, b = a }", &ast, DocRegistry::builtin());
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn test_assigning_function_expression_defines_the_name() {
        // f = function() {}; f()
        let mut builder = AstBuilder::new();
        let target = identifier(&mut builder, "f", 0);
        let body = builder.add(NodeKind::Block { statements: vec![] }, Span::new(15, 17));
        let function = builder.add(
            NodeKind::FunctionExpression {
                parameters: vec![],
                return_annotation: None,
                body,
            },
            Span::new(4, 17),
        );
        let assignment = builder.add(
            NodeKind::BinaryExpression {
                left: target,
                operator: TokenKind::Assign,
                right: function,
            },
            Span::new(0, 17),
        );
        let first = builder.add(
            NodeKind::ExpressionStatement {
                expression: assignment,
            },
            Span::new(0, 17),
        );
        let callee = identifier(&mut builder, "f", 19);
        let call = builder.add(
            NodeKind::CallExpression {
                callee,
                arguments: vec![],
            },
            Span::new(19, 22),
        );
        let second = builder.add(
            NodeKind::ExpressionStatement { expression: call },
            Span::new(19, 22),
        );
        let ast = source_file(builder, vec![first, second]);

        let messages = check_file("test.nut", "f = function() {}; f()", &ast, DocRegistry::builtin());
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn test_string_operands_promote_subtraction() {
        // local i : int = "a" - "b"
        let mut builder = AstBuilder::new();
        let name = identifier(&mut builder, "i", 6);
        let annotation = builder.add(
            NodeKind::TypeAnnotation {
                name: "int".to_string(),
                generic_arguments: vec![],
                is_optional: false,
            },
            Span::new(10, 13),
        );
        let left = builder.add(
            NodeKind::StringLiteral {
                value: "a".to_string(),
            },
            Span::new(16, 19),
        );
        let right = builder.add(
            NodeKind::StringLiteral {
                value: "b".to_string(),
            },
            Span::new(22, 25),
        );
        let difference = builder.add(
            NodeKind::BinaryExpression {
                left,
                operator: TokenKind::Minus,
                right,
            },
            Span::new(16, 25),
        );
        let declaration = builder.add(
            NodeKind::VariableDeclaration {
                name,
                type_annotation: Some(annotation),
                initialiser: Some(difference),
            },
            Span::new(6, 25),
        );
        let local = builder.add(
            NodeKind::LocalStatement {
                declarations: vec![declaration],
            },
            Span::new(0, 25),
        );
        let ast = source_file(builder, vec![local]);

        let messages = check_file(
            "test.nut",
            "local i : int = \"a\" - \"b\"",
            &ast,
            DocRegistry::builtin(),
        );
        let errors = errors(&messages);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::NOT_ASSIGNABLE);
        assert_eq!(
            errors[0].message,
            "Type 'string' is not assignable to type 'int'"
        );
        assert_eq!((errors[0].start, errors[0].end), (16, 25));
    }
}
