//! The binder.
//!
//! A single depth-first walk over the syntax tree that produces side tables
//! keyed by node id: per-container locals, a node-to-symbol map, the symbol
//! arena, and the declaration outline. Two scope kinds run in parallel with
//! stack discipline: the *declarative* container scope (file, class, enum,
//! table, function) and the *block* scope (blocks, loops, catch, case
//! blocks). Containers without locals of their own (class, enum, table)
//! declare into the members table of their symbol instead.
//!
//! Binding never fails: unnamed or malformed declarations fall back to fixed
//! placeholder names.

use std::collections::HashMap;

use vscript_parser::ast::{Ast, NodeId, NodeKind};
use vscript_parser::TokenKind;

pub type SymbolId = usize;

/// Name to declaration list, ordered so shadowing and redeclaration history
/// is preserved.
pub type SymbolTable = HashMap<String, Vec<SymbolId>>;

/// Symbol classification bits.
pub mod flags {
    pub const GLOBAL: u16 = 1 << 0;
    pub const FUNCTION_SCOPED_VARIABLE: u16 = 1 << 1;
    pub const BLOCK_SCOPED_VARIABLE: u16 = 1 << 2;
    pub const PROPERTY: u16 = 1 << 3;
    pub const ENUM_MEMBER: u16 = 1 << 4;
    pub const FUNCTION: u16 = 1 << 5;
    pub const CLASS: u16 = 1 << 6;
    pub const ENUM: u16 = 1 << 7;
    pub const METHOD: u16 = 1 << 8;
    pub const CONSTRUCTOR: u16 = 1 << 9;
    pub const NEW_SLOT: u16 = 1 << 10;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub flags: u16,
    pub name: String,
    pub declaration: NodeId,
    /// Members of class/enum/table symbols.
    pub members: Option<SymbolTable>,
}

/// One entry of the declaration outline tree. Parameters and other
/// function-scoped variables never appear here.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub symbol: SymbolId,
    pub children: Vec<OutlineNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindResult {
    pub symbols: Vec<Symbol>,
    pub node_symbols: HashMap<NodeId, SymbolId>,
    /// Locals table of each container that has one, keyed by container node.
    pub locals: HashMap<NodeId, SymbolTable>,
    pub outline: Vec<OutlineNode>,
}

impl BindResult {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    /// All symbols with the given name, in binding order.
    pub fn symbols_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Symbol> {
        self.symbols.iter().filter(move |s| s.name == name)
    }
}

pub fn bind(ast: &Ast) -> BindResult {
    let root = ast.root();
    let mut binder = Binder {
        ast,
        symbols: Vec::new(),
        node_symbols: HashMap::new(),
        locals: HashMap::new(),
        container: vec![ScopeSlot::Locals(root)],
        block: vec![ScopeSlot::Locals(root)],
        outline: vec![Vec::new()],
    };
    for child in ast.children(root) {
        binder.bind_node(child);
    }
    let outline = binder.outline.pop().unwrap_or_default();
    BindResult {
        symbols: binder.symbols,
        node_symbols: binder.node_symbols,
        locals: binder.locals,
        outline,
    }
}

#[derive(Debug, Clone, Copy)]
enum ScopeSlot {
    /// Declarations land in the locals table of this container node.
    Locals(NodeId),
    /// Declarations land in the members table of this symbol.
    Members(SymbolId),
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Block,
    Container,
    File,
}

struct Binder<'a> {
    ast: &'a Ast,
    symbols: Vec<Symbol>,
    node_symbols: HashMap<NodeId, SymbolId>,
    locals: HashMap<NodeId, SymbolTable>,
    container: Vec<ScopeSlot>,
    block: Vec<ScopeSlot>,
    outline: Vec<Vec<OutlineNode>>,
}

impl<'a> Binder<'a> {
    fn new_symbol(&mut self, flags: u16, name: String, declaration: NodeId) -> SymbolId {
        let id = self.symbols.len();
        self.symbols.push(Symbol {
            flags,
            name,
            declaration,
            members: None,
        });
        id
    }

    fn declare(&mut self, scope: Scope, name: String, symbol: SymbolId) {
        let slot = match scope {
            Scope::Block => self.block.last().copied(),
            Scope::Container => self.container.last().copied(),
            Scope::File => self.container.first().copied(),
        }
        .unwrap_or(ScopeSlot::Locals(self.ast.root()));
        let table = match slot {
            ScopeSlot::Locals(node) => self.locals.entry(node).or_default(),
            ScopeSlot::Members(owner) => {
                self.symbols[owner].members.get_or_insert_with(SymbolTable::new)
            }
        };
        table.entry(name).or_default().push(symbol);
    }

    fn enter_locals(&mut self, node: NodeId, function_like: bool) {
        self.block.push(ScopeSlot::Locals(node));
        if function_like {
            self.container.push(ScopeSlot::Locals(node));
        }
    }

    fn exit_locals(&mut self, function_like: bool) {
        self.block.pop();
        if function_like {
            self.container.pop();
        }
    }

    fn enter_members(&mut self, symbol: SymbolId) {
        self.container.push(ScopeSlot::Members(symbol));
    }

    fn exit_members(&mut self) {
        self.container.pop();
    }

    fn begin_outline(&mut self) {
        self.outline.push(Vec::new());
    }

    fn end_outline(&mut self, symbol: SymbolId) {
        let children = self.outline.pop().unwrap_or_default();
        if let Some(parent) = self.outline.last_mut() {
            parent.push(OutlineNode { symbol, children });
        }
    }

    /// Name of a declaration's name node: an identifier, a literal, the tail
    /// of a property access, or an element access with a literal key.
    fn resolve_name(&self, id: NodeId) -> Option<String> {
        let ast = self.ast;
        match &ast.node(id).kind {
            NodeKind::Identifier { value }
            | NodeKind::StringLiteral { value }
            | NodeKind::VerbatimStringLiteral { value }
            | NodeKind::IntegerLiteral { value }
            | NodeKind::FloatLiteral { value } => Some(value.clone()),
            NodeKind::ComputedName { expression } => self.resolve_name(*expression),
            NodeKind::PropertyAccessExpression { name, .. } => self.resolve_name(*name),
            NodeKind::RootAccessExpression { name } => self.resolve_name(*name),
            NodeKind::ElementAccessExpression { index, .. } => match &ast.node(*index).kind {
                NodeKind::StringLiteral { value } => Some(value.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// An anonymous function/class/table expression that is the direct
    /// right-hand side of a declaration or newslot assignment reuses the
    /// declaration's symbol instead of allocating its own.
    fn alias_symbol(&self, id: NodeId) -> Option<SymbolId> {
        let ast = self.ast;
        let parent = ast.node(id).parent?;
        let aliased = match &ast.node(parent).kind {
            NodeKind::VariableDeclaration { initialiser, .. }
            | NodeKind::ParameterDeclaration { initialiser, .. }
            | NodeKind::EnumMember { initialiser, .. } => *initialiser == Some(id),
            NodeKind::PropertyAssignment { initialiser, .. }
            | NodeKind::ConstStatement { initialiser, .. } => *initialiser == id,
            NodeKind::BinaryExpression {
                operator, right, ..
            } => *operator == TokenKind::NewSlot && *right == id,
            _ => false,
        };
        if aliased {
            self.node_symbols.get(&parent).copied()
        } else {
            None
        }
    }

    fn bind_function(
        &mut self,
        id: NodeId,
        symbol: SymbolId,
        parameters: &[NodeId],
        return_annotation: Option<NodeId>,
        body: NodeId,
    ) {
        self.node_symbols.insert(id, symbol);
        self.begin_outline();
        self.enter_locals(id, true);
        for parameter in parameters {
            self.bind_node(*parameter);
        }
        if let Some(annotation) = return_annotation {
            self.bind_node(annotation);
        }
        self.bind_node(body);
        self.exit_locals(true);
        self.end_outline(symbol);
    }

    fn bind_loop_variable(&mut self, id: NodeId) {
        let name = self
            .resolve_name(id)
            .unwrap_or_else(|| "<variable>".to_string());
        let symbol = self.new_symbol(flags::BLOCK_SCOPED_VARIABLE, name.clone(), id);
        self.node_symbols.insert(id, symbol);
        self.declare(Scope::Block, name, symbol);
    }

    fn bind_node(&mut self, id: NodeId) {
        let ast = self.ast;
        match &ast.node(id).kind {
            NodeKind::VariableDeclaration {
                name,
                type_annotation,
                initialiser,
            } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<variable>".to_string());
                let symbol = self.new_symbol(flags::BLOCK_SCOPED_VARIABLE, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::Block, name, symbol);
                self.begin_outline();
                if let Some(annotation) = type_annotation {
                    self.bind_node(*annotation);
                }
                if let Some(initialiser) = initialiser {
                    self.bind_node(*initialiser);
                }
                self.end_outline(symbol);
            }
            NodeKind::ParameterDeclaration {
                name,
                type_annotation,
                initialiser,
            } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<variable>".to_string());
                let symbol = self.new_symbol(flags::FUNCTION_SCOPED_VARIABLE, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                // In the container's locals but never in the outline.
                self.declare(Scope::Block, name, symbol);
                if let Some(annotation) = type_annotation {
                    self.bind_node(*annotation);
                }
                if let Some(initialiser) = initialiser {
                    self.bind_node(*initialiser);
                }
            }
            NodeKind::ConstStatement { name, initialiser } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<variable>".to_string());
                let symbol = self.new_symbol(flags::GLOBAL, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::File, name, symbol);
                self.begin_outline();
                self.bind_node(*initialiser);
                self.end_outline(symbol);
            }
            NodeKind::FunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                let name = name
                    .and_then(|n| self.resolve_name(n))
                    .unwrap_or_else(|| "<function>".to_string());
                let symbol = self.new_symbol(flags::FUNCTION, name.clone(), id);
                self.declare(Scope::Container, name, symbol);
                self.bind_function(id, symbol, parameters, *return_annotation, *body);
            }
            NodeKind::LocalFunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<function>".to_string());
                let symbol = self.new_symbol(flags::FUNCTION, name.clone(), id);
                self.declare(Scope::Block, name, symbol);
                self.bind_function(id, symbol, parameters, *return_annotation, *body);
            }
            NodeKind::FunctionExpression {
                parameters,
                return_annotation,
                body,
            } => {
                let symbol = self.alias_symbol(id).unwrap_or_else(|| {
                    self.new_symbol(flags::FUNCTION, "<function>".to_string(), id)
                });
                self.node_symbols.insert(id, symbol);
                self.enter_locals(id, true);
                for parameter in parameters {
                    self.bind_node(*parameter);
                }
                if let Some(annotation) = return_annotation {
                    self.bind_node(*annotation);
                }
                self.bind_node(*body);
                self.exit_locals(true);
            }
            NodeKind::LambdaExpression {
                parameters,
                expression,
            } => {
                let symbol = self.alias_symbol(id).unwrap_or_else(|| {
                    self.new_symbol(flags::FUNCTION, "<function>".to_string(), id)
                });
                self.node_symbols.insert(id, symbol);
                self.enter_locals(id, true);
                for parameter in parameters {
                    self.bind_node(*parameter);
                }
                self.bind_node(*expression);
                self.exit_locals(true);
            }
            NodeKind::ClassDeclaration {
                name,
                extends,
                members,
            } => {
                let name = name
                    .and_then(|n| self.resolve_name(n))
                    .unwrap_or_else(|| "<class>".to_string());
                let symbol = self.new_symbol(flags::CLASS, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::Container, name, symbol);
                if let Some(extends) = extends {
                    self.bind_node(*extends);
                }
                self.begin_outline();
                self.enter_members(symbol);
                for member in members {
                    self.bind_node(*member);
                }
                self.exit_members();
                self.end_outline(symbol);
            }
            NodeKind::ClassExpression { extends, members } => {
                let symbol = self
                    .alias_symbol(id)
                    .unwrap_or_else(|| self.new_symbol(flags::CLASS, "<class>".to_string(), id));
                self.node_symbols.insert(id, symbol);
                if let Some(extends) = extends {
                    self.bind_node(*extends);
                }
                self.enter_members(symbol);
                for member in members {
                    self.bind_node(*member);
                }
                self.exit_members();
            }
            NodeKind::TableLiteralExpression { members } => {
                let symbol = self
                    .alias_symbol(id)
                    .unwrap_or_else(|| self.new_symbol(flags::PROPERTY, "<table>".to_string(), id));
                self.node_symbols.insert(id, symbol);
                self.enter_members(symbol);
                for member in members {
                    self.bind_node(*member);
                }
                self.exit_members();
            }
            NodeKind::MethodDeclaration {
                name,
                parameters,
                return_annotation,
                body,
                ..
            } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<method>".to_string());
                let symbol = self.new_symbol(flags::METHOD, name.clone(), id);
                self.declare(Scope::Container, name, symbol);
                self.bind_function(id, symbol, parameters, *return_annotation, *body);
            }
            NodeKind::ConstructorDeclaration { parameters, body } => {
                let symbol = self.new_symbol(flags::CONSTRUCTOR, "constructor".to_string(), id);
                self.declare(Scope::Container, "constructor".to_string(), symbol);
                self.bind_function(id, symbol, parameters, None, *body);
            }
            NodeKind::PropertyAssignment { name, initialiser } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<property>".to_string());
                let symbol = self.new_symbol(flags::PROPERTY, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::Container, name, symbol);
                self.begin_outline();
                self.bind_node(*initialiser);
                self.end_outline(symbol);
            }
            NodeKind::EnumDeclaration { name, members } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<enum>".to_string());
                let symbol = self.new_symbol(flags::ENUM, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::Container, name, symbol);
                self.begin_outline();
                self.enter_members(symbol);
                for member in members {
                    self.bind_node(*member);
                }
                self.exit_members();
                self.end_outline(symbol);
            }
            NodeKind::EnumMember { name, initialiser } => {
                let name = self
                    .resolve_name(*name)
                    .unwrap_or_else(|| "<enum member>".to_string());
                let symbol = self.new_symbol(flags::ENUM_MEMBER, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::Container, name, symbol);
                self.begin_outline();
                if let Some(initialiser) = initialiser {
                    self.bind_node(*initialiser);
                }
                self.end_outline(symbol);
            }
            NodeKind::BinaryExpression {
                left,
                operator,
                right,
            } if *operator == TokenKind::NewSlot => {
                // `<-` declares a new global slot named after the left side.
                let name = self
                    .resolve_name(*left)
                    .unwrap_or_else(|| "<variable>".to_string());
                let symbol = self.new_symbol(flags::GLOBAL | flags::NEW_SLOT, name.clone(), id);
                self.node_symbols.insert(id, symbol);
                self.declare(Scope::File, name, symbol);
                self.bind_node(*left);
                self.begin_outline();
                self.bind_node(*right);
                self.end_outline(symbol);
            }
            NodeKind::Block { statements } => {
                self.enter_locals(id, false);
                for statement in statements {
                    self.bind_node(*statement);
                }
                self.exit_locals(false);
            }
            NodeKind::ForStatement {
                initialiser,
                condition,
                increment,
                body,
            } => {
                self.enter_locals(id, false);
                if let Some(initialiser) = initialiser {
                    self.bind_node(*initialiser);
                }
                if let Some(condition) = condition {
                    self.bind_node(*condition);
                }
                if let Some(increment) = increment {
                    self.bind_node(*increment);
                }
                self.bind_node(*body);
                self.exit_locals(false);
            }
            NodeKind::ForEachStatement {
                index,
                value,
                iterable,
                body,
            } => {
                self.enter_locals(id, false);
                if let Some(index) = index {
                    self.bind_loop_variable(*index);
                }
                self.bind_loop_variable(*value);
                self.bind_node(*iterable);
                self.bind_node(*body);
                self.exit_locals(false);
            }
            NodeKind::CatchClause { variable, body } => {
                self.enter_locals(id, false);
                self.bind_loop_variable(*variable);
                self.bind_node(*body);
                self.exit_locals(false);
            }
            NodeKind::CaseBlock { clauses } => {
                self.enter_locals(id, false);
                for clause in clauses {
                    self.bind_node(*clause);
                }
                self.exit_locals(false);
            }
            _ => {
                for child in ast.children(id) {
                    self.bind_node(child);
                }
            }
        }
    }
}
