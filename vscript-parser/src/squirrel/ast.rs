//! Arena syntax tree for the Squirrel dialect.
//!
//! Nodes live in a contiguous arena and refer to each other by `NodeId`, so
//! parent links are plain indices instead of reference cycles. Malformed
//! constructs are explicit `Missing` nodes flagged with `missing`; consumers
//! pattern-match on them rather than dealing with absent children.
//!
//! The grammar that produces these trees lives outside this crate.
//! `AstBuilder` is the construction API: children are added first, the root
//! last, and `finish` computes every node's parent link.

use super::token::TokenKind;

/// Index of a node in its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    /// Set for placeholder nodes the parser emitted in place of a malformed
    /// construct. Missing names bind to placeholder strings, missing
    /// expressions type as `any`.
    pub missing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    SourceFile {
        statements: Vec<NodeId>,
    },
    Block {
        statements: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    LocalStatement {
        declarations: Vec<NodeId>,
    },
    ConstStatement {
        name: NodeId,
        initialiser: NodeId,
    },
    VariableDeclaration {
        name: NodeId,
        type_annotation: Option<NodeId>,
        initialiser: Option<NodeId>,
    },
    ParameterDeclaration {
        name: NodeId,
        type_annotation: Option<NodeId>,
        initialiser: Option<NodeId>,
    },
    FunctionDeclaration {
        name: Option<NodeId>,
        parameters: Vec<NodeId>,
        return_annotation: Option<NodeId>,
        body: NodeId,
    },
    LocalFunctionDeclaration {
        name: NodeId,
        parameters: Vec<NodeId>,
        return_annotation: Option<NodeId>,
        body: NodeId,
    },
    FunctionExpression {
        parameters: Vec<NodeId>,
        return_annotation: Option<NodeId>,
        body: NodeId,
    },
    LambdaExpression {
        parameters: Vec<NodeId>,
        expression: NodeId,
    },
    ClassDeclaration {
        name: Option<NodeId>,
        extends: Option<NodeId>,
        members: Vec<NodeId>,
    },
    ClassExpression {
        extends: Option<NodeId>,
        members: Vec<NodeId>,
    },
    MethodDeclaration {
        name: NodeId,
        parameters: Vec<NodeId>,
        return_annotation: Option<NodeId>,
        body: NodeId,
        is_static: bool,
    },
    ConstructorDeclaration {
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    PropertyAssignment {
        name: NodeId,
        initialiser: NodeId,
    },
    EnumDeclaration {
        name: NodeId,
        members: Vec<NodeId>,
    },
    EnumMember {
        name: NodeId,
        initialiser: Option<NodeId>,
    },
    TableLiteralExpression {
        members: Vec<NodeId>,
    },
    ArrayLiteralExpression {
        elements: Vec<NodeId>,
    },
    Identifier {
        value: String,
    },
    StringLiteral {
        value: String,
    },
    VerbatimStringLiteral {
        value: String,
    },
    IntegerLiteral {
        value: String,
    },
    FloatLiteral {
        value: String,
    },
    TrueLiteral,
    FalseLiteral,
    NullLiteral,
    ThisExpression,
    BaseExpression,
    RootAccessExpression {
        name: NodeId,
    },
    ComputedName {
        expression: NodeId,
    },
    BinaryExpression {
        left: NodeId,
        operator: TokenKind,
        right: NodeId,
    },
    PrefixUnaryExpression {
        operator: TokenKind,
        operand: NodeId,
    },
    PostfixUnaryExpression {
        operator: TokenKind,
        operand: NodeId,
    },
    ConditionalExpression {
        condition: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    PropertyAccessExpression {
        object: NodeId,
        name: NodeId,
    },
    ElementAccessExpression {
        object: NodeId,
        index: NodeId,
    },
    ParenthesisedExpression {
        expression: NodeId,
    },
    TypeAnnotation {
        name: String,
        generic_arguments: Vec<NodeId>,
        is_optional: bool,
    },
    ReturnStatement {
        expression: Option<NodeId>,
    },
    YieldStatement {
        expression: Option<NodeId>,
    },
    ThrowStatement {
        expression: NodeId,
    },
    IfStatement {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        condition: NodeId,
    },
    ForStatement {
        initialiser: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
    },
    ForEachStatement {
        index: Option<NodeId>,
        value: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    SwitchStatement {
        expression: NodeId,
        cases: NodeId,
    },
    CaseBlock {
        clauses: Vec<NodeId>,
    },
    CaseClause {
        expression: NodeId,
        statements: Vec<NodeId>,
    },
    DefaultClause {
        statements: Vec<NodeId>,
    },
    TryStatement {
        body: NodeId,
        catch: NodeId,
    },
    CatchClause {
        variable: NodeId,
        body: NodeId,
    },
    BreakStatement,
    ContinueStatement,
    EmptyStatement,
    DeleteExpression {
        operand: NodeId,
    },
    CloneExpression {
        operand: NodeId,
    },
    TypeOfExpression {
        operand: NodeId,
    },
    ResumeExpression {
        operand: NodeId,
    },
    Missing,
}

impl NodeKind {
    /// Child node ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        let mut out = Vec::new();
        let one = |id: &NodeId, out: &mut Vec<NodeId>| out.push(*id);
        let opt = |id: &Option<NodeId>, out: &mut Vec<NodeId>| {
            if let Some(id) = id {
                out.push(*id);
            }
        };
        let many = |ids: &[NodeId], out: &mut Vec<NodeId>| out.extend_from_slice(ids);
        match self {
            SourceFile { statements } | Block { statements } => many(statements, &mut out),
            ExpressionStatement { expression }
            | ParenthesisedExpression { expression }
            | ComputedName { expression }
            | ThrowStatement { expression } => one(expression, &mut out),
            LocalStatement { declarations } => many(declarations, &mut out),
            ConstStatement { name, initialiser } | PropertyAssignment { name, initialiser } => {
                one(name, &mut out);
                one(initialiser, &mut out);
            }
            VariableDeclaration {
                name,
                type_annotation,
                initialiser,
            }
            | ParameterDeclaration {
                name,
                type_annotation,
                initialiser,
            } => {
                one(name, &mut out);
                opt(type_annotation, &mut out);
                opt(initialiser, &mut out);
            }
            FunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                opt(name, &mut out);
                many(parameters, &mut out);
                opt(return_annotation, &mut out);
                one(body, &mut out);
            }
            LocalFunctionDeclaration {
                name,
                parameters,
                return_annotation,
                body,
            } => {
                one(name, &mut out);
                many(parameters, &mut out);
                opt(return_annotation, &mut out);
                one(body, &mut out);
            }
            FunctionExpression {
                parameters,
                return_annotation,
                body,
            } => {
                many(parameters, &mut out);
                opt(return_annotation, &mut out);
                one(body, &mut out);
            }
            LambdaExpression {
                parameters,
                expression,
            } => {
                many(parameters, &mut out);
                one(expression, &mut out);
            }
            ClassDeclaration {
                name,
                extends,
                members,
            } => {
                opt(name, &mut out);
                opt(extends, &mut out);
                many(members, &mut out);
            }
            ClassExpression { extends, members } => {
                opt(extends, &mut out);
                many(members, &mut out);
            }
            MethodDeclaration {
                name,
                parameters,
                return_annotation,
                body,
                ..
            } => {
                one(name, &mut out);
                many(parameters, &mut out);
                opt(return_annotation, &mut out);
                one(body, &mut out);
            }
            ConstructorDeclaration { parameters, body } => {
                many(parameters, &mut out);
                one(body, &mut out);
            }
            EnumDeclaration { name, members } => {
                one(name, &mut out);
                many(members, &mut out);
            }
            EnumMember { name, initialiser } => {
                one(name, &mut out);
                opt(initialiser, &mut out);
            }
            TableLiteralExpression { members } => many(members, &mut out),
            ArrayLiteralExpression { elements } => many(elements, &mut out),
            RootAccessExpression { name } => one(name, &mut out),
            BinaryExpression { left, right, .. } => {
                one(left, &mut out);
                one(right, &mut out);
            }
            PrefixUnaryExpression { operand, .. }
            | PostfixUnaryExpression { operand, .. }
            | DeleteExpression { operand }
            | CloneExpression { operand }
            | TypeOfExpression { operand }
            | ResumeExpression { operand } => one(operand, &mut out),
            ConditionalExpression {
                condition,
                when_true,
                when_false,
            } => {
                one(condition, &mut out);
                one(when_true, &mut out);
                one(when_false, &mut out);
            }
            CallExpression { callee, arguments } => {
                one(callee, &mut out);
                many(arguments, &mut out);
            }
            PropertyAccessExpression { object, name } => {
                one(object, &mut out);
                one(name, &mut out);
            }
            ElementAccessExpression { object, index } => {
                one(object, &mut out);
                one(index, &mut out);
            }
            TypeAnnotation {
                generic_arguments, ..
            } => many(generic_arguments, &mut out),
            ReturnStatement { expression } | YieldStatement { expression } => {
                opt(expression, &mut out)
            }
            IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                one(condition, &mut out);
                one(then_branch, &mut out);
                opt(else_branch, &mut out);
            }
            WhileStatement { condition, body } => {
                one(condition, &mut out);
                one(body, &mut out);
            }
            DoWhileStatement { body, condition } => {
                one(body, &mut out);
                one(condition, &mut out);
            }
            ForStatement {
                initialiser,
                condition,
                increment,
                body,
            } => {
                opt(initialiser, &mut out);
                opt(condition, &mut out);
                opt(increment, &mut out);
                one(body, &mut out);
            }
            ForEachStatement {
                index,
                value,
                iterable,
                body,
            } => {
                opt(index, &mut out);
                one(value, &mut out);
                one(iterable, &mut out);
                one(body, &mut out);
            }
            SwitchStatement { expression, cases } => {
                one(expression, &mut out);
                one(cases, &mut out);
            }
            CaseBlock { clauses } => many(clauses, &mut out),
            CaseClause {
                expression,
                statements,
            } => {
                one(expression, &mut out);
                many(statements, &mut out);
            }
            DefaultClause { statements } => many(statements, &mut out),
            TryStatement { body, catch } => {
                one(body, &mut out);
                one(catch, &mut out);
            }
            CatchClause { variable, body } => {
                one(variable, &mut out);
                one(body, &mut out);
            }
            Identifier { .. }
            | StringLiteral { .. }
            | VerbatimStringLiteral { .. }
            | IntegerLiteral { .. }
            | FloatLiteral { .. }
            | TrueLiteral
            | FalseLiteral
            | NullLiteral
            | ThisExpression
            | BaseExpression
            | BreakStatement
            | ContinueStatement
            | EmptyStatement
            | Missing => {}
        }
        out
    }
}

/// A complete syntax tree: node arena plus the root (a `SourceFile`).
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).kind.children()
    }

    /// The identifier text of `id`, if it is an `Identifier` node.
    pub fn identifier_value(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Identifier { value } => Some(value),
            _ => None,
        }
    }

    /// Depth-first pre-order walk below `id`.
    pub fn for_each_child<F: FnMut(NodeId)>(&self, id: NodeId, f: &mut F) {
        for child in self.children(id) {
            f(child);
            self.for_each_child(child, f);
        }
    }
}

/// Constructs an [`Ast`]. Children must be added before the node that refers
/// to them; `finish` walks the finished tree and fills in parent links.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            missing: false,
        });
        id
    }

    /// A zero-width placeholder for a construct the parser could not read.
    pub fn missing(&mut self, span: Span) -> NodeId {
        let id = self.add(NodeKind::Missing, span);
        self.nodes[id.0 as usize].missing = true;
        id
    }

    pub fn finish(mut self, root: NodeId) -> Ast {
        for index in 0..self.nodes.len() {
            let parent = NodeId(index as u32);
            for child in self.nodes[index].kind.children() {
                self.nodes[child.0 as usize].parent = Some(parent);
            }
        }
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}
