//! Abstract Syntax Tree definitions for Frond
//!
//! The tree is immutable after parsing. Each node category is a closed enum,
//! so adding a variant is a compile error everywhere it is unhandled. The
//! semantic pass never mutates nodes; its annotations live in a side table
//! keyed by [`ExprId`] (see `typechecker::Analysis`).

/// Source location: 1-based line and column.
///
/// The file path is carried by the compilation unit (one file per run), not
/// by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Stable key for side-table annotations on call-shaped expressions.
///
/// Allocated by the parser for `Call`, `MethodCall`, and `Pipe` nodes; the
/// semantic pass records return counts under these ids and codegen reads
/// them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// A program is an optional module declaration, imports, then declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub module: Option<ModuleDecl>,
    pub imports: Vec<ImportDecl>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
    pub pos: Position,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Type(TypeDecl),
    Interface(InterfaceDecl),
    Function(FunctionDecl),
}

impl Declaration {
    pub fn pos(&self) -> Position {
        match self {
            Declaration::Type(d) => d.pos,
            Declaration::Interface(d) => d.pos,
            Declaration::Function(d) => d.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Serialization alias: `name string as "user_name"` becomes a struct tag.
    pub alias: Option<String>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<MethodSig>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Vec<TypeExpr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    /// `func (c Counter) Increment()` — methods carry a receiver.
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub returns: Vec<TypeExpr>,
    pub body: Block,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub name: String,
    pub ty: TypeExpr,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    /// Default value; only trailing parameters may carry one.
    pub default: Option<Expr>,
    pub pos: Position,
}

// ============================================================================
// Type expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `int`, `float`, `string`, `bool`, `byte`, `any`, `error`
    Primitive { name: String, pos: Position },
    /// User-defined or qualified type: `User`, `web.ResponseWriter`
    Named { name: String, pos: Position },
    /// `list of T`
    List { elem: Box<TypeExpr>, pos: Position },
    /// `map of K to V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
        pos: Position,
    },
    /// `channel of T`
    Channel { elem: Box<TypeExpr>, pos: Position },
    /// `reference T`
    Reference { elem: Box<TypeExpr>, pos: Position },
    /// `func(int, string) bool`
    Function {
        params: Vec<TypeExpr>,
        returns: Vec<TypeExpr>,
        pos: Position,
    },
}

impl TypeExpr {
    pub fn pos(&self) -> Position {
        match self {
            TypeExpr::Primitive { pos, .. }
            | TypeExpr::Named { pos, .. }
            | TypeExpr::List { pos, .. }
            | TypeExpr::Map { pos, .. }
            | TypeExpr::Channel { pos, .. }
            | TypeExpr::Reference { pos, .. }
            | TypeExpr::Function { pos, .. } => *pos,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDecl(VarDeclStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
    Return(ReturnStmt),
    If(IfStmt),
    For(ForStmt),
    Defer(DeferStmt),
    Go(GoStmt),
    Send(SendStmt),
}

impl Statement {
    pub fn pos(&self) -> Position {
        match self {
            Statement::VarDecl(s) => s.pos,
            Statement::Assign(s) => s.pos,
            Statement::Expr(s) => s.expr.pos(),
            Statement::Return(s) => s.pos,
            Statement::If(s) => s.pos,
            Statement::For(s) => s.pos,
            Statement::Defer(s) => s.pos,
            Statement::Go(s) => s.pos,
            Statement::Send(s) => s.pos,
        }
    }
}

/// `x := expr` or `x, err := expr` or `x int = expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub names: Vec<String>,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub onerr: Option<OnErrClause>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub onerr: Option<OnErrClause>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub onerr: Option<OnErrClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub consequence: Block,
    pub alternative: Option<ElseArm>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseArm {
    If(Box<IfStmt>),
    Block(Block),
}

/// All four loop forms share one statement node with a header discriminant.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub header: ForHeader,
    pub body: Block,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForHeader {
    /// `for i from a to b` (exclusive) / `for i from a through b` (inclusive)
    Range {
        var: String,
        start: Expr,
        end: Expr,
        inclusive: bool,
    },
    /// `for x in xs` / `for i, x in xs`
    Collection {
        index: Option<String>,
        value: String,
        collection: Expr,
    },
    /// `for cond`
    Condition { condition: Expr },
    /// `for i := 0; i < n; i = i + 1`
    Clauses {
        init: Option<Box<Statement>>,
        condition: Option<Expr>,
        post: Option<Box<Statement>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferStmt {
    pub call: Expr,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoStmt {
    pub call: Expr,
    pub pos: Position,
}

/// `send value to ch`
#[derive(Debug, Clone, PartialEq)]
pub struct SendStmt {
    pub value: Expr,
    pub channel: Expr,
    pub pos: Position,
}

// ============================================================================
// onerr clause
// ============================================================================

/// Trailing error-handling modifier on var-decl, assignment, and expression
/// statements. Never an expression: it cannot nest inside sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct OnErrClause {
    pub handler: OnErrHandler,
    /// `explain "hint"` wraps the error text before it propagates.
    pub explain: Option<String>,
    /// `onerr as e` binds the caught error to `e` inside a block handler.
    pub alias: Option<String>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnErrHandler {
    /// `onerr` NEWLINE INDENT ... DEDENT
    Block(Block),
    /// `onerr panic "message"`
    Panic(Box<Expr>),
    /// Bare `onerr return` or standalone `onerr explain "hint"`: re-raise
    /// with zero values for the non-error results.
    Propagate,
    /// `onerr return a, b`
    Return(Vec<Expr>),
    /// `onerr "fallback"`: assign the fallback into the declared target.
    Default(Box<Expr>),
    /// `onerr discard`: bind the error to a throwaway name, no conditional.
    Discard,
}

// ============================================================================
// Expressions
// ============================================================================

/// Segment of a (possibly interpolated) string literal. The lexer produces
/// raw expression source; the parser re-parses it into [`StrPart::Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum StrPart {
    Literal(String),
    Expr(Box<Expr>),
}

/// Call argument, possibly named: `f(width: 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

/// How a pipe injects its left operand into the call on its right.
/// Resolved by the parser, in this priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeStrategy {
    /// `x |> f(a, _, b)` — substitute at the `_` position.
    Placeholder,
    /// `x |> .M(a)` — piped value becomes the receiver.
    Method,
    /// `ctx |> f(a)` — context-like value prepends as first argument.
    ContextFirst,
    /// `x |> f(a)` — default: prepend as first argument.
    DataFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int {
        value: i64,
        pos: Position,
    },
    Float {
        value: f64,
        pos: Position,
    },
    /// Single `Literal` part when not interpolated.
    Str {
        parts: Vec<StrPart>,
        pos: Position,
    },
    Bool {
        value: bool,
        pos: Position,
    },
    Ident {
        name: String,
        pos: Position,
    },
    This {
        pos: Position,
    },
    /// `_` — valid only as a pipe placeholder argument.
    Placeholder {
        pos: Position,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Position,
    },
    Pipe {
        id: ExprId,
        strategy: PipeStrategy,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },
    Call {
        id: ExprId,
        callee: Box<Expr>,
        args: Vec<Arg>,
        pos: Position,
    },
    /// `obj.M(args)`; `receiver` is `None` for the pipe shorthand `.M(args)`.
    MethodCall {
        id: ExprId,
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Arg>,
        pos: Position,
    },
    /// `obj.field`
    Field {
        object: Box<Expr>,
        name: String,
        pos: Position,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        pos: Position,
    },
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        pos: Position,
    },
    /// `Point{x: 1}` or the indentation-delimited equivalent.
    StructLit {
        name: String,
        fields: Vec<FieldInit>,
        pos: Position,
    },
    /// `[1, 2, 3]`, or `list of T []` for a typed empty list.
    ListLit {
        elem_ty: Option<TypeExpr>,
        elements: Vec<Expr>,
        pos: Position,
    },
    /// `map of K to V {k: v, ...}`
    MapLit {
        key_ty: TypeExpr,
        value_ty: TypeExpr,
        entries: Vec<(Expr, Expr)>,
        pos: Position,
    },
    /// `receive from ch`
    Receive {
        channel: Box<Expr>,
        pos: Position,
    },
    /// `x as T` — conversion for primitive targets, assertion for named ones.
    Cast {
        expr: Box<Expr>,
        ty: TypeExpr,
        pos: Position,
    },
    /// `make(channel of int)`, `make(list of string, 0, 10)`
    Make {
        ty: TypeExpr,
        args: Vec<Expr>,
        pos: Position,
    },
    /// `empty T` — the zero value of T.
    Empty {
        ty: Option<TypeExpr>,
        pos: Position,
    },
    /// `error "message"` — construct an error value.
    ErrorNew {
        message: Box<Expr>,
        pos: Position,
    },
    Panic {
        message: Box<Expr>,
        pos: Position,
    },
    Recover {
        pos: Position,
    },
    /// `close ch`
    Close {
        channel: Box<Expr>,
        pos: Position,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Int { pos, .. }
            | Expr::Float { pos, .. }
            | Expr::Str { pos, .. }
            | Expr::Bool { pos, .. }
            | Expr::Ident { pos, .. }
            | Expr::This { pos }
            | Expr::Placeholder { pos }
            | Expr::Binary { pos, .. }
            | Expr::Unary { pos, .. }
            | Expr::Pipe { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::MethodCall { pos, .. }
            | Expr::Field { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Slice { pos, .. }
            | Expr::StructLit { pos, .. }
            | Expr::ListLit { pos, .. }
            | Expr::MapLit { pos, .. }
            | Expr::Receive { pos, .. }
            | Expr::Cast { pos, .. }
            | Expr::Make { pos, .. }
            | Expr::Empty { pos, .. }
            | Expr::ErrorNew { pos, .. }
            | Expr::Panic { pos, .. }
            | Expr::Recover { pos }
            | Expr::Close { pos, .. } => *pos,
        }
    }

    /// True when this string literal carries embedded expressions.
    pub fn is_interpolated(&self) -> bool {
        matches!(self, Expr::Str { parts, .. } if parts.iter().any(|p| matches!(p, StrPart::Expr(_))))
    }

    /// True for plain literal expressions (no embedded interpolation).
    pub fn is_literal(&self) -> bool {
        match self {
            Expr::Int { .. } | Expr::Float { .. } | Expr::Bool { .. } => true,
            Expr::Str { .. } => !self.is_interpolated(),
            _ => false,
        }
    }
}
